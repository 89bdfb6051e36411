//! Number of keys folded per round, with the closed-form Lagrange and
//! vanishing evaluations specialized per width.
//!
//! The closed forms exist for widths 2, 3 and 4 only; anything else is a
//! configuration error rejected before any transcript interaction.

use crate::error::FoldingError;
use ark_ff::Field;

/// Maximum total degree (plus one) of the batched relation, including the
/// pow-polynomial factor. Fixes the extended evaluation length of the
/// combiner.
pub const MAX_TOTAL_RELATION_LENGTH: usize = 11;

/// How many keys one folding round combines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FoldWidth {
    Two,
    Three,
    Four,
}

impl FoldWidth {
    pub fn try_from_num_keys(num_keys: usize) -> Result<Self, FoldingError> {
        match num_keys {
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            _ => Err(FoldingError::UnsupportedFoldWidth(num_keys)),
        }
    }

    pub const fn num_keys(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }

    /// Length of the extended evaluation domain of the batched combiner. The
    /// combiner quotient is transmitted as its values at the integer points
    /// `num_keys()..batched_extended_length()`; its values below `num_keys()`
    /// are zero by construction.
    pub const fn batched_extended_length(self) -> usize {
        (MAX_TOTAL_RELATION_LENGTH - 1 + self.num_keys() - 1) * (self.num_keys() - 1) + 1
    }

    /// The Lagrange basis over `{0, .., num_keys() - 1}` evaluated at `x`.
    pub fn lagranges<F: Field>(self, x: F) -> Vec<F> {
        let one = F::one();
        let inverse_two = F::from(2u64).inverse().expect("odd characteristic");
        match self {
            Self::Two => vec![one - x, x],
            Self::Three => vec![
                (one - x) * (F::from(2u64) - x) * inverse_two,
                x * (F::from(2u64) - x),
                x * (x - one) * inverse_two,
            ],
            Self::Four => {
                let inverse_six = F::from(6u64).inverse().expect("characteristic above 3");
                vec![
                    (one - x) * (F::from(2u64) - x) * (F::from(3u64) - x) * inverse_six,
                    x * (F::from(2u64) - x) * (F::from(3u64) - x) * inverse_two,
                    x * (x - one) * (F::from(3u64) - x) * inverse_two,
                    x * (x - one) * (F::from(2u64) - x) * inverse_six,
                ]
            }
        }
    }

    /// The vanishing polynomial of `{0, .., num_keys() - 1}` evaluated at
    /// `x`.
    pub fn vanishing<F: Field>(self, x: F) -> F {
        (0..self.num_keys() as u64)
            .map(|i| x - F::from(i))
            .product()
    }
}
