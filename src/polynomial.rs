//! Univariate evaluation helpers for the folding verifier: the perturbator
//! polynomial, the round challenge powers, the gate-challenge update rule and
//! the partially specified combiner quotient.

use crate::fold_width::FoldWidth;
use ark_ff::{batch_inversion, Field, PrimeField};
use ark_poly::{univariate::DensePolynomial, DenseUVPolynomial, Polynomial};
use itertools::Itertools;

/// `delta^(2^i)` for `i = 0..count`, by iterated squaring.
pub fn compute_round_challenge_pows<F: Field>(count: usize, delta: F) -> Vec<F> {
    let mut pows = Vec::with_capacity(count);
    let mut current = delta;
    for _ in 0..count {
        pows.push(current);
        current.square_in_place();
    }
    pows
}

/// Fold the previous round's gate challenges with the new perturbator
/// challenge: `new[i] = old[i] + perturbator_challenge * deltas[i]`. The
/// result keeps the input length and is reproduced bit for bit by an honest
/// prover running the mirrored computation.
pub fn update_gate_challenges<F: Field>(
    perturbator_challenge: F,
    gate_challenges: &[F],
    deltas: &[F],
) -> Vec<F> {
    gate_challenges
        .iter()
        .zip(deltas)
        .map(|(gate_challenge, delta)| *gate_challenge + perturbator_challenge * delta)
        .collect()
}

/// Horner evaluation of the perturbator polynomial given by its
/// coefficients, lowest degree first.
pub fn evaluate_perturbator<F: PrimeField>(coefficients: Vec<F>, point: F) -> F {
    DensePolynomial::from_coefficients_vec(coefficients).evaluate(&point)
}

/// The combiner quotient `K(X)`, specified by its evaluations at the integer
/// points `num_keys..batched_extended_length`; its values at `0..num_keys`
/// are zero by construction and are not transmitted.
#[derive(Clone, Debug)]
pub struct CombinerQuotient<F: PrimeField> {
    evaluations: Vec<F>,
    skip_count: usize,
    domain_size: usize,
}

impl<F: PrimeField> CombinerQuotient<F> {
    pub fn new(width: FoldWidth, evaluations: Vec<F>) -> Self {
        debug_assert_eq!(
            evaluations.len(),
            width.batched_extended_length() - width.num_keys()
        );
        Self {
            evaluations,
            skip_count: width.num_keys(),
            domain_size: width.batched_extended_length(),
        }
    }

    /// Barycentric evaluation over the full integer domain
    /// `{0, .., domain_size - 1}`.
    pub fn evaluate(&self, point: F) -> F {
        let domain = || (0..self.domain_size as u64).map(F::from);

        // On the domain itself the barycentric form degenerates; the value is
        // one of the known evaluations.
        if let Some((index, _)) = domain().find_position(|node| *node == point) {
            return if index < self.skip_count {
                F::zero()
            } else {
                self.evaluations[index - self.skip_count]
            };
        }

        let full_numerator: F = domain().map(|node| point - node).product();

        // denominators[i] = (i - 0)..(i - (n-1)) without the i term, times
        // (point - i); inverted in batch.
        let mut denominators: Vec<F> = (self.skip_count..self.domain_size)
            .map(|index| {
                let node = F::from(index as u64);
                let mut denominator = lagrange_denominator::<F>(index, self.domain_size);
                denominator *= point - node;
                denominator
            })
            .collect();
        batch_inversion(&mut denominators);

        let sum: F = self
            .evaluations
            .iter()
            .zip(&denominators)
            .map(|(evaluation, inverse)| *evaluation * inverse)
            .sum();
        full_numerator * sum
    }
}

/// `prod_{j != i} (i - j)` over the integer domain of the given size, i.e.
/// `(-1)^(n-1-i) * i! * (n-1-i)!`.
fn lagrange_denominator<F: Field>(index: usize, domain_size: usize) -> F {
    let mut product = F::one();
    for j in 0..domain_size {
        if j < index {
            product *= F::from((index - j) as u64);
        } else if j > index {
            product *= -F::from((j - index) as u64);
        }
    }
    product
}
