//! This library implements the verifier side of the
//! [Protogalaxy](https://eprint.iacr.org/2023/1106) folding scheme: it
//! combines several decider verification keys into a single accumulated key,
//! re-deriving every challenge the prover used through a Fiat-Shamir
//! transcript and checking the prover's claimed polynomial evaluations
//! against the committed combiner polynomial.
//! It implements different components to achieve it:
//! - [transcript]: the labeled Fiat-Shamir channel over the fold data.
//! - [decider_vk]: the accumulator record being folded.
//! - [oink]: the sub-instance verifier that brings a fresh key to a
//!   normalized shape before combination.
//! - [verifier]: the folding orchestrator, [`ProtogalaxyVerifier`].
//! - [polynomial] and [fold_width]: perturbator, combiner-quotient and
//!   Lagrange/vanishing evaluation helpers.
//!
//! One folding round consumes its input keys and produces a fresh
//! accumulator; the accumulator becomes an input to the next round or, once
//! folding stops, to an external decision procedure. There is no explicit
//! accept/reject bit: an inconsistent proof yields an accumulator whose
//! target sum no honest prover can satisfy, so a later round (or the
//! terminal check) fails.

use ark_ec::{
    short_weierstrass::{Affine, SWCurveConfig},
    AffineRepr,
};

pub mod decider_vk;
pub mod error;
pub mod fold_width;
pub mod oink;
pub mod polynomial;
pub mod relations;
pub mod transcript;
pub mod verifier;

pub use decider_vk::{
    DatabusPropagationData, DeciderVerificationKey, PcsVerificationKey, PrecomputedCommitments,
    RelationParameters, VerificationKey, WitnessCommitments, NUM_ALPHAS,
};
pub use error::{FoldingError, OinkError, ShapeError, TranscriptError};
pub use fold_width::{FoldWidth, MAX_TOTAL_RELATION_LENGTH};
pub use transcript::{Blake2bTranscriptHasher, Transcript, TranscriptHasher};
pub use verifier::ProtogalaxyVerifier;

/// The curve commitments live on: what the transcript needs from a
/// commitment, namely access to its affine coordinates and canonical
/// reconstruction from them.
pub trait CommitmentCurve: AffineRepr {
    /// Affine coordinates, `None` for the group identity.
    fn to_coordinates(&self) -> Option<(Self::BaseField, Self::BaseField)>;

    /// Rebuild a point from affine coordinates. `None` if `(x, y)` is not on
    /// the curve or outside the prime-order subgroup.
    fn of_coordinates(x: Self::BaseField, y: Self::BaseField) -> Option<Self>;
}

impl<P: SWCurveConfig> CommitmentCurve for Affine<P> {
    fn to_coordinates(&self) -> Option<(Self::BaseField, Self::BaseField)> {
        self.xy().map(|(x, y)| (*x, *y))
    }

    fn of_coordinates(x: Self::BaseField, y: Self::BaseField) -> Option<Self> {
        let point = Affine::new_unchecked(x, y);
        (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
    }
}
