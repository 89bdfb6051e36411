//! This module implements the error types surfaced by the folding verifier.

use thiserror::Error;

/// Errors that can arise while reading the fold data through the transcript.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("proof data exhausted while reading element {0}")]
    MissingProofElement(String),

    #[error("element {0} is not a valid curve point encoding")]
    InvalidPointEncoding(String),
}

/// Errors that can arise while checking a sub-instance ("Oink") proof.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OinkError {
    #[error("circuit size in the proof does not match the verification key")]
    CircuitSizeMismatch,

    #[error("public input count in the proof does not match the verification key")]
    PublicInputCountMismatch,

    #[error("public input offset in the proof does not match the verification key")]
    PublicInputOffsetMismatch,
}

/// Errors raised when the keys to fold are not positionally aligned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeError {
    #[error("key {0} has circuit size {2}, expected {1}")]
    CircuitSize(usize, u64, u64),

    #[error("key {0} has {2} public inputs, expected {1}")]
    PublicInputCount(usize, usize, usize),

    #[error("key {0} does not match key 0 on databus support")]
    DatabusSupport(usize),

    #[error("key {0} has {2} gate challenges, expected {1}")]
    GateChallengeCount(usize, usize, usize),
}

/// Errors that can arise when verifying a folding proof.
///
/// Any of these means "reject this proof"; no partial accumulator is ever
/// returned alongside an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FoldingError {
    #[error("the folding proof is malformed: {0}")]
    ProofMalformed(#[from] TranscriptError),

    #[error("cannot fold {0} keys: supported widths are 2, 3 and 4")]
    UnsupportedFoldWidth(usize),

    #[error("sub-instance proof for key {key_index} is invalid: {source}")]
    SubInstanceVerificationFailed {
        key_index: usize,
        source: OinkError,
    },

    #[error("keys to fold are not positionally aligned: {0}")]
    ShapeMismatch(#[from] ShapeError),
}
