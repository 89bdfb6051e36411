//! Fiat-Shamir transcript over a fully buffered folding proof.
//!
//! The fold data is an ordered sequence of scalar field elements. Reading an
//! element absorbs it; every challenge is derived from the previous challenge,
//! everything absorbed since, and the challenge label, so no transcript
//! interaction can be reordered without changing all subsequent challenges.
//!
//! Commitments travel over the wire as four scalar field elements: each
//! base field coordinate is split into a low limb of [`NUM_LIMB_BITS`] bits
//! and a high limb carrying the rest. The all-zero encoding denotes the group
//! identity. Non-canonical limbs and off-curve points are rejected.

use crate::{error::TranscriptError, CommitmentCurve};
use ark_ff::{BigInteger, PrimeField, Zero};
use blake2::{Blake2b512, Digest};
use num_bigint::BigUint;
use std::marker::PhantomData;

/// Bits carried by the low limb of a base field coordinate.
pub const NUM_LIMB_BITS: usize = 136;

/// Scalar field elements consumed per commitment.
pub const POINT_LIMBS: usize = 4;

const LIMB_BYTES: usize = NUM_LIMB_BITS / 8;

/// Maps an absorbed byte stream to a scalar field element. The concrete hash
/// is owned by the surrounding protocol; the verifier only requires
/// determinism.
pub trait TranscriptHasher<F: PrimeField> {
    fn hash(input: &[u8]) -> F;
}

/// Blake2b-based hasher, reduced into the field via its little-endian bytes.
#[derive(Clone, Debug, Default)]
pub struct Blake2bTranscriptHasher;

impl<F: PrimeField> TranscriptHasher<F> for Blake2bTranscriptHasher {
    fn hash(input: &[u8]) -> F {
        let mut h = Blake2b512::new();
        h.update(input);
        F::from_le_bytes_mod_order(&h.finalize()[..])
    }
}

/// Append-only, order-sensitive challenge and proof-element channel.
#[derive(Clone, Debug)]
pub struct Transcript<F: PrimeField, H: TranscriptHasher<F>> {
    proof_data: Vec<F>,
    num_elements_read: usize,
    round_buffer: Vec<u8>,
    previous_challenge: F,
    _hasher: PhantomData<H>,
}

impl<F: PrimeField, H: TranscriptHasher<F>> Transcript<F, H> {
    pub fn new(fold_data: &[F]) -> Self {
        Self {
            proof_data: fold_data.to_vec(),
            num_elements_read: 0,
            round_buffer: Vec::new(),
            previous_challenge: F::zero(),
            _hasher: PhantomData,
        }
    }

    /// Absorb a field element without reading it from the proof data. Used to
    /// bind an already accumulated key's state into the round.
    pub fn absorb_element(&mut self, label: &str, element: &F) {
        self.round_buffer.extend_from_slice(label.as_bytes());
        self.round_buffer
            .extend_from_slice(&element.into_bigint().to_bytes_le());
    }

    /// Absorb a commitment, as its limb encoding.
    pub fn absorb_point<G>(&mut self, label: &str, point: &G)
    where
        G: CommitmentCurve<ScalarField = F>,
        G::BaseField: PrimeField,
    {
        for limb in point_to_limbs(point) {
            self.absorb_element(label, &limb);
        }
    }

    /// Read the next proof element tagged `label` and absorb it.
    pub fn receive_from_prover(&mut self, label: &str) -> Result<F, TranscriptError> {
        let element = self
            .proof_data
            .get(self.num_elements_read)
            .copied()
            .ok_or_else(|| TranscriptError::MissingProofElement(label.to_string()))?;
        self.num_elements_read += 1;
        self.absorb_element(label, &element);
        Ok(element)
    }

    /// Read the next commitment tagged `label`: four limbs, reassembled and
    /// checked to be a canonical encoding of a point on the curve.
    pub fn receive_point_from_prover<G>(&mut self, label: &str) -> Result<G, TranscriptError>
    where
        G: CommitmentCurve<ScalarField = F>,
        G::BaseField: PrimeField,
    {
        let mut limbs = [F::zero(); POINT_LIMBS];
        for limb in &mut limbs {
            *limb = self.receive_from_prover(label)?;
        }
        limbs_to_point(&limbs).ok_or_else(|| TranscriptError::InvalidPointEncoding(label.to_string()))
    }

    /// Derive a challenge from everything absorbed so far plus `label`.
    pub fn get_challenge(&mut self, label: &str) -> F {
        let mut input = self.previous_challenge.into_bigint().to_bytes_le();
        input.append(&mut self.round_buffer);
        input.extend_from_slice(label.as_bytes());
        let challenge = H::hash(&input);
        self.previous_challenge = challenge;
        challenge
    }
}

/// Limb encoding of a commitment: `[x_lo, x_hi, y_lo, y_hi]`, or all zeros
/// for the group identity.
pub fn point_to_limbs<G>(point: &G) -> [G::ScalarField; POINT_LIMBS]
where
    G: CommitmentCurve,
    G::BaseField: PrimeField,
{
    match point.to_coordinates() {
        Some((x, y)) => {
            let (x_lo, x_hi) = coordinate_to_limbs::<G>(&x);
            let (y_lo, y_hi) = coordinate_to_limbs::<G>(&y);
            [x_lo, x_hi, y_lo, y_hi]
        }
        None => [G::ScalarField::zero(); POINT_LIMBS],
    }
}

/// Inverse of [`point_to_limbs`]. `None` for non-canonical limbs or a point
/// not on the curve.
pub fn limbs_to_point<G>(limbs: &[G::ScalarField; POINT_LIMBS]) -> Option<G>
where
    G: CommitmentCurve,
    G::BaseField: PrimeField,
{
    if limbs.iter().all(Zero::is_zero) {
        return Some(G::zero());
    }
    let x = limbs_to_coordinate::<G>(&limbs[0], &limbs[1])?;
    let y = limbs_to_coordinate::<G>(&limbs[2], &limbs[3])?;
    G::of_coordinates(x, y)
}

fn coordinate_to_limbs<G>(coordinate: &G::BaseField) -> (G::ScalarField, G::ScalarField)
where
    G: CommitmentCurve,
    G::BaseField: PrimeField,
{
    let bytes = coordinate.into_bigint().to_bytes_le();
    let split = LIMB_BYTES.min(bytes.len());
    let lo = G::ScalarField::from_le_bytes_mod_order(&bytes[..split]);
    let hi = G::ScalarField::from_le_bytes_mod_order(&bytes[split..]);
    (lo, hi)
}

fn limbs_to_coordinate<G>(lo: &G::ScalarField, hi: &G::ScalarField) -> Option<G::BaseField>
where
    G: CommitmentCurve,
    G::BaseField: PrimeField,
{
    let lo_bytes = lo.into_bigint().to_bytes_le();
    // The low limb must fit its declared width.
    if lo_bytes.len() > LIMB_BYTES && lo_bytes[LIMB_BYTES..].iter().any(|b| *b != 0) {
        return None;
    }
    let mut bytes = Vec::with_capacity(LIMB_BYTES + lo_bytes.len());
    bytes.extend_from_slice(&lo_bytes[..LIMB_BYTES.min(lo_bytes.len())]);
    bytes.resize(LIMB_BYTES, 0);
    bytes.extend_from_slice(&hi.into_bigint().to_bytes_le());

    let value = BigUint::from_bytes_le(&bytes);
    let modulus =
        BigUint::from_bytes_le(&<G::BaseField as PrimeField>::MODULUS.to_bytes_le());
    if value >= modulus {
        return None;
    }
    Some(<G::BaseField as PrimeField>::from_le_bytes_mod_order(&bytes))
}
