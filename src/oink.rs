//! Sub-instance ("Oink") verifier: replays a fresh key's initial proof
//! through the shared transcript, populating its public inputs, witness
//! commitments, relation parameters and alphas, and resetting it to the
//! normalized shape folding expects.
//!
//! Every label is prefixed with the key's domain separator so the per-key
//! transcript segments stay independent while remaining bound into the one
//! overall Fiat-Shamir transcript.

use crate::{
    decider_vk::{DeciderVerificationKey, RelationParameters, NUM_ALPHAS},
    error::{FoldingError, OinkError},
    transcript::{Transcript, TranscriptHasher},
    CommitmentCurve,
};
use ark_ff::{Field, PrimeField, Zero};
use log::trace;

pub struct OinkVerifier<'a, G, H>
where
    G: CommitmentCurve,
    H: TranscriptHasher<G::ScalarField>,
{
    transcript: &'a mut Transcript<G::ScalarField, H>,
    domain_separator: String,
    key_index: usize,
}

impl<'a, G, H> OinkVerifier<'a, G, H>
where
    G: CommitmentCurve,
    G::BaseField: PrimeField,
    H: TranscriptHasher<G::ScalarField>,
{
    pub fn new(
        transcript: &'a mut Transcript<G::ScalarField, H>,
        domain_separator: &str,
        key_index: usize,
    ) -> Self {
        Self {
            transcript,
            domain_separator: domain_separator.to_string(),
            key_index,
        }
    }

    /// Replay the key's initial proof. On success the key carries freshly
    /// derived relation parameters and alphas, a zero target sum and an
    /// all-zero gate challenge vector.
    pub fn verify(mut self, key: &mut DeciderVerificationKey<G>) -> Result<(), FoldingError> {
        trace!("oink verification for key {}", self.key_index);
        let vk = &key.verification_key;

        let circuit_size = self.receive_fr("circuit_size")?;
        let public_input_size = self.receive_fr("public_input_size")?;
        let pub_inputs_offset = self.receive_fr("pub_inputs_offset")?;
        if circuit_size != G::ScalarField::from(vk.circuit_size) {
            return Err(self.failure(OinkError::CircuitSizeMismatch));
        }
        if public_input_size != G::ScalarField::from(vk.num_public_inputs as u64) {
            return Err(self.failure(OinkError::PublicInputCountMismatch));
        }
        if pub_inputs_offset != G::ScalarField::from(vk.pub_inputs_offset) {
            return Err(self.failure(OinkError::PublicInputOffsetMismatch));
        }

        let mut public_inputs = Vec::with_capacity(vk.num_public_inputs);
        for i in 0..vk.num_public_inputs {
            public_inputs.push(self.receive_fr(&format!("public_input_{i}"))?);
        }

        let w_l = self.receive_point("w_l")?;
        let w_r = self.receive_point("w_r")?;
        let w_o = self.receive_point("w_o")?;

        let eta = self.challenge("eta");
        let eta_two = self.challenge("eta_two");
        let eta_three = self.challenge("eta_three");

        let lookup_read_counts = self.receive_point("lookup_read_counts")?;
        let lookup_read_tags = self.receive_point("lookup_read_tags")?;
        let w_4 = self.receive_point("w_4")?;

        let beta = self.challenge("beta");
        let gamma = self.challenge("gamma");

        let lookup_inverses = self.receive_point("lookup_inverses")?;
        let z_perm = self.receive_point("z_perm")?;

        let vk = &key.verification_key;
        let public_input_delta = compute_public_input_delta(
            &public_inputs,
            beta,
            gamma,
            vk.circuit_size,
            vk.pub_inputs_offset,
        );
        let lookup_grand_product_delta =
            compute_lookup_grand_product_delta(beta, gamma, vk.circuit_size);

        key.public_inputs = public_inputs;
        key.witness_commitments.w_l = w_l;
        key.witness_commitments.w_r = w_r;
        key.witness_commitments.w_o = w_o;
        key.witness_commitments.w_4 = w_4;
        key.witness_commitments.z_perm = z_perm;
        key.witness_commitments.lookup_inverses = lookup_inverses;
        key.witness_commitments.lookup_read_counts = lookup_read_counts;
        key.witness_commitments.lookup_read_tags = lookup_read_tags;
        key.relation_parameters = RelationParameters {
            eta,
            eta_two,
            eta_three,
            beta,
            gamma,
            public_input_delta,
            lookup_grand_product_delta,
        };
        for index in 0..NUM_ALPHAS {
            key.alphas[index] = self.challenge(&format!("alpha_{index}"));
        }

        key.target_sum = G::ScalarField::zero();
        key.gate_challenges =
            vec![G::ScalarField::zero(); key.verification_key.log_circuit_size as usize];
        Ok(())
    }

    fn receive_fr(&mut self, label: &str) -> Result<G::ScalarField, FoldingError> {
        let label = format!("{}{label}", self.domain_separator);
        Ok(self.transcript.receive_from_prover(&label)?)
    }

    fn receive_point(&mut self, label: &str) -> Result<G, FoldingError> {
        let label = format!("{}{label}", self.domain_separator);
        Ok(self.transcript.receive_point_from_prover(&label)?)
    }

    fn challenge(&mut self, label: &str) -> G::ScalarField {
        let label = format!("{}{label}", self.domain_separator);
        self.transcript.get_challenge(&label)
    }

    fn failure(&self, source: OinkError) -> FoldingError {
        FoldingError::SubInstanceVerificationFailed {
            key_index: self.key_index,
            source,
        }
    }
}

/// Ratio of the permutation grand product boundary terms contributed by the
/// public inputs:
/// `prod_i (gamma + beta * (n + offset + i) + p_i)` over
/// `prod_i (gamma - beta * (offset + 1 + i) + p_i)`.
pub fn compute_public_input_delta<F: Field>(
    public_inputs: &[F],
    beta: F,
    gamma: F,
    domain_size: u64,
    offset: u64,
) -> F {
    let mut numerator = F::one();
    let mut denominator = F::one();
    let mut numerator_acc = gamma + beta * F::from(domain_size + offset);
    let mut denominator_acc = gamma - beta * F::from(offset + 1);
    for public_input in public_inputs {
        numerator *= numerator_acc + public_input;
        denominator *= denominator_acc + public_input;
        numerator_acc += beta;
        denominator_acc -= beta;
    }
    numerator * denominator.inverse().expect("non-zero")
}

/// Boundary factor of the lookup grand product:
/// `(gamma * (1 + beta))^domain_size`.
pub fn compute_lookup_grand_product_delta<F: Field>(beta: F, gamma: F, domain_size: u64) -> F {
    (gamma * (F::one() + beta)).pow([domain_size])
}
