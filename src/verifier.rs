//! The folding orchestrator: derives the round challenges, evaluates the
//! perturbator and combiner-quotient polynomials and linearly combines every
//! field of every input key into the next accumulator.
//!
//! There is no explicit accept/reject bit. Every challenge depends on every
//! prior transcript absorption, so an inconsistent proof produces an
//! accumulator whose target sum no honest prover can satisfy; the next round
//! (or the terminal decision procedure) fails instead. No step may be
//! skipped, reordered or short-circuited.

use crate::{
    decider_vk::{DeciderVerificationKey, RelationParameters, VerificationKey, NUM_ALPHAS},
    error::{FoldingError, ShapeError},
    fold_width::FoldWidth,
    oink::OinkVerifier,
    polynomial::{
        compute_round_challenge_pows, evaluate_perturbator, update_gate_challenges,
        CombinerQuotient,
    },
    transcript::{Transcript, TranscriptHasher},
    CommitmentCurve,
};
use ark_ec::CurveGroup;
use ark_ff::{PrimeField, Zero};
use log::{debug, trace};
use rayon::prelude::*;
use std::{array, sync::Arc};

pub struct ProtogalaxyVerifier<G, H>
where
    G: CommitmentCurve,
    H: TranscriptHasher<G::ScalarField>,
{
    transcript: Transcript<G::ScalarField, H>,
    keys_to_fold: Vec<DeciderVerificationKey<G>>,
}

impl<G, H> ProtogalaxyVerifier<G, H>
where
    G: CommitmentCurve,
    G::BaseField: PrimeField,
    H: TranscriptHasher<G::ScalarField>,
{
    /// Run one folding round over the given keys, consuming them. The keys
    /// are finalized in input order, every challenge is re-derived from the
    /// fold data, and a new accumulator is returned.
    pub fn verify_folding_proof(
        keys: Vec<DeciderVerificationKey<G>>,
        fold_data: &[G::ScalarField],
    ) -> Result<DeciderVerificationKey<G>, FoldingError> {
        let width = FoldWidth::try_from_num_keys(keys.len())?;
        check_key_shapes(&keys)?;
        debug!(
            "folding {} keys, circuit size 2^{}",
            width.num_keys(),
            keys[0].verification_key.log_circuit_size
        );
        let mut verifier = Self {
            transcript: Transcript::new(fold_data),
            keys_to_fold: keys,
        };
        verifier.prepare_for_folding()?;
        verifier.fold(width)
    }

    /// Finalize each key under its positional domain separator: fresh keys
    /// are put through the sub-instance verifier, accumulated keys have
    /// their state absorbed so it is bound into this round's challenges.
    fn prepare_for_folding(&mut self) -> Result<(), FoldingError> {
        let Self {
            transcript,
            keys_to_fold,
        } = self;
        for (index, key) in keys_to_fold.iter_mut().enumerate() {
            let domain_separator = format!("{index}_");
            if key.is_accumulator {
                bind_accumulator_state(transcript, key, &domain_separator);
            } else {
                OinkVerifier::new(transcript, &domain_separator, index).verify(key)?;
            }
        }
        Ok(())
    }

    fn fold(mut self, width: FoldWidth) -> Result<DeciderVerificationKey<G>, FoldingError> {
        let log_circuit_size =
            self.keys_to_fold[0].verification_key.log_circuit_size as usize;
        let accumulator_is_accumulator = self.keys_to_fold[0].is_accumulator;
        let accumulator_target_sum = self.keys_to_fold[0].target_sum;

        let delta = self.transcript.get_challenge("delta");
        let deltas = compute_round_challenge_pows(log_circuit_size, delta);

        let mut perturbator_coeffs =
            vec![G::ScalarField::zero(); log_circuit_size + 1];
        if accumulator_is_accumulator {
            for index in 1..=log_circuit_size {
                perturbator_coeffs[index] = self
                    .transcript
                    .receive_from_prover(&format!("perturbator_{index}"))?;
            }
        }
        perturbator_coeffs[0] = accumulator_target_sum;
        let perturbator_challenge = self.transcript.get_challenge("perturbator_challenge");
        let perturbator_at_challenge =
            evaluate_perturbator(perturbator_coeffs, perturbator_challenge);
        trace!("perturbator evaluated at its challenge");

        let num_evaluations = width.batched_extended_length() - width.num_keys();
        let mut combiner_quotient_evals = Vec::with_capacity(num_evaluations);
        for index in 0..num_evaluations {
            combiner_quotient_evals.push(self.transcript.receive_from_prover(&format!(
                "combiner_quotient_{}",
                index + width.num_keys()
            ))?);
        }
        let combiner_quotient = CombinerQuotient::new(width, combiner_quotient_evals);
        let combiner_challenge = self.transcript.get_challenge("combiner_quotient_challenge");
        let combiner_quotient_at_challenge = combiner_quotient.evaluate(combiner_challenge);

        let vanishing_at_challenge = width.vanishing(combiner_challenge);
        let lagranges = width.lagranges(combiner_challenge);

        let Self { keys_to_fold, .. } = self;
        let accumulator = &keys_to_fold[0];
        let vk = &accumulator.verification_key;

        // Invariant metadata is copied from the accumulator; only the
        // commitments are recombined.
        let mut next_verification_key = VerificationKey {
            circuit_size: vk.circuit_size,
            log_circuit_size: vk.log_circuit_size,
            num_public_inputs: vk.num_public_inputs,
            pcs_verification_key: Arc::clone(&vk.pcs_verification_key),
            pub_inputs_offset: vk.pub_inputs_offset,
            contains_recursive_proof: vk.contains_recursive_proof,
            recursive_proof_public_input_indices: vk
                .recursive_proof_public_input_indices
                .clone(),
            databus_propagation_data: vk.databus_propagation_data,
            commitments: vk.commitments.clone(),
        };
        let vk_slots: Vec<Vec<&G>> = keys_to_fold
            .iter()
            .map(|key| key.verification_key.commitments.get_all())
            .collect();
        fold_commitment_slots(
            next_verification_key.commitments.get_all_mut(),
            &vk_slots,
            &lagranges,
        );

        let mut witness_commitments = accumulator.witness_commitments.clone();
        let witness_slots: Vec<Vec<&G>> = keys_to_fold
            .iter()
            .map(|key| key.witness_commitments.get_all())
            .collect();
        fold_commitment_slots(witness_commitments.get_all_mut(), &witness_slots, &lagranges);

        let alphas: [G::ScalarField; NUM_ALPHAS] = array::from_fn(|index| {
            keys_to_fold
                .iter()
                .zip(&lagranges)
                .map(|(key, lagrange)| key.alphas[index] * lagrange)
                .sum()
        });

        let mut relation_parameters = RelationParameters::default();
        for (key, lagrange) in keys_to_fold.iter().zip(&lagranges) {
            let parameters = &key.relation_parameters;
            relation_parameters.eta += parameters.eta * lagrange;
            relation_parameters.eta_two += parameters.eta_two * lagrange;
            relation_parameters.eta_three += parameters.eta_three * lagrange;
            relation_parameters.beta += parameters.beta * lagrange;
            relation_parameters.gamma += parameters.gamma * lagrange;
            relation_parameters.public_input_delta +=
                parameters.public_input_delta * lagrange;
            relation_parameters.lookup_grand_product_delta +=
                parameters.lookup_grand_product_delta * lagrange;
        }

        // Next folding parameters.
        let target_sum = perturbator_at_challenge * lagranges[0]
            + vanishing_at_challenge * combiner_quotient_at_challenge;
        let gate_challenges =
            update_gate_challenges(perturbator_challenge, &accumulator.gate_challenges, &deltas);

        let num_public_inputs = next_verification_key.num_public_inputs;
        Ok(DeciderVerificationKey {
            verification_key: next_verification_key,
            witness_commitments,
            public_inputs: vec![G::ScalarField::zero(); num_public_inputs],
            relation_parameters,
            alphas,
            gate_challenges,
            target_sum,
            is_accumulator: true,
        })
    }
}

/// Check the keys are positionally aligned before any transcript
/// interaction: identical circuit shape and databus capability, and a
/// well-formed gate challenge vector on every key.
fn check_key_shapes<G: CommitmentCurve>(
    keys: &[DeciderVerificationKey<G>],
) -> Result<(), FoldingError> {
    let reference = &keys[0].verification_key;
    for (index, key) in keys.iter().enumerate() {
        let vk = &key.verification_key;
        if vk.circuit_size != reference.circuit_size
            || vk.log_circuit_size != reference.log_circuit_size
        {
            return Err(
                ShapeError::CircuitSize(index, reference.circuit_size, vk.circuit_size).into(),
            );
        }
        if vk.num_public_inputs != reference.num_public_inputs {
            return Err(ShapeError::PublicInputCount(
                index,
                reference.num_public_inputs,
                vk.num_public_inputs,
            )
            .into());
        }
        if vk.commitments.has_databus() != reference.commitments.has_databus() {
            return Err(ShapeError::DatabusSupport(index).into());
        }
        if key.gate_challenges.len() != vk.log_circuit_size as usize {
            return Err(ShapeError::GateChallengeCount(
                index,
                vk.log_circuit_size as usize,
                key.gate_challenges.len(),
            )
            .into());
        }
    }
    Ok(())
}

/// Absorb an accumulated key's full state under its domain separator, so its
/// prior state is bound into this round's challenges.
fn bind_accumulator_state<G, H>(
    transcript: &mut Transcript<G::ScalarField, H>,
    key: &DeciderVerificationKey<G>,
    domain_separator: &str,
) where
    G: CommitmentCurve,
    G::BaseField: PrimeField,
    H: TranscriptHasher<G::ScalarField>,
{
    let vk = &key.verification_key;
    let scalar_label = format!("{domain_separator}accumulator_state");
    for element in [
        G::ScalarField::from(vk.circuit_size),
        G::ScalarField::from(vk.num_public_inputs as u64),
        G::ScalarField::from(vk.pub_inputs_offset),
        key.target_sum,
    ] {
        transcript.absorb_element(&scalar_label, &element);
    }
    for public_input in &key.public_inputs {
        transcript.absorb_element(&scalar_label, public_input);
    }
    let parameters = &key.relation_parameters;
    for element in [
        parameters.eta,
        parameters.eta_two,
        parameters.eta_three,
        parameters.beta,
        parameters.gamma,
        parameters.public_input_delta,
        parameters.lookup_grand_product_delta,
    ] {
        transcript.absorb_element(&scalar_label, &element);
    }
    for alpha in &key.alphas {
        transcript.absorb_element(&scalar_label, alpha);
    }
    for gate_challenge in &key.gate_challenges {
        transcript.absorb_element(&scalar_label, gate_challenge);
    }
    let vk_label = format!("{domain_separator}accumulator_vk_commitments");
    for commitment in vk.commitments.get_all() {
        transcript.absorb_point(&vk_label, commitment);
    }
    let witness_label = format!("{domain_separator}accumulator_witness_commitments");
    for commitment in key.witness_commitments.get_all() {
        transcript.absorb_point(&witness_label, commitment);
    }
}

/// Per-slot elliptic-curve linear combination: every output slot becomes
/// `sum_i lagranges[i] * inputs[i][slot]`. Slots are independent and
/// combined in parallel.
fn fold_commitment_slots<G: CommitmentCurve>(
    outputs: Vec<&mut G>,
    inputs: &[Vec<&G>],
    lagranges: &[G::ScalarField],
) {
    debug_assert!(inputs
        .iter()
        .all(|key_slots| key_slots.len() == outputs.len()));
    outputs
        .into_par_iter()
        .enumerate()
        .for_each(|(slot, output)| {
            let mut combined = inputs[0][slot].mul(lagranges[0]);
            for (key_slots, lagrange) in inputs.iter().zip(lagranges).skip(1) {
                combined += key_slots[slot].mul(*lagrange);
            }
            *output = combined.into_affine();
        });
}
