//! This module defines the record the folding verifier operates on: the
//! decider verification key, i.e. one relaxed proof-instance descriptor per
//! folded party plus the running accumulator.
//!
//! A key is either fresh (`is_accumulator == false`, never folded, zero
//! target sum and gate challenges) or an accumulator produced by a previous
//! round. Each folding round consumes its input keys and returns a new
//! record; no key is ever mutated in place across rounds.

use crate::relations::NUM_SUBRELATIONS;
use ark_ec::AffineRepr;
use ark_ff::{Field, Zero};
use std::sync::Arc;

/// One relation-batching challenge per subrelation past the first.
pub const NUM_ALPHAS: usize = NUM_SUBRELATIONS - 1;

/// Verification key of the underlying polynomial commitment scheme. A single
/// immutable copy is shared by every accumulator generation; it is never
/// recombined during folding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PcsVerificationKey<G: AffineRepr> {
    /// First element of the SRS, used by the decider to check openings.
    pub g1: G,
    /// Number of elements in the SRS the proving side committed with.
    pub srs_size: usize,
}

/// Metadata describing how databus commitments propagate between circuits.
/// Present only for flavors with cross-circuit databus support; copied from
/// the accumulator, never recombined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DatabusPropagationData {
    pub app_return_data_public_input_key: u32,
    pub kernel_return_data_public_input_key: u32,
    pub is_kernel: bool,
}

/// Named scalars consumed by the relation-checking engine. Folding combines
/// every field as an independent weighted sum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelationParameters<F: Field> {
    pub eta: F,
    pub eta_two: F,
    pub eta_three: F,
    pub beta: F,
    pub gamma: F,
    pub public_input_delta: F,
    pub lookup_grand_product_delta: F,
}

impl<F: Field> Default for RelationParameters<F> {
    fn default() -> Self {
        Self {
            eta: F::zero(),
            eta_two: F::zero(),
            eta_three: F::zero(),
            beta: F::zero(),
            gamma: F::zero(),
            public_input_delta: F::zero(),
            lookup_grand_product_delta: F::zero(),
        }
    }
}

/// Commitments to the fixed circuit polynomials: selectors, permutation and
/// identity descriptors, lookup tables and the boundary Lagrange
/// polynomials. `databus_id` is present exactly for flavors with databus
/// support; its presence must agree across all keys folded together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrecomputedCommitments<G: AffineRepr> {
    pub q_m: G,
    pub q_c: G,
    pub q_l: G,
    pub q_r: G,
    pub q_o: G,
    pub q_4: G,
    pub q_lookup: G,
    pub q_arith: G,
    pub q_delta_range: G,
    pub q_elliptic: G,
    pub q_aux: G,
    pub q_poseidon2_external: G,
    pub q_poseidon2_internal: G,
    pub sigma: [G; 4],
    pub id: [G; 4],
    pub table: [G; 4],
    pub lagrange_first: G,
    pub lagrange_last: G,
    pub databus_id: Option<G>,
}

impl<G: AffineRepr> PrecomputedCommitments<G> {
    pub fn has_databus(&self) -> bool {
        self.databus_id.is_some()
    }

    /// All commitments, in the fixed slot order folding combines them in.
    pub fn get_all(&self) -> Vec<&G> {
        let mut all = vec![
            &self.q_m,
            &self.q_c,
            &self.q_l,
            &self.q_r,
            &self.q_o,
            &self.q_4,
            &self.q_lookup,
            &self.q_arith,
            &self.q_delta_range,
            &self.q_elliptic,
            &self.q_aux,
            &self.q_poseidon2_external,
            &self.q_poseidon2_internal,
        ];
        all.extend(self.sigma.iter());
        all.extend(self.id.iter());
        all.extend(self.table.iter());
        all.push(&self.lagrange_first);
        all.push(&self.lagrange_last);
        all.extend(self.databus_id.iter());
        all
    }

    pub fn get_all_mut(&mut self) -> Vec<&mut G> {
        let mut all = vec![
            &mut self.q_m,
            &mut self.q_c,
            &mut self.q_l,
            &mut self.q_r,
            &mut self.q_o,
            &mut self.q_4,
            &mut self.q_lookup,
            &mut self.q_arith,
            &mut self.q_delta_range,
            &mut self.q_elliptic,
            &mut self.q_aux,
            &mut self.q_poseidon2_external,
            &mut self.q_poseidon2_internal,
        ];
        all.extend(self.sigma.iter_mut());
        all.extend(self.id.iter_mut());
        all.extend(self.table.iter_mut());
        all.push(&mut self.lagrange_first);
        all.push(&mut self.lagrange_last);
        all.extend(self.databus_id.iter_mut());
        all
    }
}

impl<G: AffineRepr> Default for PrecomputedCommitments<G> {
    fn default() -> Self {
        Self {
            q_m: G::zero(),
            q_c: G::zero(),
            q_l: G::zero(),
            q_r: G::zero(),
            q_o: G::zero(),
            q_4: G::zero(),
            q_lookup: G::zero(),
            q_arith: G::zero(),
            q_delta_range: G::zero(),
            q_elliptic: G::zero(),
            q_aux: G::zero(),
            q_poseidon2_external: G::zero(),
            q_poseidon2_internal: G::zero(),
            sigma: [G::zero(); 4],
            id: [G::zero(); 4],
            table: [G::zero(); 4],
            lagrange_first: G::zero(),
            lagrange_last: G::zero(),
            databus_id: None,
        }
    }
}

/// Commitments to the prover's witness polynomials, populated by the
/// sub-instance verifier for fresh keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WitnessCommitments<G: AffineRepr> {
    pub w_l: G,
    pub w_r: G,
    pub w_o: G,
    pub w_4: G,
    pub z_perm: G,
    pub lookup_inverses: G,
    pub lookup_read_counts: G,
    pub lookup_read_tags: G,
}

impl<G: AffineRepr> WitnessCommitments<G> {
    /// All commitments, in the fixed slot order folding combines them in.
    pub fn get_all(&self) -> Vec<&G> {
        vec![
            &self.w_l,
            &self.w_r,
            &self.w_o,
            &self.w_4,
            &self.z_perm,
            &self.lookup_inverses,
            &self.lookup_read_counts,
            &self.lookup_read_tags,
        ]
    }

    pub fn get_all_mut(&mut self) -> Vec<&mut G> {
        vec![
            &mut self.w_l,
            &mut self.w_r,
            &mut self.w_o,
            &mut self.w_4,
            &mut self.z_perm,
            &mut self.lookup_inverses,
            &mut self.lookup_read_counts,
            &mut self.lookup_read_tags,
        ]
    }
}

impl<G: AffineRepr> Default for WitnessCommitments<G> {
    fn default() -> Self {
        Self {
            w_l: G::zero(),
            w_r: G::zero(),
            w_o: G::zero(),
            w_4: G::zero(),
            z_perm: G::zero(),
            lookup_inverses: G::zero(),
            lookup_read_counts: G::zero(),
            lookup_read_tags: G::zero(),
        }
    }
}

/// The circuit's verification key. Everything here except the commitments is
/// invariant across folding: copied into the next accumulator, never
/// recombined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationKey<G: AffineRepr> {
    pub circuit_size: u64,
    /// `ceil(log2(circuit_size))`.
    pub log_circuit_size: u32,
    pub num_public_inputs: usize,
    pub pcs_verification_key: Arc<PcsVerificationKey<G>>,
    pub pub_inputs_offset: u64,
    pub contains_recursive_proof: bool,
    /// Indices of the public inputs that encode a nested proof.
    pub recursive_proof_public_input_indices: Vec<u32>,
    pub databus_propagation_data: Option<DatabusPropagationData>,
    pub commitments: PrecomputedCommitments<G>,
}

/// One foldable instance descriptor, and the shape of the accumulator a
/// folding round produces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeciderVerificationKey<G: AffineRepr> {
    pub verification_key: VerificationKey<G>,
    pub witness_commitments: WitnessCommitments<G>,
    pub public_inputs: Vec<G::ScalarField>,
    pub relation_parameters: RelationParameters<G::ScalarField>,
    pub alphas: [G::ScalarField; NUM_ALPHAS],
    /// Running folding challenge vector, always `log_circuit_size` long.
    pub gate_challenges: Vec<G::ScalarField>,
    /// The folding invariant the accumulated relation must satisfy.
    pub target_sum: G::ScalarField,
    pub is_accumulator: bool,
}

impl<G: AffineRepr> DeciderVerificationKey<G> {
    /// A fresh, never-folded key for the given verification key. Witness
    /// commitments, public inputs, relation parameters and alphas are
    /// populated by the sub-instance verifier during folding.
    pub fn fresh(verification_key: VerificationKey<G>) -> Self {
        let log_circuit_size = verification_key.log_circuit_size as usize;
        Self {
            verification_key,
            witness_commitments: WitnessCommitments::default(),
            public_inputs: Vec::new(),
            relation_parameters: RelationParameters::default(),
            alphas: [G::ScalarField::zero(); NUM_ALPHAS],
            gate_challenges: vec![G::ScalarField::zero(); log_circuit_size],
            target_sum: G::ScalarField::zero(),
            is_accumulator: false,
        }
    }
}
