//! End-to-end tests of the folding verifier over bn254: happy paths for
//! every supported width, the exact target-sum arithmetic with a pinned
//! challenge, and the rejection paths.

use ark_bn254::{Fr, G1Affine};
use ark_ec::AffineRepr;
use ark_ff::{Field, One, Zero};
use protogalaxy::{
    oink::compute_public_input_delta,
    transcript::point_to_limbs,
    Blake2bTranscriptHasher, DatabusPropagationData, DeciderVerificationKey, FoldWidth,
    FoldingError, PcsVerificationKey, PrecomputedCommitments, ProtogalaxyVerifier, ShapeError,
    TranscriptError, TranscriptHasher, VerificationKey,
};
use std::sync::Arc;

type Verifier = ProtogalaxyVerifier<G1Affine, Blake2bTranscriptHasher>;

const CIRCUIT_SIZE: u64 = 8;
const LOG_CIRCUIT_SIZE: u32 = 3;
const NUM_PUBLIC_INPUTS: usize = 2;
const PUB_INPUTS_OFFSET: u64 = 1;

fn commitment(scalar: u64) -> G1Affine {
    (G1Affine::generator() * Fr::from(scalar)).into()
}

fn verification_key(seed: u64, databus: bool) -> VerificationKey<G1Affine> {
    let mut commitments = PrecomputedCommitments::default();
    if databus {
        commitments.databus_id = Some(G1Affine::zero());
    }
    for (index, slot) in commitments.get_all_mut().into_iter().enumerate() {
        *slot = commitment(seed + index as u64 + 1);
    }
    VerificationKey {
        circuit_size: CIRCUIT_SIZE,
        log_circuit_size: LOG_CIRCUIT_SIZE,
        num_public_inputs: NUM_PUBLIC_INPUTS,
        pcs_verification_key: Arc::new(PcsVerificationKey {
            g1: G1Affine::generator(),
            srs_size: CIRCUIT_SIZE as usize,
        }),
        pub_inputs_offset: PUB_INPUTS_OFFSET,
        contains_recursive_proof: false,
        recursive_proof_public_input_indices: Vec::new(),
        databus_propagation_data: databus.then(DatabusPropagationData::default),
        commitments,
    }
}

fn fresh_key(seed: u64, databus: bool) -> DeciderVerificationKey<G1Affine> {
    DeciderVerificationKey::fresh(verification_key(seed, databus))
}

fn public_inputs() -> Vec<Fr> {
    vec![Fr::from(1u64), Fr::from(2u64)]
}

/// Proof elements the sub-instance verifier reads for one fresh key:
/// circuit metadata, public inputs, then the witness commitments in wire
/// order.
fn oink_proof_segment(witness_seed: u64) -> Vec<Fr> {
    let mut data = vec![
        Fr::from(CIRCUIT_SIZE),
        Fr::from(NUM_PUBLIC_INPUTS as u64),
        Fr::from(PUB_INPUTS_OFFSET),
    ];
    data.extend(public_inputs());
    // w_l, w_r, w_o, lookup_read_counts, lookup_read_tags, w_4,
    // lookup_inverses, z_perm
    for offset in 0..8 {
        data.extend(point_to_limbs(&commitment(witness_seed + offset)));
    }
    data
}

fn combiner_quotient_evals(width: FoldWidth) -> Vec<Fr> {
    let count = width.batched_extended_length() - width.num_keys();
    (0..count as u64).map(|i| Fr::from(50 + i)).collect()
}

fn fold_data_for_fresh_keys(width: FoldWidth, witness_seeds: &[u64]) -> Vec<Fr> {
    let mut data = Vec::new();
    for seed in witness_seeds {
        data.extend(oink_proof_segment(*seed));
    }
    data.extend(combiner_quotient_evals(width));
    data
}

fn interpolate_at(domain_size: usize, values: &[Fr], point: Fr) -> Fr {
    (0..domain_size)
        .map(|i| {
            let mut term = values[i];
            for j in 0..domain_size {
                if j != i {
                    let node_i = Fr::from(i as u64);
                    let node_j = Fr::from(j as u64);
                    term *= (point - node_j) * (node_i - node_j).inverse().unwrap();
                }
            }
            term
        })
        .sum()
}

#[test]
fn folds_two_fresh_keys_deterministically() {
    let keys = vec![fresh_key(10, false), fresh_key(10, false)];
    let fold_data = fold_data_for_fresh_keys(FoldWidth::Two, &[100, 100]);

    let accumulator = Verifier::verify_folding_proof(keys.clone(), &fold_data).unwrap();
    let again = Verifier::verify_folding_proof(keys.clone(), &fold_data).unwrap();
    assert_eq!(accumulator, again);

    assert!(accumulator.is_accumulator);
    assert_eq!(
        accumulator.gate_challenges.len(),
        LOG_CIRCUIT_SIZE as usize
    );
    assert_eq!(
        accumulator.public_inputs,
        vec![Fr::zero(); NUM_PUBLIC_INPUTS]
    );

    // Invariant metadata is copied from the accumulator key.
    let vk = &accumulator.verification_key;
    assert_eq!(vk.circuit_size, CIRCUIT_SIZE);
    assert_eq!(vk.pub_inputs_offset, PUB_INPUTS_OFFSET);
    assert_eq!(
        vk.pcs_verification_key,
        keys[0].verification_key.pcs_verification_key
    );

    // Both keys carry the same commitments in every slot, and the Lagrange
    // basis sums to one, so folding must reproduce them.
    assert_eq!(vk.commitments, keys[0].verification_key.commitments);
    let witness = &accumulator.witness_commitments;
    assert_eq!(witness.w_l, commitment(100));
    assert_eq!(witness.w_r, commitment(101));
    assert_eq!(witness.w_o, commitment(102));
    assert_eq!(witness.lookup_read_counts, commitment(103));
    assert_eq!(witness.lookup_read_tags, commitment(104));
    assert_eq!(witness.w_4, commitment(105));
    assert_eq!(witness.lookup_inverses, commitment(106));
    assert_eq!(witness.z_perm, commitment(107));
}

/// Hasher pinning every challenge to 3, to check the target-sum arithmetic
/// end to end with concrete field values.
struct ConstantThreeHasher;

impl TranscriptHasher<Fr> for ConstantThreeHasher {
    fn hash(_input: &[u8]) -> Fr {
        Fr::from(3u64)
    }
}

#[test]
fn target_sum_matches_the_combiner_arithmetic() {
    let keys = vec![fresh_key(10, false), fresh_key(10, false)];
    let width = FoldWidth::Two;
    let fold_data = fold_data_for_fresh_keys(width, &[100, 200]);

    let accumulator =
        ProtogalaxyVerifier::<G1Affine, ConstantThreeHasher>::verify_folding_proof(
            keys.clone(),
            &fold_data,
        )
        .unwrap();

    // Every challenge is 3. Both input keys are fresh, so the perturbator is
    // the constant 0 and contributes nothing regardless of its challenge.
    let challenge = Fr::from(3u64);
    let evals = combiner_quotient_evals(width);
    let mut padded = vec![Fr::zero(); width.num_keys()];
    padded.extend_from_slice(&evals);
    let combiner_quotient_at_3 =
        interpolate_at(width.batched_extended_length(), &padded, challenge);
    // 3 lies on the evaluation domain, so the value is the transmitted one.
    assert_eq!(combiner_quotient_at_3, evals[1]);

    // Z(3) = 3 * 2 = 6 for the two-key domain {0, 1}.
    let vanishing_at_3 = Fr::from(6u64);
    assert_eq!(
        accumulator.target_sum,
        vanishing_at_3 * combiner_quotient_at_3
    );

    // Gate challenges start from zero: new[i] = 3 * 3^(2^i).
    assert_eq!(
        accumulator.gate_challenges,
        vec![Fr::from(9u64), Fr::from(27u64), Fr::from(243u64)]
    );

    // All alphas are the challenge itself on both keys, and the Lagrange
    // weights sum to one.
    assert!(accumulator.alphas.iter().all(|alpha| *alpha == challenge));

    // Relation parameters fold the same way; the delta is re-derivable from
    // the shared beta/gamma and public inputs.
    let parameters = &accumulator.relation_parameters;
    assert_eq!(parameters.beta, challenge);
    assert_eq!(parameters.gamma, challenge);
    assert_eq!(
        parameters.public_input_delta,
        compute_public_input_delta(
            &public_inputs(),
            challenge,
            challenge,
            CIRCUIT_SIZE,
            PUB_INPUTS_OFFSET
        )
    );
}

#[test]
fn folds_an_accumulator_with_a_fresh_key() {
    let first_round = Verifier::verify_folding_proof(
        vec![fresh_key(10, false), fresh_key(10, false)],
        &fold_data_for_fresh_keys(FoldWidth::Two, &[100, 200]),
    )
    .unwrap();

    let keys = vec![first_round, fresh_key(10, false)];
    let mut fold_data = oink_proof_segment(300);
    // The accumulator reads perturbator coefficients 1..=log_circuit_size.
    fold_data.extend([Fr::from(7u64), Fr::from(8u64), Fr::from(9u64)]);
    fold_data.extend(combiner_quotient_evals(FoldWidth::Two));

    let second_round = Verifier::verify_folding_proof(keys.clone(), &fold_data).unwrap();
    let again = Verifier::verify_folding_proof(keys, &fold_data).unwrap();
    assert_eq!(second_round, again);
    assert!(second_round.is_accumulator);
    assert_eq!(
        second_round.gate_challenges.len(),
        LOG_CIRCUIT_SIZE as usize
    );
}

#[test]
fn folds_three_fresh_keys() {
    let keys = vec![
        fresh_key(10, false),
        fresh_key(10, false),
        fresh_key(10, false),
    ];
    let fold_data = fold_data_for_fresh_keys(FoldWidth::Three, &[100, 200, 300]);

    let accumulator = Verifier::verify_folding_proof(keys, &fold_data).unwrap();
    assert!(accumulator.is_accumulator);
    assert_eq!(
        accumulator.gate_challenges.len(),
        LOG_CIRCUIT_SIZE as usize
    );
}

#[test]
fn folds_databus_keys_and_propagates_the_metadata() {
    let keys = vec![fresh_key(10, true), fresh_key(10, true)];
    let fold_data = fold_data_for_fresh_keys(FoldWidth::Two, &[100, 200]);

    let accumulator = Verifier::verify_folding_proof(keys.clone(), &fold_data).unwrap();
    assert!(accumulator.verification_key.commitments.databus_id.is_some());
    assert_eq!(
        accumulator.verification_key.databus_propagation_data,
        keys[0].verification_key.databus_propagation_data
    );
}

#[test]
fn truncated_fold_data_is_rejected() {
    let keys = vec![fresh_key(10, false), fresh_key(10, false)];
    let mut fold_data = fold_data_for_fresh_keys(FoldWidth::Two, &[100, 200]);
    fold_data.pop();

    let error = Verifier::verify_folding_proof(keys, &fold_data).unwrap_err();
    assert_eq!(
        error,
        FoldingError::ProofMalformed(TranscriptError::MissingProofElement(
            "combiner_quotient_11".into()
        ))
    );
}

#[test]
fn corrupted_commitment_encoding_is_rejected() {
    let keys = vec![fresh_key(10, false), fresh_key(10, false)];
    let mut fold_data = fold_data_for_fresh_keys(FoldWidth::Two, &[100, 200]);
    // First limb of key 0's w_l: metadata and public inputs come first.
    fold_data[3 + NUM_PUBLIC_INPUTS] += Fr::one();

    let error = Verifier::verify_folding_proof(keys, &fold_data).unwrap_err();
    assert_eq!(
        error,
        FoldingError::ProofMalformed(TranscriptError::InvalidPointEncoding("0_w_l".into()))
    );
}

#[test]
fn unsupported_widths_are_rejected_before_any_transcript_read() {
    // Empty fold data: any transcript interaction would fail with a missing
    // element, so getting the width error proves the check runs first.
    for num_keys in [1, 5] {
        let keys: Vec<_> = (0..num_keys).map(|_| fresh_key(10, false)).collect();
        let error = Verifier::verify_folding_proof(keys, &[]).unwrap_err();
        assert_eq!(error, FoldingError::UnsupportedFoldWidth(num_keys));
    }
}

#[test]
fn mismatched_circuit_sizes_are_rejected() {
    let mut bigger = verification_key(10, false);
    bigger.circuit_size = 16;
    bigger.log_circuit_size = 4;
    let keys = vec![
        fresh_key(10, false),
        DeciderVerificationKey::fresh(bigger),
    ];

    let error = Verifier::verify_folding_proof(keys, &[]).unwrap_err();
    assert_eq!(
        error,
        FoldingError::ShapeMismatch(ShapeError::CircuitSize(1, CIRCUIT_SIZE, 16))
    );
}

#[test]
fn mixed_databus_support_is_rejected() {
    let keys = vec![fresh_key(10, false), fresh_key(10, true)];
    let error = Verifier::verify_folding_proof(keys, &[]).unwrap_err();
    assert_eq!(
        error,
        FoldingError::ShapeMismatch(ShapeError::DatabusSupport(1))
    );
}
