//! Static, per-relation configuration consumed by the relation-checking
//! engine. Folding itself never evaluates a relation; it only carries the
//! batching challenges (one alpha per subrelation past the first) and the
//! relation parameters the engine needs later.

use ark_ff::Field;

/// Subrelation count of the flavor's full relation set. Pins the number of
/// relation-batching challenges.
pub const NUM_SUBRELATIONS: usize = 26;

/// Declarative description of one permutation argument: which named columns
/// are bundled into each side, and which row selectors decide whether the
/// auxiliary inverse polynomial is populated at a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PermutationSettings {
    pub name: &'static str,
    /// How many columns are bundled together to form each set.
    pub columns_per_set: usize,
    /// Column holding the precomputed inverses for this argument.
    pub inverse_column: &'static str,
    pub first_set_selector: &'static str,
    pub second_set_selector: &'static str,
    pub first_set_columns: [&'static str; 4],
    pub second_set_columns: [&'static str; 4],
}

impl PermutationSettings {
    /// Row predicate: the inverse polynomial is populated wherever either
    /// side's selector is set.
    pub fn inverse_polynomial_is_computed_at_row<F: Field>(
        &self,
        first_set_selector: F,
        second_set_selector: F,
    ) -> bool {
        first_set_selector.is_one() || second_set_selector.is_one()
    }
}

/// Permutation tying the main trace's resolved indirect d-address lookups to
/// the memory trace.
pub const PERM_MAIN_MEM_IND_ADDR_D: PermutationSettings = PermutationSettings {
    name: "perm_main_mem_ind_addr_d",
    columns_per_set: 4,
    inverse_column: "perm_main_mem_ind_addr_d",
    first_set_selector: "main_sel_resolve_ind_addr_d",
    second_set_selector: "mem_sel_resolve_ind_addr_d",
    first_set_columns: [
        "main_clk",
        "main_space_id",
        "main_ind_addr_d",
        "main_mem_addr_d",
    ],
    second_set_columns: ["mem_clk", "mem_space_id", "mem_addr", "mem_val"],
};
