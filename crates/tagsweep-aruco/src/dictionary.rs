//! The built-in 5x5 code dictionary.
//!
//! 250 codewords of 25 bits each, generated once per process from a
//! fixed congruential seed. Bits are row-major from the top-left cell;
//! a set bit is a black cell. Any two codes keep a Hamming distance of
//! at least [`MIN_SEPARATION`] across all four rotations, and every
//! code keeps that distance to its own rotations, so lookup can both
//! correct bit errors and recover marker orientation unambiguously.

use std::sync::LazyLock;

/// Payload grid side length, in cells.
pub const GRID: u32 = 5;
/// Payload size in bits.
pub const CODE_BITS: u32 = GRID * GRID;
/// Number of codes in the built-in dictionary.
pub const DICTIONARY_SIZE: usize = 250;
/// Minimum Hamming distance between any two codes, rotations included.
pub const MIN_SEPARATION: u32 = 6;

/// Mask selecting the payload bits of a codeword.
const CODE_MASK: u32 = (1 << CODE_BITS) - 1;

/// Congruential generator constants (Knuth's 64-bit multiplier).
const LCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const LCG_INCREMENT: u64 = 1;
/// Seed the built-in table is generated from. Changing it changes
/// every marker id, so it is part of the wire format.
const GENERATOR_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

static BUILTIN: LazyLock<Dictionary> = LazyLock::new(|| Dictionary {
    codes: generate_codes(GENERATOR_SEED),
});

/// A fixed table of marker codewords.
#[derive(Debug, Clone)]
pub struct Dictionary {
    codes: Vec<u32>,
}

/// Result of a dictionary lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeMatch {
    /// Index of the matched code.
    pub id: u32,
    /// Clockwise quarter turns that bring the observed grid into the
    /// stored orientation.
    pub rotation: u8,
    /// Hamming distance of the match after rotation.
    pub distance: u32,
}

impl Dictionary {
    /// The built-in 250-code table. Generated on first use; later
    /// calls return the same table.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Number of codes in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Codeword for `id`, if the table holds it.
    #[must_use]
    pub fn code(&self, id: u32) -> Option<u32> {
        self.codes.get(id as usize).copied()
    }

    /// Bit errors [`Dictionary::identify`] is allowed to correct while
    /// keeping matches unambiguous.
    #[must_use]
    pub const fn max_corrections() -> u32 {
        (MIN_SEPARATION - 1) / 2
    }

    /// Match sampled payload bits against the table over all four
    /// rotations, returning the closest code within `max_corrections`
    /// bit errors.
    #[must_use]
    pub fn identify(&self, bits: u32, max_corrections: u32) -> Option<CodeMatch> {
        let mut best: Option<CodeMatch> = None;
        let mut rotated = bits & CODE_MASK;
        for rotation in 0..4_u8 {
            for (id, &code) in self.codes.iter().enumerate() {
                let distance = (rotated ^ code).count_ones();
                if distance <= max_corrections
                    && best.is_none_or(|b| distance < b.distance)
                {
                    best = Some(CodeMatch {
                        id: id as u32,
                        rotation,
                        distance,
                    });
                }
            }
            rotated = rotate90(rotated);
        }
        best
    }
}

/// Rotate a [`GRID`]x[`GRID`] bit pattern 90 degrees clockwise.
#[must_use]
pub(crate) fn rotate90(code: u32) -> u32 {
    let side = GRID as usize;
    let mut out = 0;
    for y in 0..side {
        for x in 0..side {
            if code & (1 << (y * side + x)) != 0 {
                let nx = side - 1 - y;
                let ny = x;
                out |= 1 << (ny * side + nx);
            }
        }
    }
    out
}

/// Draw candidate codewords from the generator and keep the ones that
/// satisfy the density and separation rules until the table is full.
fn generate_codes(seed: u64) -> Vec<u32> {
    let mut codes: Vec<u32> = Vec::with_capacity(DICTIONARY_SIZE);
    let mut state = seed;
    while codes.len() < DICTIONARY_SIZE {
        state = state.wrapping_mul(LCG_MULTIPLIER).wrapping_add(LCG_INCREMENT);
        let candidate = (state >> 32) as u32 & CODE_MASK;
        if !density_ok(candidate) || !rotationally_distinct(candidate) {
            continue;
        }
        if codes
            .iter()
            .all(|&code| rotation_distance(code, candidate) >= MIN_SEPARATION)
        {
            codes.push(candidate);
        }
    }
    codes
}

/// Reject near-blank and near-solid patterns: ones must fill between a
/// quarter and three quarters of the grid.
fn density_ok(code: u32) -> bool {
    let ones = code.count_ones();
    ones >= CODE_BITS / 4 && ones <= CODE_BITS * 3 / 4
}

/// A code must stay [`MIN_SEPARATION`] away from its own rotations so
/// a detected marker has exactly one valid orientation.
fn rotationally_distinct(code: u32) -> bool {
    let mut rotated = rotate90(code);
    for _ in 0..3 {
        if (code ^ rotated).count_ones() < MIN_SEPARATION {
            return false;
        }
        rotated = rotate90(rotated);
    }
    true
}

/// Minimum Hamming distance between `a` and the four rotations of `b`.
fn rotation_distance(a: u32, b: u32) -> u32 {
    let mut best = u32::MAX;
    let mut rotated = b;
    for _ in 0..4 {
        best = best.min((a ^ rotated).count_ones());
        rotated = rotate90(rotated);
    }
    best
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builtin_holds_full_table() {
        assert_eq!(Dictionary::builtin().len(), DICTIONARY_SIZE);
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(generate_codes(GENERATOR_SEED), generate_codes(GENERATOR_SEED));
        assert_eq!(generate_codes(GENERATOR_SEED), Dictionary::builtin().codes);
    }

    #[test]
    fn codes_keep_density_bounds() {
        for &code in &Dictionary::builtin().codes {
            let ones = code.count_ones();
            assert!((CODE_BITS / 4..=CODE_BITS * 3 / 4).contains(&ones));
        }
    }

    #[test]
    fn all_pairs_keep_minimum_separation() {
        let codes = &Dictionary::builtin().codes;
        for (i, &a) in codes.iter().enumerate() {
            for &b in &codes[i + 1..] {
                assert!(rotation_distance(a, b) >= MIN_SEPARATION);
            }
        }
    }

    #[test]
    fn codes_are_rotationally_distinct() {
        for &code in &Dictionary::builtin().codes {
            assert!(rotationally_distinct(code));
        }
    }

    #[test]
    fn rotate90_four_times_is_identity() {
        let code = Dictionary::builtin().code(0).unwrap();
        let mut rotated = code;
        for _ in 0..4 {
            rotated = rotate90(rotated);
        }
        assert_eq!(rotated, code);
    }

    #[test]
    fn rotate90_moves_top_left_to_top_right() {
        // Single black cell at (0, 0); one clockwise turn puts it at
        // (GRID - 1, 0).
        let rotated = rotate90(1);
        assert_eq!(rotated, 1 << (GRID - 1));
    }

    #[test]
    fn identify_finds_exact_code() {
        let dict = Dictionary::builtin();
        let code = dict.code(7).unwrap();
        let found = dict.identify(code, Dictionary::max_corrections()).unwrap();
        assert_eq!(found.id, 7);
        assert_eq!(found.rotation, 0);
        assert_eq!(found.distance, 0);
    }

    #[test]
    fn identify_corrects_two_bit_errors() {
        let dict = Dictionary::builtin();
        let damaged = dict.code(42).unwrap() ^ 0b101;
        let found = dict
            .identify(damaged, Dictionary::max_corrections())
            .unwrap();
        assert_eq!(found.id, 42);
        assert_eq!(found.distance, 2);
    }

    #[test]
    fn identify_rejects_three_bit_errors() {
        // Three flips sit at distance 3 from the true code and, by the
        // separation bound, at least 3 from every other code.
        let dict = Dictionary::builtin();
        let damaged = dict.code(42).unwrap() ^ 0b10101;
        assert!(dict
            .identify(damaged, Dictionary::max_corrections())
            .is_none());
    }

    #[test]
    fn identify_reports_rotation_of_turned_grid() {
        let dict = Dictionary::builtin();
        let turned = rotate90(dict.code(3).unwrap());
        let found = dict.identify(turned, Dictionary::max_corrections()).unwrap();
        assert_eq!(found.id, 3);
        assert_eq!(found.rotation, 3);
        assert_eq!(found.distance, 0);
    }
}
