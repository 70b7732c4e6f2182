//! Proof-of-work puzzle format, version 1.
//!
//! ```text
//! puzzle    = 32 lowercase hex chars (16 random bytes)
//! solution  = 1..=128 ASCII chars (reference solvers use a decimal counter)
//! digest    = SHA-256( UTF8(puzzle) || UTF8(solution) )
//! accepted  iff digest has >= difficulty leading zero bits, MSB of byte 0 first
//! ```
//!
//! Any client can implement this independently; nothing here depends on
//! server state.

use ring::digest::{Context, Digest, SHA256};
use ring::rand::SecureRandom;

use crate::{RegistryError, Result};

/// Random bytes in a puzzle nonce.
pub const NONCE_BYTES: usize = 16;

/// Longest solution string accepted.
pub const MAX_SOLUTION_LEN: usize = 128;

/// Highest difficulty the registry will issue.
pub const MAX_DIFFICULTY: u8 = 64;

/// Generate a fresh puzzle nonce.
pub fn generate_puzzle(rng: &dyn SecureRandom) -> Result<String> {
    let mut nonce = [0u8; NONCE_BYTES];
    rng.fill(&mut nonce)
        .map_err(|_| RegistryError::Internal("system RNG failed".into()))?;
    Ok(hex::encode(nonce))
}

/// SHA-256 over the puzzle followed by the solution.
#[must_use]
pub fn digest(puzzle: &str, solution: &str) -> Digest {
    let mut context = Context::new(&SHA256);
    context.update(puzzle.as_bytes());
    context.update(solution.as_bytes());
    context.finish()
}

/// Count leading zero bits, most significant bit first.
#[must_use]
pub fn leading_zero_bits(bytes: &[u8]) -> u32 {
    let mut bits = 0;
    for byte in bytes {
        if *byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}

/// Whether `solution` solves `puzzle` at `difficulty`.
#[must_use]
pub fn satisfies(puzzle: &str, solution: &str, difficulty: u8) -> bool {
    if solution.is_empty() || solution.len() > MAX_SOLUTION_LEN || !solution.is_ascii() {
        return false;
    }
    leading_zero_bits(digest(puzzle, solution).as_ref()) >= u32::from(difficulty)
}

/// Brute-force a solution by counting up from zero.
///
/// Expected work is `2^difficulty` hashes; meant for clients and tests.
#[must_use]
pub fn solve(puzzle: &str, difficulty: u8) -> String {
    let mut counter: u64 = 0;
    loop {
        let candidate = counter.to_string();
        if satisfies(puzzle, &candidate, difficulty) {
            return candidate;
        }
        counter = counter.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::rand::SystemRandom;

    #[test]
    fn test_leading_zero_bits() {
        assert_eq!(leading_zero_bits(&[]), 0);
        assert_eq!(leading_zero_bits(&[0x80]), 0);
        assert_eq!(leading_zero_bits(&[0x01]), 7);
        assert_eq!(leading_zero_bits(&[0x00, 0x0f]), 12);
        assert_eq!(leading_zero_bits(&[0x00, 0x00]), 16);
    }

    #[test]
    fn test_digest_is_plain_concatenation() {
        // SHA-256("hello world") split across puzzle and solution.
        let d = digest("hello ", "world");
        assert_eq!(
            hex::encode(d.as_ref()),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_zero_difficulty_accepts_any_wellformed_solution() {
        assert!(satisfies("abc", "0", 0));
        assert!(!satisfies("abc", "", 0));
        assert!(!satisfies("abc", &"1".repeat(MAX_SOLUTION_LEN + 1), 0));
        assert!(!satisfies("abc", "ünïcode", 0));
    }

    #[test]
    fn test_solve_then_verify() {
        let rng = SystemRandom::new();
        let puzzle = generate_puzzle(&rng).unwrap();
        let solution = solve(&puzzle, 8);
        assert!(satisfies(&puzzle, &solution, 8));
        let d = digest(&puzzle, &solution);
        assert!(leading_zero_bits(d.as_ref()) >= 8);
    }

    #[test]
    fn test_puzzle_format() {
        let rng = SystemRandom::new();
        let puzzle = generate_puzzle(&rng).unwrap();
        assert_eq!(puzzle.len(), NONCE_BYTES * 2);
        assert!(puzzle.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(puzzle, generate_puzzle(&rng).unwrap());
    }
}
