//! Redemption code generation.

use std::fmt;

use rand::Rng;

/// Produces candidate redemption codes. Uniqueness is checked by the caller
/// against storage; a generator only has to make collisions unlikely.
pub trait CodeGenerator: Send + Sync + fmt::Debug {
    /// Returns a fresh candidate code.
    fn generate(&self) -> String;
}

/// Characters used in codes. Omits `0`, `O`, `1` and `I` so codes survive
/// being read aloud at a counter.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Prefix plus characters drawn uniformly from the alphabet, e.g.
/// `TP-7KQ2M9XHWD`.
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    prefix: String,
    length: usize,
}

impl RandomCodeGenerator {
    /// Creates a generator for `prefix` codes with `length` random characters.
    #[must_use]
    pub fn new(prefix: impl Into<String>, length: usize) -> Self {
        Self {
            prefix: prefix.into(),
            length: length.max(1),
        }
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::rng();
        let random: String = (0..self.length)
            .filter_map(|_| ALPHABET.get(rng.random_range(0..ALPHABET.len())))
            .map(|c| char::from(*c))
            .collect();
        if self.prefix.is_empty() {
            random
        } else {
            format!("{}-{random}", self.prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_have_prefix_and_length() {
        let generator = RandomCodeGenerator::new("TP", 10);
        let code = generator.generate();
        assert!(code.starts_with("TP-"));
        assert_eq!(code.len(), 13);
        assert!(code.chars().skip(3).all(|c| ALPHABET.contains(&(c as u8))));
    }

    #[test]
    fn long_codes_have_requested_length() {
        let generator = RandomCodeGenerator::new("", 40);
        assert_eq!(generator.generate().len(), 40);
    }

    #[test]
    fn every_position_uses_the_whole_alphabet() {
        let generator = RandomCodeGenerator::new("", 10);
        let codes: Vec<Vec<u8>> = (0..4_000)
            .map(|_| generator.generate().into_bytes())
            .collect();
        for position in 0..10 {
            let seen: std::collections::HashSet<u8> = codes
                .iter()
                .filter_map(|code| code.get(position).copied())
                .collect();
            assert_eq!(seen.len(), ALPHABET.len(), "position {position}");
        }
    }

    #[test]
    fn consecutive_codes_differ() {
        let generator = RandomCodeGenerator::new("TP", 10);
        assert_ne!(generator.generate(), generator.generate());
    }
}
