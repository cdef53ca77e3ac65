//! Phase designations for distribution elements.
//!
//! Every branch element participates in a subset of the three phase
//! conductors {A, B, C} plus the neutral N. The vendor export encodes the
//! subset as a letter string ("ABC", "AN", ...); [`PhaseSet`] is the parsed
//! form used on every [`crate::Element`].

use serde::{Serialize, Serializer};

/// A single phase conductor designation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Phase {
    A,
    B,
    C,
    /// Neutral conductor.
    N,
}

impl Phase {
    /// All phases in canonical A, B, C, N order.
    pub const ALL: [Phase; 4] = [Phase::A, Phase::B, Phase::C, Phase::N];

    /// Single-letter designation used in the vendor tables.
    pub fn letter(&self) -> char {
        match self {
            Phase::A => 'A',
            Phase::B => 'B',
            Phase::C => 'C',
            Phase::N => 'N',
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A subset of {A, B, C, N}, stored as a bitset.
///
/// Parsing is case-insensitive and ignores characters outside the phase
/// alphabet, so raw vendor strings can be fed in directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PhaseSet(u8);

impl PhaseSet {
    pub const EMPTY: PhaseSet = PhaseSet(0);

    fn bit(phase: Phase) -> u8 {
        match phase {
            Phase::A => 1,
            Phase::B => 2,
            Phase::C => 4,
            Phase::N => 8,
        }
    }

    /// Parse a vendor phase string such as `"ABC"`, `"abn"`, or `"B"`.
    pub fn parse(raw: &str) -> PhaseSet {
        let mut set = PhaseSet::EMPTY;
        for ch in raw.chars() {
            match ch.to_ascii_uppercase() {
                'A' => set.insert(Phase::A),
                'B' => set.insert(Phase::B),
                'C' => set.insert(Phase::C),
                'N' => set.insert(Phase::N),
                _ => {}
            }
        }
        set
    }

    pub fn insert(&mut self, phase: Phase) {
        self.0 |= Self::bit(phase);
    }

    pub fn contains(&self, phase: Phase) -> bool {
        self.0 & Self::bit(phase) != 0
    }

    /// Iterate the contained phases in canonical A, B, C, N order.
    pub fn iter(&self) -> impl Iterator<Item = Phase> + '_ {
        Phase::ALL.into_iter().filter(|p| self.contains(*p))
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for PhaseSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for phase in self.iter() {
            write!(f, "{}", phase.letter())?;
        }
        Ok(())
    }
}

impl Serialize for PhaseSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_set() {
        let set = PhaseSet::parse("ABCN");
        assert_eq!(set.len(), 4);
        for phase in Phase::ALL {
            assert!(set.contains(phase));
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(PhaseSet::parse("abn"), PhaseSet::parse("ABN"));
    }

    #[test]
    fn test_parse_ignores_noise() {
        let set = PhaseSet::parse(" A-C ");
        assert!(set.contains(Phase::A));
        assert!(set.contains(Phase::C));
        assert!(!set.contains(Phase::B));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_iteration_order_is_canonical() {
        // Input order must not leak into iteration order.
        let set = PhaseSet::parse("CBA");
        let phases: Vec<Phase> = set.iter().collect();
        assert_eq!(phases, vec![Phase::A, Phase::B, Phase::C]);
    }

    #[test]
    fn test_display_roundtrip() {
        assert_eq!(PhaseSet::parse("BCN").to_string(), "BCN");
        assert_eq!(PhaseSet::EMPTY.to_string(), "");
    }

    #[test]
    fn test_serialize_as_string() {
        let json = serde_json::to_string(&PhaseSet::parse("AN")).unwrap();
        assert_eq!(json, "\"AN\"");
    }
}
