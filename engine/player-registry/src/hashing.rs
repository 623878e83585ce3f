use crate::types::CanonicalId;
use sha2::{Digest, Sha256};

/// Consistent hashing for players that arrive without a platform ID
///
/// The same name key and hints always produce the same generated ID, across
/// restarts and regardless of the order records arrive in.
pub struct ConsistentHasher;

impl ConsistentHasher {
    /// Prefix that marks an ID as generated rather than platform-issued
    pub const GENERATED_PREFIX: &'static str = "gen-";

    /// Hash a normalized name key plus its identity hints to a canonical ID
    pub fn generated_player_id(name_key: &str, positions: &[String], pro_team: &str) -> CanonicalId {
        let mut sorted: Vec<&str> = positions.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        let composite_key = format!("{name_key}|{}|{pro_team}", sorted.join(","));

        let digest = Sha256::digest(composite_key.as_bytes());
        let hex: String = digest.iter().take(6).map(|b| format!("{b:02x}")).collect();
        CanonicalId::new(format!("{}{hex}", Self::GENERATED_PREFIX))
    }

    /// Linear probe past an ID that is already taken
    pub fn probe(base: &CanonicalId, attempt: u32) -> CanonicalId {
        CanonicalId::new(format!("{}-{attempt}", base.as_str()))
    }

    pub fn is_generated(id: &CanonicalId) -> bool {
        id.as_str().starts_with(Self::GENERATED_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistent_hashing() {
        let positions = vec!["SS".to_string(), "2B".to_string()];
        let id1 = ConsistentHasher::generated_player_id("john smith", &positions, "detroit tigers");
        let id2 = ConsistentHasher::generated_player_id("john smith", &positions, "detroit tigers");
        assert_eq!(id1, id2);
        assert!(ConsistentHasher::is_generated(&id1));
        assert_eq!(id1.as_str().len(), "gen-".len() + 12);

        let id3 = ConsistentHasher::generated_player_id("jane doe", &positions, "detroit tigers");
        assert_ne!(id1, id3);
    }

    #[test]
    fn test_position_order_does_not_matter() {
        let a = ConsistentHasher::generated_player_id(
            "john smith",
            &["SS".to_string(), "2B".to_string()],
            "",
        );
        let b = ConsistentHasher::generated_player_id(
            "john smith",
            &["2B".to_string(), "SS".to_string()],
            "",
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_probe() {
        let base = CanonicalId::new("gen-abc");
        assert_eq!(ConsistentHasher::probe(&base, 2).as_str(), "gen-abc-2");
        assert!(!ConsistentHasher::is_generated(&CanonicalId::new("04xyz")));
    }
}
