//! Pure validation helpers.
//!
//! These have no side effects and do not touch ledger state, so outer
//! layers can reuse them for pre-flight checks before submitting a
//! mutation.

use std::collections::HashSet;

use crate::model::CandidateId;

/// Upper bound on a candidate name, counted in decoded characters.
pub const MAX_NAME_CHARS: usize = 50;

/// Whether a candidate name is acceptable: non-empty, at most
/// [`MAX_NAME_CHARS`] characters, and each character either ASCII
/// alphanumeric, space, underscore, hyphen, or any non-ASCII
/// character (names in other scripts are fine).
///
/// The check runs on code points, not raw bytes, so a malformed
/// multibyte sequence can never slip through as "permissible text".
pub fn is_valid_candidate_name(name: &str) -> bool {
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '_' || c == '-' || !c.is_ascii())
}

/// Counts the entries of a vote vector that match none of the given
/// live candidate ids.
pub fn count_invalid_votes(votes: &[CandidateId], valid_ids: &HashSet<CandidateId>) -> usize {
    votes.iter().filter(|v| !valid_ids.contains(v)).count()
}

/// Trims a raw voter identifier; `None` when nothing is left.
pub fn normalize_voter_id(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_charset() {
        assert!(is_valid_candidate_name("Alice"));
        assert!(is_valid_candidate_name("Alice Smith-Jones_2"));
        assert!(is_valid_candidate_name("李雷"));
        assert!(!is_valid_candidate_name(""));
        assert!(!is_valid_candidate_name("Alice!"));
        assert!(!is_valid_candidate_name("a,b"));
    }

    #[test]
    fn name_length_counts_chars_not_bytes() {
        let ascii_50: String = "a".repeat(50);
        assert!(is_valid_candidate_name(&ascii_50));
        assert!(!is_valid_candidate_name(&"a".repeat(51)));
        // 50 CJK characters are 150 bytes but still a valid name.
        let cjk_50: String = "宁".repeat(50);
        assert!(is_valid_candidate_name(&cjk_50));
        assert!(!is_valid_candidate_name(&"宁".repeat(51)));
    }

    #[test]
    fn invalid_vote_counting() {
        let valid: HashSet<CandidateId> = [1, 2, 3].into_iter().collect();
        assert_eq!(count_invalid_votes(&[1, 2, 3], &valid), 0);
        assert_eq!(count_invalid_votes(&[1, 9, 2, 42], &valid), 2);
        assert_eq!(count_invalid_votes(&[], &valid), 0);
    }

    #[test]
    fn voter_id_normalization() {
        assert_eq!(normalize_voter_id("  bob  "), Some("bob"));
        assert_eq!(normalize_voter_id("bob"), Some("bob"));
        assert_eq!(normalize_voter_id("   "), None);
        assert_eq!(normalize_voter_id(""), None);
    }
}
