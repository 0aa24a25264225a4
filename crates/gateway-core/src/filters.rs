//! Sequential candidate filters. Each stage is stable: it only
//! removes candidates, never reorders the survivors.

use crate::model::CandidateStream;

/// Drop candidates whose known size exceeds `max_bytes`. Unknown size (0)
/// always passes — we never penalize an indexer that didn't report size.
pub fn filter_max_size(candidates: Vec<CandidateStream>, max_bytes: u64) -> Vec<CandidateStream> {
    candidates
        .into_iter()
        .filter(|c| c.features.bytes == 0 || c.features.bytes <= max_bytes)
        .collect()
}

/// Drop any candidate whose lowercased combined text contains a blacklisted
/// substring.
pub fn filter_blacklist(candidates: Vec<CandidateStream>, terms: &[String]) -> Vec<CandidateStream> {
    if terms.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|c| {
            let text = c.combined_text().to_lowercase();
            !terms.iter().any(|term| text.contains(&term.to_lowercase()))
        })
        .collect()
}

/// Opt-in: drop any candidate whose detected language set is disjoint from
/// `preferred`, including a candidate with no detected language at all — an
/// empty set has no match to any non-empty preference list. An empty
/// `preferred` list disables the filter entirely rather than dropping
/// everything.
pub fn filter_strict_language(
    candidates: Vec<CandidateStream>,
    preferred: &[String],
) -> Vec<CandidateStream> {
    if preferred.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|c| c.features.languages.iter().any(|lang| preferred.contains(lang)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Origin;

    fn candidate(bytes: u64, text: &str) -> CandidateStream {
        let mut c = CandidateStream::new(Origin::TorrentIndexA, Some("a".repeat(40)), None).unwrap();
        c.features.bytes = bytes;
        c.name = text.to_string();
        c
    }

    #[test]
    fn max_size_drops_oversized_known_size() {
        let candidates = vec![candidate(10_000_000_000, "big"), candidate(1_000_000_000, "small")];
        let kept = filter_max_size(candidates, 5_000_000_000);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "small");
    }

    #[test]
    fn max_size_keeps_unknown_size() {
        let candidates = vec![candidate(0, "unknown")];
        let kept = filter_max_size(candidates, 1);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn blacklist_drops_matching_substring_case_insensitive() {
        let candidates = vec![candidate(0, "CAM rip"), candidate(0, "Proper release")];
        let kept = filter_blacklist(candidates, &["cam".to_string()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "Proper release");
    }

    #[test]
    fn strict_language_drops_disjoint_candidate() {
        let mut en = candidate(0, "x");
        en.features.languages.insert("EN".to_string());
        let mut fr = candidate(0, "y");
        fr.features.languages.insert("FR".to_string());
        let kept = filter_strict_language(vec![en, fr], &["EN".to_string()]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn strict_language_drops_candidate_with_no_detected_language() {
        let unknown = candidate(0, "x");
        let kept = filter_strict_language(vec![unknown], &["EN".to_string()]);
        assert!(kept.is_empty());
    }

    #[test]
    fn strict_language_with_empty_preference_list_disables_filter() {
        let unknown = candidate(0, "x");
        let kept = filter_strict_language(vec![unknown], &[]);
        assert_eq!(kept.len(), 1);
    }
}
