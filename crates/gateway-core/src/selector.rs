//! Primary/secondary selection.

use crate::model::CandidateStream;

/// Result of selection. Both fields are populated when possible; hiding the
/// secondary from a response is a presentation-layer decision, not a
/// selection-layer one (`additionalstream=0` slices `secondary` away after
/// the fact).
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub primary: Option<CandidateStream>,
    pub secondary: Option<CandidateStream>,
}

/// Resolution tier one step below `resolution`, or `None` at the bottom.
#[must_use]
pub fn target_tier(resolution: u32) -> Option<u32> {
    match resolution {
        2160 => Some(1080),
        1080 => Some(720),
        720 => Some(480),
        _ => None,
    }
}

/// Sort scored candidates by descending score (stable, so ties keep
/// fan-out/insertion order), pick the top as primary, then scan the
/// remainder for the first candidate at the primary's target resolution
/// tier with a distinct identity.
#[must_use]
pub fn select(mut candidates: Vec<CandidateStream>) -> Selection {
    candidates.sort_by(|a, b| {
        let score_a = a.score.as_ref().map_or(0, |s| s.total);
        let score_b = b.score.as_ref().map_or(0, |s| s.total);
        score_b.cmp(&score_a)
    });

    let mut iter = candidates.into_iter();
    let Some(primary) = iter.next() else {
        return Selection::default();
    };

    let secondary = target_tier(primary.features.resolution).and_then(|tier| {
        iter.filter(|c| c.features.resolution == tier && c.identity() != primary.identity())
            .next()
    });

    Selection { primary: Some(primary), secondary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Origin, ScoreBreakdown};

    fn scored(hash: &str, resolution: u32, total: i64) -> CandidateStream {
        let mut c = CandidateStream::new(Origin::TorrentIndexA, Some(hash.to_string()), None).unwrap();
        c.features.resolution = resolution;
        c.score = Some(ScoreBreakdown { total, ..Default::default() });
        c
    }

    #[test]
    fn picks_highest_scored_as_primary() {
        let candidates = vec![scored("a", 1080, 500), scored("b", 2160, 900)];
        let selection = select(candidates);
        assert_eq!(selection.primary.unwrap().identity(), "b");
    }

    #[test]
    fn picks_secondary_at_target_tier() {
        let candidates = vec![scored("a", 2160, 900), scored("b", 1080, 700), scored("c", 720, 600)];
        let selection = select(candidates);
        assert_eq!(selection.secondary.unwrap().identity(), "b");
    }

    #[test]
    fn no_secondary_when_no_candidate_at_target_tier() {
        let candidates = vec![scored("a", 2160, 900), scored("b", 720, 700)];
        let selection = select(candidates);
        assert!(selection.secondary.is_none());
    }

    #[test]
    fn no_secondary_below_480() {
        let candidates = vec![scored("a", 480, 900), scored("b", 480, 700)];
        let selection = select(candidates);
        assert!(selection.secondary.is_none());
    }

    #[test]
    fn empty_input_yields_empty_selection() {
        let selection = select(vec![]);
        assert!(selection.primary.is_none());
        assert!(selection.secondary.is_none());
    }
}
