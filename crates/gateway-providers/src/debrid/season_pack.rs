//! Season-pack detection and file selection, shared by every resolver.

use once_cell::sync::Lazy;
use regex::Regex;

use super::traits::ResolveOptions;

const SEASON_PACK_SIZE_THRESHOLD_BYTES: u64 = 25 * 1024 * 1024 * 1024;
const MIN_SXXEYY_MATCHES_FOR_PACK: usize = 3;

static SXXEYY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)s(\d{1,2})e(\d{1,2})").unwrap());
static SEASON_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bs(\d{1,2})\b").unwrap());
static COMPLETE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)complete|full season").unwrap());

#[derive(Debug, Clone)]
pub struct DebridFile {
    pub index: u32,
    pub name: String,
    pub bytes: u64,
}

/// Any of: a "complete"/"full season" token; a bare `Sxx` token with no
/// matching `Exx`; at least three files matching `SxxEyy`; or a total size
/// over 25 GiB.
#[must_use]
pub fn is_season_pack(files: &[DebridFile]) -> bool {
    if files.iter().any(|f| COMPLETE_TOKEN.is_match(&f.name)) {
        return true;
    }
    if files
        .iter()
        .any(|f| SEASON_ONLY.is_match(&f.name) && !SXXEYY.is_match(&f.name))
    {
        return true;
    }
    if files.iter().filter(|f| SXXEYY.is_match(&f.name)).count() >= MIN_SXXEYY_MATCHES_FOR_PACK {
        return true;
    }
    let total: u64 = files.iter().map(|f| f.bytes).sum();
    total > SEASON_PACK_SIZE_THRESHOLD_BYTES
}

/// Priority: explicit `file_index` (by index field, else position) > a
/// season-episode match when the set looks like a pack and series metadata
/// was supplied > the largest file.
#[must_use]
pub fn pick_file<'a>(files: &'a [DebridFile], opts: &ResolveOptions) -> Option<&'a DebridFile> {
    if files.is_empty() {
        return None;
    }

    if let Some(index) = opts.file_index {
        if let Some(file) = files.iter().find(|f| f.index == index) {
            return Some(file);
        }
        if let Some(file) = files.get(index as usize) {
            return Some(file);
        }
    }

    if let Some(series) = &opts.series {
        if is_season_pack(files) {
            if let Some(file) = files.iter().find(|f| matches_episode(&f.name, series.season, series.episode)) {
                return Some(file);
            }
        }
    }

    files.iter().max_by_key(|f| f.bytes)
}

fn matches_episode(name: &str, season: u32, episode: u32) -> bool {
    SXXEYY.captures(name).is_some_and(|caps| {
        let matched_season: u32 = caps[1].parse().unwrap_or(0);
        let matched_episode: u32 = caps[2].parse().unwrap_or(0);
        matched_season == season && matched_episode == episode
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debrid::traits::SeriesMeta;

    fn file(index: u32, name: &str, bytes: u64) -> DebridFile {
        DebridFile { index, name: name.to_string(), bytes }
    }

    #[test]
    fn detects_pack_from_complete_token() {
        let files = vec![file(0, "Show.Complete.Season.1", 1_000)];
        assert!(is_season_pack(&files));
    }

    #[test]
    fn detects_pack_from_bare_season_token() {
        let files = vec![file(0, "Show.S01", 1_000)];
        assert!(is_season_pack(&files));
    }

    #[test]
    fn single_episode_is_not_a_pack() {
        let files = vec![file(0, "Show.S01E02", 1_000)];
        assert!(!is_season_pack(&files));
    }

    #[test]
    fn three_episode_matches_count_as_pack() {
        let files = vec![
            file(0, "Show.S01E01", 1_000),
            file(1, "Show.S01E02", 1_000),
            file(2, "Show.S01E03", 1_000),
        ];
        assert!(is_season_pack(&files));
    }

    #[test]
    fn oversized_total_counts_as_pack() {
        let files = vec![file(0, "Show.mkv", 30 * 1024 * 1024 * 1024)];
        assert!(is_season_pack(&files));
    }

    #[test]
    fn explicit_file_index_wins() {
        let files = vec![file(0, "a", 10), file(1, "b", 999)];
        let opts = ResolveOptions { file_index: Some(0), series: None };
        assert_eq!(pick_file(&files, &opts).unwrap().name, "a");
    }

    #[test]
    fn season_pack_picks_matching_episode() {
        let files = vec![
            file(0, "Show.S01E01", 1_000),
            file(1, "Show.S01E02", 1_000),
            file(2, "Show.S01E03", 1_000),
        ];
        let opts = ResolveOptions { file_index: None, series: Some(SeriesMeta { season: 1, episode: 2 }) };
        assert_eq!(pick_file(&files, &opts).unwrap().name, "Show.S01E02");
    }

    #[test]
    fn falls_back_to_largest_file() {
        let files = vec![file(0, "a", 10), file(1, "b", 999)];
        let opts = ResolveOptions::default();
        assert_eq!(pick_file(&files, &opts).unwrap().name, "b");
    }
}
