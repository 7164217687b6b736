//! Ranked entry lookup.
//!
//! Each entry is scored against the query by the best tier it reaches:
//!
//! | tier                                   | score |
//! |----------------------------------------|-------|
//! | query equals name without extension    | 100   |
//! | query equals name                      | 95    |
//! | name starts with query                 | 80    |
//! | name contains query                    | 60    |
//! | path contains query                    | 40    |
//! | edit distance 1 / 2                    | 35/20 |
//!
//! All comparisons ignore case. Results are ordered by score, then shorter
//! path, then index order.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::index::{Entry, EntryKind};

/// Largest edit distance accepted by the fuzzy tier.
pub const MAX_DISTANCE: usize = 2;

const SCORE_STEM: u32 = 100;
const SCORE_NAME: u32 = 95;
const SCORE_PREFIX: u32 = 80;
const SCORE_CONTAINS: u32 = 60;
const SCORE_PATH: u32 = 40;
const SCORE_FUZZY_BEST: u32 = 35;
const SCORE_FUZZY_WORST: u32 = 20;

/// Filters applied to a lookup.
#[derive(Debug, Clone, Default)]
pub struct MatchOptions {
    pub kind: Option<EntryKind>,
    /// Maximum results; `None` keeps everything.
    pub limit: Option<usize>,
}

/// One ranked result.
#[derive(Debug, Clone, Serialize)]
pub struct Match<'a> {
    #[serde(flatten)]
    pub entry: &'a Entry,
    pub score: u32,
    /// Edit distance, for fuzzy-tier matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<usize>,
}

/// Score and order entries against `query`.
pub fn rank<'a>(entries: &'a [Entry], query: &str, options: &MatchOptions) -> Result<Vec<Match<'a>>> {
    let query = normalize(query)?;
    let query_len = query.chars().count();

    let mut matches: Vec<Match<'a>> = entries
        .iter()
        .filter(|e| options.kind.map_or(true, |k| e.kind == k))
        .filter_map(|entry| {
            let (score, distance) = score(entry, &query, query_len);
            (score > 0).then_some(Match {
                entry,
                score,
                distance,
            })
        })
        .collect();

    // Stable: equal score and path length keep index order.
    matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.entry.path.len().cmp(&b.entry.path.len()))
    });

    if let Some(limit) = options.limit {
        matches.truncate(limit);
    }
    Ok(matches)
}

/// Unranked lookup: case-sensitive substring of name or path, index order.
pub fn substring<'a>(entries: &'a [Entry], query: &str, options: &MatchOptions) -> Result<Vec<&'a Entry>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::EmptyQuery);
    }

    let iter = entries
        .iter()
        .filter(|e| options.kind.map_or(true, |k| e.kind == k))
        .filter(|e| e.name.contains(query) || e.path.contains(query));

    Ok(match options.limit {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    })
}

fn normalize(query: &str) -> Result<String> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::EmptyQuery);
    }
    Ok(query.to_lowercase())
}

fn score(entry: &Entry, query: &str, query_len: usize) -> (u32, Option<usize>) {
    let name = entry.name.to_lowercase();
    let stem = entry.stem().to_lowercase();

    if stem == query {
        return (SCORE_STEM, None);
    }
    if name == query {
        return (SCORE_NAME, None);
    }
    if name.starts_with(query) {
        return (SCORE_PREFIX, None);
    }
    if name.contains(query) {
        return (SCORE_CONTAINS, None);
    }
    if entry.path.to_lowercase().contains(query) {
        return (SCORE_PATH, None);
    }

    if stem.chars().count() <= query_len + MAX_DISTANCE {
        if let Some(d) = bounded_distance(query, &stem, MAX_DISTANCE) {
            if d > 0 {
                return (fuzzy_score(d), Some(d));
            }
        }
    }
    (0, None)
}

/// Linear from 35 at distance 1 down to 20 at the maximum distance.
fn fuzzy_score(distance: usize) -> u32 {
    if MAX_DISTANCE <= 1 {
        return SCORE_FUZZY_BEST;
    }
    let span = SCORE_FUZZY_BEST - SCORE_FUZZY_WORST;
    let steps = (MAX_DISTANCE - 1) as u32;
    SCORE_FUZZY_BEST - span * (distance as u32 - 1) / steps
}

/// Optimal string alignment distance (insert, delete, substitute and
/// adjacent transposition), or `None` when it exceeds `max`.
pub fn bounded_distance(a: &str, b: &str, max: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        let d = a.len().max(b.len());
        return (d <= max).then_some(d);
    }

    let width = b.len() + 1;
    let mut prev2 = vec![0usize; width];
    let mut prev: Vec<usize> = (0..width).collect();
    let mut curr = vec![0usize; width];

    for i in 1..=a.len() {
        curr[0] = i;
        let mut row_min = curr[0];
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut d = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                d = d.min(prev2[j - 2] + 1);
            }
            curr[j] = d;
            row_min = row_min.min(d);
        }
        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev2, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }

    let d = prev[b.len()];
    (d <= max).then_some(d)
}
