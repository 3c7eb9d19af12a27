use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// The slice of a movie that similarity scoring looks at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieProfile {
    pub id: i64,
    pub release_year: Option<i32>,
    pub vote_average: f64,
    pub popularity: f64,
    pub genres: BTreeSet<i64>,
    pub keywords: BTreeSet<i64>,
}

impl MovieProfile {
    pub fn new(id: i64, release_date: Option<NaiveDate>, vote_average: f64, popularity: f64) -> Self {
        Self {
            id,
            release_year: release_date.map(|d| d.year()),
            vote_average,
            popularity,
            ..Self::default()
        }
    }
}

/// Ratings carry one decimal; a gap of `8.3 - 7.3` comes out as 1.0000000000000009.
const RATING_TOLERANCE: f64 = 1e-9;

/// Weights and thresholds of the similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub per_shared_genre: i64,
    pub per_shared_keyword: i64,
    /// (max year gap, points), checked in order.
    pub year_bands: [(i32, i64); 2],
    /// (max rating gap, points), checked in order.
    pub rating_bands: [(f64, i64); 2],
    /// Both movies must be strictly above this popularity for the bonus.
    pub popularity_floor: f64,
    pub popularity_bonus: i64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            per_shared_genre: 3,
            per_shared_keyword: 2,
            year_bands: [(3, 2), (5, 1)],
            rating_bands: [(1.0, 2), (2.0, 1)],
            popularity_floor: 10.0,
            popularity_bonus: 1,
        }
    }
}

/// A candidate that survived scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    pub id: i64,
    pub score: i64,
    pub vote_average: f64,
    pub popularity: f64,
}

/// Similarity of `candidate` to `anchor`. Depends on nothing but the two profiles.
pub fn score(anchor: &MovieProfile, candidate: &MovieProfile, weights: &ScoringWeights) -> i64 {
    let shared_genres = anchor.genres.intersection(&candidate.genres).count() as i64;
    let shared_keywords = anchor.keywords.intersection(&candidate.keywords).count() as i64;

    let year = match (anchor.release_year, candidate.release_year) {
        (Some(a), Some(c)) => {
            let gap = (a - c).abs();
            weights
                .year_bands
                .iter()
                .find(|(max_gap, _)| gap <= *max_gap)
                .map_or(0, |(_, points)| *points)
        }
        _ => 0,
    };

    let rating_gap = (anchor.vote_average - candidate.vote_average).abs();
    let rating = weights
        .rating_bands
        .iter()
        .find(|(max_gap, _)| rating_gap <= *max_gap + RATING_TOLERANCE)
        .map_or(0, |(_, points)| *points);

    let popularity = if anchor.popularity > weights.popularity_floor
        && candidate.popularity > weights.popularity_floor
    {
        weights.popularity_bonus
    } else {
        0
    };

    shared_genres * weights.per_shared_genre
        + shared_keywords * weights.per_shared_keyword
        + year
        + rating
        + popularity
}

/// Score every candidate except the anchor itself and drop non-positive scores.
pub fn score_candidates<'a, I>(
    anchor: &MovieProfile,
    candidates: I,
    weights: &ScoringWeights,
) -> Vec<ScoredCandidate>
where
    I: IntoIterator<Item = &'a MovieProfile>,
{
    candidates
        .into_iter()
        .filter(|candidate| candidate.id != anchor.id)
        .filter_map(|candidate| {
            let score = score(anchor, candidate, weights);
            (score > 0).then_some(ScoredCandidate {
                id: candidate.id,
                score,
                vote_average: candidate.vote_average,
                popularity: candidate.popularity,
            })
        })
        .collect()
}
