use std::cmp::Ordering;

use super::scoring::ScoredCandidate;

/// Score desc, then rating desc, then popularity desc, then id asc.
pub fn compare(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.vote_average.total_cmp(&a.vote_average))
        .then_with(|| b.popularity.total_cmp(&a.popularity))
        .then_with(|| a.id.cmp(&b.id))
}

/// Order candidates and keep the best `top_k`.
pub fn rank(mut candidates: Vec<ScoredCandidate>, top_k: usize) -> Vec<ScoredCandidate> {
    candidates.sort_by(compare);
    candidates.truncate(top_k);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: i64, score: i64, vote_average: f64, popularity: f64) -> ScoredCandidate {
        ScoredCandidate {
            id,
            score,
            vote_average,
            popularity,
        }
    }

    fn ids(ranked: &[ScoredCandidate]) -> Vec<i64> {
        ranked.iter().map(|c| c.id).collect()
    }

    #[test]
    fn orders_by_score_then_rating_then_popularity() {
        let ranked = rank(
            vec![
                candidate(1, 5, 6.0, 10.0),
                candidate(2, 9, 5.0, 10.0),
                candidate(3, 5, 7.0, 10.0),
                candidate(4, 5, 7.0, 40.0),
            ],
            10,
        );
        assert_eq!(ids(&ranked), vec![2, 4, 3, 1]);
    }

    #[test]
    fn full_ties_fall_back_to_lowest_id() {
        let ranked = rank(
            vec![candidate(9, 4, 7.0, 12.0), candidate(3, 4, 7.0, 12.0)],
            10,
        );
        assert_eq!(ids(&ranked), vec![3, 9]);
    }

    #[test]
    fn truncates_to_top_k() {
        let many: Vec<ScoredCandidate> = (1..=8).map(|id| candidate(id, id, 5.0, 1.0)).collect();
        let ranked = rank(many, 5);
        assert_eq!(ids(&ranked), vec![8, 7, 6, 5, 4]);
    }

    #[test]
    fn ranking_is_independent_of_input_order() {
        let input = vec![
            candidate(1, 3, 6.0, 1.0),
            candidate(2, 3, 6.0, 1.0),
            candidate(3, 7, 2.0, 1.0),
            candidate(4, 3, 8.0, 1.0),
        ];
        let mut reversed = input.clone();
        reversed.reverse();
        assert_eq!(rank(input, 5), rank(reversed, 5));
    }
}
