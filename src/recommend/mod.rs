//! Query-time pipeline: resolve an anchor, score the catalog against it, rank.

pub mod ranker;
pub mod resolver;
pub mod scoring;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::catalog::{CatalogStore, EntityKind, LabeledMovie, Movie, MovieTitle};
use crate::error::CatalogError;
use crate::util::env::env_parse;
use scoring::{MovieProfile, ScoringWeights};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendConfig {
    /// Maximum number of recommendations returned.
    pub top_k: usize,
    /// Maximum keyword labels attached per movie.
    pub tag_limit: i64,
    pub weights: ScoringWeights,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            tag_limit: 5,
            weights: ScoringWeights::default(),
        }
    }
}

impl RecommendConfig {
    /// Defaults overridden by `RECOMMEND_TOP_K` / `RECOMMEND_TAG_LIMIT`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            top_k: env_parse("RECOMMEND_TOP_K", defaults.top_k),
            tag_limit: env_parse("RECOMMEND_TAG_LIMIT", defaults.tag_limit),
            weights: defaults.weights,
        }
    }
}

/// A recommended movie with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMovie {
    #[serde(flatten)]
    pub movie: LabeledMovie,
    pub similarity_score: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub anchor: Option<LabeledMovie>,
    pub recommendations: Vec<ScoredMovie>,
}

/// Read-only entry point shared by the HTTP handlers and the CLI.
#[derive(Clone)]
pub struct Recommender {
    store: CatalogStore,
    config: RecommendConfig,
}

impl Recommender {
    pub fn new(store: CatalogStore, config: RecommendConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Resolve `query` to an anchor and return the top-K most similar movies.
    #[instrument(skip(self))]
    pub async fn resolve_and_rank(&self, query: &str) -> Result<Recommendation, CatalogError> {
        let _shared = self.store.read_gate().await;

        let Some(anchor) = resolver::resolve_anchor(&self.store, query).await? else {
            info!("no anchor for query");
            return Ok(Recommendation::default());
        };

        let profiles = self.store.similarity_profiles().await?;
        let anchor_profile = profiles
            .iter()
            .find(|p| p.id == anchor.id)
            .cloned()
            .unwrap_or_else(|| {
                MovieProfile::new(
                    anchor.id,
                    anchor.release_date,
                    anchor.vote_average,
                    anchor.popularity,
                )
            });

        let scored = scoring::score_candidates(&anchor_profile, &profiles, &self.config.weights);
        let considered = scored.len();
        let ranked = ranker::rank(scored, self.config.top_k);

        let mut recommendations = Vec::with_capacity(ranked.len());
        for candidate in ranked {
            let Some(movie) = self.store.movie(candidate.id).await? else {
                continue;
            };
            recommendations.push(ScoredMovie {
                movie: self.label(movie).await?,
                similarity_score: candidate.score,
            });
        }

        info!(
            anchor_id = anchor.id,
            considered,
            returned = recommendations.len(),
            "ranked recommendations"
        );
        Ok(Recommendation {
            anchor: Some(self.label(anchor).await?),
            recommendations,
        })
    }

    /// Plain popularity-ordered listing, no scoring.
    pub async fn list_items_by_popularity(&self, limit: i64) -> Result<Vec<MovieTitle>, CatalogError> {
        let _shared = self.store.read_gate().await;
        self.store.list_by_popularity(limit).await
    }

    async fn label(&self, movie: Movie) -> Result<LabeledMovie, CatalogError> {
        let genres = self
            .store
            .entity_names(EntityKind::Genre, movie.id, None)
            .await?;
        let keywords = self
            .store
            .entity_names(EntityKind::Keyword, movie.id, Some(self.config.tag_limit))
            .await?;
        Ok(LabeledMovie {
            movie,
            genres,
            keywords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{row, seeded_store, RowBuilder};

    const ACTION: &str = "{'id': 28, 'name': 'Action'}";
    const DRAMA: &str = "{'id': 18, 'name': 'Drama'}";
    const HEIST: &str = "{'id': 1, 'name': 'heist'}";
    const TWIST: &str = "{'id': 2, 'name': 'twist'}";

    fn list(items: &[&str]) -> String {
        format!("[{}]", items.join(", "))
    }

    fn catalog() -> Vec<RowBuilder> {
        vec![
            row(1, "The Score", 2010, 7.5, 50.0)
                .genres(&list(&[ACTION, DRAMA]))
                .keywords(&list(&[HEIST])),
            row(2, "Double Cross", 2012, 7.0, 20.0)
                .genres(&list(&[ACTION, DRAMA]))
                .keywords(&list(&[HEIST, TWIST])),
            row(3, "Lonely Meadow", 1980, 3.0, 2.0),
            row(4, "Getaway", 2009, 6.0, 15.0).genres(&list(&[ACTION])),
        ]
    }

    #[tokio::test]
    async fn ranks_the_worked_example() {
        let store = seeded_store(catalog()).await;
        let recommender = Recommender::new(store, RecommendConfig::default());

        let result = recommender.resolve_and_rank("score").await.unwrap();
        let anchor = result.anchor.unwrap();
        assert_eq!(anchor.movie.id, 1);
        assert_eq!(anchor.genres, vec!["Action", "Drama"]);
        assert_eq!(anchor.keywords, vec!["heist"]);

        let ranked: Vec<(i64, i64)> = result
            .recommendations
            .iter()
            .map(|r| (r.movie.movie.id, r.similarity_score))
            .collect();
        // Getaway: 3 (genre) + 2 (year) + 1 (rating gap 1.5) + 1 (popularity)
        assert_eq!(ranked, vec![(2, 13), (4, 7)]);
        assert_eq!(result.recommendations[0].movie.keywords, vec!["heist", "twist"]);
    }

    #[tokio::test]
    async fn zero_matches_give_an_empty_result() {
        let store = seeded_store(catalog()).await;
        let recommender = Recommender::new(store, RecommendConfig::default());
        let result = recommender.resolve_and_rank("no such film").await.unwrap();
        assert_eq!(result, Recommendation::default());
    }

    #[tokio::test]
    async fn never_returns_the_anchor_or_more_than_top_k() {
        let mut rows = vec![row(100, "Anchor", 2000, 7.0, 90.0).genres(&list(&[ACTION]))];
        for id in 1..=8 {
            rows.push(row(id, &format!("Clone {id}"), 2000, 7.0, 20.0).genres(&list(&[ACTION])));
        }
        let store = seeded_store(rows).await;
        let recommender = Recommender::new(store, RecommendConfig::default());

        let result = recommender.resolve_and_rank("anchor").await.unwrap();
        assert_eq!(result.recommendations.len(), 5);
        assert!(result
            .recommendations
            .iter()
            .all(|r| r.movie.movie.id != 100));
        let ids: Vec<i64> = result
            .recommendations
            .iter()
            .map(|r| r.movie.movie.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn repeated_queries_return_identical_rankings() {
        let store = seeded_store(catalog()).await;
        let recommender = Recommender::new(store, RecommendConfig::default());
        let first = recommender.resolve_and_rank("action").await.unwrap();
        for _ in 0..3 {
            assert_eq!(recommender.resolve_and_rank("action").await.unwrap(), first);
        }
    }

    #[tokio::test]
    async fn keyword_labels_are_truncated_to_the_tag_limit() {
        let keywords: Vec<String> = (1..=7)
            .map(|id| format!("{{'id': {id}, 'name': 'kw{id}'}}"))
            .collect();
        let keyword_refs: Vec<&str> = keywords.iter().map(String::as_str).collect();
        let store = seeded_store(vec![
            row(1, "Tagged", 2000, 7.0, 50.0).keywords(&list(&keyword_refs)),
        ])
        .await;
        let recommender = Recommender::new(store, RecommendConfig::default());

        let anchor = recommender
            .resolve_and_rank("tagged")
            .await
            .unwrap()
            .anchor
            .unwrap();
        assert_eq!(anchor.keywords, vec!["kw1", "kw2", "kw3", "kw4", "kw5"]);
    }

    #[tokio::test]
    async fn undated_movies_still_score_on_other_factors() {
        let store = seeded_store(vec![
            row(1, "Dated", 2000, 7.0, 50.0),
            row(2, "Undated", 2000, 7.5, 50.0).undated(),
        ])
        .await;
        let recommender = Recommender::new(store, RecommendConfig::default());
        let result = recommender.resolve_and_rank("dated").await.unwrap();
        // "dated" also matches "Undated"; popularity tie goes to id 1
        assert_eq!(result.anchor.unwrap().movie.id, 1);
        assert_eq!(result.recommendations[0].similarity_score, 3);
    }

    #[tokio::test]
    async fn lists_titles_under_the_read_gate() {
        let store = seeded_store(catalog()).await;
        let recommender = Recommender::new(store, RecommendConfig::default());
        let titles = recommender.list_items_by_popularity(2).await.unwrap();
        let ids: Vec<i64> = titles.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
