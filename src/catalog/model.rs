use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A catalog item as loaded from the export. Immutable until the next reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub release_date: Option<NaiveDate>,
    /// Minutes.
    pub runtime: Option<f64>,
    pub budget: i64,
    pub revenue: i64,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: i64,
    pub original_language: Option<String>,
    pub status: Option<String>,
    pub homepage: Option<String>,
}

impl Movie {
    /// Minimal movie with defaulted numeric fields; handy for fixtures.
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            original_title: None,
            overview: None,
            tagline: None,
            release_date: None,
            runtime: None,
            budget: 0,
            revenue: 0,
            popularity: 0.0,
            vote_average: 0.0,
            vote_count: 0,
            original_language: None,
            status: None,
            homepage: None,
        }
    }
}

/// Projection served to autocomplete-style listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MovieTitle {
    pub id: i64,
    pub title: String,
    pub release_date: Option<NaiveDate>,
}

/// A movie with its taxonomy labels attached for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledMovie {
    #[serde(flatten)]
    pub movie: Movie,
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
}

/// The three taxonomy kinds carried by every movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Genre,
    Keyword,
    Company,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Genre, EntityKind::Keyword, EntityKind::Company];

    /// Name of the export column holding this kind's list.
    pub fn source_field(self) -> &'static str {
        match self {
            EntityKind::Genre => "genres",
            EntityKind::Keyword => "keywords",
            EntityKind::Company => "production_companies",
        }
    }

    pub(crate) fn table(self) -> &'static str {
        match self {
            EntityKind::Genre => "genres",
            EntityKind::Keyword => "keywords",
            EntityKind::Company => "production_companies",
        }
    }

    pub(crate) fn link_table(self) -> &'static str {
        match self {
            EntityKind::Genre => "movie_genres",
            EntityKind::Keyword => "movie_keywords",
            EntityKind::Company => "movie_companies",
        }
    }

    pub(crate) fn link_column(self) -> &'static str {
        match self {
            EntityKind::Genre => "genre_id",
            EntityKind::Keyword => "keyword_id",
            EntityKind::Company => "company_id",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EntityKind::Genre => "genre",
            EntityKind::Keyword => "keyword",
            EntityKind::Company => "company",
        })
    }
}

/// Deduplicated taxonomy record. `name` is unique within its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEntity {
    pub id: i64,
    pub name: String,
}

/// Link between a movie and a canonical entity of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Association {
    pub movie_id: i64,
    pub entity_id: i64,
}

/// Row counts per table, reported after a reload and by `reelrank counts`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogCounts {
    pub movies: i64,
    pub genres: i64,
    pub keywords: i64,
    pub companies: i64,
    pub movie_genres: i64,
    pub movie_keywords: i64,
    pub movie_companies: i64,
}
