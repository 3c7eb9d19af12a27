//! Fixture builders shared by the unit tests.

use chrono::NaiveDate;

use crate::catalog::{CatalogStore, Movie};
use crate::normalization::{normalize, NormalizedCatalog, NormalizerState, SourceRecord, TaxonomyPolicy};

pub(crate) struct RowBuilder(SourceRecord);

/// A source row released mid-`year` with empty taxonomy cells.
pub(crate) fn row(id: i64, title: &str, year: i32, vote_average: f64, popularity: f64) -> RowBuilder {
    let mut movie = Movie::new(id, title);
    movie.release_date = NaiveDate::from_ymd_opt(year, 6, 15);
    movie.vote_average = vote_average;
    movie.popularity = popularity;
    RowBuilder(SourceRecord {
        line: 0,
        movie,
        genres: String::new(),
        keywords: String::new(),
        companies: String::new(),
    })
}

impl RowBuilder {
    pub(crate) fn genres(mut self, cell: &str) -> Self {
        self.0.genres = cell.to_string();
        self
    }

    pub(crate) fn keywords(mut self, cell: &str) -> Self {
        self.0.keywords = cell.to_string();
        self
    }

    pub(crate) fn companies(mut self, cell: &str) -> Self {
        self.0.companies = cell.to_string();
        self
    }

    pub(crate) fn overview(mut self, text: &str) -> Self {
        self.0.movie.overview = Some(text.to_string());
        self
    }

    pub(crate) fn undated(mut self) -> Self {
        self.0.movie.release_date = None;
        self
    }
}

pub(crate) fn records(rows: Vec<RowBuilder>) -> Vec<SourceRecord> {
    rows.into_iter()
        .enumerate()
        .map(|(idx, RowBuilder(mut record))| {
            record.line = idx as u64 + 2;
            record
        })
        .collect()
}

pub(crate) fn normalized(rows: Vec<RowBuilder>) -> NormalizedCatalog {
    let (catalog, _) = normalize(
        records(rows),
        NormalizerState::default(),
        TaxonomyPolicy::Lenient,
    )
    .expect("fixture rows normalize");
    catalog
}

pub(crate) async fn seeded_store(rows: Vec<RowBuilder>) -> CatalogStore {
    let store = CatalogStore::in_memory().await.expect("in-memory store");
    store
        .reload(&normalized(rows))
        .await
        .expect("fixture reload");
    store
}
