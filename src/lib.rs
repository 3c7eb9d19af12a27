//! Movie catalog loader and content-based recommender.
//!
//! A CSV export is normalized into canonical genres, keywords and production
//! companies ([`normalization`]), persisted in SQLite ([`catalog`]) and served
//! through a query → anchor → top-K similarity pipeline ([`recommend`]).

pub mod api;
pub mod catalog;
pub mod cli;
pub mod error;
pub mod ingest;
pub mod normalization;
pub mod recommend;
pub mod tracing;

pub mod util {
    pub mod env;
}

#[cfg(test)]
mod test_support;

pub use catalog::CatalogStore;
pub use error::CatalogError;
pub use recommend::{Recommendation, Recommender};
