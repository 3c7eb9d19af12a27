//! Persistence for movies, canonical entities and their associations.

pub mod model;
pub mod store;

pub use model::{
    Association, CanonicalEntity, CatalogCounts, EntityKind, LabeledMovie, Movie, MovieTitle,
};
pub use store::CatalogStore;
