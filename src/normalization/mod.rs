//! Raw export rows → canonical taxonomy entities and associations.

pub mod entities;
pub mod taxonomy;

pub use entities::{
    normalize, EntityTable, FallbackIds, NormalizedCatalog, NormalizerState, ParseWarning,
    SourceRecord, TaxonomyPolicy,
};
pub use taxonomy::{parse_mentions, RawMention, TaxonomyParseError};
