use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::taxonomy::parse_mentions;
use crate::catalog::model::{Association, CanonicalEntity, EntityKind, Movie};
use crate::error::CatalogError;

/// Name-derived ids live above this floor so they never meet export ids.
pub const NAME_DERIVED_BASE: i64 = 1 << 40;

/// One export row after scalar parsing. Taxonomy cells are still raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// 1-based line in the source file, for diagnostics.
    pub line: u64,
    pub movie: Movie,
    pub genres: String,
    pub keywords: String,
    pub companies: String,
}

impl SourceRecord {
    pub fn cell(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Genre => &self.genres,
            EntityKind::Keyword => &self.keywords,
            EntityKind::Company => &self.companies,
        }
    }
}

/// How an entity id is chosen when the export does not supply one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackIds {
    /// Next value of a per-kind counter starting at 1.
    #[default]
    Sequential,
    /// Hash of the name, stable across reloads regardless of row order.
    NameDerived,
}

impl FromStr for FallbackIds {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "seq" | "counter" => Ok(Self::Sequential),
            "name" | "name_derived" | "stable" => Ok(Self::NameDerived),
            other => Err(format!("unknown fallback id strategy {other:?}")),
        }
    }
}

/// What to do with a taxonomy cell that does not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaxonomyPolicy {
    /// Ingest an empty list for the cell and record a [`ParseWarning`].
    #[default]
    Lenient,
    /// Abort the reload with [`CatalogError::Taxonomy`].
    Strict,
}

/// A taxonomy cell that was dropped during a lenient reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub movie_id: i64,
    pub line: u64,
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
struct KindIds {
    by_name: HashMap<String, i64>,
    claimed: HashSet<i64>,
    next_id: i64,
}

impl Default for KindIds {
    fn default() -> Self {
        Self {
            by_name: HashMap::new(),
            claimed: HashSet::new(),
            next_id: 1,
        }
    }
}

impl KindIds {
    fn resolve(
        &mut self,
        kind: EntityKind,
        name: &str,
        supplied: Option<i64>,
        fallback: FallbackIds,
    ) -> i64 {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = match supplied.filter(|id| *id > 0) {
            Some(id) if !self.claimed.contains(&id) => id,
            Some(id) => {
                warn!(
                    %kind,
                    entity = name,
                    supplied_id = id,
                    "supplied id already belongs to another name; assigning a fallback id"
                );
                self.fallback_id(name, fallback)
            }
            None => self.fallback_id(name, fallback),
        };
        self.claimed.insert(id);
        self.by_name.insert(name.to_string(), id);
        id
    }

    fn fallback_id(&mut self, name: &str, fallback: FallbackIds) -> i64 {
        match fallback {
            FallbackIds::Sequential => loop {
                let candidate = self.next_id;
                self.next_id += 1;
                if !self.claimed.contains(&candidate) {
                    return candidate;
                }
            },
            FallbackIds::NameDerived => {
                let mut id = name_derived_id(name);
                while self.claimed.contains(&id) {
                    id += 1;
                }
                id
            }
        }
    }
}

/// Name→id maps and fallback counters for one reload run.
///
/// Created fresh per reload and handed back by [`normalize`] so callers can
/// inspect the assignments; nothing here outlives the run unless the caller
/// keeps it.
#[derive(Debug, Clone, Default)]
pub struct NormalizerState {
    fallback: FallbackIds,
    genres: KindIds,
    keywords: KindIds,
    companies: KindIds,
}

impl NormalizerState {
    pub fn new(fallback: FallbackIds) -> Self {
        Self {
            fallback,
            ..Self::default()
        }
    }

    /// Canonical id assigned to `name` so far in this run.
    pub fn id_for(&self, kind: EntityKind, name: &str) -> Option<i64> {
        self.ids(kind).by_name.get(name).copied()
    }

    /// Number of distinct names registered for `kind`.
    pub fn len(&self, kind: EntityKind) -> usize {
        self.ids(kind).by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        EntityKind::ALL.iter().all(|kind| self.len(*kind) == 0)
    }

    fn ids(&self, kind: EntityKind) -> &KindIds {
        match kind {
            EntityKind::Genre => &self.genres,
            EntityKind::Keyword => &self.keywords,
            EntityKind::Company => &self.companies,
        }
    }

    fn ids_mut(&mut self, kind: EntityKind) -> &mut KindIds {
        match kind {
            EntityKind::Genre => &mut self.genres,
            EntityKind::Keyword => &mut self.keywords,
            EntityKind::Company => &mut self.companies,
        }
    }
}

/// Canonical entities and associations of a single kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityTable {
    pub entities: Vec<CanonicalEntity>,
    pub associations: Vec<Association>,
}

/// Everything a reload writes to the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedCatalog {
    pub movies: Vec<Movie>,
    pub genres: EntityTable,
    pub keywords: EntityTable,
    pub companies: EntityTable,
    pub warnings: Vec<ParseWarning>,
}

impl NormalizedCatalog {
    pub fn table(&self, kind: EntityKind) -> &EntityTable {
        match kind {
            EntityKind::Genre => &self.genres,
            EntityKind::Keyword => &self.keywords,
            EntityKind::Company => &self.companies,
        }
    }

    fn table_mut(&mut self, kind: EntityKind) -> &mut EntityTable {
        match kind {
            EntityKind::Genre => &mut self.genres,
            EntityKind::Keyword => &mut self.keywords,
            EntityKind::Company => &mut self.companies,
        }
    }
}

/// Turn source rows into deduplicated entities and associations.
///
/// Mentions are keyed by their trimmed name within a kind: the first mention
/// of a name fixes its id (the export id when present and positive, else a
/// fallback id) and later mentions reuse it. Each entity and each
/// (movie, entity) pair is emitted once. Blank names are skipped.
pub fn normalize(
    records: Vec<SourceRecord>,
    mut state: NormalizerState,
    policy: TaxonomyPolicy,
) -> Result<(NormalizedCatalog, NormalizerState), CatalogError> {
    let fallback = state.fallback;
    let mut catalog = NormalizedCatalog::default();
    let mut seen_movies: HashSet<i64> = HashSet::with_capacity(records.len());
    let mut emitted: HashSet<(EntityKind, i64)> = HashSet::new();
    let mut linked: HashSet<(EntityKind, Association)> = HashSet::new();

    for record in records {
        let movie_id = record.movie.id;
        if !seen_movies.insert(movie_id) {
            return Err(CatalogError::row(
                record.line,
                format!("duplicate movie id {movie_id}"),
            ));
        }

        for kind in EntityKind::ALL {
            let mentions = match parse_mentions(record.cell(kind)) {
                Ok(mentions) => mentions,
                Err(source) if policy == TaxonomyPolicy::Strict => {
                    return Err(CatalogError::Taxonomy {
                        line: record.line,
                        field: kind.source_field(),
                        source,
                    });
                }
                Err(err) => {
                    warn!(
                        movie_id,
                        line = record.line,
                        field = kind.source_field(),
                        error = %err,
                        "malformed taxonomy cell; ingesting an empty list"
                    );
                    catalog.warnings.push(ParseWarning {
                        movie_id,
                        line: record.line,
                        field: kind.source_field(),
                        message: err.to_string(),
                    });
                    Vec::new()
                }
            };

            for mention in mentions {
                let name = mention.name.trim();
                if name.is_empty() {
                    debug!(movie_id, %kind, "skipping blank taxonomy name");
                    continue;
                }
                let entity_id = state.ids_mut(kind).resolve(kind, name, mention.id, fallback);
                let table = catalog.table_mut(kind);
                if emitted.insert((kind, entity_id)) {
                    table.entities.push(CanonicalEntity {
                        id: entity_id,
                        name: name.to_string(),
                    });
                }
                let association = Association {
                    movie_id,
                    entity_id,
                };
                if linked.insert((kind, association)) {
                    table.associations.push(association);
                }
            }
        }

        catalog.movies.push(record.movie);
    }

    debug!(
        movies = catalog.movies.len(),
        genres = catalog.genres.entities.len(),
        keywords = catalog.keywords.entities.len(),
        companies = catalog.companies.entities.len(),
        warnings = catalog.warnings.len(),
        "normalized catalog"
    );
    Ok((catalog, state))
}

/// Stable id for `name`: the first 40 bits of its SHA-256 above [`NAME_DERIVED_BASE`].
pub fn name_derived_id(name: &str) -> i64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut buf = [0u8; 8];
    buf[3..].copy_from_slice(&digest[..5]);
    NAME_DERIVED_BASE + i64::from_be_bytes(buf)
}
