use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{info, instrument};

use super::model::{CatalogCounts, EntityKind, Movie, MovieTitle};
use crate::error::{CatalogError, StoreStage};
use crate::normalization::NormalizedCatalog;
use crate::recommend::resolver::fold_case;
use crate::recommend::scoring::MovieProfile;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS movies (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    original_title TEXT,
    overview TEXT,
    tagline TEXT,
    release_date TEXT,
    runtime REAL,
    budget INTEGER NOT NULL DEFAULT 0,
    revenue INTEGER NOT NULL DEFAULT 0,
    popularity REAL NOT NULL DEFAULT 0,
    vote_average REAL NOT NULL DEFAULT 0,
    vote_count INTEGER NOT NULL DEFAULT 0,
    original_language TEXT,
    status TEXT,
    homepage TEXT,
    title_folded TEXT NOT NULL DEFAULT '',
    overview_folded TEXT
);
CREATE INDEX IF NOT EXISTS idx_movies_popularity ON movies (popularity DESC);
CREATE INDEX IF NOT EXISTS idx_movies_title ON movies (title);

CREATE TABLE IF NOT EXISTS genres (
    id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE, name_folded TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS keywords (
    id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE, name_folded TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS production_companies (
    id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE, name_folded TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS movie_genres (
    movie_id INTEGER NOT NULL REFERENCES movies (id),
    genre_id INTEGER NOT NULL REFERENCES genres (id),
    PRIMARY KEY (movie_id, genre_id)
);
CREATE INDEX IF NOT EXISTS idx_movie_genres_genre ON movie_genres (genre_id);

CREATE TABLE IF NOT EXISTS movie_keywords (
    movie_id INTEGER NOT NULL REFERENCES movies (id),
    keyword_id INTEGER NOT NULL REFERENCES keywords (id),
    PRIMARY KEY (movie_id, keyword_id)
);
CREATE INDEX IF NOT EXISTS idx_movie_keywords_keyword ON movie_keywords (keyword_id);

CREATE TABLE IF NOT EXISTS movie_companies (
    movie_id INTEGER NOT NULL REFERENCES movies (id),
    company_id INTEGER NOT NULL REFERENCES production_companies (id),
    PRIMARY KEY (movie_id, company_id)
);
CREATE INDEX IF NOT EXISTS idx_movie_companies_company ON movie_companies (company_id);
"#;

const MOVIE_COLUMNS: &str = "m.id, m.title, m.original_title, m.overview, m.tagline, \
     m.release_date, m.runtime, m.budget, m.revenue, m.popularity, m.vote_average, \
     m.vote_count, m.original_language, m.status, m.homepage";

/// Children before parents so foreign keys hold while clearing.
const CLEAR_ORDER: [&str; 7] = [
    "movie_genres",
    "movie_keywords",
    "movie_companies",
    "genres",
    "keywords",
    "production_companies",
    "movies",
];

/// SQLite-backed catalog.
///
/// Cloning is cheap and shares the pool. Reloads take the write half of an
/// in-process gate; query paths hold the read half via [`CatalogStore::read_gate`]
/// so a reload never interleaves with them.
#[derive(Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
    gate: Arc<RwLock<()>>,
}

impl CatalogStore {
    /// Open (creating if missing) the database at `database_url` and ensure the schema.
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, CatalogError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .stage("connect.parse_url")?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every in-memory connection is its own database, so pin to one.
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(10));
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .stage("connect")?;
        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .stage("connect.schema")?;
        info!(in_memory, "catalog store ready");

        Ok(Self {
            pool,
            gate: Arc::new(RwLock::new(())),
        })
    }

    /// Private in-memory catalog; used by tests and dry runs.
    pub async fn in_memory() -> Result<Self, CatalogError> {
        Self::connect("sqlite::memory:", 1).await
    }

    /// Shared guard held by read paths for the duration of one request.
    pub async fn read_gate(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().await
    }

    pub async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    /// Clear every table and write `catalog` in one transaction.
    #[instrument(skip_all, fields(movies = catalog.movies.len()))]
    pub async fn reload(&self, catalog: &NormalizedCatalog) -> Result<CatalogCounts, CatalogError> {
        let _exclusive = self.gate.write().await;
        let mut tx = self.pool.begin().await.stage("reload.begin")?;

        for table in CLEAR_ORDER {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await
                .stage(format!("reload.clear {table}"))?;
        }

        for movie in &catalog.movies {
            sqlx::query(
                "INSERT INTO movies (id, title, original_title, overview, tagline, release_date, \
                 runtime, budget, revenue, popularity, vote_average, vote_count, \
                 original_language, status, homepage, title_folded, overview_folded) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(movie.id)
            .bind(&movie.title)
            .bind(&movie.original_title)
            .bind(&movie.overview)
            .bind(&movie.tagline)
            .bind(movie.release_date)
            .bind(movie.runtime)
            .bind(movie.budget)
            .bind(movie.revenue)
            .bind(movie.popularity)
            .bind(movie.vote_average)
            .bind(movie.vote_count)
            .bind(&movie.original_language)
            .bind(&movie.status)
            .bind(&movie.homepage)
            .bind(fold_case(&movie.title))
            .bind(movie.overview.as_deref().map(fold_case))
            .execute(&mut *tx)
            .await
            .stage(format!("reload.insert_movie id={}", movie.id))?;
        }

        for kind in EntityKind::ALL {
            let table = catalog.table(kind);
            let insert_entity = format!(
                "INSERT OR IGNORE INTO {} (id, name, name_folded) VALUES (?, ?, ?)",
                kind.table()
            );
            for entity in &table.entities {
                sqlx::query(&insert_entity)
                    .bind(entity.id)
                    .bind(&entity.name)
                    .bind(fold_case(&entity.name))
                    .execute(&mut *tx)
                    .await
                    .stage(format!("reload.insert_{kind} id={}", entity.id))?;
            }

            let insert_link = format!(
                "INSERT OR IGNORE INTO {} (movie_id, {}) VALUES (?, ?)",
                kind.link_table(),
                kind.link_column()
            );
            for link in &table.associations {
                sqlx::query(&insert_link)
                    .bind(link.movie_id)
                    .bind(link.entity_id)
                    .execute(&mut *tx)
                    .await
                    .stage(format!(
                        "reload.link_{kind} movie={} entity={}",
                        link.movie_id, link.entity_id
                    ))?;
            }
        }

        tx.commit().await.stage("reload.commit")?;
        let counts = self.counts().await?;
        info!(?counts, "catalog reloaded");
        Ok(counts)
    }

    pub async fn counts(&self) -> Result<CatalogCounts, CatalogError> {
        sqlx::query_as::<_, CatalogCounts>(
            "SELECT \
               (SELECT COUNT(*) FROM movies) AS movies, \
               (SELECT COUNT(*) FROM genres) AS genres, \
               (SELECT COUNT(*) FROM keywords) AS keywords, \
               (SELECT COUNT(*) FROM production_companies) AS companies, \
               (SELECT COUNT(*) FROM movie_genres) AS movie_genres, \
               (SELECT COUNT(*) FROM movie_keywords) AS movie_keywords, \
               (SELECT COUNT(*) FROM movie_companies) AS movie_companies",
        )
        .fetch_one(&self.pool)
        .await
        .stage("counts")
    }

    pub async fn movie(&self, id: i64) -> Result<Option<Movie>, CatalogError> {
        sqlx::query_as::<_, Movie>(&format!("SELECT {MOVIE_COLUMNS} FROM movies m WHERE m.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .stage(format!("movie id={id}"))
    }

    /// Most popular movie whose case-folded title, overview, genre names or
    /// keyword names match the `LIKE` pattern (escape character `\`). The
    /// pattern must already be folded with [`fold_case`]. Popularity ties go
    /// to the lowest id.
    pub async fn most_popular_match(&self, pattern: &str) -> Result<Option<Movie>, CatalogError> {
        let sql = format!(
            "SELECT {MOVIE_COLUMNS} FROM movies m \
             WHERE m.title_folded LIKE ? ESCAPE '\\' \
                OR m.overview_folded LIKE ? ESCAPE '\\' \
                OR EXISTS (SELECT 1 FROM movie_genres mg JOIN genres g ON g.id = mg.genre_id \
                           WHERE mg.movie_id = m.id AND g.name_folded LIKE ? ESCAPE '\\') \
                OR EXISTS (SELECT 1 FROM movie_keywords mk JOIN keywords k ON k.id = mk.keyword_id \
                           WHERE mk.movie_id = m.id AND k.name_folded LIKE ? ESCAPE '\\') \
             ORDER BY m.popularity DESC, m.id ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Movie>(&sql)
            .bind(pattern)
            .bind(pattern)
            .bind(pattern)
            .bind(pattern)
            .fetch_optional(&self.pool)
            .await
            .stage("resolve_anchor")
    }

    /// Scoring profiles (year, rating, popularity, genre and keyword ids) for every movie, by id.
    pub async fn similarity_profiles(&self) -> Result<Vec<MovieProfile>, CatalogError> {
        let rows: Vec<(i64, Option<NaiveDate>, f64, f64)> = sqlx::query_as(
            "SELECT id, release_date, vote_average, popularity FROM movies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .stage("profiles.movies")?;

        let mut profiles: BTreeMap<i64, MovieProfile> = rows
            .into_iter()
            .map(|(id, release_date, vote_average, popularity)| {
                (id, MovieProfile::new(id, release_date, vote_average, popularity))
            })
            .collect();

        for kind in [EntityKind::Genre, EntityKind::Keyword] {
            let links: Vec<(i64, i64)> = sqlx::query_as(&format!(
                "SELECT movie_id, {} FROM {}",
                kind.link_column(),
                kind.link_table()
            ))
            .fetch_all(&self.pool)
            .await
            .stage(format!("profiles.{kind}"))?;

            for (movie_id, entity_id) in links {
                if let Some(profile) = profiles.get_mut(&movie_id) {
                    let set = match kind {
                        EntityKind::Genre => &mut profile.genres,
                        _ => &mut profile.keywords,
                    };
                    set.insert(entity_id);
                }
            }
        }

        Ok(profiles.into_values().collect())
    }

    /// Names of `kind` linked to a movie, in link insertion order, at most `limit` when given.
    pub async fn entity_names(
        &self,
        kind: EntityKind,
        movie_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<String>, CatalogError> {
        let sql = format!(
            "SELECT e.name FROM {table} e JOIN {link} l ON e.id = l.{column} \
             WHERE l.movie_id = ? ORDER BY l.rowid LIMIT ?",
            table = kind.table(),
            link = kind.link_table(),
            column = kind.link_column(),
        );
        sqlx::query_scalar::<_, String>(&sql)
            .bind(movie_id)
            .bind(limit.unwrap_or(-1))
            .fetch_all(&self.pool)
            .await
            .stage(format!("labels.{kind} movie={movie_id}"))
    }

    /// Movies ordered by popularity (desc), id breaking ties.
    pub async fn list_by_popularity(&self, limit: i64) -> Result<Vec<MovieTitle>, CatalogError> {
        sqlx::query_as::<_, MovieTitle>(
            "SELECT id, title, release_date FROM movies ORDER BY popularity DESC, id ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .stage("list_by_popularity")
    }
}
