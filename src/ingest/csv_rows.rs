use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use tracing::debug;

use crate::catalog::Movie;
use crate::error::CatalogError;
use crate::normalization::SourceRecord;

/// Export row as text. Every column but `id` may be missing or blank.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMovieRow {
    id: String,
    title: Option<String>,
    original_title: Option<String>,
    overview: Option<String>,
    tagline: Option<String>,
    release_date: Option<String>,
    runtime: Option<String>,
    budget: Option<String>,
    revenue: Option<String>,
    popularity: Option<String>,
    vote_average: Option<String>,
    vote_count: Option<String>,
    original_language: Option<String>,
    status: Option<String>,
    homepage: Option<String>,
    genres: Option<String>,
    keywords: Option<String>,
    production_companies: Option<String>,
}

impl RawMovieRow {
    fn into_record(self, line: u64) -> Result<SourceRecord, CatalogError> {
        let id_text = self.id.trim();
        let id = id_text
            .parse::<i64>()
            .map_err(|_| CatalogError::row(line, format!("movie id {id_text:?} is not an integer")))?;

        let release_date = non_blank(&self.release_date).and_then(|raw| {
            let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok();
            if parsed.is_none() {
                debug!(line, movie_id = id, raw, "unparseable release date; storing none");
            }
            parsed
        });

        let movie = Movie {
            id,
            title: self.title.unwrap_or_default(),
            original_title: self.original_title,
            overview: self.overview,
            tagline: self.tagline,
            release_date,
            runtime: parse_f64(&self.runtime),
            budget: parse_i64(&self.budget).unwrap_or(0),
            revenue: parse_i64(&self.revenue).unwrap_or(0),
            popularity: parse_f64(&self.popularity).unwrap_or(0.0),
            vote_average: parse_f64(&self.vote_average).unwrap_or(0.0),
            vote_count: parse_i64(&self.vote_count).unwrap_or(0),
            original_language: self.original_language,
            status: self.status,
            homepage: self.homepage,
        };

        Ok(SourceRecord {
            line,
            movie,
            genres: self.genres.unwrap_or_default(),
            keywords: self.keywords.unwrap_or_default(),
            companies: self.production_companies.unwrap_or_default(),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_f64(value: &Option<String>) -> Option<f64> {
    non_blank(value)?.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integers, tolerating float renderings such as `1.5e8`.
fn parse_i64(value: &Option<String>) -> Option<i64> {
    let raw = non_blank(value)?;
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i64))
}

/// Read a headered export into source records.
pub fn read_source_records<R: Read>(reader: R) -> Result<Vec<SourceRecord>, CatalogError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut out = Vec::new();
    let mut record = StringRecord::new();
    while rdr.read_record(&mut record)? {
        let line = record.position().map_or(0, |p| p.line());
        let raw: RawMovieRow = record
            .deserialize(Some(&headers))
            .map_err(|e| CatalogError::row(line, e.to_string()))?;
        out.push(raw.into_record(line)?);
    }
    debug!(rows = out.len(), "read export rows");
    Ok(out)
}

pub fn read_source_file(path: &Path) -> Result<Vec<SourceRecord>, CatalogError> {
    let file = File::open(path)?;
    read_source_records(BufReader::with_capacity(1 << 20, file))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,title,original_title,overview,tagline,release_date,runtime,budget,revenue,popularity,vote_average,vote_count,original_language,status,homepage,genres,keywords,production_companies";

    #[test]
    fn parses_scalar_columns() {
        let csv = format!(
            "{HEADER}\n19995,Avatar,Avatar,In the 22nd century...,Enter the World of Pandora.,2009-12-10,162.0,237000000,2787965087,150.437577,7.2,11800,en,Released,http://www.avatarmovie.com/,\"[{{\"\"id\"\": 28, \"\"name\"\": \"\"Action\"\"}}]\",[],[]\n"
        );
        let records = read_source_records(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.line, 2);
        assert_eq!(record.movie.id, 19995);
        assert_eq!(record.movie.title, "Avatar");
        assert_eq!(record.movie.release_date, NaiveDate::from_ymd_opt(2009, 12, 10));
        assert_eq!(record.movie.runtime, Some(162.0));
        assert_eq!(record.movie.revenue, 2_787_965_087);
        assert_eq!(record.movie.vote_count, 11800);
        assert_eq!(record.genres, r#"[{"id": 28, "name": "Action"}]"#);
        assert_eq!(record.keywords, "[]");
    }

    #[test]
    fn blank_and_odd_values_default() {
        let csv = format!("{HEADER}\n7,Untitled,,,,soon,,,1.5e6,,,,,,,,,\n");
        let movie = read_source_records(csv.as_bytes()).unwrap().remove(0).movie;
        assert_eq!(movie.release_date, None);
        assert_eq!(movie.runtime, None);
        assert_eq!(movie.budget, 0);
        assert_eq!(movie.revenue, 1_500_000);
        assert_eq!(movie.popularity, 0.0);
        assert_eq!(movie.overview, None);
    }

    #[test]
    fn missing_columns_are_tolerated() {
        let csv = "id,title,popularity\n3,Short,4.5\n";
        let record = read_source_records(csv.as_bytes()).unwrap().remove(0);
        assert_eq!(record.movie.popularity, 4.5);
        assert!(record.genres.is_empty());
    }

    #[test]
    fn non_numeric_ids_fail_with_line() {
        let csv = format!("{HEADER}\n1,Fine,,,,,,,,,,,,,,,,\nabc,Broken,,,,,,,,,,,,,,,,\n");
        let err = read_source_records(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::Row { line: 3, .. }), "{err:?}");
    }
}
