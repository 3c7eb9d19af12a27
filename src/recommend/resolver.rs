use tracing::debug;

use crate::catalog::{CatalogStore, Movie};
use crate::error::CatalogError;

/// Unicode lowercase; applied to stored text at reload and to queries.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// `LIKE` pattern matching `query` literally as a substring.
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Map a query to the single anchor movie.
///
/// Matches title, overview, genre names and keyword names case-insensitively
/// (Unicode lowercase on both sides). The most popular match wins; equal popularity goes to the
/// lowest movie id. `Ok(None)` when nothing matches.
pub async fn resolve_anchor(store: &CatalogStore, query: &str) -> Result<Option<Movie>, CatalogError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CatalogError::EmptyQuery);
    }
    let anchor = store
        .most_popular_match(&like_pattern(&fold_case(query)))
        .await?;
    debug!(query, anchor = ?anchor.as_ref().map(|m| m.id), "resolved anchor");
    Ok(anchor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{row, seeded_store};

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(like_pattern("heat"), "%heat%");
        assert_eq!(like_pattern("100%_\\"), "%100\\%\\_\\\\%");
    }

    #[tokio::test]
    async fn picks_the_most_popular_match_across_fields() {
        let store = seeded_store(vec![
            row(1, "Heat", 1995, 7.9, 30.0),
            row(2, "Quiet Night", 2001, 6.0, 80.0).overview("A heatwave hits the city."),
            row(3, "Ronin", 1998, 6.9, 95.0).keywords("[{'id': 1, 'name': 'heist'}]"),
            row(4, "Le Samourai", 1967, 7.9, 99.0).genres("[{'id': 80, 'name': 'Crime'}]"),
        ])
        .await;

        let by_overview = resolve_anchor(&store, "HEAT").await.unwrap().unwrap();
        assert_eq!(by_overview.id, 2);
        let by_keyword = resolve_anchor(&store, "Heis").await.unwrap().unwrap();
        assert_eq!(by_keyword.id, 3);
        let by_genre = resolve_anchor(&store, "crime").await.unwrap().unwrap();
        assert_eq!(by_genre.id, 4);
    }

    #[tokio::test]
    async fn popularity_ties_resolve_to_lowest_id_every_time() {
        let store = seeded_store(vec![
            row(30, "Alien Resurrection", 1997, 5.9, 40.0),
            row(10, "Alien", 1979, 7.9, 40.0),
            row(20, "Aliens", 1986, 7.7, 40.0),
        ])
        .await;

        for _ in 0..5 {
            let anchor = resolve_anchor(&store, "alien").await.unwrap().unwrap();
            assert_eq!(anchor.id, 10);
        }
    }

    #[tokio::test]
    async fn no_match_is_none_and_blank_is_an_error() {
        let store = seeded_store(vec![row(1, "Heat", 1995, 7.9, 30.0)]).await;
        assert!(resolve_anchor(&store, "zzz").await.unwrap().is_none());
        assert!(matches!(
            resolve_anchor(&store, "   ").await,
            Err(CatalogError::EmptyQuery)
        ));
    }

    #[tokio::test]
    async fn non_ascii_matching_ignores_case() {
        let store = seeded_store(vec![
            row(1, "Amélie", 2001, 7.8, 40.0),
            row(2, "Quiet Night", 2001, 6.0, 10.0).keywords("[{'id': 4, 'name': 'Ödipus'}]"),
        ])
        .await;

        for query in ["amélie", "AMÉLIE", "AmÉlIe"] {
            let anchor = resolve_anchor(&store, query).await.unwrap();
            assert_eq!(anchor.map(|m| m.id), Some(1), "{query}");
        }
        let by_keyword = resolve_anchor(&store, "ödipus").await.unwrap().unwrap();
        assert_eq!(by_keyword.id, 2);
    }

    #[tokio::test]
    async fn wildcards_in_queries_are_literal() {
        let store = seeded_store(vec![row(1, "Heat", 1995, 7.9, 30.0)]).await;
        assert!(resolve_anchor(&store, "%").await.unwrap().is_none());
        assert!(resolve_anchor(&store, "H_at").await.unwrap().is_none());
    }
}
