use anyhow::Result;

use crate::recommend::{RecommendConfig, Recommender};

#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    pub database_url: Option<String>,
    pub query: String,
    /// Override `RECOMMEND_TOP_K`.
    pub top_k: Option<usize>,
    /// Emit the raw JSON result instead of a table.
    pub json: bool,
}

pub async fn run(cfg: SearchConfig) -> Result<()> {
    let store = super::open_store(cfg.database_url).await?;
    let mut config = RecommendConfig::from_env();
    if let Some(top_k) = cfg.top_k {
        config.top_k = top_k;
    }
    let recommender = Recommender::new(store, config);
    let result = recommender.resolve_and_rank(&cfg.query).await?;

    if cfg.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let Some(anchor) = &result.anchor else {
        println!("No movie matches {:?}", cfg.query);
        return Ok(());
    };
    println!(
        "Anchor: [{}] {} ({})",
        anchor.movie.id,
        anchor.movie.title,
        anchor.genres.join(", ")
    );
    println!("Recommendations ({}):", result.recommendations.len());
    for r in &result.recommendations {
        println!(
            "  {:>3}  [{}] {}  rating {:.1}",
            r.similarity_score, r.movie.movie.id, r.movie.movie.title, r.movie.movie.vote_average
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct TitlesConfig {
    pub database_url: Option<String>,
    pub limit: i64,
}

/// Print `id<TAB>title<TAB>release date`, most popular first.
pub async fn run_titles(cfg: TitlesConfig) -> Result<()> {
    let store = super::open_store(cfg.database_url).await?;
    let recommender = Recommender::new(store, RecommendConfig::from_env());
    for t in recommender.list_items_by_popularity(cfg.limit).await? {
        let date = t.release_date.map(|d| d.to_string()).unwrap_or_default();
        println!("{}\t{}\t{}", t.id, t.title, date);
    }
    Ok(())
}
