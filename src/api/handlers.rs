// HTTP request handlers for API endpoints

use actix_web::{web, HttpResponse, Result};
use tracing::{error, info};

use crate::api::models::*;
use crate::api::server::AppState;
use crate::error::CatalogError;

fn failure(err: CatalogError) -> HttpResponse {
    match err {
        CatalogError::EmptyQuery => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error("query must not be empty"))
        }
        other => {
            error!(error = %other, "request failed");
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error("internal error"))
        }
    }
}

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let db_status = if state.recommender.store().ping().await {
        "connected"
    } else {
        "disconnected"
    };

    let response = ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        database: db_status.to_string(),
        uptime_seconds: state.started.elapsed().as_secs(),
    });

    Ok(HttpResponse::Ok().json(response))
}

/// Resolve a free-text query to an anchor movie and its most similar titles
pub async fn search(
    params: web::Query<SearchParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let query = params.query.as_deref().unwrap_or_default();
    info!(query, "search requested");

    match state.recommender.resolve_and_rank(query).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => Ok(failure(e)),
    }
}

/// Titles ordered by popularity, for client-side autocomplete
pub async fn list_titles(
    params: web::Query<TitlesParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    match state
        .recommender
        .list_items_by_popularity(params.limit())
        .await
    {
        Ok(titles) => Ok(HttpResponse::Ok().json(ApiResponse::success(titles))),
        Err(e) => Ok(failure(e)),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;

    use super::*;
    use crate::api::routes::configure_routes;
    use crate::recommend::{RecommendConfig, Recommender};
    use crate::test_support::{row, seeded_store};

    async fn state() -> web::Data<AppState> {
        let store = seeded_store(vec![
            row(1, "The Score", 2010, 7.5, 50.0)
                .genres("[{'id': 28, 'name': 'Action'}, {'id': 18, 'name': 'Drama'}]")
                .keywords("[{'id': 1, 'name': 'heist'}]"),
            row(2, "Double Cross", 2012, 7.0, 20.0)
                .genres("[{'id': 28, 'name': 'Action'}, {'id': 18, 'name': 'Drama'}]")
                .keywords("[{'id': 1, 'name': 'heist'}, {'id': 2, 'name': 'twist'}]"),
            row(3, "Lonely Meadow", 1980, 3.0, 2.0),
        ])
        .await;
        web::Data::new(AppState {
            recommender: Recommender::new(store, RecommendConfig::default()),
            started: Instant::now(),
        })
    }

    #[actix_web::test]
    async fn search_returns_anchor_and_scored_recommendations() {
        let app =
            test::init_service(App::new().app_data(state().await).configure(configure_routes))
                .await;

        let req = test::TestRequest::get().uri("/api/search?query=score").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["anchor"]["id"], 1);
        assert_eq!(body["data"]["anchor"]["genres"][0], "Action");
        assert_eq!(body["data"]["recommendations"][0]["id"], 2);
        assert_eq!(body["data"]["recommendations"][0]["similarity_score"], 13);
        assert_eq!(body["data"]["recommendations"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn unmatched_query_yields_null_anchor() {
        let app =
            test::init_service(App::new().app_data(state().await).configure(configure_routes))
                .await;

        let req = test::TestRequest::get().uri("/api/search?query=zzz").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"]["anchor"].is_null());
        assert_eq!(body["data"]["recommendations"], serde_json::json!([]));
    }

    #[actix_web::test]
    async fn blank_or_missing_query_is_a_bad_request() {
        let app =
            test::init_service(App::new().app_data(state().await).configure(configure_routes))
                .await;

        for uri in ["/api/search?query=%20%20", "/api/search"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[actix_web::test]
    async fn titles_are_listed_by_popularity() {
        let app =
            test::init_service(App::new().app_data(state().await).configure(configure_routes))
                .await;

        let req = test::TestRequest::get().uri("/api/movies/titles?limit=2").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let ids: Vec<i64> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[actix_web::test]
    async fn health_reports_database_connectivity() {
        let app =
            test::init_service(App::new().app_data(state().await).configure(configure_routes))
                .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["database"], "connected");
    }

    #[actix_web::test]
    async fn only_api_prefixed_routes_are_served() {
        let app =
            test::init_service(App::new().app_data(state().await).configure(configure_routes))
                .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
