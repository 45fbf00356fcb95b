use crate::{
    error::ApiError,
    ml::SentenceEncoder,
    models::{SearchRequest, SearchResponse},
    services::RecommendationEngine,
};
use actix_web::{
    web::{self, Json},
    HttpResponse,
};
use tracing::info;

pub fn search_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/search").route(web::post().to(search)));
}

/// Search for movie recommendations. `title` routes to the precomputed
/// similarity matrix; `query` routes to live embedding search. `title`
/// takes precedence when both are present.
pub async fn search(
    request: Json<SearchRequest>,
    engine: web::Data<RecommendationEngine<SentenceEncoder>>,
) -> Result<HttpResponse, ApiError> {
    let top_n = request.n;

    let recommendations = match (&request.title, &request.query) {
        (Some(title), _) if !title.trim().is_empty() => {
            info!("Title-based search for '{}'", title);
            engine.by_title(title, top_n)?
        }
        (_, Some(query)) if !query.trim().is_empty() => {
            info!("Description-based search");
            engine.by_description(query, top_n).await?
        }
        _ => {
            return Err(ApiError::InvalidInput(
                "Either 'title' or 'query' must be provided".to_string(),
            ));
        }
    };

    Ok(HttpResponse::Ok().json(SearchResponse { recommendations }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::tests::catalog_with_embeddings;
    use crate::services::{SimilarityMatrix, TitleMatcher};
    use actix_web::{test, App};
    use std::sync::Arc;

    fn test_engine() -> web::Data<RecommendationEngine<SentenceEncoder>> {
        let catalog = Arc::new(catalog_with_embeddings(vec![
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.0, 1.0],
        ]));
        let similarity = Arc::new(SimilarityMatrix::build(&catalog));
        let encoder = SentenceEncoder::new("test-key").unwrap();
        web::Data::new(
            RecommendationEngine::new(catalog, similarity, encoder, TitleMatcher::default())
                .unwrap(),
        )
    }

    #[actix_web::test]
    async fn title_search_returns_recommendations() {
        let app = test::init_service(
            App::new()
                .app_data(test_engine())
                .configure(search_config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/search")
            .set_json(serde_json::json!({"title": "Movie 0", "n": 2}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: SearchResponse = test::read_body_json(resp).await;
        assert_eq!(body.recommendations.len(), 2);
        assert!(body.recommendations.iter().all(|r| r.title != "Movie 0"));
    }

    #[actix_web::test]
    async fn unknown_title_maps_to_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(test_engine())
                .configure(search_config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/search")
            .set_json(serde_json::json!({"title": "Xyzzyxq Nonexistent Film"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn missing_title_and_query_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(test_engine())
                .configure(search_config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/search")
            .set_json(serde_json::json!({"n": 5}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }
}
