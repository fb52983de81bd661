pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::layout::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/parse", post(handlers::handle_parse))
        .route("/api/v1/layout", post(handlers::handle_layout))
        .route("/api/v1/typeset", post(handlers::handle_typeset))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::sheet::{InlineSheetSource, RawSheet};

    fn test_state() -> AppState {
        let config = Config {
            port: 0,
            rust_log: "info".to_string(),
            sheet_dir: "./sheets".into(),
            spacing_enabled: true,
            spacer_unit_pt: 3.0,
            sheet_font_size_pt: 10.0,
            default_font_size: 10.0,
            spacing_commands: None,
        };
        let source = InlineSheetSource::new().with_sheet(
            "title",
            RawSheet {
                positions: "0,0\n6,0\n".to_string(),
                attributes: "x,5,5,0\n2,3,4,0\n".to_string(),
            },
        );
        AppState {
            settings: Arc::new(config.typeset_settings()),
            sheet_source: Arc::new(source),
        }
    }

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_parse_returns_tree_view() {
        let (status, body) = post_json("/api/v1/parse", json!({ "text": "$e = mc^2$" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rendered_count"], 5);
        assert_eq!(body["single_glyph"], false);
        assert!(body["document"].as_str().unwrap().contains("$e = mc^2$"));
        let compounds = body["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|n| n["kind"] == "compound")
            .count();
        assert_eq!(compounds, 1);
    }

    #[tokio::test]
    async fn test_parse_error_is_unprocessable() {
        let (status, body) = post_json("/api/v1/parse", json!({ "text": "$x" })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNTERMINATED_MATH_MODE");
    }

    #[tokio::test]
    async fn test_layout_with_inline_metrics() {
        let (status, body) = post_json(
            "/api/v1/layout",
            json!({
                "text": "$ab$",
                "font_size": 20.0,
                "positions": "0,0\n5,0\n",
                "attributes": "a,5,5,0\nb,5,5,0\n"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["glyphs"].as_array().unwrap().len(), 2);
        assert_eq!(body["glyphs"][1]["world_rect"]["x"], 15.0);
        assert_eq!(body["sheet"]["width"], 10.0);
    }

    #[tokio::test]
    async fn test_layout_resolves_styles_from_ancestors() {
        let (_, parsed) = post_json("/api/v1/parse", json!({ "text": r"$\frac{a}{b}$" })).await;
        let frac = parsed["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|n| n["form"] == "command")
            .unwrap()["id"]
            .clone();

        let (status, body) = post_json(
            "/api/v1/layout",
            json!({
                "text": r"$\frac{a}{b}$",
                "positions": "0,2\n0,0\n",
                "attributes": "a,1,1,0\nb,1,1,0\n",
                "styles": [{ "node": frac, "bold": true }]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["styles"][0]["bold"], true);
        assert_eq!(body["styles"][1]["bold"], true);
        assert_eq!(body["styles"][1]["italic"], false);
    }

    #[tokio::test]
    async fn test_layout_rejects_unknown_style_node() {
        let (status, _) = post_json(
            "/api/v1/layout",
            json!({
                "text": "a",
                "positions": "0,0\n",
                "attributes": "a,1,1,0\n",
                "styles": [{ "node": 99, "italic": true }]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_layout_count_mismatch() {
        let (status, body) = post_json(
            "/api/v1/layout",
            json!({ "text": "ab", "positions": "0,0\n", "attributes": "a,1,1,0\n" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "METRICS_COUNT_MISMATCH");
    }

    #[tokio::test]
    async fn test_typeset_reports_each_box() {
        let (status, body) = post_json(
            "/api/v1/typeset",
            json!({ "boxes": [
                { "id": "title", "text": "$x^2$" },
                { "id": "missing", "text": "y" }
            ]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results[0]["status"], "ok");
        assert_eq!(results[0]["id"], "title");
        assert_eq!(results[1]["status"], "error");
        assert_eq!(results[1]["code"], "SHEET_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_typeset_rejects_empty_batch() {
        let (status, _) = post_json("/api/v1/typeset", json!({ "boxes": [] })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
