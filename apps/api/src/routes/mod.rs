pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

/// Uploaded resumes may exceed axum's default 2 MB body limit.
const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/roles", get(handlers::handle_list_roles))
        .route("/api/v1/anonymize", post(handlers::handle_anonymize))
        .route("/api/v1/screen", post(handlers::handle_screen))
        .route("/api/v1/screen/batch", post(handlers::handle_screen_batch))
        .route(
            "/api/v1/screen/upload",
            post(handlers::handle_screen_upload).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::screening::judge::DisabledJudge;
    use crate::test_support::screener;

    fn app() -> Router {
        let config = Config::from_lookup(|_| None).unwrap();
        build_router(AppState {
            screener: Arc::new(screener(Arc::new(DisabledJudge))),
            config,
        })
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_roles() {
        let (status, body) =
            send(Request::get("/api/v1/roles").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roles"][0]["name"], "Backend Developer");
        assert_eq!(body["judge_backend"], "disabled");
    }

    #[tokio::test]
    async fn test_anonymize_endpoint() {
        let (status, body) = send(post_json(
            "/api/v1/anonymize",
            json!({"text": "Name: Jane Doe\nEmail jane@acme.com\nSkills\nPython"}),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        let text = body["text"].as_str().unwrap();
        assert!(!text.contains("Jane"));
        assert!(!text.contains("jane@acme.com"));
        assert_eq!(body["redactions"]["email"], 1);
        assert_eq!(body["sections"][1]["label"], "skills");
    }

    #[tokio::test]
    async fn test_screen_reference_example() {
        let (status, body) = send(post_json(
            "/api/v1/screen",
            json!({
                "text": "Contact: jane@acme.com, +1-555-0100. Skills: Python, SQL. Studied at Elite University.",
                "role": "Backend Developer"
            }),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["best"]["decision"]["decision"], "hire");
        assert_eq!(body["best"]["decision"]["signal"], "skills-only fallback");
        assert_eq!(body["best"]["decision"]["skills"]["missing"][0]["skill"], "Docker");
    }

    #[tokio::test]
    async fn test_screen_rejects_empty_text() {
        let (status, body) = send(post_json(
            "/api/v1/screen",
            json!({"text": "   ", "role": "Backend Developer"}),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_batch_endpoint_counts_decisions() {
        let (status, body) = send(post_json(
            "/api/v1/screen/batch",
            json!({"items": [
                {"text": "Skills\nPython, SQL, Docker", "role": "Backend Developer"},
                {"text": "Skills\nWatercolour", "role": "Backend Developer"}
            ]}),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["decisions"]["hire"], 1);
        assert_eq!(body["decisions"]["do_not_hire"], 1);
        assert_eq!(body["decisions"]["needs_review"], 0);
    }

    #[tokio::test]
    async fn test_upload_plain_text() {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"role\"\r\n\r\nEnglish Teacher\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cv.txt\"\r\n\
             Content-Type: text/plain\r\n\r\nSkills\nEnglish, lesson plans, classroom management\r\n\
             --{b}--\r\n",
            b = boundary
        );
        let request = Request::post("/api/v1/screen/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["best"]["decision"]["coverage"], 1.0);
    }

    #[tokio::test]
    async fn test_upload_unsupported_type() {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"role\"\r\n\r\nEnglish Teacher\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cv.docx\"\r\n\
             Content-Type: application/octet-stream\r\n\r\nPK\r\n\
             --{b}--\r\n",
            b = boundary
        );
        let request = Request::post("/api/v1/screen/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    }
}
