use axum::Json;
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Liveness probe. Never touches the database.
pub async fn root() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Server is running smoothly",
        timestamp: OffsetDateTime::now_utc(),
    })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use time::format_description::well_known::Rfc3339;
    use tower::ServiceExt;

    use super::*;
    use crate::{app::build_app, state::AppState};

    #[tokio::test]
    async fn root_reports_current_timestamp_even_when_store_is_down() {
        let app = build_app(AppState::fake_unavailable());
        let before = OffsetDateTime::now_utc();

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Server is running smoothly");

        let ts = OffsetDateTime::parse(body["timestamp"].as_str().unwrap(), &Rfc3339).unwrap();
        assert!(ts >= before - time::Duration::seconds(1));
        assert!(ts <= OffsetDateTime::now_utc());
    }
}
