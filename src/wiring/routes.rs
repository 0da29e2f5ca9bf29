//! SBI route groups: access token, discovery, management.
//!
//! Request handling lives in the NF services themselves; these groups only
//! reserve the paths and answer with a problem document until then.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::observability::logging::OPENAPI_TARGET;

/// RFC 7807 problem document.
#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    pub title: &'static str,
    pub status: u16,
    pub detail: String,
    pub cause: &'static str,
}

async fn not_implemented(service: &'static str) -> Response {
    tracing::debug!(target: OPENAPI_TARGET, service, "Request to unimplemented operation");
    let problem = ProblemDetails {
        title: "Not Implemented",
        status: StatusCode::NOT_IMPLEMENTED.as_u16(),
        detail: format!("{service} operation is not served by this instance"),
        cause: "NOT_IMPLEMENTED",
    };
    (StatusCode::NOT_IMPLEMENTED, Json(problem)).into_response()
}

pub fn access_token() -> Router {
    Router::new().route("/oauth2/token", post(|| not_implemented("nnrf-oauth2")))
}

pub fn discovery() -> Router {
    Router::new().route("/nnrf-disc/v1/nf-instances", get(|| not_implemented("nnrf-disc")))
}

pub fn management() -> Router {
    let handler = || not_implemented("nnrf-nfm");
    Router::new()
        .route("/nnrf-nfm/v1/nf-instances", get(handler))
        .route(
            "/nnrf-nfm/v1/nf-instances/{nfInstanceID}",
            get(handler).put(handler).patch(handler).delete(handler),
        )
        .route("/nnrf-nfm/v1/subscriptions", post(handler))
        .route(
            "/nnrf-nfm/v1/subscriptions/{subscriptionID}",
            axum::routing::patch(handler).delete(handler),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    async fn status_of(router: Router, method: Method, uri: &str) -> StatusCode {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        router.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_groups_reserve_their_paths() {
        assert_eq!(status_of(access_token(), Method::POST, "/oauth2/token").await, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(
            status_of(discovery(), Method::GET, "/nnrf-disc/v1/nf-instances").await,
            StatusCode::NOT_IMPLEMENTED
        );
        assert_eq!(
            status_of(management(), Method::DELETE, "/nnrf-nfm/v1/nf-instances/abc").await,
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        assert_eq!(status_of(discovery(), Method::GET, "/nnrf-disc/v2/x").await, StatusCode::NOT_FOUND);
    }
}
