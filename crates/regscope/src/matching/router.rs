use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::catalog::RuleStore;
use super::profile::BusinessProfile;
use super::service::RuleMatcher;

/// Router exposing rule matching over HTTP.
pub fn match_router<S>(matcher: Arc<RuleMatcher<S>>) -> Router
where
    S: RuleStore + 'static,
{
    Router::new()
        .route("/api/v1/match", post(match_handler::<S>))
        .with_state(matcher)
}

pub(crate) async fn match_handler<S>(
    State(matcher): State<Arc<RuleMatcher<S>>>,
    axum::Json(profile): axum::Json<BusinessProfile>,
) -> Response
where
    S: RuleStore + 'static,
{
    match matcher.match_profile(&profile) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => {
            tracing::error!(%error, "rule matching failed");
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
