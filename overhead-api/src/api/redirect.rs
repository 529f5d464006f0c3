//! Map viewer deep links
//!
//! Notification messages link to `/go/{hex}`, which forwards to the
//! configured map viewer. Link-preview fetchers from feed readers are
//! refused so that posting a message does not fan out into a burst of
//! viewer hits.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{ApiError, ApiResult, AppState};

/// GET /go/:code
///
/// 302 to the map viewer for `code`; 403 for blocked user agents; 400 when
/// the code is not plain ASCII alphanumeric.
pub async fn go_to_map(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if let Some(blocked) = state
        .blocked_user_agents
        .iter()
        .find(|blocked| !blocked.is_empty() && user_agent.contains(blocked.as_str()))
    {
        debug!(user_agent, "Refused redirect for {}", blocked);
        return Err(ApiError::Forbidden(format!("User agent not allowed: {}", blocked)));
    }

    if !is_valid_code(&code) {
        return Err(ApiError::BadRequest(format!("Invalid aircraft code: {}", code)));
    }

    let location = format!("{}{}", state.map_viewer_url, code);
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

fn is_valid_code(code: &str) -> bool {
    !code.is_empty() && code.len() <= 16 && code.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_validation() {
        assert!(is_valid_code("7c6b2d"));
        assert!(is_valid_code("VHVXA"));
        assert!(!is_valid_code(""));
        assert!(!is_valid_code("VH-VXA"));
        assert!(!is_valid_code("7c6b2d<script>"));
        assert!(!is_valid_code(&"a".repeat(17)));
    }
}
