use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::context::SessionContext;
use crate::session::SessionVerifier;

#[derive(Clone)]
pub struct SessionState {
    pub verifier: Arc<dyn SessionVerifier>,
}

/// Resolve the request's identity and insert a [`SessionContext`].
///
/// Guests are first-class subjects here: a missing, malformed, or expired
/// token does not fail the request, it downgrades it to the guest context
/// (zero access). Guards further in decide what guests may reach.
pub async fn session_middleware(
    State(state): State<SessionState>,
    mut req: Request,
    next: Next,
) -> Response {
    let context = match bearer_token(req.headers()) {
        Some(token) => match state.verifier.verify(token, Utc::now()) {
            Ok(claims) => SessionContext::authenticated(claims.sub, claims.role),
            Err(err) => {
                tracing::warn!(%err, "session token rejected; continuing as guest");
                SessionContext::guest()
            }
        },
        None => SessionContext::guest(),
    };

    req.extensions_mut().insert(context);
    next.run(req).await
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;

    #[test]
    fn bearer_token_strips_the_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_or_empty_tokens_yield_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwdw==".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
