use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue},
};
use uuid::Uuid;

const COOKIE_NAME: &str = "session_id";

/// Per-client identity carried in a cookie; a fresh id is issued when the
/// request does not present one.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

impl SessionId {
    /// `Set-Cookie` value re-issuing this id.
    pub fn cookie(&self) -> HeaderValue {
        let value = format!("{COOKIE_NAME}={}; Path=/; HttpOnly", self.0);
        HeaderValue::from_str(&value)
            .unwrap_or_else(|_| HeaderValue::from_static("session_id=invalid; Path=/"))
    }
}

impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let existing = parts
            .headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(find_session_cookie);

        Ok(Self(
            existing.unwrap_or_else(|| Uuid::new_v4().to_string()),
        ))
    }
}

fn find_session_cookie(cookies: &str) -> Option<String> {
    cookies.split(';').find_map(|cookie| {
        cookie
            .trim()
            .strip_prefix(COOKIE_NAME)
            .and_then(|rest| rest.strip_prefix('='))
            .filter(|id| !id.is_empty())
            .map(ToString::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_session_cookie_among_others() {
        let id = find_session_cookie("theme=dark; session_id=abc-123; lang=ko");
        assert_eq!(id.as_deref(), Some("abc-123"));
    }

    #[test]
    fn missing_or_empty_cookie_yields_none() {
        assert!(find_session_cookie("theme=dark").is_none());
        assert!(find_session_cookie("session_id=").is_none());
    }

    #[test]
    fn cookie_header_round_trips_the_id() {
        let session = SessionId("abc-123".into());
        let header = session.cookie();
        let value = header.to_str().expect("header value");
        assert!(value.starts_with("session_id=abc-123"));
        assert!(value.contains("HttpOnly"));
    }
}
