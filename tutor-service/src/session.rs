//! Session identifier management.
//!
//! Session ids have the shape `session_<unix-millis>_<random suffix>` and are
//! propagated via an explicit body/form field or the `sessionId` cookie; the
//! field wins when both are present.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

/// Cookie carrying the session id between requests.
pub const SESSION_COOKIE: &str = "sessionId";

/// Cookie lifetime.
const SESSION_COOKIE_DAYS: i64 = 7;

/// Length of the random suffix.
const SUFFIX_LEN: usize = 13;

const SUFFIX_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

static SESSION_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^session_\d+_[a-z0-9]+$").expect("session id regex"));

/// Outcome of resolving a session id from a request.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub session_id: String,
    /// Whether the resolved id matches the required pattern.
    pub is_valid: bool,
    /// True iff neither the request field nor the cookie supplied an id.
    pub is_new: bool,
}

/// Generate a fresh session id. Collisions are statistically negligible;
/// there is no uniqueness check against the store.
pub fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARS[rng.gen_range(0..SUFFIX_CHARS.len())] as char)
        .collect();
    format!("session_{}_{}", Utc::now().timestamp_millis(), suffix)
}

pub fn is_valid_session_id(session_id: &str) -> bool {
    SESSION_ID_RE.is_match(session_id)
}

/// Resolve the session id from the explicit request value, the cookie, or a
/// fresh generation, in that order. Never fails; invalid externally supplied
/// ids are reported through `is_valid` for the caller to reject.
pub fn resolve_session(explicit: Option<&str>, jar: &CookieJar) -> ResolvedSession {
    let explicit = explicit.filter(|s| !s.is_empty());
    let from_cookie = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

    let is_new = explicit.is_none() && from_cookie.is_none();
    let session_id = explicit
        .map(str::to_string)
        .or(from_cookie)
        .unwrap_or_else(generate_session_id);
    let is_valid = is_valid_session_id(&session_id);

    ResolvedSession {
        session_id,
        is_valid,
        is_new,
    }
}

/// Build the persistent session cookie. HttpOnly and lax so the browser
/// carries it across navigations during development over plain HTTP.
pub fn session_cookie(session_id: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(false)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_COOKIE_DAYS))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar_with_cookie(session_id: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(SESSION_COOKIE, session_id.to_string()))
    }

    #[test]
    fn generated_ids_match_pattern_and_differ() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert!(is_valid_session_id(&a), "{a}");
        assert!(is_valid_session_id(&b), "{b}");
        assert_ne!(a, b);
    }

    #[test]
    fn validation_accepts_canonical_shape() {
        assert!(is_valid_session_id("session_1699999999999_abc123def"));
    }

    #[test]
    fn validation_rejects_malformed_ids() {
        assert!(!is_valid_session_id("abc"));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("session__abc"));
        assert!(!is_valid_session_id("session_123_ABC"));
        assert!(!is_valid_session_id("session_123_abc extra"));
    }

    #[test]
    fn explicit_value_wins_over_cookie() {
        let jar = jar_with_cookie("session_1_fromcookie");
        let resolved = resolve_session(Some("session_2_frombody"), &jar);
        assert_eq!(resolved.session_id, "session_2_frombody");
        assert!(resolved.is_valid);
        assert!(!resolved.is_new);
    }

    #[test]
    fn empty_explicit_value_falls_back_to_cookie() {
        let jar = jar_with_cookie("session_1_fromcookie");
        let resolved = resolve_session(Some(""), &jar);
        assert_eq!(resolved.session_id, "session_1_fromcookie");
        assert!(!resolved.is_new);
    }

    #[test]
    fn missing_sources_generate_a_new_valid_id() {
        let resolved = resolve_session(None, &CookieJar::new());
        assert!(resolved.is_new);
        assert!(resolved.is_valid);
        assert!(is_valid_session_id(&resolved.session_id));
    }

    #[test]
    fn malformed_external_id_is_reported_not_replaced() {
        let resolved = resolve_session(Some("abc"), &CookieJar::new());
        assert_eq!(resolved.session_id, "abc");
        assert!(!resolved.is_valid);
        assert!(!resolved.is_new);
    }

    #[test]
    fn cookie_attributes() {
        let cookie = session_cookie("session_1_abc");
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "session_1_abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
    }
}
