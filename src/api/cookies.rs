use std::sync::Arc;

use percent_encoding::percent_decode_str;
use reqwest::cookie::{CookieStore, Jar};
use url::Url;

use crate::error::Result;

/// Cookie the backend uses to hand out the anti-forgery token.
pub const CSRF_COOKIE_NAME: &str = "csrf_token";

/// Look up `name` in a `Cookie` header value (`a=1; b=2`).
///
/// The first pair with a matching name wins. Values are percent-decoded;
/// a value that does not decode to UTF-8 is returned as-is.
pub fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split("; ")
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| {
            percent_decode_str(value)
                .decode_utf8()
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
}

/// Session cookies held for the API origin.
///
/// The jar is shared with the HTTP client, so cookies set by the backend
/// (session, CSRF) are visible here and sent back on every request.
#[derive(Clone)]
pub struct SessionCookies {
    jar: Arc<Jar>,
    url: Url,
}

impl SessionCookies {
    pub fn new(api_base_url: &str) -> Result<Self> {
        Ok(Self {
            jar: Arc::new(Jar::default()),
            url: Url::parse(api_base_url)?,
        })
    }

    pub fn jar(&self) -> Arc<Jar> {
        self.jar.clone()
    }

    /// Store a `Set-Cookie` style string for the API origin.
    pub fn set(&self, cookie: &str) {
        self.jar.add_cookie_str(cookie, &self.url);
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.url)?;
        get_cookie(header.to_str().ok()?, name)
    }

    pub fn csrf_token(&self) -> Option<String> {
        self.get(CSRF_COOKIE_NAME)
    }

    /// Expire the CSRF cookie.
    pub fn clear_csrf(&self) {
        self.set(&format!(
            "{}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            CSRF_COOKIE_NAME
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("csrf_token=abc", "csrf_token", Some("abc"))]
    #[case("session=s1; csrf_token=abc", "csrf_token", Some("abc"))]
    #[case("session=s1; csrf_token=abc", "missing", None)]
    #[case("", "csrf_token", None)]
    #[case("csrf_token=a%20b%2Fc", "csrf_token", Some("a b/c"))]
    #[case("token=a=b=c", "token", Some("a=b=c"))]
    #[case("csrf_token=first; csrf_token=second", "csrf_token", Some("first"))]
    #[case("xcsrf_token=nope; csrf_token=yes", "csrf_token", Some("yes"))]
    fn test_get_cookie(#[case] header: &str, #[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(get_cookie(header, name).as_deref(), expected);
    }

    #[test]
    fn test_invalid_utf8_escape_returns_raw_value() {
        assert_eq!(get_cookie("t=%FF", "t").as_deref(), Some("%FF"));
    }

    #[test]
    fn test_percent_encoding_round_trips() {
        let original = "tök=n; with spaces/&";
        let encoded =
            percent_encoding::utf8_percent_encode(original, percent_encoding::NON_ALPHANUMERIC)
                .to_string();
        let header = format!("csrf_token={}", encoded);
        assert_eq!(get_cookie(&header, "csrf_token").as_deref(), Some(original));
    }

    #[test]
    fn test_session_cookies_read_from_jar() {
        let cookies = SessionCookies::new("http://portal.test").unwrap();
        assert_eq!(cookies.csrf_token(), None);

        cookies.set("csrf_token=tok%2B1; Path=/");
        assert_eq!(cookies.csrf_token().as_deref(), Some("tok+1"));
    }

    #[test]
    fn test_clear_csrf_expires_cookie() {
        let cookies = SessionCookies::new("http://portal.test").unwrap();
        cookies.set("csrf_token=abc; Path=/");
        cookies.set("session=s1; Path=/");

        cookies.clear_csrf();
        assert_eq!(cookies.csrf_token(), None);
        assert_eq!(cookies.get("session").as_deref(), Some("s1"));
    }
}
