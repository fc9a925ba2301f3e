//! Cookie lookup for the anti-forgery token.
//!
//! The token is read from the page's cookie string on every request; it is
//! never cached, so a rotated token is picked up immediately.

use secrecy::{ExposeSecret, SecretString};

/// Look up a cookie by name in a `Cookie`-header style string.
///
/// Pairs are separated by `;` and surrounding whitespace is ignored. The
/// first pair whose name matches exactly wins, and its value is
/// percent-decoded (an invalid escape sequence leaves the raw value).
///
/// An empty cookie string or an unknown name yields `None`.
///
/// ```
/// use rink_rental_storefront::get_cookie;
///
/// let cookies = "sessionid=abc; csrftoken=t%20k";
/// assert_eq!(get_cookie(cookies, "csrftoken").as_deref(), Some("t k"));
/// assert_eq!(get_cookie(cookies, "missing"), None);
/// assert_eq!(get_cookie("", "csrftoken"), None);
/// ```
#[must_use]
pub fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }

    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            pair.strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .map(|raw| {
            urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |value| value.into_owned())
        })
}

/// CSRF token echoed back on every mutating request.
///
/// Implements `Debug` manually to redact the value.
#[derive(Clone)]
pub struct CsrfToken(SecretString);

impl CsrfToken {
    /// Read the token from a cookie string.
    #[must_use]
    pub fn from_cookies(cookie_header: &str, cookie_name: &str) -> Option<Self> {
        get_cookie(cookie_header, cookie_name).map(|value| Self(SecretString::from(value)))
    }

    /// Token value, for placing in a request header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CsrfToken([REDACTED])")
    }
}
