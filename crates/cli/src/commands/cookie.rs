//! Cookie lookup command.
//!
//! # Usage
//!
//! ```bash
//! rink-cli --cookies "csrftoken=abc%20def; sessionid=xyz" cookie csrftoken
//! ```

use rink_rental_storefront::{EnhanceConfig, get_cookie};

/// Report the decoded value of cookie `name`.
pub fn show(config: &EnhanceConfig, cookies: &str, name: &str) {
    match get_cookie(cookies, name) {
        Some(value) => tracing::info!(name, %value, "Cookie found"),
        None => tracing::info!(name, "Cookie not set"),
    }

    if name != config.csrf_cookie {
        tracing::debug!(csrf_cookie = %config.csrf_cookie, "Interceptors read a different cookie");
    }
}
