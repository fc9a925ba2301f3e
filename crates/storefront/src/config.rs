//! Interceptor configuration loaded from environment variables.
//!
//! Every endpoint path and element identifier the interceptors rely on is
//! deployment-specific, so all of them are configurable.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `RINK_BASE_URL` - Origin the relative endpoints resolve against (default: `http://127.0.0.1:8000`)
//! - `RINK_CSRF_COOKIE` - Cookie holding the anti-forgery token (default: `csrftoken`)
//! - `RINK_CSRF_HEADER` - Header the token is echoed in (default: `X-CSRFToken`)
//! - `RINK_ADD_PATH_FROM` - Form action segment to rewrite (default: `/cart/add/`)
//! - `RINK_ADD_PATH_TO` - Background replacement segment (default: `/cart/add-ajax/`)
//! - `RINK_REMOVE_PATH_TEMPLATE` - Remove endpoint, `{id}` is the item (default: `/rental/cart/remove-ajax/{id}/`)
//! - `RINK_CHECKOUT_PATH` - Checkout endpoint (default: `/rental/checkout-ajax/`)
//! - `RINK_CHECKOUT_SUCCESS_TEMPLATE` - Redirect after checkout, `{id}` is the rental (default: `/rental/checkout/{id}/success/`)
//! - `RINK_CHECKOUT_FALLBACK` - Redirect when no rental ID is returned (default: `#`)
//! - `RINK_CART_CONTAINER_ID` - Element replaced by `cart_html` (default: `cart-items`)
//! - `RINK_CART_ITEM_CLASS` - Class of the node removed on remove (default: `cart-item`)
//! - `RINK_TOAST_DURATION_MS` - Toast visibility in milliseconds (default: 3000)
//! - `RINK_STATUS_POLICY` - `status-first` or `body-only` (default: `status-first`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TOAST_DURATION_MS: u64 = 3000;

/// Placeholder replaced by an identifier in path templates.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// How a response's HTTP status is weighed against its JSON body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// A non-2xx status is a failure regardless of the body.
    #[default]
    StatusFirst,
    /// Only the body's flags decide the outcome.
    BodyOnly,
}

impl std::str::FromStr for StatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status-first" => Ok(Self::StatusFirst),
            "body-only" => Ok(Self::BodyOnly),
            _ => Err(format!("expected `status-first` or `body-only`, got `{s}`")),
        }
    }
}

/// Interceptor configuration.
#[derive(Debug, Clone)]
pub struct EnhanceConfig {
    /// Origin that relative endpoint paths resolve against
    pub base_url: Url,
    /// Cookie holding the CSRF token
    pub csrf_cookie: String,
    /// Request header carrying the CSRF token
    pub csrf_header: String,
    /// Add-to-cart endpoint rewriting
    pub add_path_from: String,
    pub add_path_to: String,
    /// Remove endpoint template (`{id}` is the cart item)
    pub remove_path_template: String,
    /// Checkout endpoint
    pub checkout_path: String,
    /// Post-checkout redirect template (`{id}` is the rental)
    pub checkout_success_template: String,
    /// Post-checkout redirect when no rental ID is returned
    pub checkout_fallback: String,
    /// Element whose contents are replaced by `cart_html`
    pub cart_container_id: String,
    /// Class of the enclosing node removed after a successful remove
    pub cart_item_class: String,
    /// How long a toast stays visible
    pub toast_duration: Duration,
    /// Status handling shared by all interceptors
    pub status_policy: StatusPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl Default for EnhanceConfig {
    /// Documented defaults for every setting.
    ///
    /// # Panics
    ///
    /// Never in practice: `DEFAULT_BASE_URL` is a constant, valid URL.
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            csrf_cookie: "csrftoken".to_string(),
            csrf_header: "X-CSRFToken".to_string(),
            add_path_from: "/cart/add/".to_string(),
            add_path_to: "/cart/add-ajax/".to_string(),
            remove_path_template: "/rental/cart/remove-ajax/{id}/".to_string(),
            checkout_path: "/rental/checkout-ajax/".to_string(),
            checkout_success_template: "/rental/checkout/{id}/success/".to_string(),
            checkout_fallback: "#".to_string(),
            cart_container_id: "cart-items".to_string(),
            cart_item_class: "cart-item".to_string(),
            toast_duration: Duration::from_millis(DEFAULT_TOAST_DURATION_MS),
            status_policy: StatusPolicy::StatusFirst,
            sentry_dsn: None,
        }
    }
}

impl EnhanceConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let base_url = get_env_or_default("RINK_BASE_URL", DEFAULT_BASE_URL);
        let base_url = Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("RINK_BASE_URL".to_string(), e.to_string()))?;

        let toast_ms = get_env_or_default(
            "RINK_TOAST_DURATION_MS",
            &DEFAULT_TOAST_DURATION_MS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("RINK_TOAST_DURATION_MS".to_string(), e.to_string())
        })?;

        let status_policy = get_optional_env("RINK_STATUS_POLICY")
            .map(|v| v.parse::<StatusPolicy>())
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("RINK_STATUS_POLICY".to_string(), e))?
            .unwrap_or_default();

        let remove_path_template =
            get_env_or_default("RINK_REMOVE_PATH_TEMPLATE", &defaults.remove_path_template);
        require_placeholder("RINK_REMOVE_PATH_TEMPLATE", &remove_path_template)?;
        let checkout_success_template = get_env_or_default(
            "RINK_CHECKOUT_SUCCESS_TEMPLATE",
            &defaults.checkout_success_template,
        );
        require_placeholder("RINK_CHECKOUT_SUCCESS_TEMPLATE", &checkout_success_template)?;

        Ok(Self {
            base_url,
            csrf_cookie: get_env_or_default("RINK_CSRF_COOKIE", &defaults.csrf_cookie),
            csrf_header: get_env_or_default("RINK_CSRF_HEADER", &defaults.csrf_header),
            add_path_from: get_env_or_default("RINK_ADD_PATH_FROM", &defaults.add_path_from),
            add_path_to: get_env_or_default("RINK_ADD_PATH_TO", &defaults.add_path_to),
            remove_path_template,
            checkout_path: get_env_or_default("RINK_CHECKOUT_PATH", &defaults.checkout_path),
            checkout_success_template,
            checkout_fallback: get_env_or_default(
                "RINK_CHECKOUT_FALLBACK",
                &defaults.checkout_fallback,
            ),
            cart_container_id: get_env_or_default(
                "RINK_CART_CONTAINER_ID",
                &defaults.cart_container_id,
            ),
            cart_item_class: get_env_or_default("RINK_CART_ITEM_CLASS", &defaults.cart_item_class),
            toast_duration: Duration::from_millis(toast_ms),
            status_policy,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }

    /// Remove endpoint for a cart item.
    #[must_use]
    pub fn remove_path(&self, item_id: &str) -> String {
        fill_template(&self.remove_path_template, item_id)
    }

    /// Post-checkout redirect for a rental.
    #[must_use]
    pub fn checkout_success_path(&self, rental_id: &str) -> String {
        fill_template(&self.checkout_success_template, rental_id)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Substitute a percent-encoded identifier into a path template.
fn fill_template(template: &str, id: &str) -> String {
    template.replace(ID_PLACEHOLDER, &urlencoding::encode(id))
}

/// Reject templates that would silently drop the identifier.
fn require_placeholder(key: &str, template: &str) -> Result<(), ConfigError> {
    if template.contains(ID_PLACEHOLDER) {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("template must contain {ID_PLACEHOLDER}"),
        ))
    }
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
