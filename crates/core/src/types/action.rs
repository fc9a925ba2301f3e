//! Cart actions and the JSON result returned by the background endpoints.

use serde::{Deserialize, Serialize};

use super::rental_id::RentalId;

/// Parsed body of a background cart endpoint.
///
/// Expected shape:
///
/// ```json
/// { "success": true, "login_required": false, "message": "Added!",
///   "cart_html": "<li>...</li>", "rental_id": 42 }
/// ```
///
/// No field is mandatory and each one is read independently: a `null` or
/// oddly typed field falls back to its default instead of rejecting the
/// whole body. Flags follow JavaScript truthiness, and the string accessors
/// treat an empty string the same as an absent field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub login_required: bool,
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub cart_html: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::rental_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub rental_id: Option<RentalId>,
}

impl ActionResult {
    /// Server-supplied message, if present and non-empty.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }

    /// Message to display, falling back to `default`.
    #[must_use]
    pub fn message_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.message().unwrap_or(default)
    }

    /// Replacement cart listing, if provided.
    #[must_use]
    pub fn cart_html(&self) -> Option<&str> {
        self.cart_html.as_deref()
    }

    /// Rental identifier for the post-checkout redirect, if non-empty.
    #[must_use]
    pub fn rental_id(&self) -> Option<&RentalId> {
        self.rental_id.as_ref().filter(|id| !id.is_empty())
    }
}

/// Per-field deserializers that never fail on a well-formed JSON value.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::RentalId;

    /// Truthiness of any JSON value; `null` is `false`.
    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => false,
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        })
    }

    /// Scalars as text; `null`, arrays and objects as absent.
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        })
    }

    pub fn rental_id<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<RentalId>, D::Error> {
        Ok(text(deserializer)?.map(RentalId::new))
    }
}

/// One of the three intercepted cart actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartAction {
    AddToCart,
    RemoveFromCart,
    Checkout,
}

impl CartAction {
    /// Message shown when the response body cannot be parsed.
    #[must_use]
    pub const fn malformed_message(self) -> &'static str {
        match self {
            Self::AddToCart => "Server response error",
            Self::RemoveFromCart | Self::Checkout => "Server error",
        }
    }

    /// Message shown when the request never completed.
    #[must_use]
    pub const fn network_message(self) -> &'static str {
        "Network error"
    }

    /// Default message when the server asks the user to log in.
    #[must_use]
    pub const fn login_message(self) -> &'static str {
        "Please login to continue"
    }

    /// Default message on success.
    #[must_use]
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::AddToCart => "Added to cart",
            Self::RemoveFromCart => "Removed",
            Self::Checkout => "Checkout success",
        }
    }

    /// Default message on failure (HTTP status or `success: false`).
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        "Error"
    }
}

impl std::fmt::Display for CartAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AddToCart => write!(f, "add_to_cart"),
            Self::RemoveFromCart => write!(f, "remove_from_cart"),
            Self::Checkout => write!(f, "checkout"),
        }
    }
}
