//! Rental identifier returned by the checkout endpoint.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a rental created by checkout.
///
/// The endpoint may send the identifier as a JSON string or a JSON integer;
/// both forms are held as a string so they can be spliced into a URL path.
///
/// ```
/// use rink_rental_core::RentalId;
///
/// let from_number: RentalId = serde_json::from_str("42").unwrap();
/// let from_string: RentalId = serde_json::from_str("\"42\"").unwrap();
/// assert_eq!(from_number, from_string);
/// assert_eq!(from_number.as_str(), "42");
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct RentalId(String);

impl RentalId {
    /// Create a rental ID from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty (treated as "no identifier").
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RentalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RentalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Signed(n) => Self(n.to_string()),
            Raw::Unsigned(n) => Self(n.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_integer() {
        let id: RentalId = serde_json::from_str("1234").expect("integer id");
        assert_eq!(id.as_str(), "1234");
    }

    #[test]
    fn test_deserialize_from_string() {
        let id: RentalId = serde_json::from_str("\"R-17\"").expect("string id");
        assert_eq!(id.as_str(), "R-17");
    }

    #[test]
    fn test_deserialize_rejects_other_shapes() {
        assert!(serde_json::from_str::<RentalId>("true").is_err());
        assert!(serde_json::from_str::<RentalId>("{\"id\":1}").is_err());
    }
}
