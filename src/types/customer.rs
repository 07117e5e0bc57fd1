use serde::{Deserialize, Serialize};

/// The simulated accounts the backend knows about, as `(id, label)` pairs.
pub const KNOWN_CUSTOMERS: &[(&str, &str)] = &[
    ("user123", "John Doe"),
    ("user456", "Jane Smith"),
    ("guest", "Guest (Unverified)"),
];

/// Identifier of the customer the session speaks for.
///
/// The value is opaque to the client and sent verbatim with every chat turn.
/// Anything outside [`KNOWN_CUSTOMERS`] is still accepted; the backend decides
/// what it means.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Wrap an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The unverified guest identity.
    pub fn guest() -> Self {
        Self::new("guest")
    }

    /// The identifier as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The display label for a known customer.
    pub fn label(&self) -> Option<&'static str> {
        KNOWN_CUSTOMERS
            .iter()
            .find(|(id, _)| *id == self.0)
            .map(|(_, label)| *label)
    }

    /// Returns true for the guest identity.
    pub fn is_guest(&self) -> bool {
        self.0 == "guest"
    }
}

impl Default for CustomerId {
    fn default() -> Self {
        Self::new("user123")
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.label() {
            Some(label) => write!(f, "{label} ({})", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<&str> for CustomerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CustomerId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}
