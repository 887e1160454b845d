//! The signed-in shopper's identity.

use serde::{Deserialize, Serialize};

use crate::types::Email;

/// Who is using this client, as established by the last successful login.
///
/// The email doubles as the user identifier on every user-scoped API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl SessionIdentity {
    /// Identity with no display name parts.
    #[must_use]
    pub const fn new(email: Email) -> Self {
        Self {
            email,
            first_name: None,
            last_name: None,
        }
    }

    /// The identifier sent as `username` to the shop API.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.email.as_str()
    }

    /// "First Last" for the header, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            self.email.to_string()
        } else {
            parts.join(" ")
        }
    }
}
