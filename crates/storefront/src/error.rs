//! Unified error handling with Sentry integration.
//!
//! Provides the `ClientError` type every storefront operation returns, the
//! mapping from an error to the message a shopper sees, and the Sentry
//! helpers used to report transport failures.

use thiserror::Error;

use petalshop_core::{EmailError, PriceError};

use crate::api::ApiError;
use crate::services::auth::TokenError;
use crate::session::SessionError;

/// Shown whenever a user-scoped operation runs with no signed-in shopper.
pub const SIGN_IN_MESSAGE: &str = "Please sign in.";

/// Shown when an order is attempted with nothing in the cart.
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty.";

/// Shown when an order is attempted while another is being submitted.
pub const ORDER_IN_FLIGHT_MESSAGE: &str = "Your order is already being placed.";

/// Shown when the email typed at login is not an address.
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address.";

/// Error type for storefront operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No session identity; the operation was not attempted.
    #[error("not signed in")]
    Unauthenticated,

    /// Order requested with an empty cart; nothing was sent.
    #[error("cart is empty")]
    EmptyCart,

    /// Another order submission has not finished yet.
    #[error("an order is already in flight")]
    OrderInFlight,

    /// Shop API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Persisted session could not be written or removed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Login token could not be decoded.
    #[error("Invalid token: {0}")]
    Token(#[from] TokenError),

    /// Email is not a valid address.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Server sent amounts that cannot be totalled.
    #[error("Invalid amount: {0}")]
    Price(#[from] PriceError),
}

impl ClientError {
    /// The message to show the shopper.
    ///
    /// Server-reported failures show the server's message when it sent a
    /// non-blank one. Everything else that went wrong in transport shows
    /// `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Unauthenticated => SIGN_IN_MESSAGE.to_string(),
            Self::EmptyCart => EMPTY_CART_MESSAGE.to_string(),
            Self::OrderInFlight => ORDER_IN_FLIGHT_MESSAGE.to_string(),
            Self::InvalidEmail(_) => INVALID_EMAIL_MESSAGE.to_string(),
            Self::Api(err) => err.server_message().unwrap_or(fallback).to_string(),
            Self::Session(_) | Self::Token(_) | Self::Price(_) => fallback.to_string(),
        }
    }

    /// Report the error to Sentry if it is worth an event.
    ///
    /// Precondition failures and server rejections are expected outcomes
    /// and only logged.
    pub fn report(&self, action: &str) {
        let reportable = match self {
            Self::Api(err) => err.is_transport(),
            Self::Session(_) | Self::Token(_) | Self::Price(_) => true,
            Self::Unauthenticated
            | Self::EmptyCart
            | Self::OrderInFlight
            | Self::InvalidEmail(_) => false,
        };

        if reportable {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                action,
                sentry_event_id = %event_id,
                "Storefront operation failed"
            );
        } else {
            tracing::warn!(error = %self, action, "Storefront operation rejected");
        }
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Set the Sentry user context from the signed-in shopper.
///
/// Call this after login to associate errors with the shopper.
pub fn set_sentry_user(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(email.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the shopper.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
