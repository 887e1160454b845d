//! Authentication service.
//!
//! Signs the shopper in and out and registers new accounts. A successful
//! login stores the identity read from the token in the session context,
//! which every user-scoped component reads from.

mod token;

pub use token::{TokenClaims, TokenError};

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{info, instrument};

use petalshop_core::{Email, SessionIdentity};

use crate::api::{ApiError, CommerceApi, LoginRequest, RegisterRequest};
use crate::error::{ClientError, Result, clear_sentry_user, set_sentry_user};
use crate::navigation::{Navigator, Route, navigate_after};
use crate::notify::Notifier;
use crate::session::SessionContext;

pub const LOGIN_OK_MESSAGE: &str = "Login successful!";
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";
pub const REGISTER_OK_MESSAGE: &str = "Registration successful!";
pub const REGISTER_FAILED_MESSAGE: &str = "Registration failed. Please try again.";

/// Authentication service.
pub struct AuthService {
    api: Arc<dyn CommerceApi>,
    session: SessionContext,
    notifier: Notifier,
    navigator: Arc<dyn Navigator>,
    redirect_delay: Duration,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(
        api: Arc<dyn CommerceApi>,
        session: SessionContext,
        notifier: Notifier,
        navigator: Arc<dyn Navigator>,
        redirect_delay: Duration,
    ) -> Self {
        Self {
            api,
            session,
            notifier,
            navigator,
            redirect_delay,
        }
    }

    /// Log in with email and password.
    ///
    /// The identity comes from the token's claims; the typed email stands in
    /// when the server sends no token or no email claim.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` if the server refused the credentials or
    /// could not be reached, `ClientError::Token` if the token cannot be
    /// read, `ClientError::InvalidEmail` if no usable email is available,
    /// or `ClientError::Session` if the session cannot be persisted.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: SecretString) -> Result<SessionIdentity> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password,
        };

        let response = self
            .api
            .login(&request)
            .await
            .map_err(|e| self.fail(e.into(), LOGIN_FAILED_MESSAGE, "auth.login"))?;

        if !response.success {
            let err = ClientError::from(ApiError::Rejected {
                message: response.message,
            });
            return Err(self.fail(err, LOGIN_FAILED_MESSAGE, "auth.login"));
        }

        let identity = match response.token.as_deref() {
            Some(token) => identity_from_token(token, &request.email),
            None => Email::parse(&request.email)
                .map(SessionIdentity::new)
                .map_err(ClientError::from),
        }
        .map_err(|e| self.fail(e, LOGIN_FAILED_MESSAGE, "auth.login"))?;

        self.session
            .sign_in(identity.clone())
            .map_err(|e| self.fail(e.into(), LOGIN_FAILED_MESSAGE, "auth.login"))?;
        set_sentry_user(identity.user_id());
        info!(user = %identity.email, "Signed in");

        self.notifier
            .success(non_blank(response.message).unwrap_or_else(|| LOGIN_OK_MESSAGE.to_string()));
        navigate_after(Arc::clone(&self.navigator), Route::Catalog, self.redirect_delay);

        Ok(identity)
    }

    /// Create an account. Does not sign in.
    ///
    /// Returns the message shown to the shopper.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` if the server refused the registration or
    /// could not be reached.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<String> {
        let response = self
            .api
            .register(&request)
            .await
            .map_err(|e| self.fail(e.into(), REGISTER_FAILED_MESSAGE, "auth.register"))?;

        if !response.success {
            let err = ClientError::from(ApiError::Rejected {
                message: response.message,
            });
            return Err(self.fail(err, REGISTER_FAILED_MESSAGE, "auth.register"));
        }

        let message =
            non_blank(response.message).unwrap_or_else(|| REGISTER_OK_MESSAGE.to_string());
        self.notifier.success(message.clone());
        navigate_after(Arc::clone(&self.navigator), Route::Catalog, self.redirect_delay);

        Ok(message)
    }

    /// Forget the signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Session` if the persisted session cannot be
    /// removed.
    pub fn logout(&self) -> Result<()> {
        self.session.sign_out()?;
        clear_sentry_user();
        info!("Signed out");
        Ok(())
    }

    fn fail(&self, err: ClientError, fallback: &str, action: &str) -> ClientError {
        self.notifier.failure(err.user_message(fallback));
        err.report(action);
        err
    }
}

/// Build the session identity from a login token.
fn identity_from_token(token: &str, typed_email: &str) -> Result<SessionIdentity> {
    let claims = TokenClaims::decode(token)?;
    let email = non_blank(claims.email).unwrap_or_else(|| typed_email.to_string());

    Ok(SessionIdentity {
        email: Email::parse(&email)?,
        first_name: non_blank(claims.first_name),
        last_name: non_blank(claims.last_name),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
