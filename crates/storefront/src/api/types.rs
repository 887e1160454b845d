//! Request and response bodies for the shop API.
//!
//! Catalog, cart and order payloads decode straight into the
//! `petalshop_core` types; only the envelopes live here.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use petalshop_core::{CartId, ProductId};

// =============================================================================
// Cart & Order Requests
// =============================================================================

/// Body of `POST /cart/add` and `POST /cart/remove`.
#[derive(Debug, Clone, Serialize)]
pub struct CartMutation<'a> {
    pub username: &'a str,
    #[serde(rename = "flowerId")]
    pub product_id: ProductId,
}

/// Body of `POST /order/create`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrder<'a> {
    pub username: &'a str,
    #[serde(rename = "cartId")]
    pub cart_id: CartId,
}

/// What a mutation endpoint said back. The body is optional; when it is a
/// JSON object its `message` is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Auth
// =============================================================================

/// Body of `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
}

/// Answer to `POST /auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Answer to `POST /auth/register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error envelope some endpoints send with a non-success status.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

fn serialize_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
