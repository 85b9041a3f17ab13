//! OAuth 2.0 authorization infrastructure.
//!
//! Provides the standard and PKCE authorization strategies, the provider adapter
//! contract, the adapter registry, and the Airtable, HubSpot and Notion adapters.

mod pkce;
mod provider;
mod registry;
mod state;
mod strategy;
mod token_exchange;

pub mod providers;

pub use pkce::{PkceChallenge, PkceVerifier, CHALLENGE_METHOD};
pub use provider::{CloseWindow, Provider, ProviderKind};
pub use registry::Registry;
pub use state::{IssuedState, OAuthState, StateManager};
pub use strategy::{
    Authorization, CallbackParams, PkceAuthorization, PkceCallback, PkceStrategy,
    StandardStrategy, Strategy, VerifiedCallback,
};
pub use token_exchange::{ClientAuth, ClientCredentials, TokenEncoding, TokenRequest};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

/// 32 bytes from the OS-seeded thread RNG, base64url-encoded without padding.
pub(crate) fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
