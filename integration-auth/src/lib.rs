//! # integration-auth
//!
//! OAuth 2.0 brokering for third-party SaaS integrations (Airtable, HubSpot, Notion):
//! - Short-lived state, PKCE verifier and credential bookkeeping in a TTL key-value store
//! - Standard and PKCE authorization strategies with anti-CSRF state validation
//! - A uniform provider adapter contract and a name-keyed registry of adapters
//! - Normalization of each provider's resource listing into [`item::IntegrationItem`]
//!
//! ## Architecture
//!
//! The request layer (`web`) resolves an adapter from the [`oauth::Registry`] by provider
//! name and calls one of its four operations. Adapters delegate state handling to their
//! [`oauth::Strategy`], perform the provider-specific token exchange, and hand credentials
//! to the caller exactly once through [`credentials::CredentialStore`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use integration_auth::{
//!     oauth::{providers::airtable, Registry},
//!     store::MemoryStore,
//! };
//! ```

pub mod credentials;
pub mod error;
pub mod http;
pub mod item;
pub mod oauth;
pub mod store;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
