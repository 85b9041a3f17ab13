//! Provider credential shapes and their single-read handoff.

mod storage;
mod types;

pub use storage::CredentialStore;
pub use types::{parse, AirtableCredentials, HubSpotCredentials, NotionCredentials};
