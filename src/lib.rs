//! Client for the tokenizer service.
//!
//! Converts sensitive data into opaque tokens under generation policies, and
//! resolves or reverse-looks-up those tokens under access policies. The bearer
//! credential is obtained with a client-credentials grant and refreshed
//! transparently; every failure is surfaced as a [`TokenizerError`].

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod executor;
pub mod models;
pub mod policies;
pub mod policy_store;
pub mod tokens;

pub use client::TokenizerClient;
pub use config::ClientConfig;
pub use errors::{ApiFailure, ErrorKind, TokenizerError};
pub use models::{AccessPolicy, GenerationPolicy, InspectTokenResponse, ResolutionContext};
pub use policy_store::PolicyStore;
pub use tokens::TokenOperations;
