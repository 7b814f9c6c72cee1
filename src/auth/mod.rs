//! Bearer-credential session: client-credentials exchange, unverified expiry
//! reading and single-flight refresh.

pub mod claims;
pub mod exchange;
pub mod session;

pub use exchange::{ClientCredentials, CredentialExchange};
pub use session::{AuthSession, BearerToken};
