pub mod policy;
pub mod token;
pub(crate) mod wire;

pub use policy::{AccessPolicy, GenerationPolicy};
pub use token::{InspectTokenResponse, ResolutionContext};
