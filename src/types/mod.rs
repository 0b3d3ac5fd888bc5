//! Public types for the Muninn API.

mod provider;
mod request;
mod result;

pub use provider::{ProviderResult, ProviderStatus};
pub use request::{ResolutionMode, ResolveOptions, normalize_query};
pub use result::{Candidate, ErrorCode, ResolutionError, ResolutionResult, ResolvedTicker};
