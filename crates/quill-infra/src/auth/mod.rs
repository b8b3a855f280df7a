//! Credential adapters.

mod jwt;

pub use jwt::{JwtConfig, JwtTokenService};
