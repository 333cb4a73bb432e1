//! Token validation for the external auth collaborator.

mod jwt;

pub use jwt::{JwtConfig, JwtTokenService};
