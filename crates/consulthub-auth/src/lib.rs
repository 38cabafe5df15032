//! # consulthub-auth
//!
//! Verifies access tokens issued by the account service and turns them
//! into an [`Identity`]. Token issuance and credential checks live outside
//! this workspace; [`JwtEncoder`] exists for local tooling and tests.

pub mod identity;
pub mod jwt;

pub use identity::Identity;
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
