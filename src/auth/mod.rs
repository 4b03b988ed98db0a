//! Credential verification for LoanDesk
//!
//! Callers present an HS256 bearer token whose claims carry the user id and
//! role. Issuing sessions is the identity service's job.

mod jwt;

pub use jwt::{generate_access_token, verify_token, Claims, JwtError, TokenVerifier};
