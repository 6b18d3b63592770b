//! # depot-auth: Token Authorization
//!
//! The fact base for every write decision the repository makes.
//!
//! ## Components
//!
//! - [`TokenStore`]: named tokens persisted as YAML. Only a salted SHA-256
//!   hash of each secret is ever stored. Mutated by administrative commands,
//!   read-only once the server has loaded it.
//! - [`Authenticator`]: verifies a [`Credential`] against the store in
//!   constant time and yields a [`Session`].
//! - [`Session`]: request-scoped capability answering one question: may this
//!   caller write under a given path? The answer is a whole-segment prefix
//!   test, so `/lib` never grants `/library`.
//!
//! Reads are unauthenticated; only deploys and operator endpoints consult
//! this crate.

pub mod authenticator;
pub mod error;
pub mod session;
pub mod store;
pub mod token;

pub use authenticator::{Authenticator, Credential};
pub use error::{AuthError, TokenStoreError};
pub use session::{PermissionPrefix, Session};
pub use store::TokenStore;
pub use token::{generate_secret, SecretHash, Token};
