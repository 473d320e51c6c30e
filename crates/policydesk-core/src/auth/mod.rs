//! Authentication module for managing user sessions.
//!
//! This module provides:
//! - `Session`, `UserIdentity`, `Role`: the signed-in user and their tokens
//! - `TokenStore`: all-or-nothing persistence of the session
//! - `StorageBackend`: the key-value medium behind the store (memory, file, keyring)
//! - `SessionEvaluator`: synchronous authentication and role checks
//! - `AccessClaims`: the unverified payload of an access token

pub mod claims;
pub mod evaluator;
pub mod session;
pub mod storage;
pub mod store;

pub use claims::{decode_claims, AccessClaims, TokenError};
pub use evaluator::SessionEvaluator;
pub use session::{role_matches, Role, Session, UserIdentity};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, StorageBackend, StorageError};
pub use store::TokenStore;
