//! REST API client module for the appointment platform backend.
//!
//! Every backend call goes through `ApiClient`, which attaches the stored
//! bearer token, refreshes it once when the backend answers 401, and replays
//! the call. Concurrent 401s share a single refresh exchange.
//!
//! The HTTP layer sits behind the `Transport` trait so the pipeline can be
//! driven by an in-process fake.

pub mod client;
pub mod error;
pub mod services;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use transport::{ApiRequest, HttpTransport, RawResponse, Transport};
