//! Core library for policydesk.
//!
//! This crate holds everything the policydesk front ends share:
//!
//! - `auth`: session model, token store, storage media and the session evaluator
//! - `api`: the request pipeline (`ApiClient`) and typed backend services
//! - `routes`: route table and the role-gated route guard
//! - `models`: backend data transfer types
//! - `config`: persisted client configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod routes;

pub use api::{ApiClient, ApiError, ApiRequest};
pub use auth::{Role, Session, SessionEvaluator, TokenStore, UserIdentity};
pub use config::Config;
pub use routes::{GuardDecision, Navigator, Route, RouteGuard, View};
