//! Data models for the appointment platform backend.
//!
//! This module contains the wire types exchanged with the backend:
//!
//! - Auth types: `Credentials`, `RegisterRequest`, `AuthResponse`
//! - `Agent`: agent directory entries
//! - `Appointment`, `AppointmentRequest`: bookings and their lifecycle
//! - `Availability`: agent time slots
//! - `AiQueryRequest`, `AiQueryResponse`: the assistant endpoint
//! - Admin types: `Analytics`, `User`

pub mod admin;
pub mod agent;
pub mod ai;
pub mod appointment;
pub mod auth;
pub mod availability;

pub use admin::{Analytics, User};
pub use agent::Agent;
pub use ai::{AiQueryRequest, AiQueryResponse};
pub use appointment::{Appointment, AppointmentRequest, AppointmentStatus, AppointmentType};
pub use auth::{AuthResponse, Credentials, RefreshResponse, RegisterRequest};
pub use availability::{Availability, AvailabilityRequest};
