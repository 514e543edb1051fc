//! Application state management for Parcel Session
//!
//! This crate owns the authentication session lifecycle and the route guards
//! that decide what signed-in and signed-out users may see.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod guard;
pub mod session;

pub use guard::{landing_route, resolve, GuardDecision, Route, RouteGuard};
pub use session::{
    SessionConfig, SessionError, SessionEvent, SessionManager, SessionPhase, SessionSnapshot,
    SessionToken,
};
