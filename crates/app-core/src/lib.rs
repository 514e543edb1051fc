//! Core application logic for Parcel Session
//!
//! This crate contains the client-side auth flows, form validation, and
//! booking summaries that sit on top of the session state.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod bookings;
pub mod validation;
