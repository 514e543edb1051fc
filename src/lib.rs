//! Parcel Session
//!
//! Client-side session lifecycle and auth flows for the parcel-booking app.
//! See the member crates for details.

pub use app_core as core;
pub use app_state as state;
pub use storage;
