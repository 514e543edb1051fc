//! Storage layer for Parcel Session
//!
//! This crate provides the durable key-value store that client state is
//! persisted to between launches.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kv;

pub use kv::{KeyValueStore, KvConfig, KvError, KvStore};
