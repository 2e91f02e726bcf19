//! Core types and the occupancy engine for Headcount.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! holds the scan-event model, the reducer that turns an event window into an
//! [`occupancy::OccupancyState`], the demo-traffic simulator, and the
//! [`store::EventLog`] trait that storage backends implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod event;
pub mod occupancy;
pub mod simulate;
pub mod store;

pub use error::{Error, Result};
