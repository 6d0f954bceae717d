//! In-memory driver for exercising the shared state machines without a database.
//!
//! [`ScriptedDriver`] answers every native call from a script and records it in a
//! [`CallLog`], so tests can assert what reached the backend and in which order.

pub mod scripted;

pub use scripted::{CallLog, DriverCall, ScriptedDriver};
