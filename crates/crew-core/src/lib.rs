//! Foundational low-level utilities shared across crew crates.
//!
//! Provides atomic file-write helpers plus the clock abstraction used by the
//! provider catalog cache and the local model listing cache.

pub mod atomic_io;
pub mod time_utils;

pub use atomic_io::write_text_atomic;
pub use time_utils::{elapsed_between, Clock, SystemClock};
