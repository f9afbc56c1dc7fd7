#![doc = include_str!("../README.md")]

mod error;
mod queue;

pub mod framing;
pub mod processor;
pub mod records;
pub mod time;
pub mod timesync;
pub mod transport;

pub use error::{Error, Result};
pub use queue::BoundedQueue;
