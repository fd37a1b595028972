//! Configuration for dockwatch
//!
//! Global configuration lives at `~/.config/dockwatch/config.toml` and
//! describes the Docker connection, the UI refresh rate, the test network
//! and the two tracked resources (`nats` and `project`).

mod error;
mod global;

pub use error::*;
pub use global::*;
