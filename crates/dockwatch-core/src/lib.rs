//! Status aggregation core for dockwatch
//!
//! This crate provides:
//! - Per-resource status records and their text rendering
//! - One aggregation loop per tracked resource, the sole writer of its status
//! - The view sink interface the UI implements
//! - Command dispatch from menu selections to controller calls
//! - A session that wires controllers, aggregators and the dispatcher together

mod aggregator;
mod dispatcher;
mod error;
mod render;
mod session;
mod sink;
mod status;

pub use aggregator::*;
pub use dispatcher::*;
pub use error::*;
pub use render::*;
pub use session::*;
pub use sink::*;
pub use status::*;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
