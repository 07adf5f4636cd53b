//! POISE Test Harness - synthetic candidates and deterministic scenarios
//!
//! This crate provides:
//! - Synthetic subjects that render landmarks for named behaviours
//! - Scripted frame source and providers for driving a real session
//! - A scenario runner that drives the feedback engine on a simulated clock
//! - End-to-end session helpers

pub mod integration;
pub mod scenario;
pub mod scripted;
pub mod subject;

pub use integration::*;
pub use scenario::*;
pub use scripted::*;
pub use subject::*;
