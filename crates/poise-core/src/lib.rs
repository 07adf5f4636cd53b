//! POISE Core - Fundamental types and primitives
//!
//! This crate defines the core types shared by every POISE crate:
//! - Landmarks and per-provider snapshots (face mesh, body pose, hands)
//! - Session time (`SessionTime`)
//! - The fixed feedback message catalog
//! - Core error type

pub mod error;
pub mod landmark;
pub mod message;
pub mod time;

pub use error::*;
pub use landmark::*;
pub use message::*;
pub use time::*;
