//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data Model
//! - [`Item`]: one opaque text payload flowing through the hub (an Event or a Command)
//! - [`Command`]: a control message recognised by its `command` field
//! - [`ServerBlueprint`]: the complete runtime configuration

mod blueprint;
mod error;
mod item;
mod sink;
mod source;

pub use blueprint::*;
pub use error::*;
pub use item::{Command, CommandVerb, Item};
pub use sink::*;
pub use source::{LineSource, SourceRead};
