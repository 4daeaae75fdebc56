//! # Property Graph Model
//!
//! Plain DTOs shared by the store adapters, the kind mappers and the
//! inference pipeline.
//!
//! Design rule: NO driver types here. This module is pure data: no I/O,
//! no state, no async.

pub mod node;
pub mod relationship;
pub mod value;
pub mod property_map;

pub use node::{Node, NodeId, Labels};
pub use relationship::{Relationship, RelId, Direction};
pub use value::Value;
pub use property_map::{PropertyMap, props};
