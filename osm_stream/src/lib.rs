//! Streaming infrastructure around the area assembler: a diff/handler pipeline that walks a
//! sorted OSM object stream with a three-item window per entity, and a supervised background
//! worker that captures failures and surfaces them in the owning thread.

mod diff;
mod worker;

pub use crate::diff::{apply, DiffChangeset, DiffHandler, DiffNode, DiffRelation, DiffWay};
pub use crate::worker::Worker;
