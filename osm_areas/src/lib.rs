//! Assembles polygon-with-holes area geometries from OSM source objects: a single closed way, or
//! a multipolygon relation whose member ways collectively bound an area. OSM data is known-dirty,
//! so malformed geometry (duplicated nodes, crossing segments, open rings, mislabeled member
//! roles) is reported through a streaming problem-reporter interface instead of aborting; some
//! defects still yield a valid area, others leave an invalid header-only record behind.

#[macro_use]
extern crate log;

mod assembler;
mod problems;
mod ring;
mod segment;

pub use crate::assembler::Assembler;
pub use crate::problems::{CollectedProblems, LoggedProblems, Problem, ProblemReporter};
pub use crate::ring::ProtoRing;
pub use crate::segment::{NodeRefSegment, Role, SegmentList};
