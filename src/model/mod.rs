//! Value types shared by every stage of the reconstruction pipeline.
//!
//! Fragments, lines and records are immutable values built fresh for each
//! document; nothing here holds state across pages or documents.

mod bbox;
mod fragment;
mod record;
mod report;

pub use bbox::{bottom, containment, overlaps, top, BoundingBox, Envelope, Point, MIN_POINTS};
pub use fragment::{Fragment, FragmentKind, Line, SourceKind};
pub use record::{PageRecord, RegionRecord};
pub use report::{DocumentReport, PageFailure, ReconstructionStats, Rejection};
