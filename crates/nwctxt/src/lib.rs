//! NoteWorthy Composer text (`.nwctxt`) toolkit.
//!
//! This crate parses `.nwctxt` files into a line-preserving document
//! model, analyzes song structure (measures, pickup, lead-in, lyrics per
//! measure, chord timelines), and concatenates section files into one
//! score.
//!
//! # Example
//!
//! ```
//! use nwctxt::Document;
//!
//! let text = "\
//! !NoteWorthyComposer(2.751)
//! |SongInfo|Title:\"Voorbeeld\"
//! |AddStaff|Name:\"Zang\"
//! |Note|Dur:4th|Pos:0
//! !NoteWorthyComposer-End
//! ";
//!
//! let doc = Document::parse(text);
//! assert_eq!(doc.title().as_deref(), Some("Voorbeeld"));
//! assert_eq!(doc.staves.len(), 1);
//! assert_eq!(doc.serialize(), text);
//! ```

pub mod analyze;
pub mod chords;
pub mod concat;
pub mod error;
pub mod feedback;
pub mod model;
pub mod report;
pub mod timing;

pub use error::NwctxtError;
pub use feedback::{Analyzed, Feedback, FeedbackCollector, FeedbackLevel};
pub use model::{Document, Staff};
