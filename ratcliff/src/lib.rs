//! # Ratcliff
//!
//! Sequence alignment and character diffs, the two primitives a structural
//! document differ is built from.
//!
//! Named after John W. Ratcliff, whose pattern-matching algorithm (with
//! David Obershelp) finds the longest common block first and recurses on
//! either side of it.
//!
//! ## Pieces
//!
//! - [`matcher`]: aligns two sequences of hashable items and classifies the
//!   spans as equal / replace / delete / insert opcodes.
//! - [`text`]: character-level diff with a semantic cleanup pass that moves
//!   edit boundaries onto word and sentence edges.
//!
//! ## Usage
//!
//! ```
//! use ratcliff::{OpTag, opcodes};
//! use ratcliff::text::{Chunk, diff_text};
//!
//! let ops = opcodes(&["a", "b", "c"], &["a", "c"]);
//! assert_eq!(ops[1].tag, OpTag::Delete);
//!
//! let chunks = diff_text("Groundhog Day!", "Valentines Day!");
//! assert_eq!(chunks[2], Chunk::equal(" Day!"));
//! ```

#![warn(missing_docs)]

mod tracing_macros;

/// Sequence alignment with opcodes
pub mod matcher;
/// Character diffs with semantic cleanup
pub mod text;

pub use matcher::{Match, MatcherConfig, OpTag, Opcode, SequenceMatcher, opcodes};
pub use text::{Chunk, ChunkOp, diff_text};
