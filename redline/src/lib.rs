//! Structural HTML diffing built on html5ever and ratcliff.
//!
//! redline takes two versions of an HTML fragment and produces one fragment
//! with the changes marked inline:
//! - **Block aware**: paragraphs, list items, table rows and cells are aligned
//!   as units, so a moved list item shows up as one deletion and one insertion
//! - **Text level**: inside a matched block, only the changed words are marked
//! - **Valid output**: markers never become direct children of `<tr>`, `<ul>`
//!   and friends; the contents of such elements are wrapped instead
//! - **Side views**: [`old_side`] and [`new_side`] split a diff back into the
//!   two documents for side-by-side display
//!
//! # Example
//!
//! ```rust
//! let old = "<p>This sentence has been changed.</p>";
//! let new = "<p>This sentence has been altered in some way.</p>";
//!
//! let marked = redline::diff(old, new);
//! assert_eq!(
//!     marked,
//!     "<p>This sentence has been <del>changed</del><ins>altered in some way</ins>.</p>"
//! );
//! assert!(redline::has_diff(&marked));
//! ```

mod tracing_macros;

pub mod classify;
pub mod diff;
pub mod dom;
pub mod serialize;
mod sides;

pub use diff::{DiffError, Marker, PairStrategy, diff, has_diff, html_diff, html_diff_bytes};
pub use dom::{Document, NodeRef, parse};
pub use serialize::SerializeOptions;
pub use sides::{new_side, old_side};

pub use html5ever::tendril::StrTendril;
