//! Section-by-section comparison of two versions of a document.
//!
//! Documents come in as [`Outline`]s: sections of subsections with HTML
//! bodies. [`compare_outlines`] pairs sections by name and subsections by
//! heading (or by position among their neighbours when unnamed), diffs the
//! bodies with [`redline`], and reports each subsection as a
//! [`ChangeStatus`]. Subsections taken from a content guide can be judged by
//! heading only, skipped, or checked for required strings; see
//! [`ComparisonType`].
//!
//! # Example
//!
//! ```rust
//! use redline_compare::{ChangeStatus, CompareOptions, Outline, Section, Subsection, compare_outlines};
//!
//! let old = Outline::new(vec![Section::new(
//!     "Eligibility",
//!     vec![Subsection::new("Who can apply", "<p>Nonprofits only.</p>")],
//! )]);
//! let new = Outline::new(vec![Section::new(
//!     "Eligibility",
//!     vec![Subsection::new("Who can apply", "<p>Nonprofits and tribes.</p>")],
//! )]);
//!
//! let sections = compare_outlines(&old, &new, &CompareOptions::default());
//! let item = &sections[0].subsections[0];
//! assert_eq!(item.status, ChangeStatus::Update);
//! assert!(item.diff.contains("<ins>"));
//! ```

mod tracing_macros;

mod outline;
mod report;
mod rules;
mod sections;

use facet::Facet;
use redline::html_diff;

pub use outline::{Outline, Section, Subsection, is_matching_subsection};
pub use report::{ChangeStatus, ComparisonType, SectionDiff, SubsectionDiff};
pub use rules::{NOT_COMPARED, annotate_sides, apply_comparison_types, contains_required_strings};
pub use sections::{compare_sections, merge_renamed_subsections};

use crate::tracing_macros::debug;

/// Options for a comparison.
#[derive(Facet, Debug, Clone, Default)]
pub struct CompareOptions {
    /// Items with these statuses are left out of the result; sections left
    /// without items are dropped.
    #[facet(default)]
    pub ignore_statuses: Vec<ChangeStatus>,

    /// Fill in [`SubsectionDiff::old_diff`] and [`SubsectionDiff::new_diff`].
    #[facet(default)]
    pub side_by_side: bool,
}

impl CompareOptions {
    /// Create new default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave items with this status out of the result.
    pub fn ignore(mut self, status: ChangeStatus) -> Self {
        if !self.ignore_statuses.contains(&status) {
            self.ignore_statuses.push(status);
        }
        self
    }

    /// Also compute side-by-side views.
    pub fn side_by_side(mut self) -> Self {
        self.side_by_side = true;
        self
    }

    fn keeps(&self, item: &SubsectionDiff) -> bool {
        !self.ignore_statuses.contains(&item.status)
    }
}

/// Compare two outlines section by section.
///
/// Sections of the new outline are paired with the first old section of the
/// same name. Sections without any items are left out, renamed subsections
/// are merged, comparison types are applied, and ignored statuses are
/// filtered last. Only that filter drops a section, so with no ignored
/// statuses a section can come back with an empty item list.
pub fn compare_outlines(old: &Outline, new: &Outline, options: &CompareOptions) -> Vec<SectionDiff> {
    let mut out = Vec::new();
    for section in &new.sections {
        let mut diff = compare_sections(old.section(&section.name), section);
        if diff.subsections.is_empty() {
            continue;
        }

        diff.subsections = apply_comparison_types(merge_renamed_subsections(diff.subsections));
        if !options.ignore_statuses.is_empty() {
            diff.subsections.retain(|item| options.keeps(item));
            if diff.subsections.is_empty() {
                continue;
            }
        }
        if options.side_by_side {
            annotate_sides(&mut diff.subsections);
        }
        out.push(diff);
    }
    debug!(sections = out.len(), "compared outlines");
    out
}

/// One metadata field of a document, in both versions.
#[derive(Facet, Debug, Clone, Default)]
pub struct Field {
    /// Display name
    pub name: String,
    /// Value in the old document
    pub old: String,
    /// Value in the new document
    pub new: String,
}

impl Field {
    /// A field with its old and new values.
    pub fn new(name: impl Into<String>, old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Compare metadata fields one row each.
///
/// Unequal values are an `Add` when the old value is empty, a `Delete` when
/// the new value is empty, and an `Update` otherwise.
pub fn compare_fields(fields: &[Field], options: &CompareOptions) -> Vec<SubsectionDiff> {
    let mut out: Vec<SubsectionDiff> = fields
        .iter()
        .map(|field| {
            let status = if field.old == field.new {
                ChangeStatus::Match
            } else if field.old.is_empty() {
                ChangeStatus::Add
            } else if field.new.is_empty() {
                ChangeStatus::Delete
            } else {
                ChangeStatus::Update
            };

            let mut item = SubsectionDiff::new(field.name.clone(), status);
            item.old_value = field.old.clone();
            item.new_value = field.new.clone();
            if status != ChangeStatus::Match {
                item.diff = html_diff(Some(&field.old), Some(&field.new));
            }
            item
        })
        .filter(|item| options.keeps(item))
        .collect();

    if options.side_by_side {
        annotate_sides(&mut out);
    }
    out
}
