//! Comparison results.

use facet::Facet;

/// What happened to a subsection or field between the two documents.
#[derive(Facet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[facet(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ChangeStatus {
    /// Present on both sides with no visible change
    Match,
    /// Present on both sides, changed
    Update,
    /// Only in the new document
    Add,
    /// Only in the old document
    Delete,
}

/// How a changed subsection is judged.
#[derive(Facet, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[facet(rename_all = "snake_case")]
#[repr(u8)]
pub enum ComparisonType {
    /// Show the body diff
    #[default]
    Body,
    /// Only the heading matters
    Name,
    /// Leave the subsection out of the comparison
    None,
    /// The new body must contain the subsection's required strings
    DiffStrings,
}

/// Diff of one subsection (or one metadata field).
#[derive(Facet, Debug, Clone)]
pub struct SubsectionDiff {
    /// Display name; may itself carry `<ins>`/`<del>` when a heading changed
    pub name: String,
    pub status: ChangeStatus,
    pub comparison: ComparisonType,
    pub old_name: String,
    pub new_name: String,
    pub old_value: String,
    pub new_value: String,
    /// Marked-up diff of the values; empty for matches
    pub diff: String,
    /// `diff` with insertions removed
    pub old_diff: String,
    /// `diff` with deletions removed
    pub new_diff: String,
    pub diff_strings: Vec<String>,
    pub tag: String,
    pub html_id: String,
}

impl SubsectionDiff {
    pub(crate) fn new(name: impl Into<String>, status: ChangeStatus) -> Self {
        Self {
            name: name.into(),
            status,
            comparison: ComparisonType::Body,
            old_name: String::new(),
            new_name: String::new(),
            old_value: String::new(),
            new_value: String::new(),
            diff: String::new(),
            old_diff: String::new(),
            new_diff: String::new(),
            diff_strings: Vec::new(),
            tag: String::new(),
            html_id: String::new(),
        }
    }

    /// Whether the display name carries change markers.
    pub fn name_modified(&self) -> bool {
        redline::has_diff(&self.name)
    }
}

/// Subsection diffs of one section.
#[derive(Facet, Debug, Clone)]
pub struct SectionDiff {
    pub name: String,
    pub html_id: String,
    pub subsections: Vec<SubsectionDiff>,
}
