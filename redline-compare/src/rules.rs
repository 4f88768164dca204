//! Per-subsection comparison rules and side views.

use std::fmt::Write;

use redline::{new_side, old_side};

use crate::report::{ChangeStatus, ComparisonType, SubsectionDiff};

/// Shown instead of a body diff when the body is not compared.
pub const NOT_COMPARED: &str = "—";

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Whether `body` contains every required string, ignoring case and
/// whitespace differences.
pub fn contains_required_strings<S: AsRef<str>>(strings: &[S], body: &str) -> bool {
    let body = normalize(body);
    strings.iter().all(|s| body.contains(&normalize(s.as_ref())))
}

/// Escape for HTML text and attribute values, quotes included.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// A `<ul>` of deleted strings.
fn deleted_list<S: AsRef<str>>(strings: &[S]) -> String {
    let mut out = String::from("<ul>");
    for s in strings {
        let _ = write!(out, "<li><del>{}</del></li>", escape(s.as_ref()));
    }
    out.push_str("</ul>");
    out
}

/// Rewrite each item according to its comparison type.
///
/// - `None` items are dropped
/// - additions and matches pass through unchanged
/// - `Name`: the body is not compared; an update counts only when the
///   heading changed
/// - `DiffStrings`: a deletion lists every required string as removed; an
///   update lists the required strings missing from the new body, or counts
///   only when the heading changed if none are missing
pub fn apply_comparison_types(items: Vec<SubsectionDiff>) -> Vec<SubsectionDiff> {
    let mut out = Vec::with_capacity(items.len());
    for mut item in items {
        match (item.status, item.comparison) {
            (_, ComparisonType::None) => continue,
            (ChangeStatus::Add | ChangeStatus::Match, _) | (_, ComparisonType::Body) => {}
            (ChangeStatus::Delete, ComparisonType::Name) => {
                item.diff = NOT_COMPARED.to_string();
            }
            (ChangeStatus::Delete, ComparisonType::DiffStrings) => {
                item.diff = deleted_list(&item.diff_strings);
            }
            (ChangeStatus::Update, ComparisonType::Name) => {
                if !item.name_modified() {
                    item.status = ChangeStatus::Match;
                }
                item.diff = NOT_COMPARED.to_string();
            }
            (ChangeStatus::Update, ComparisonType::DiffStrings) => {
                let body = normalize(&item.new_value);
                let missing: Vec<&String> = item
                    .diff_strings
                    .iter()
                    .filter(|s| !body.contains(&normalize(s)))
                    .collect();
                if missing.is_empty() {
                    if !item.name_modified() {
                        item.status = ChangeStatus::Match;
                    }
                    item.diff = NOT_COMPARED.to_string();
                } else {
                    item.diff = deleted_list(&missing);
                }
            }
        }
        out.push(item);
    }
    out
}

/// Fill in the old and new side views of every item that has a diff.
pub fn annotate_sides(items: &mut [SubsectionDiff]) {
    for item in items.iter_mut().filter(|item| !item.diff.is_empty()) {
        item.old_diff = old_side(&item.diff);
        item.new_diff = new_side(&item.diff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn item(
        name: &str,
        status: ChangeStatus,
        comparison: ComparisonType,
        diff_strings: &[&str],
        new_value: &str,
    ) -> SubsectionDiff {
        let mut d = SubsectionDiff::new(name, status);
        d.comparison = comparison;
        d.diff_strings = diff_strings.iter().map(|s| s.to_string()).collect();
        d.new_value = new_value.to_string();
        d.diff = "<p><del>x</del></p>".to_string();
        d
    }

    #[test]
    fn test_required_strings() {
        let body = "<p>Applicants   MUST register\nwith SAM.gov</p>";
        assert!(contains_required_strings(&["must register with sam.gov"], body));
        assert!(contains_required_strings::<&str>(&[], body));
        assert!(!contains_required_strings(&["Grants.gov"], body));
    }

    #[test]
    fn test_none_items_are_dropped() {
        let out = apply_comparison_types(vec![
            item("A", ChangeStatus::Update, ComparisonType::None, &[], ""),
            item("B", ChangeStatus::Add, ComparisonType::None, &[], ""),
        ]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_body_items_pass_through() {
        let out = apply_comparison_types(vec![item(
            "A",
            ChangeStatus::Update,
            ComparisonType::Body,
            &[],
            "",
        )]);
        assert_eq!(out[0].status, ChangeStatus::Update);
        assert_eq!(out[0].diff, "<p><del>x</del></p>");
    }

    #[test]
    fn test_name_comparison() {
        let out = apply_comparison_types(vec![
            item("Same", ChangeStatus::Update, ComparisonType::Name, &[], ""),
            item(
                "<del>Old</del><ins>New</ins>",
                ChangeStatus::Update,
                ComparisonType::Name,
                &[],
                "",
            ),
            item("<del>Gone</del>", ChangeStatus::Delete, ComparisonType::Name, &[], ""),
        ]);
        assert_eq!(out[0].status, ChangeStatus::Match);
        assert_eq!(out[1].status, ChangeStatus::Update);
        assert_eq!(out[2].status, ChangeStatus::Delete);
        assert!(out.iter().all(|i| i.diff == NOT_COMPARED));
    }

    #[test]
    fn test_diff_strings_on_delete_lists_everything() {
        let out = apply_comparison_types(vec![item(
            "<del>Gone</del>",
            ChangeStatus::Delete,
            ComparisonType::DiffStrings,
            &["Tom & Jerry", "<b>"],
            "",
        )]);
        assert_eq!(
            out[0].diff,
            "<ul><li><del>Tom &amp; Jerry</del></li><li><del>&lt;b&gt;</del></li></ul>"
        );
    }

    #[test]
    fn test_diff_strings_on_update() {
        let out = apply_comparison_types(vec![
            item(
                "Contacts",
                ChangeStatus::Update,
                ComparisonType::DiffStrings,
                &["Grants.gov", "SAM.gov"],
                "<p>Register at sam.gov</p>",
            ),
            item(
                "Contacts",
                ChangeStatus::Update,
                ComparisonType::DiffStrings,
                &["SAM.gov"],
                "<p>Register at SAM.gov</p>",
            ),
        ]);
        assert_eq!(out[0].status, ChangeStatus::Update);
        assert_eq!(out[0].diff, "<ul><li><del>Grants.gov</del></li></ul>");
        assert_eq!(out[1].status, ChangeStatus::Match);
        assert_eq!(out[1].diff, NOT_COMPARED);
    }

    #[test]
    fn test_sides_skip_empty_diffs() {
        let mut items = vec![
            SubsectionDiff::new("Match", ChangeStatus::Match),
            {
                let mut d = SubsectionDiff::new("Update", ChangeStatus::Update);
                d.diff = "<p>One <del>two</del><ins>three</ins></p>".to_string();
                d
            },
        ];
        annotate_sides(&mut items);
        assert!(items[0].old_diff.is_empty());
        assert_eq!(items[1].old_diff, "<p>One <del>two</del></p>");
        assert_eq!(items[1].new_diff, "<p>One <ins>three</ins></p>");
    }
}
