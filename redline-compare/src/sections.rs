//! Subsection pairing within one section.

use std::collections::HashSet;
use std::sync::LazyLock;

use redline::{has_diff, html_diff};
use regex::Regex;

use crate::outline::{Section, Subsection, display_name, is_matching_subsection};
use crate::report::{ChangeStatus, SectionDiff, SubsectionDiff};
use crate::tracing_macros::{debug, trace};

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*?>").expect("valid regex"));

static MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<del>.*?</del>|<ins>.*?</ins>").expect("valid regex"));

static SHARED_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9]{3,}").expect("valid regex"));

/// Remove every tag, keeping the text.
pub(crate) fn strip_tags(markup: &str) -> String {
    TAG_REGEX.replace_all(markup, "").into_owned()
}

/// Compare the subsections of a section pair.
///
/// New subsections are walked in order. Each is paired with the first
/// unmatched old subsection it matches; old subsections skipped over on the
/// way are reported as deleted right there, so the result reads in
/// document order. `old` is `None` for a section only the new document has.
pub fn compare_sections(old: Option<&Section>, new: &Section) -> SectionDiff {
    let old_subs: &[Subsection] = old.map_or(&[], |s| s.subsections.as_slice());
    let new_subs = new.subsections.as_slice();

    let mut matched: HashSet<usize> = HashSet::new();
    let mut out = Vec::new();
    let mut old_index = 0;

    for ni in 0..new_subs.len() {
        let found = (0..old_subs.len())
            .find(|oi| !matched.contains(oi) && is_matching_subsection(new_subs, ni, old_subs, *oi));

        let Some(oi) = found else {
            trace!(name = %display_name(new_subs, ni), "added");
            out.push(added(new_subs, ni));
            continue;
        };

        while old_index < old_subs.len() && old_index != oi {
            if matched.insert(old_index) {
                out.push(deleted(old_subs, old_index));
            }
            old_index += 1;
        }

        matched.insert(oi);
        let diff = html_diff(Some(old_subs[oi].body.trim()), Some(new_subs[ni].body.trim()));
        if has_diff(&diff) {
            out.push(updated(old_subs, oi, new_subs, ni));
        } else {
            out.push(unchanged(old_subs, oi));
        }
        old_index = old_index.max(oi + 1);
    }

    for oi in old_index..old_subs.len() {
        if matched.insert(oi) {
            out.push(deleted(old_subs, oi));
        }
    }

    debug!(section = %new.name, items = out.len(), "compared section");
    SectionDiff {
        name: new.name.clone(),
        html_id: new.html_id.clone(),
        subsections: out,
    }
}

fn with_guide_fields(mut diff: SubsectionDiff, sub: &Subsection) -> SubsectionDiff {
    diff.comparison = sub.comparison;
    diff.diff_strings = sub.diff_strings.clone();
    diff
}

fn unchanged(old: &[Subsection], oi: usize) -> SubsectionDiff {
    let sub = &old[oi];
    let name = display_name(old, oi);
    let mut diff = SubsectionDiff::new(name.clone(), ChangeStatus::Match);
    diff.old_name = name.clone();
    diff.new_name = name;
    diff.old_value = sub.body.clone();
    diff.new_value = sub.body.clone();
    diff.tag = sub.tag.clone();
    diff.html_id = sub.html_id.clone();
    with_guide_fields(diff, sub)
}

fn updated(old: &[Subsection], oi: usize, new: &[Subsection], ni: usize) -> SubsectionDiff {
    let (o, n) = (&old[oi], &new[ni]);
    let name = display_name(old, oi);
    let mut diff = SubsectionDiff::new(name.clone(), ChangeStatus::Update);
    diff.old_name = name;
    diff.new_name = display_name(new, ni);
    diff.diff = html_diff(Some(&o.body), Some(&n.body));
    diff.old_value = o.body.clone();
    diff.new_value = n.body.clone();
    diff.tag = n.tag.clone();
    diff.html_id = n.html_id.clone();
    with_guide_fields(diff, o)
}

fn added(new: &[Subsection], ni: usize) -> SubsectionDiff {
    let sub = &new[ni];
    let name = display_name(new, ni);
    let mut diff = SubsectionDiff::new(name.clone(), ChangeStatus::Add);
    diff.new_name = name;
    diff.diff = html_diff(None, Some(&sub.body));
    diff.new_value = sub.body.clone();
    diff.tag = sub.tag.clone();
    diff.html_id = sub.html_id.clone();
    diff
}

fn deleted(old: &[Subsection], oi: usize) -> SubsectionDiff {
    let sub = &old[oi];
    let name = display_name(old, oi);
    let mut diff = SubsectionDiff::new(html_diff(Some(&name), None), ChangeStatus::Delete);
    diff.old_name = name;
    diff.diff = html_diff(Some(&sub.body), None);
    diff.old_value = sub.body.clone();
    diff.tag = sub.tag.clone();
    diff.html_id = sub.html_id.clone();
    with_guide_fields(diff, sub)
}

/// Whether a heading diff keeps a run of at least three ASCII letters or
/// digits outside its markers.
fn has_shared_heading(heading_diff: &str) -> bool {
    let remaining = MARKER_REGEX.replace_all(heading_diff, " ");
    SHARED_RUN_REGEX.is_match(&remaining)
}

/// Merge an `Add` directly followed by a `Delete` into one `Update` when
/// the pair looks like a renamed subsection: same body, or headings that
/// still share some text.
pub fn merge_renamed_subsections(items: Vec<SubsectionDiff>) -> Vec<SubsectionDiff> {
    let mut merged = Vec::with_capacity(items.len());
    let mut iter = items.into_iter().peekable();

    while let Some(current) = iter.next() {
        if current.status == ChangeStatus::Add
            && let Some(next) = iter.next_if(|n| n.status == ChangeStatus::Delete)
        {
            match merge_rename(&current, &next) {
                Some(update) => merged.push(update),
                None => merged.extend([current, next]),
            }
            continue;
        }
        merged.push(current);
    }

    merged
}

fn merge_rename(added: &SubsectionDiff, deleted: &SubsectionDiff) -> Option<SubsectionDiff> {
    let new_body = added.new_value.trim();
    let old_body = deleted.old_value.trim();
    let old_name = strip_tags(&deleted.name);
    let heading_diff = html_diff(Some(&old_name), Some(&added.name));

    if old_body != new_body && !has_shared_heading(&heading_diff) {
        return None;
    }
    trace!(old = %old_name, new = %added.name, "merging rename");

    let name = if heading_diff.is_empty() {
        added.name.clone()
    } else {
        heading_diff
    };
    let mut update = SubsectionDiff::new(name, ChangeStatus::Update);
    update.comparison = deleted.comparison;
    update.diff_strings = deleted.diff_strings.clone();
    update.old_name = old_name;
    update.new_name = strip_tags(&added.name);
    update.diff = html_diff(Some(old_body), Some(new_body));
    update.old_value = old_body.to_string();
    update.new_value = new_body.to_string();
    update.html_id = added.html_id.clone();
    Some(update)
}
