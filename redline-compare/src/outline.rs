//! Document outlines: the input side of a comparison.

use facet::Facet;

use crate::report::ComparisonType;

/// A whole document, as an ordered list of sections.
#[derive(Facet, Debug, Clone, Default)]
pub struct Outline {
    pub sections: Vec<Section>,
}

impl Outline {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// First section with the given name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }
}

/// A named section holding subsections in document order.
#[derive(Facet, Debug, Clone, Default)]
pub struct Section {
    pub name: String,
    #[facet(default)]
    pub html_id: String,
    pub subsections: Vec<Subsection>,
}

impl Section {
    pub fn new(name: impl Into<String>, subsections: Vec<Subsection>) -> Self {
        Self {
            name: name.into(),
            html_id: String::new(),
            subsections,
        }
    }
}

/// One subsection: an optional heading and an HTML body.
#[derive(Facet, Debug, Clone, Default)]
pub struct Subsection {
    /// Heading text; empty for unnamed subsections
    #[facet(default)]
    pub name: String,
    pub body: String,
    #[facet(default)]
    pub html_id: String,
    /// Heading tag (`h3`, `h4`, ...)
    #[facet(default)]
    pub tag: String,
    /// How this subsection is judged when it comes from a content guide
    #[facet(default)]
    pub comparison: ComparisonType,
    /// Strings the new body must contain under [`ComparisonType::DiffStrings`]
    #[facet(default)]
    pub diff_strings: Vec<String>,
}

impl Subsection {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_comparison(mut self, comparison: ComparisonType) -> Self {
        self.comparison = comparison;
        self
    }

    pub fn with_diff_strings<S: Into<String>>(
        mut self,
        strings: impl IntoIterator<Item = S>,
    ) -> Self {
        self.diff_strings = strings.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_html_id(mut self, html_id: impl Into<String>) -> Self {
        self.html_id = html_id.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    fn is_named(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Display name of the subsection at `index`: its heading, or its 1-based
/// position as `(#n)` when unnamed.
pub(crate) fn display_name(subsections: &[Subsection], index: usize) -> String {
    let sub = &subsections[index];
    if sub.is_named() {
        sub.name.clone()
    } else {
        format!("(#{})", index + 1)
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Previous,
    Next,
}

impl Direction {
    fn step(self, index: usize, len: usize) -> Option<usize> {
        match self {
            Direction::Previous => index.checked_sub(1),
            Direction::Next => Some(index + 1).filter(|&i| i < len),
        }
    }
}

/// Whether `new[ni]` and `old[oi]` are the same subsection of a section.
///
/// Two named subsections match on their names. Otherwise both neighbours
/// have to line up: walking outwards in one direction, the first pair of
/// named neighbours must have equal names, or both walks must hit the edge
/// together.
pub fn is_matching_subsection(new: &[Subsection], ni: usize, old: &[Subsection], oi: usize) -> bool {
    let (n, o) = (&new[ni], &old[oi]);
    if n.is_named() && o.is_named() {
        return n.name == o.name;
    }
    neighbours_match(new, ni, old, oi, Direction::Previous)
        && neighbours_match(new, ni, old, oi, Direction::Next)
}

fn neighbours_match(
    new: &[Subsection],
    mut ni: usize,
    old: &[Subsection],
    mut oi: usize,
    direction: Direction,
) -> bool {
    loop {
        match (
            direction.step(ni, new.len()),
            direction.step(oi, old.len()),
        ) {
            (None, None) => return true,
            (Some(n), Some(o)) => {
                if new[n].is_named() && old[o].is_named() {
                    return new[n].name == old[o].name;
                }
                ni = n;
                oi = o;
            }
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    fn subs(names: &[&str]) -> Vec<Subsection> {
        names.iter().map(|n| Subsection::new(*n, "<p>body</p>")).collect()
    }

    #[test]
    fn test_named_subsections_match_on_name() {
        let new = subs(&["Eligibility", "Budget"]);
        let old = subs(&["Budget", "Eligibility"]);
        assert!(is_matching_subsection(&new, 0, &old, 1));
        assert!(!is_matching_subsection(&new, 0, &old, 0));
    }

    #[test]
    fn test_unnamed_subsection_between_same_neighbours() {
        let new = subs(&["Intro", "", "Budget"]);
        let old = subs(&["Intro", "", "Budget"]);
        assert!(is_matching_subsection(&new, 1, &old, 1));
    }

    #[test]
    fn test_unnamed_subsection_with_different_neighbour() {
        let new = subs(&["Intro", "", "Budget"]);
        let old = subs(&["Intro", "", "Timeline"]);
        assert!(!is_matching_subsection(&new, 1, &old, 1));
    }

    #[test]
    fn test_unnamed_walk_skips_unnamed_neighbours() {
        let new = subs(&["", "", "Budget"]);
        let old = subs(&["", "", "Budget"]);
        assert!(is_matching_subsection(&new, 0, &old, 0));
        assert!(is_matching_subsection(&new, 1, &old, 1));

        // one walk hits the edge before the other
        let old = subs(&["", "", "", "Budget"]);
        assert!(!is_matching_subsection(&new, 0, &old, 0));
    }

    #[test]
    fn test_display_name_falls_back_to_position() {
        let list = subs(&["Intro", ""]);
        assert_eq!(display_name(&list, 0), "Intro");
        assert_eq!(display_name(&list, 1), "(#2)");
    }
}
