//! Whole-outline and metadata comparisons.

use facet_testhelpers::test;
use redline_compare::{
    ChangeStatus, CompareOptions, ComparisonType, Field, NOT_COMPARED, Outline, Section,
    Subsection, compare_fields, compare_outlines,
};

fn step_one(subsections: Vec<Subsection>) -> Outline {
    Outline::new(vec![Section::new("Step 1", subsections)])
}

fn old_outline() -> Outline {
    step_one(vec![
        Subsection::new("Budget Requirements", "<p>Budget must not exceed $100K.</p>").with_tag("h3"),
        Subsection::new("", "<p>Need help? Visit contacts and support</p>").with_tag("h3"),
        Subsection::new("Application Process", "<p>Submit before Jan 1.</p>").with_tag("h3"),
        Subsection::new("Permitting rules", "<p>Of course permits must be obtained.</p>")
            .with_tag("h3"),
        Subsection::new("SAM.gov", "<p>Visit the website to sign up.</p>").with_tag("h3"),
        Subsection::new("Old NOFO Fee Requirements", "<p>Processing fee is $50.</p>")
            .with_tag("h3"),
    ])
}

fn new_outline() -> Outline {
    step_one(vec![
        Subsection::new("Budget Requirements", "<p>Budget must not exceed $100K.</p>").with_tag("h3"),
        Subsection::new("", "<p>Go to 'Contacts and Support</p>").with_tag("h3"),
        Subsection::new("Application Process", "<p>Submit before Feb 1.</p>").with_tag("h3"),
        Subsection::new("New NOFO Funding Guidelines", "<p>Follow these new rules.</p>")
            .with_tag("h3")
            .with_html_id("new-nofo-funding-guidelines"),
        Subsection::new("Permitting rules", "<p>Of course permits must be obtained.</p>")
            .with_tag("h4"),
        Subsection::new("Visit SAM.gov", "<p>This is the website where you can sign up.</p>")
            .with_tag("h3")
            .with_html_id("visit-samgov"),
    ])
}

#[test]
fn test_compare_outlines() {
    let result = compare_outlines(&old_outline(), &new_outline(), &CompareOptions::default());
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].name, "Step 1");

    let items = &result[0].subsections;
    let statuses: Vec<ChangeStatus> = items.iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![
            ChangeStatus::Match,
            ChangeStatus::Update,
            ChangeStatus::Update,
            ChangeStatus::Add,
            ChangeStatus::Match,
            ChangeStatus::Update,
            ChangeStatus::Delete,
        ]
    );

    assert_eq!(items[0].name, "Budget Requirements");
    assert!(items[0].diff.is_empty());

    // unnamed, matched through its neighbours
    assert_eq!(items[1].name, "(#2)");
    assert_eq!(items[1].new_value, "<p>Go to 'Contacts and Support</p>");

    assert_eq!(items[2].name, "Application Process");
    assert!(
        items[2]
            .diff
            .contains("Submit before <del>Jan</del><ins>Feb</ins> 1.")
    );

    assert_eq!(items[3].name, "New NOFO Funding Guidelines");
    assert_eq!(items[3].old_value, "");
    assert_eq!(items[3].html_id, "new-nofo-funding-guidelines");

    // same body, heading tag changed
    assert_eq!(items[4].name, "Permitting rules");

    // renamed and rewritten, merged from an add and a delete
    let merged = &items[5];
    assert_eq!(merged.name, "<ins>Visit </ins>SAM.gov");
    assert_eq!(merged.old_name, "SAM.gov");
    assert_eq!(merged.new_name, "Visit SAM.gov");
    assert_eq!(merged.html_id, "visit-samgov");
    assert_eq!(merged.old_value, "<p>Visit the website to sign up.</p>");
    assert!(merged.diff.contains(
        "<del>Visit</del><ins>This is</ins> the website <del>to</del><ins>where you can</ins> sign up."
    ));

    assert_eq!(items[6].name, "<del>Old NOFO Fee Requirements</del>");
    assert_eq!(items[6].new_value, "");
    assert!(
        items[6]
            .diff
            .contains("<del><p>Processing fee is $50.</p></del>")
    );
}

#[test]
fn test_ignored_statuses_are_filtered() {
    let options = CompareOptions::new().ignore(ChangeStatus::Match);
    let result = compare_outlines(&old_outline(), &new_outline(), &options);
    assert!(
        result[0]
            .subsections
            .iter()
            .all(|i| i.status != ChangeStatus::Match)
    );
    assert_eq!(result[0].subsections.len(), 5);

    // nothing left to show: the section goes away
    let same = old_outline();
    assert!(compare_outlines(&same, &same, &options).is_empty());
}

#[test]
fn test_sections_only_in_new_are_all_added() {
    let old = Outline::default();
    let new = step_one(vec![Subsection::new("Contacts", "<p>Call us</p>")]);
    let result = compare_outlines(&old, &new, &CompareOptions::default());
    assert_eq!(result[0].subsections[0].status, ChangeStatus::Add);
    assert_eq!(
        result[0].subsections[0].diff,
        "<ins><p>Call us</p></ins>"
    );
}

#[test]
fn test_content_guide_comparison_types() {
    let old = step_one(vec![
        Subsection::new("Tagline", "<p>Old tagline</p>").with_comparison(ComparisonType::Name),
        Subsection::new("Internal notes", "<p>x</p>").with_comparison(ComparisonType::None),
        Subsection::new("Contacts", "<p>Email us</p>")
            .with_comparison(ComparisonType::DiffStrings)
            .with_diff_strings(["Grants.gov", "SAM.gov"]),
    ]);
    let new = step_one(vec![
        Subsection::new("Tagline", "<p>New tagline</p>"),
        Subsection::new("Internal notes", "<p>y</p>"),
        Subsection::new("Contacts", "<p>Register with sam.gov, then   grants.gov</p>"),
    ]);

    let result = compare_outlines(&old, &new, &CompareOptions::default());
    let items = &result[0].subsections;
    assert_eq!(items.len(), 2);

    assert_eq!(items[0].name, "Tagline");
    assert_eq!(items[0].status, ChangeStatus::Match);
    assert_eq!(items[0].diff, NOT_COMPARED);

    assert_eq!(items[1].name, "Contacts");
    assert_eq!(items[1].status, ChangeStatus::Match);
    assert_eq!(items[1].diff, NOT_COMPARED);
}

#[test]
fn test_section_emptied_by_comparison_types_is_kept() {
    let old = step_one(vec![
        Subsection::new("Internal notes", "<p>Draft</p>").with_comparison(ComparisonType::None),
    ]);
    let new = step_one(vec![Subsection::new("Internal notes", "<p>Final</p>")]);

    let result = compare_outlines(&old, &new, &CompareOptions::default());
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].name, "Step 1");
    assert!(result[0].subsections.is_empty());

    // the status filter drops sections left empty
    let options = CompareOptions::new().ignore(ChangeStatus::Match);
    assert!(compare_outlines(&old, &new, &options).is_empty());
}

#[test]
fn test_side_by_side_views() {
    let options = CompareOptions::new().side_by_side();
    let result = compare_outlines(&old_outline(), &new_outline(), &options);
    let update = &result[0].subsections[2];
    assert_eq!(update.old_diff, "<p>Submit before <del>Jan</del> 1.</p>");
    assert_eq!(update.new_diff, "<p>Submit before <ins>Feb</ins> 1.</p>");
    assert!(result[0].subsections[0].old_diff.is_empty());
}

fn metadata() -> Vec<Field> {
    vec![
        Field::new("NOFO title", "Groundhog Training Grant", "Groundhog Training Grant"),
        Field::new("Opportunity number", "GHOG-101", "GHOG-101"),
        Field::new(
            "Operating Division",
            "National Oceanic and Atmospheric Administration",
            "National Oceanic and Atmospheric Administration",
        ),
        Field::new("Agency", "Climate and Weather Division", "Climate and Weather Division"),
        Field::new(
            "Subagency",
            "Department of Guessing Groundhogs (DGG)",
            "Department of Groundhog Excellence (DOGE)",
        ),
        Field::new(
            "Subagency 2",
            "Action Group for Diverse Prognosticators (AGDP)",
            "",
        ),
        Field::new("Application deadline", "", "February 2, 2026"),
        Field::new("Tagline", "Make Groundhogs Great Again", "Make Groundhogs Great Again"),
    ]
}

#[test]
fn test_compare_fields() {
    let result = compare_fields(&metadata(), &CompareOptions::default());
    assert_eq!(result.len(), 8);
    assert_eq!(
        result
            .iter()
            .filter(|i| i.status != ChangeStatus::Match)
            .count(),
        3
    );
    for item in result.iter().filter(|i| i.status == ChangeStatus::Match) {
        assert!(item.diff.is_empty());
    }

    assert_eq!(result[4].status, ChangeStatus::Update);
    assert!(result[4].diff.contains(
        "Department of G<del>uessing Groundhogs (DGG</del><ins>roundhog Excellence (DOGE</ins>)"
    ));

    assert_eq!(result[5].status, ChangeStatus::Delete);
    assert_eq!(
        result[5].diff,
        "<del>Action Group for Diverse Prognosticators (AGDP)</del>"
    );

    assert_eq!(result[6].status, ChangeStatus::Add);
    assert_eq!(result[6].diff, "<ins>February 2, 2026</ins>");
}

#[test]
fn test_compare_fields_filtered_with_sides() {
    let options = CompareOptions::new()
        .ignore(ChangeStatus::Match)
        .side_by_side();
    let result = compare_fields(&metadata(), &options);
    assert_eq!(result.len(), 3);
    assert_eq!(result[1].new_diff, "");
    assert_eq!(
        result[1].old_diff,
        "<del>Action Group for Diverse Prognosticators (AGDP)</del>"
    );
}
