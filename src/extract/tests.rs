use std::collections::HashSet;

use tempfile::TempDir;

use super::*;
use crate::test_support::{config_with_indices, source_pages};

fn extra_names(extraction: &Extraction<'_>) -> Vec<String> {
    extraction
        .extras
        .iter()
        .map(|extra| extra.name.clone())
        .collect()
}

#[test]
fn every_slot_resolves_when_source_matches_manifest() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_with_indices(&[0, 1, 2, 3], dir.path());
    let pages = source_pages(4);

    let extraction = extract(&config, &pages);

    assert_eq!(extraction.assignment.resolved().count(), 4);
    assert_eq!(extraction.assignment.missing().count(), 0);
    assert!(extraction.extras.is_empty());
    assert!(extraction.warnings().is_empty());

    let trends = extraction.assignment.get("trends").expect("trends slot");
    assert_eq!(trends.state, SlotState::Resolved(&pages[2]));
}

#[test]
fn slot_beyond_source_is_missing_and_others_resolve() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_with_indices(&[0, 1, 2, 5], dir.path());
    let pages = source_pages(4);

    let extraction = extract(&config, &pages);

    let missing: Vec<_> = extraction
        .assignment
        .missing()
        .map(|entry| entry.slot.name.as_str())
        .collect();
    assert_eq!(missing, vec!["budget"]);
    assert_eq!(
        extraction.assignment.get("budget").map(|entry| &entry.state),
        Some(&SlotState::Missing {
            requested: 5,
            available: 4
        })
    );
    assert_eq!(extraction.assignment.resolved().count(), 3);
    // Page 4 is unclaimed because the fourth slot asked for index 5.
    assert_eq!(extra_names(&extraction), vec!["page_4"]);

    let warnings = extraction.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Label budget"));
    assert!(warnings[0].contains("only has 4 pages"));
}

#[test]
fn unclaimed_pages_become_extras_in_source_order() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_with_indices(&[0, 2], dir.path());
    let pages = source_pages(5);

    let extraction = extract(&config, &pages);

    assert_eq!(extraction.assignment.resolved().count(), 2);
    assert_eq!(extra_names(&extraction), vec!["page_2", "page_4", "page_5"]);
    let extra_indices: Vec<_> = extraction.extras.iter().map(|extra| extra.page.index).collect();
    assert_eq!(extra_indices, vec![1, 3, 4]);
}

#[test]
fn colliding_slots_share_a_page_and_are_reported() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_with_indices(&[0, 1, 1], dir.path());
    let pages = source_pages(3);

    let extraction = extract(&config, &pages);

    let categories = extraction.assignment.get("categories").expect("categories");
    let trends = extraction.assignment.get("trends").expect("trends");
    assert_eq!(categories.state, SlotState::Resolved(&pages[1]));
    assert_eq!(trends.state, SlotState::Resolved(&pages[1]));
    assert_eq!(extraction.collisions.len(), 1);
    assert_eq!(extraction.collisions[0].index, 1);
    assert_eq!(extra_names(&extraction), vec!["page_3"]);
    assert!(
        extraction
            .warnings()
            .iter()
            .any(|warning| warning.contains("categories, trends"))
    );
}

#[test]
fn extras_plus_used_indices_cover_every_source_page() {
    let dir = TempDir::new().expect("tempdir");
    let manifests: [&[usize]; 5] = [&[0, 1, 2, 3], &[0, 2], &[4, 0], &[1, 1, 7], &[9]];

    for indices in manifests {
        let config = config_with_indices(indices, dir.path());
        for page_count in 0..=6 {
            let pages = source_pages(page_count);
            let extraction = extract(&config, &pages);

            let used: HashSet<usize> = extraction
                .assignment
                .resolved()
                .map(|(_, page)| page.index)
                .collect();
            assert_eq!(
                extraction.extras.len() + used.len(),
                page_count,
                "indices {indices:?} over {page_count} pages"
            );

            let order: Vec<_> = extraction.extras.iter().map(|extra| extra.page.index).collect();
            let mut sorted = order.clone();
            sorted.sort_unstable();
            assert_eq!(order, sorted);

            let expected_missing = indices.iter().filter(|index| **index >= page_count).count();
            assert_eq!(extraction.assignment.missing().count(), expected_missing);
        }
    }
}

#[test]
fn persist_writes_deterministic_names_and_is_idempotent() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_with_indices(&[0, 2], dir.path());
    let pages = source_pages(4);
    let extraction = extract(&config, &pages);

    let first = persist(&extraction, &config.images_dir).expect("first persist");
    let first_bytes = fs::read(config.images_dir.join("overview.png")).expect("overview.png");
    let second = persist(&extraction, &config.images_dir).expect("second persist");
    let second_bytes = fs::read(config.images_dir.join("overview.png")).expect("overview.png");

    assert_eq!(first, second);
    assert_eq!(first_bytes, second_bytes);
    assert_eq!(first_bytes, pages[0].image);

    let keys: Vec<_> = first.iter().map(|image| (image.key.as_str(), image.kind)).collect();
    assert_eq!(
        keys,
        vec![
            ("overview", ImageKind::Slot),
            ("categories", ImageKind::Slot),
            ("page_2", ImageKind::Extra),
            ("page_4", ImageKind::Extra),
        ]
    );
    assert!(config.images_dir.join("page_4.png").is_file());

    let mut files: Vec<_> = fs::read_dir(&config.images_dir)
        .expect("images dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(
        files,
        vec!["categories.png", "overview.png", "page_2.png", "page_4.png"]
    );
}

#[test]
fn persist_removes_stale_image_for_slot_missing_this_run() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_with_indices(&[0, 3], dir.path());

    let full = source_pages(4);
    persist(&extract(&config, &full), &config.images_dir).expect("full run");
    assert!(config.images_dir.join("categories.png").is_file());

    let short = source_pages(2);
    persist(&extract(&config, &short), &config.images_dir).expect("short run");
    assert!(!config.images_dir.join("categories.png").exists());
    assert!(config.images_dir.join("overview.png").is_file());
}

#[test]
fn persist_removes_extra_pages_the_current_source_no_longer_has() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_with_indices(&[0], dir.path());

    persist(&extract(&config, &source_pages(5)), &config.images_dir).expect("five page run");
    assert!(config.images_dir.join("page_5.png").is_file());

    let unrelated = config.images_dir.join("page_notes.png");
    std::fs::write(&unrelated, b"kept").expect("write unrelated file");

    let written =
        persist(&extract(&config, &source_pages(4)), &config.images_dir).expect("four page run");

    assert!(!config.images_dir.join("page_5.png").exists());
    for name in ["page_2.png", "page_3.png", "page_4.png"] {
        assert!(config.images_dir.join(name).is_file(), "{name} should remain");
    }
    assert!(unrelated.is_file());
    assert_eq!(written.len(), 4);
}

#[test]
fn extra_page_file_names_are_recognised_exactly() {
    assert!(is_extra_page_file(Path::new("page_12.png")));
    assert!(!is_extra_page_file(Path::new("page_.png")));
    assert!(!is_extra_page_file(Path::new("page_1.jpg")));
    assert!(!is_extra_page_file(Path::new("page_one.png")));
    assert!(!is_extra_page_file(Path::new("overview.png")));
}
