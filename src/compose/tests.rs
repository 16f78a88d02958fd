use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tempfile::TempDir;

use super::style::{SLATE, WHITE};
use super::*;
use crate::config::Rgb;
use crate::extract::{extract, persist};
use crate::test_support::{config_with_indices, source_pages};

fn options(today: NaiveDate) -> ComposeOptions {
    ComposeOptions {
        date_range: None,
        client_name: None,
        today,
        extension: "json".to_string(),
    }
}

fn oct_15() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid date")
}

fn kinds(deck: &Deck) -> Vec<SlideKind> {
    deck.slides.iter().map(|slide| slide.kind).collect()
}

#[test]
fn deck_follows_title_content_insights_closing_order() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_with_indices(&[0, 1, 2, 3], dir.path());
    let pages = source_pages(4);
    let persisted = persist(&extract(&config, &pages), &config.images_dir).expect("persist");

    let deck = compose(&config, &SlotImages::from_persisted(&persisted), &options(oct_15()));

    assert_eq!(
        kinds(&deck),
        vec![
            SlideKind::Title,
            SlideKind::Content,
            SlideKind::Content,
            SlideKind::Content,
            SlideKind::Content,
            SlideKind::Insights,
            SlideKind::Closing,
        ]
    );
    let titles: Vec<_> = deck.slides[1..5].iter().map(|slide| slide.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Label overview", "Label categories", "Label trends", "Label budget"]
    );
    assert_eq!(deck.slides[1].subtitle.as_deref(), Some("About overview"));
    assert!(deck.slides.iter().all(|slide| !slide.is_placeholder()));
    assert!(deck.degradations.is_empty());
    assert_eq!(
        deck.slides[1].body,
        SlideBody::Image {
            path: config.images_dir.join("overview.png")
        }
    );
}

#[test]
fn unresolved_slot_gets_placeholder_without_dropping_slides() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_with_indices(&[0, 1, 2, 5], dir.path());
    let pages = source_pages(4);
    let persisted = persist(&extract(&config, &pages), &config.images_dir).expect("persist");

    let deck = compose(&config, &SlotImages::from_persisted(&persisted), &options(oct_15()));

    assert_eq!(deck.slides.len(), 7);
    let budget = &deck.slides[4];
    assert_eq!(budget.title, "Label budget");
    match &budget.body {
        SlideBody::Placeholder {
            diagnostic,
            missing,
            ..
        } => {
            assert_eq!(diagnostic, "Screenshot not found: N/A");
            assert!(missing.is_none());
        }
        other => panic!("expected placeholder, got {other:?}"),
    }
    assert_eq!(deck.degradations.len(), 1);
    assert_eq!(deck.degradations[0].slot, "budget");
}

#[test]
fn deleted_image_degrades_only_its_own_slide() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_with_indices(&[0, 1, 2], dir.path());
    let pages = source_pages(3);
    let persisted = persist(&extract(&config, &pages), &config.images_dir).expect("persist");
    let deleted = config.images_dir.join("categories.png");
    fs::remove_file(&deleted).expect("delete categories.png");

    let deck = compose(&config, &SlotImages::from_persisted(&persisted), &options(oct_15()));

    let placeholders: Vec<_> = deck
        .slides
        .iter()
        .filter(|slide| slide.is_placeholder())
        .collect();
    assert_eq!(placeholders.len(), 1);
    assert_eq!(placeholders[0].title, "Label categories");
    match &placeholders[0].body {
        SlideBody::Placeholder {
            diagnostic,
            missing,
            ..
        } => {
            assert!(diagnostic.contains(&deleted.display().to_string()));
            assert_eq!(missing.as_deref(), Some(deleted.as_path()));
        }
        other => panic!("expected placeholder, got {other:?}"),
    }
    assert!(matches!(deck.slides[1].body, SlideBody::Image { .. }));
    assert!(matches!(deck.slides[3].body, SlideBody::Image { .. }));
}

#[test]
fn images_dir_mapping_supports_compose_without_capture() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_with_indices(&[0, 1], dir.path());
    fs::create_dir_all(&config.images_dir).expect("images dir");
    fs::write(config.images_dir.join("overview.png"), b"png").expect("overview.png");

    let images = SlotImages::from_images_dir(&config, &config.images_dir);
    let deck = compose(&config, &images, &options(oct_15()));

    assert!(matches!(deck.slides[1].body, SlideBody::Image { .. }));
    assert!(deck.slides[2].is_placeholder());
    assert!(deck.degradations[0].diagnostic.ends_with("categories.png"));
}

#[test]
fn sections_insert_divider_when_section_changes() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = config_with_indices(&[0, 1, 2], dir.path());
    config.report_pages[0].section = Some("Spending".to_string());
    config.report_pages[1].section = Some("Spending".to_string());
    config.report_pages[2].section = Some("Planning".to_string());

    let deck = compose(&config, &SlotImages::default(), &options(oct_15()));

    assert_eq!(
        kinds(&deck),
        vec![
            SlideKind::Title,
            SlideKind::Section,
            SlideKind::Content,
            SlideKind::Content,
            SlideKind::Section,
            SlideKind::Content,
            SlideKind::Insights,
            SlideKind::Closing,
        ]
    );
    assert_eq!(deck.slides[4].title, "Planning");
}

#[test]
fn title_slide_uses_default_fortnight_and_client_override() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_with_indices(&[0], dir.path());

    let deck = compose(&config, &SlotImages::default(), &options(oct_15()));
    let title = &deck.slides[0];
    assert_eq!(title.title, "Financial Review");
    assert_eq!(title.subtitle.as_deref(), Some("Oct 01 - Oct 15, 2026"));
    let SlideBody::Text { blocks } = &title.body else {
        panic!("title slide carries text blocks");
    };
    let lines: Vec<_> = blocks.iter().flat_map(|block| block.lines.clone()).collect();
    assert_eq!(
        lines,
        vec![
            "Clarity Finance",
            "Prepared for Sarah M.",
            "Prepared by Jordan Lee"
        ]
    );

    let mut overridden = options(oct_15());
    overridden.client_name = Some("Alex P. Smith".to_string());
    overridden.date_range = Some("Jan 1 - Jan 15, 2026".to_string());
    let deck = compose(&config, &SlotImages::default(), &overridden);
    assert_eq!(deck.slides[0].subtitle.as_deref(), Some("Jan 1 - Jan 15, 2026"));
    assert_eq!(deck.client_name, "Alex P. Smith");
    assert_eq!(deck.filename, "Financial_Review_Alex_P_Smith_2026-10-15.json");
}

#[test]
fn default_date_range_crosses_year_boundary() {
    let today = NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid date");
    assert_eq!(default_date_range(today), "Dec 22 - Jan 05, 2026");
}

#[test]
fn output_filename_is_deterministic_for_same_client_and_day() {
    let first = output_filename("Financial_Review", "Sarah M.", oct_15(), "json");
    let second = output_filename("Financial_Review", "Sarah M.", oct_15(), "json");
    assert_eq!(first, "Financial_Review_Sarah_M_2026-10-15.json");
    assert_eq!(first, second);
}

#[test]
fn output_filename_keeps_client_names_inside_the_output_directory() {
    let nested = output_filename("Financial_Review", "a/b", oct_15(), "json");
    let escaping = output_filename("Financial_Review", "../x", oct_15(), "json");
    let windows = output_filename("Financial_Review", "a\\b", oct_15(), "json");

    assert_eq!(nested, "Financial_Review_a_b_2026-10-15.json");
    assert_eq!(escaping, "Financial_Review__x_2026-10-15.json");
    assert_eq!(windows, "Financial_Review_a_b_2026-10-15.json");
    for name in [nested, escaping, windows] {
        assert_eq!(Path::new(&name).components().count(), 1, "{name}");
    }
}

#[test]
fn insights_slide_has_three_insights_and_three_actions() {
    let dir = TempDir::new().expect("tempdir");
    let config = config_with_indices(&[0], dir.path());

    let deck = compose(&config, &SlotImages::default(), &options(oct_15()));
    let insights = &deck.slides[deck.slides.len() - 2];
    assert_eq!(insights.kind, SlideKind::Insights);
    let SlideBody::Text { blocks } = &insights.body else {
        panic!("insights slide carries text blocks");
    };
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].heading.as_deref(), Some("Insights"));
    assert_eq!(blocks[0].lines.len(), 3);
    assert_eq!(blocks[1].heading.as_deref(), Some("Recommended Actions"));
    assert_eq!(blocks[1].lines.len(), 3);
}

#[test]
fn every_slide_color_comes_from_the_closed_palette() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = config_with_indices(&[0, 1], dir.path());
    config.report_pages[0].section = Some("Spending".to_string());

    let deck = compose(&config, &SlotImages::default(), &options(oct_15()));
    let palette = deck.palette;
    let allowed = [
        palette.primary,
        palette.accent,
        palette.dark,
        palette.light,
        palette.text,
        WHITE,
        SLATE,
    ];

    let mut used: Vec<Rgb> = Vec::new();
    for slide in &deck.slides {
        used.extend([
            slide.style.background,
            slide.style.title_color,
            slide.style.subtitle_color,
            slide.style.edge_rule,
        ]);
        used.extend(slide.style.header_bar);
        match &slide.body {
            SlideBody::Text { blocks } => used.extend(blocks.iter().map(|block| block.color)),
            SlideBody::Placeholder { color, .. } => used.push(*color),
            SlideBody::Image { .. } => {}
        }
    }

    assert!(used.iter().all(|color| allowed.contains(color)));
    assert_eq!(deck.slides[0].style.background, Rgb::new(0x2b, 0x67, 0x77));
    assert_eq!(deck.slides[2].style.header_bar, Some(palette.primary));
}
