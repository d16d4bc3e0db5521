//! Metadata normalization.
//!
//! [`normalize`] turns a raw [`ApiResponse`] into [`NormalizedMetadata`] that
//! satisfies a marketplace's constraint table. It is pure and deterministic:
//! the same input always yields the same output, and normalizing an already
//! normalized result changes nothing.

use std::collections::HashSet;

use crate::models::{ApiResponse, Marketplace, NormalizedMetadata};

/// Placeholder vocabulary used to pad short tag lists, in order.
pub const PLACEHOLDER_TAGS: &[&str] = &[
    "graphic design",
    "gift idea",
    "unique design",
    "original artwork",
    "illustration",
    "creative",
    "cool",
    "funny",
    "vintage",
    "retro",
    "modern",
    "trendy",
    "aesthetic",
    "minimalist",
    "colorful",
    "cute",
    "humor",
    "novelty",
    "statement",
    "birthday gift",
    "christmas gift",
    "present",
    "fan art",
    "pop culture",
    "artistic",
    "bold",
    "fun",
    "everyday",
];

/// Qualifier appended to placeholders once the vocabulary is used up.
const PAD_QUALIFIER: &str = "design";

/// Normalizes a raw model response for a marketplace.
pub fn normalize(raw: &ApiResponse, market: Marketplace) -> NormalizedMetadata {
    let constraints = market.constraints();

    let mut tags = clean_tags(raw.tag_strings());
    if let Some(floor) = constraints.tag_floor {
        pad_tags(&mut tags, floor);
    }
    if let Some(ceiling) = constraints.tag_ceiling {
        tags.truncate(ceiling);
    }

    NormalizedMetadata {
        title: clamp_text(&raw.title, constraints.title_max_chars),
        description: clamp_text(&raw.description, constraints.description_max_chars),
        tags,
        main_tag: raw.main_tag.clone(),
    }
}

/// Lowercases, trims and deduplicates tags, keeping first-seen order.
fn clean_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

fn pad_tags(tags: &mut Vec<String>, floor: usize) {
    let mut seen: HashSet<String> = tags.iter().cloned().collect();
    let mut round = 0usize;

    while tags.len() < floor {
        for word in PLACEHOLDER_TAGS {
            if tags.len() >= floor {
                break;
            }
            let candidate = match round {
                0 => (*word).to_string(),
                1 => format!("{word} {PAD_QUALIFIER}"),
                n => format!("{word} {PAD_QUALIFIER} {n}"),
            };
            if seen.insert(candidate.clone()) {
                tags.push(candidate);
            }
        }
        round += 1;
    }
}

/// Trims, truncates to `max_chars` characters, then trims trailing whitespace.
fn clamp_text(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].trim_end().to_string(),
        None => text.to_string(),
    }
}
