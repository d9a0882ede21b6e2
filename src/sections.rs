//! Section identifiers: `section1`, `section2`, ... allocated per subject.
//!
//! Numbers are never handed out twice for a subject: the store remembers the
//! highest number it ever issued, so deleting `section3` does not free `3`.
//!
//! Allocation reads the current sections and writes the new one in a
//! separate step, so two authors creating sections at the same moment can
//! compute the same id. The tool is single-operator and accepts that race.

use crate::domain::{NewSection, Section};
use crate::error::{AuthoringError, Result};
use crate::util::non_empty;

const SECTION_PREFIX: &str = "section";

/// Numeric suffix of a generated section id.
pub fn section_number(id: &str) -> Option<u32> {
    id.strip_prefix(SECTION_PREFIX)?.parse().ok()
}

/// Next id for a subject that currently holds `existing` and has already
/// issued numbers up to `last_issued`.
///
/// The candidate is `section<count + 1>`, raised past `last_issued` so a
/// deleted section's number (and the levels still filed under it) is never
/// picked up again. Ids written by hand may still collide, so the number
/// moves forward until it names no live section.
pub fn next_section_id(existing: &[Section], last_issued: u32) -> String {
    let mut number = (existing.len() as u32).max(last_issued) + 1;
    while existing.iter().any(|s| section_number(&s.id) == Some(number)) {
        number += 1;
    }
    format!("{SECTION_PREFIX}{number}")
}

/// Sort sections by their number, falling back to the raw id.
pub fn sort_sections(sections: &mut [Section]) {
    sections.sort_by(|a, b| {
        section_number(&a.id)
            .cmp(&section_number(&b.id))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Name and title are required; everything else is optional.
pub fn validate_new_section(section: &NewSection) -> Result<NewSection> {
    let name = section.name.trim();
    if name.is_empty() {
        return Err(AuthoringError::MissingRequiredField { field: "name" });
    }
    let title = section.title.trim();
    if title.is_empty() {
        return Err(AuthoringError::MissingRequiredField { field: "title" });
    }
    Ok(NewSection {
        name: name.to_string(),
        title: title.to_string(),
        description: non_empty(section.description.clone()),
        background_image: non_empty(section.background_image.clone()),
    })
}
