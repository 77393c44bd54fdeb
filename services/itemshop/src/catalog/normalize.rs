//! Normalize raw shop sections into canonical records

use serde_json::Value;
use crate::catalog::offer_groups::summarize;
use crate::catalog::resolve::{
    object_field, resolve_string, str_field, DISPLAY_NAME_ALIASES, SECTION_ID_ALIASES,
};
use crate::catalog::section::{CanonicalSection, SectionView};
use crate::catalog::stack_ranks::{earliest_start, group_stack_ranks};

/// Normalize a single raw section.
///
/// Never fails: anything missing or malformed comes out as `None`/empty.
pub fn normalize_section(raw: &Value) -> CanonicalSection {
    let Some(view) = SectionView::new(raw) else {
        return CanonicalSection::default();
    };

    let groups = group_stack_ranks(&view);
    let summary = summarize(view.offer_groups());

    let custom_texture = view
        .metadata
        .and_then(|m| object_field(m, "background"))
        .and_then(|bg| str_field(bg, "customTexture"))
        .map(str::to_string);

    CanonicalSection {
        section_id: resolve_string(view.base, &SECTION_ID_ALIASES),
        display_name: resolve_string(view.base, &DISPLAY_NAME_ALIASES),
        custom_texture,
        offer_groups_count: summary.count,
        has_texture_metadata: summary.has_texture,
        texture_urls: summary.texture_urls,
        stack_rank_start: earliest_start(&groups),
    }
}

/// Batch normalize raw sections, preserving order
pub fn normalize_batch(sections: &[Value]) -> Vec<CanonicalSection> {
    sections.iter().map(normalize_section).collect()
}

/// Sections that would be dropped from every day bucket
pub fn undated(sections: &[CanonicalSection]) -> Vec<&CanonicalSection> {
    sections
        .iter()
        .filter(|s| s.stack_rank_start.is_none())
        .collect()
}
