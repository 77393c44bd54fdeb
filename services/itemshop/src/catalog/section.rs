//! Section shapes: the borrowed view over a raw section and the canonical record

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::catalog::resolve::{array_field, object_field};

/// Normalized shop section handed to bucketing and the output writers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSection {
    pub section_id: Option<String>,
    pub display_name: Option<String>,
    pub custom_texture: Option<String>,
    pub offer_groups_count: usize,
    pub has_texture_metadata: bool,
    pub texture_urls: Vec<String>,
    pub stack_rank_start: Option<String>,
}

impl CanonicalSection {
    /// Folder/file stem: section id, else display name.
    pub fn label(&self) -> Option<&str> {
        self.section_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.display_name.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Raw section with its wrapper and metadata levels resolved.
#[derive(Debug, Clone, Copy)]
pub struct SectionView<'a> {
    pub raw: &'a Map<String, Value>,
    /// `section` or `content` payload, or `raw` itself when unwrapped.
    pub base: &'a Map<String, Value>,
    pub base_is_wrapper: bool,
    pub metadata: Option<&'a Map<String, Value>>,
}

impl<'a> SectionView<'a> {
    /// `None` when the raw section is not a JSON object.
    pub fn new(raw: &'a Value) -> Option<Self> {
        let raw = raw.as_object()?;

        let wrapped = object_field(raw, "section").or_else(|| object_field(raw, "content"));
        let (base, base_is_wrapper) = match wrapped {
            Some(inner) => (inner, true),
            None => (raw, false),
        };

        let metadata = object_field(base, "metadata").or_else(|| object_field(raw, "metadata"));

        Some(Self {
            raw,
            base,
            base_is_wrapper,
            metadata,
        })
    }

    pub fn offer_groups(&self) -> &'a [Value] {
        self.metadata
            .and_then(|m| array_field(m, "offerGroups"))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
