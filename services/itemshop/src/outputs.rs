//! Output writing for the item shop pipeline (per-day JSON, TSV, raw dump)

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use crate::catalog::CanonicalSection;
use crate::config::TsvHeader;
use crate::timebucket::{DayBuckets, DayKey};

/// Header line as historically written. It names nine columns while each row
/// carries the six values of [`ALIGNED_TSV_COLUMNS`].
pub const LEGACY_TSV_HEADER: [&str; 9] = [
    "sectionId",
    "displayName",
    "landingPriority",
    "sortPriority",
    "devName",
    "customTexture",
    "offerGroupsCount",
    "textureMetadata",
    "stackRankStart",
];

pub const ALIGNED_TSV_COLUMNS: [&str; 6] = [
    "sectionId",
    "displayName",
    "customTexture",
    "offerGroupsCount",
    "hasTextureMetadata",
    "stackRankStart",
];

/// Payload of one `mp_item_shop_{date}.json` file
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayFile<'a> {
    pub date: String,
    pub generated_at: String,
    pub count: usize,
    pub sections: &'a [CanonicalSection],
}

impl<'a> DayFile<'a> {
    pub fn new(key: &DayKey, generated_at: &DateTime<FixedOffset>, sections: &'a [CanonicalSection]) -> Self {
        Self {
            date: key.to_string(),
            generated_at: generated_at.to_rfc3339(),
            count: sections.len(),
            sections,
        }
    }
}

/// Write one pretty-printed JSON file per populated day bucket
pub fn write_day_files(
    dir: &Path,
    buckets: &DayBuckets,
    generated_at: &DateTime<FixedOffset>,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {:?}", dir))?;

    let mut written = Vec::with_capacity(buckets.len());
    for (key, sections) in buckets {
        let path = dir.join(key.file_name());
        let payload = DayFile::new(key, generated_at, sections);
        let json = serde_json::to_string_pretty(&payload)
            .context("Failed to serialize day file")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write day file: {:?}", path))?;
        tracing::debug!("Wrote {} sections to {:?}", sections.len(), path);
        written.push(path);
    }

    tracing::info!("Wrote {} day files to {:?}", written.len(), dir);
    Ok(written)
}

fn tsv_text(value: Option<&str>) -> String {
    match value {
        Some(v) => v.replace(['\t', '\n', '\r'], " "),
        None => "None".to_string(),
    }
}

fn tsv_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Six tab-separated values, in [`ALIGNED_TSV_COLUMNS`] order
pub fn tsv_row(section: &CanonicalSection) -> String {
    [
        tsv_text(section.section_id.as_deref()),
        tsv_text(section.display_name.as_deref()),
        tsv_text(section.custom_texture.as_deref()),
        section.offer_groups_count.to_string(),
        tsv_bool(section.has_texture_metadata).to_string(),
        tsv_text(section.stack_rank_start.as_deref()),
    ]
    .join("\t")
}

pub fn tsv_header(header: TsvHeader) -> String {
    match header {
        TsvHeader::Legacy => LEGACY_TSV_HEADER.join("\t"),
        TsvHeader::Aligned => ALIGNED_TSV_COLUMNS.join("\t"),
    }
}

/// Write all sections (dated or not) as TSV
pub fn write_tsv(path: &Path, sections: &[CanonicalSection], header: TsvHeader) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let mut file = std::io::BufWriter::new(
        std::fs::File::create(path)
            .with_context(|| format!("Failed to create TSV file: {:?}", path))?,
    );

    writeln!(file, "{}", tsv_header(header))?;
    for section in sections {
        writeln!(file, "{}", tsv_row(section))?;
    }
    file.flush()?;

    tracing::info!("Wrote {} TSV rows to {:?}", sections.len(), path);
    Ok(())
}

/// Persist the raw catalog document for offline inspection
pub fn dump_raw_document(path: &Path, document: &serde_json::Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(document)
        .context("Failed to serialize raw document")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write raw document: {:?}", path))?;
    tracing::info!("Saved raw catalog document to {:?}", path);
    Ok(())
}
