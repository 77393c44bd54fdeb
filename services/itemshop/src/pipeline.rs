use crate::catalog::{locate_sections, normalize_batch, undated, CanonicalSection};
use crate::config::Config;
use crate::error::PipelineError;
use crate::images::{DownloadStats, ImageStore, SectionRenderer};
use crate::outputs::{dump_raw_document, write_day_files, write_tsv};
use crate::source::CatalogSource;
use crate::timebucket::bucket_by_day;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

/// Counts reported at the end of a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sections: usize,
    pub dated: usize,
    pub day_files: Vec<PathBuf>,
    pub images: DownloadStats,
    pub cards_rendered: usize,
    pub cards_failed: usize,
}

/// Locate and normalize the sections of a catalog document.
pub fn extract_sections(document: &serde_json::Value) -> Option<Vec<CanonicalSection>> {
    locate_sections(document).map(normalize_batch)
}

pub struct Pipeline {
    config: Config,
    source: Box<dyn CatalogSource>,
}

impl Pipeline {
    pub fn new(config: Config, source: Box<dyn CatalogSource>) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch, normalize, partition and write everything once.
    pub async fn run_once(&self) -> Result<RunSummary> {
        info!("Fetching catalog from source: {}", self.source.name());
        let document = self
            .source
            .fetch_catalog()
            .await
            .with_context(|| format!("Failed to fetch catalog from {}", self.source.name()))?;

        let Some(sections) = extract_sections(&document) else {
            let dump_path = self.config.raw_dump_path();
            error!("No shop sections found; saving raw document for inspection");
            dump_raw_document(&dump_path, &document)?;
            return Err(PipelineError::SectionsNotFound { dump_path }.into());
        };

        let skipped = undated(&sections).len();
        info!(
            "Normalized {} sections ({} without a usable start date)",
            sections.len(),
            skipped
        );

        let offset = self.config.zone_offset()?;
        let buckets = bucket_by_day(&sections, offset);
        let dated: usize = buckets.values().map(Vec::len).sum();
        let unparsable = sections.len() - skipped - dated;
        if unparsable > 0 {
            warn!("{} sections have a start date that could not be parsed", unparsable);
        }
        let generated_at = Utc::now().with_timezone(&offset);

        let day_files = write_day_files(&self.config.by_date_dir(), &buckets, &generated_at)?;
        write_tsv(&self.config.tsv_path(), &sections, self.config.tsv.header)?;

        let mut summary = RunSummary {
            sections: sections.len(),
            dated,
            day_files,
            ..Default::default()
        };

        let images = &self.config.images;
        if images.download || images.render {
            let store = ImageStore::new(
                self.config.backgrounds_dir(),
                images,
                &self.config.source.user_agent,
            )?;

            if images.download {
                summary.images = store.save_all(&sections).await;
            }

            if images.render {
                let renderer = SectionRenderer::new(
                    self.config.section_images_dir(),
                    images.font_path.as_deref(),
                    offset,
                );
                self.render_cards(&store, &renderer, &sections, &mut summary).await;
            }
        }

        info!(
            "Run complete: {} sections, {} dated, {} day files, {} cards",
            summary.sections,
            summary.dated,
            summary.day_files.len(),
            summary.cards_rendered
        );
        Ok(summary)
    }

    async fn render_cards(
        &self,
        store: &ImageStore,
        renderer: &SectionRenderer,
        sections: &[CanonicalSection],
        summary: &mut RunSummary,
    ) {
        for section in sections {
            let Some(url) = section.custom_texture.as_deref() else {
                continue;
            };

            let cached = store.path_for(section, url);
            let background = if cached.exists() {
                debug!("Using cached background {:?}", cached);
                std::fs::read(&cached)
                    .with_context(|| format!("Failed to read cached background {:?}", cached))
            } else {
                store.fetch_bytes(url).await
            };

            let rendered = background.and_then(|bytes| renderer.render(section, &bytes));
            match rendered {
                Ok(_) => summary.cards_rendered += 1,
                Err(e) => {
                    warn!(
                        "Failed to render card for {}: {:#}",
                        section.label().unwrap_or("unknown section"),
                        e
                    );
                    summary.cards_failed += 1;
                }
            }
        }
    }

    /// Run forever on a fixed interval. A failed run is logged and the next
    /// tick proceeds.
    pub async fn watch(&self, interval_secs: u64) -> Result<()> {
        info!("Watching catalog every {}s", interval_secs);
        let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            ticker.tick().await;
            match self.run_once().await {
                Ok(summary) => debug!("Watch iteration finished: {:?}", summary),
                Err(e) => error!("Watch iteration failed: {:#}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockCatalog;
    use serde_json::json;
    use tempfile::TempDir;

    fn offline_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.output.data_dir = dir.path().to_string_lossy().to_string();
        config.images.download = false;
        config.images.render = false;
        config
    }

    #[tokio::test]
    async fn test_mock_run_writes_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let config = offline_config(&temp_dir);
        let pipeline = Pipeline::new(config, Box::new(MockCatalog::new("mock".to_string())));

        let summary = pipeline.run_once().await.unwrap();
        assert_eq!(summary.sections, 4);
        assert_eq!(summary.dated, 3);
        // Featured 09-19 and Daily 09-18T15:00Z both land on 2025-09-19 JST
        assert_eq!(summary.day_files.len(), 2);

        let day = temp_dir
            .path()
            .join("itemshop_by_date")
            .join("mp_item_shop_2025-09-19.json");
        let payload: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&day).unwrap()).unwrap();
        assert_eq!(payload["count"], 2);
        assert_eq!(payload["sections"][0]["sectionId"], "Featured");
        assert_eq!(payload["sections"][1]["sectionId"], "Daily");

        let tsv = std::fs::read_to_string(temp_dir.path().join("shop_sections_with_dates.tsv")).unwrap();
        assert_eq!(tsv.lines().count(), 5);
    }

    #[tokio::test]
    async fn test_missing_sections_dumps_and_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = offline_config(&temp_dir);
        let document = json!({ "_title": "maintenance", "entries": [] });
        let pipeline = Pipeline::new(
            config,
            Box::new(MockCatalog::with_document("mock".to_string(), document.clone())),
        );

        let err = pipeline.run_once().await.unwrap_err();
        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::SectionsNotFound { dump_path }) => {
                let dumped: serde_json::Value =
                    serde_json::from_str(&std::fs::read_to_string(dump_path).unwrap()).unwrap();
                assert_eq!(dumped, document);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!temp_dir.path().join("shop_sections_with_dates.tsv").exists());
    }

    #[tokio::test]
    async fn test_unparsable_start_is_not_dated() {
        let temp_dir = TempDir::new().unwrap();
        let config = offline_config(&temp_dir);
        let document = json!({ "sections": [
            { "sectionId": "A", "stackRanks": [{ "startDate": "2025-09-19T00:00:00.000Z" }] },
            { "sectionId": "B", "stackRanks": [{ "startDate": "next week" }] },
            { "sectionId": "C" }
        ] });
        let pipeline = Pipeline::new(
            config,
            Box::new(MockCatalog::with_document("mock".to_string(), document)),
        );

        let summary = pipeline.run_once().await.unwrap();
        assert_eq!(summary.sections, 3);
        assert_eq!(summary.dated, 1);
        assert_eq!(summary.day_files.len(), 1);
    }

    #[test]
    fn test_extract_sections() {
        let document = json!({ "wrapper": { "sections": [{ "title": "Only" }] } });
        let sections = extract_sections(&document).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].display_name.as_deref(), Some("Only"));
        assert!(extract_sections(&json!({})).is_none());
    }
}
