//! Background and texture downloads

use crate::catalog::CanonicalSection;
use crate::config::ImagesConfig;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const FORBIDDEN_PATH_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];
const FALLBACK_FILE_NAME: &str = "unknown.jpg";
const FALLBACK_FOLDER: &str = "unknown_section";

/// Strip characters that are not allowed in file names on common platforms.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !FORBIDDEN_PATH_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Last path segment of `url`, or a fixed fallback.
pub fn url_basename(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

/// Where a section's images go: a per-section folder when it carries
/// texture metadata, otherwise the shared root.
pub fn section_dir(root: &Path, section: &CanonicalSection) -> PathBuf {
    if !section.has_texture_metadata {
        return root.to_path_buf();
    }
    let folder = sanitize_file_name(section.label().unwrap_or(FALLBACK_FOLDER));
    if folder.is_empty() {
        root.join(FALLBACK_FOLDER)
    } else {
        root.join(folder)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadStats {
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct ImageStore {
    root: PathBuf,
    client: reqwest::Client,
}

impl ImageStore {
    pub fn new(root: PathBuf, config: &ImagesConfig, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build image HTTP client")?;
        Ok(Self { root, client })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path `url` is (or would be) stored at for `section`.
    pub fn path_for(&self, section: &CanonicalSection, url: &str) -> PathBuf {
        section_dir(&self.root, section).join(url_basename(url))
    }

    /// Download `url` into `dest_dir` unless a file of that name already exists.
    /// Returns the local path and whether a download happened.
    pub async fn save(&self, url: &str, dest_dir: &Path) -> Result<(PathBuf, bool)> {
        std::fs::create_dir_all(dest_dir)
            .with_context(|| format!("Failed to create directory: {:?}", dest_dir))?;

        let out_path = dest_dir.join(url_basename(url));
        if out_path.exists() {
            debug!("Already saved: {:?}", out_path);
            return Ok((out_path, false));
        }

        let bytes = self.fetch_bytes(url).await?;
        std::fs::write(&out_path, &bytes)
            .with_context(|| format!("Failed to write image: {:?}", out_path))?;
        debug!("Saved {} bytes to {:?}", bytes.len(), out_path);
        Ok((out_path, true))
    }

    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch image {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Image request for {} returned {}", url, response.status());
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read image body {}", url))?;
        Ok(bytes.to_vec())
    }

    /// Save every background and texture referenced by `sections`.
    /// Failures are logged and counted, never returned.
    pub async fn save_all(&self, sections: &[CanonicalSection]) -> DownloadStats {
        let jobs: Vec<(&str, PathBuf)> = sections
            .iter()
            .flat_map(|section| {
                let dest = section_dir(&self.root, section);
                section
                    .custom_texture
                    .iter()
                    .chain(section.texture_urls.iter())
                    .map(move |url| (url.as_str(), dest.clone()))
            })
            .collect();

        let progress = ProgressBar::new(jobs.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{spinner} images [{bar:30}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut stats = DownloadStats::default();
        for (url, dest) in jobs {
            progress.set_message(url_basename(url));
            match self.save(url, &dest).await {
                Ok((_, true)) => stats.saved += 1,
                Ok((_, false)) => stats.skipped += 1,
                Err(e) => {
                    warn!("Failed to save image {}: {:#}", url, e);
                    stats.failed += 1;
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        info!(
            "Images: {} saved, {} already present, {} failed",
            stats.saved, stats.skipped, stats.failed
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name(" Featured:Set/01? "), "FeaturedSet01");
        assert_eq!(sanitize_file_name("a\\b*c\"d<e>f|g"), "abcdefg");
        assert_eq!(sanitize_file_name("注目アイテム"), "注目アイテム");
    }

    #[test]
    fn test_url_basename() {
        assert_eq!(url_basename("https://cdn.example.com/bg/featured.jpg?v=2"), "featured.jpg");
        assert_eq!(url_basename("https://cdn.example.com/"), "unknown.jpg");
        assert_eq!(url_basename("not a url"), "unknown.jpg");
    }

    #[test]
    fn test_section_dir() {
        let root = Path::new("bg");
        let plain = CanonicalSection {
            section_id: Some("Daily".to_string()),
            ..Default::default()
        };
        assert_eq!(section_dir(root, &plain), PathBuf::from("bg"));

        let textured = CanonicalSection {
            section_id: Some("Jam:Tracks".to_string()),
            has_texture_metadata: true,
            ..Default::default()
        };
        assert_eq!(section_dir(root, &textured), PathBuf::from("bg/JamTracks"));

        let named = CanonicalSection {
            display_name: Some("ジャム".to_string()),
            has_texture_metadata: true,
            ..Default::default()
        };
        assert_eq!(section_dir(root, &named), PathBuf::from("bg/ジャム"));

        let anonymous = CanonicalSection {
            has_texture_metadata: true,
            ..Default::default()
        };
        assert_eq!(section_dir(root, &anonymous), PathBuf::from("bg/unknown_section"));
    }

    #[tokio::test]
    async fn test_existing_file_is_not_refetched() {
        let temp_dir = TempDir::new().unwrap();
        let store = ImageStore::new(
            temp_dir.path().to_path_buf(),
            &ImagesConfig::default(),
            "test-agent",
        )
        .unwrap();

        let existing = temp_dir.path().join("bg.jpg");
        std::fs::write(&existing, b"cached").unwrap();

        // Unroutable host: only succeeds because nothing is fetched.
        let (path, downloaded) = store
            .save("http://127.0.0.1:9/bg.jpg", temp_dir.path())
            .await
            .unwrap();
        assert_eq!(path, existing);
        assert!(!downloaded);
    }

    #[tokio::test]
    async fn test_save_all_counts_failures() {
        let temp_dir = TempDir::new().unwrap();
        let config = ImagesConfig {
            timeout_secs: 1,
            ..ImagesConfig::default()
        };
        let store = ImageStore::new(temp_dir.path().to_path_buf(), &config, "test-agent").unwrap();

        let sections = vec![CanonicalSection {
            section_id: Some("s".to_string()),
            custom_texture: Some("http://127.0.0.1:9/missing.jpg".to_string()),
            ..Default::default()
        }];

        let stats = store.save_all(&sections).await;
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.saved, 0);
    }
}
