use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub tsv: TsvConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub mock: MockConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_url")]
    pub url: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_source_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_by_date_dir")]
    pub by_date_dir: String,
    #[serde(default = "default_backgrounds_dir")]
    pub backgrounds_dir: String,
    #[serde(default = "default_section_images_dir")]
    pub section_images_dir: String,
    #[serde(default = "default_tsv_file")]
    pub tsv_file: String,
    #[serde(default = "default_raw_dump_file")]
    pub raw_dump_file: String,
    #[serde(default = "default_timezone_offset_hours")]
    pub timezone_offset_hours: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "default_true")]
    pub download: bool,
    #[serde(default = "default_true")]
    pub render: bool,
    #[serde(default = "default_image_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub font_path: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TsvHeader {
    /// Nine-column header as historically written; rows carry six values.
    #[default]
    Legacy,
    /// Header naming exactly the six columns each row carries.
    Aligned,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TsvConfig {
    #[serde(default)]
    pub header: TsvHeader,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MockConfig {
    #[serde(default = "default_false")]
    pub enabled: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;
        let config: Config = toml::from_str(&content)
            .context("Failed to parse config TOML")?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise falls back to built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            tracing::info!("Config {:?} not found, using defaults", path.as_ref());
            Ok(Self::default())
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.output.data_dir)
    }

    pub fn by_date_dir(&self) -> PathBuf {
        self.data_dir().join(&self.output.by_date_dir)
    }

    pub fn backgrounds_dir(&self) -> PathBuf {
        self.data_dir().join(&self.output.backgrounds_dir)
    }

    pub fn section_images_dir(&self) -> PathBuf {
        self.data_dir().join(&self.output.section_images_dir)
    }

    pub fn tsv_path(&self) -> PathBuf {
        self.data_dir().join(&self.output.tsv_file)
    }

    pub fn raw_dump_path(&self) -> PathBuf {
        self.data_dir().join(&self.output.raw_dump_file)
    }

    pub fn zone_offset(&self) -> Result<chrono::FixedOffset> {
        chrono::FixedOffset::east_opt(self.output.timezone_offset_hours * 3600).with_context(|| {
            format!(
                "Invalid timezone offset: {} hours",
                self.output.timezone_offset_hours
            )
        })
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            lang: default_lang(),
            user_agent: default_user_agent(),
            timeout_secs: default_source_timeout_secs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            by_date_dir: default_by_date_dir(),
            backgrounds_dir: default_backgrounds_dir(),
            section_images_dir: default_section_images_dir(),
            tsv_file: default_tsv_file(),
            raw_dump_file: default_raw_dump_file(),
            timezone_offset_hours: default_timezone_offset_hours(),
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            download: default_true(),
            render: default_true(),
            timeout_secs: default_image_timeout_secs(),
            font_path: None,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_source_url() -> String {
    "https://fortnitecontent-website-prod07.ol.epicgames.com/content/api/pages/fortnite-game/mp-item-shop".to_string()
}

fn default_lang() -> String {
    "ja".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_source_timeout_secs() -> u64 {
    20
}

fn default_data_dir() -> String {
    ".".to_string()
}

fn default_by_date_dir() -> String {
    "itemshop_by_date".to_string()
}

fn default_backgrounds_dir() -> String {
    "itemshop_backgrounds".to_string()
}

fn default_section_images_dir() -> String {
    "itemshop_section_images".to_string()
}

fn default_tsv_file() -> String {
    "shop_sections_with_dates.tsv".to_string()
}

fn default_raw_dump_file() -> String {
    "response.json".to_string()
}

fn default_timezone_offset_hours() -> i32 {
    9
}

fn default_image_timeout_secs() -> u64 {
    30
}

fn default_interval_secs() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}
