use super::traits::CatalogSource;
use crate::config::SourceConfig;
use crate::error::PipelineError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Storefront content API over HTTPS.
pub struct HttpCatalog {
    name: String,
    url: String,
    lang: String,
    client: reqwest::Client,
}

impl HttpCatalog {
    pub fn new(name: String, config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            name,
            url: config.url.clone(),
            lang: config.lang.clone(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_catalog(&self) -> Result<serde_json::Value> {
        tracing::debug!("Fetching catalog from {} (lang={})", self.url, self.lang);

        let response = self
            .client
            .get(&self.url)
            .query(&[("lang", self.lang.as_str())])
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to fetch catalog from {}", self.url))?;

        if !response.status().is_success() {
            anyhow::bail!("Catalog API returned error: {}", response.status());
        }

        let document = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| PipelineError::InvalidDocument {
                source_name: self.name.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!("Fetched catalog document from {}", self.name);
        Ok(document)
    }
}
