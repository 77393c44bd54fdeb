use anyhow::Result;
use async_trait::async_trait;

/// Anything that can hand over the raw storefront catalog document.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_catalog(&self) -> Result<serde_json::Value>;
}
