use super::traits::CatalogSource;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Offline catalog source serving a fixed document.
pub struct MockCatalog {
    name: String,
    document: Value,
}

impl MockCatalog {
    pub fn new(name: String) -> Self {
        Self::with_document(name, sample_document())
    }

    pub fn with_document(name: String, document: Value) -> Self {
        Self { name, document }
    }
}

/// A catalog shaped like the live page: sections buried a few levels deep,
/// mixing flat and wrapped section records.
pub fn sample_document() -> Value {
    json!({
        "_title": "mp-item-shop",
        "_activeDate": "2025-09-01T00:00:00.000Z",
        "shopData": {
            "_type": "ShopData",
            "layouts": []
        },
        "data": {
            "pageData": {
                "shopSections": [
                    {
                        "sectionId": "Featured",
                        "displayName": "注目アイテム",
                        "metadata": {
                            "background": {
                                "customTexture": "https://cdn.example.com/backgrounds/featured.jpg"
                            },
                            "stackRanks": [
                                { "startDate": "2023-01-01T00:00:00.000Z", "context": "Shop", "productTag": null },
                                { "startDate": "2025-09-19T00:00:00.000Z", "context": "Shop", "productTag": null },
                                { "startDate": "2025-09-26T00:00:00.000Z", "context": "Shop", "productTag": null }
                            ],
                            "offerGroups": [
                                {
                                    "offerGroupId": "featured.a",
                                    "metadata": {
                                        "textureMetadata": [
                                            { "key": "BackgroundTexture", "value": "https://cdn.example.com/textures/featured_a.png" }
                                        ]
                                    }
                                },
                                { "offerGroupId": "featured.a" },
                                { "offerGroupId": "featured.b" }
                            ]
                        }
                    },
                    {
                        "content": {
                            "sectionID": "Daily",
                            "title": "デイリー",
                            "metadata": {
                                "offerGroups": [
                                    {
                                        "metadata": {
                                            "stackRanks": [
                                                { "startDate": "2025-09-18T15:00:00.000Z", "context": "Daily", "productTag": "BR" }
                                            ]
                                        }
                                    },
                                    {}
                                ]
                            }
                        }
                    },
                    {
                        "section": {
                            "id": "Jam.Tracks",
                            "sectionDisplayName": "ジャムトラック"
                        },
                        "metadata": {
                            "background": {
                                "customTexture": "https://cdn.example.com/backgrounds/jam.jpg"
                            },
                            "offerGroups": [
                                {
                                    "offerGroupId": "jam.1",
                                    "stackRanks": [
                                        { "startDate": "2025-09-20T00:00:00.000Z", "context": "Jam", "productTag": "Tracks" }
                                    ],
                                    "metadata": {
                                        "textureMetadata": [
                                            { "value": "https://cdn.example.com/textures/jam_1.png" },
                                            { "value": "https://cdn.example.com/textures/jam_1.png" }
                                        ]
                                    }
                                }
                            ]
                        }
                    },
                    {
                        "sectionId": "Unscheduled",
                        "displayName": "近日登場",
                        "stackRanks": [
                            { "startDate": "2023-01-01T00:00:00.000Z" }
                        ]
                    }
                ]
            }
        }
    })
}

#[async_trait]
impl CatalogSource for MockCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_catalog(&self) -> Result<Value> {
        Ok(self.document.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{locate_sections, normalize_batch};

    #[tokio::test]
    async fn test_mock_catalog_fetch() {
        let catalog = MockCatalog::new("mock".to_string());
        assert_eq!(catalog.name(), "mock");
        let document = catalog.fetch_catalog().await.unwrap();
        let sections = locate_sections(&document).unwrap();
        assert_eq!(sections.len(), 4);
    }

    #[test]
    fn test_sample_document_normalizes() {
        let document = sample_document();
        let sections = normalize_batch(locate_sections(&document).unwrap());

        assert_eq!(sections[0].section_id.as_deref(), Some("Featured"));
        assert_eq!(sections[0].offer_groups_count, 2);
        assert_eq!(sections[0].stack_rank_start.as_deref(), Some("2025-09-19T00:00:00.000Z"));

        assert_eq!(sections[1].section_id.as_deref(), Some("Daily"));
        assert_eq!(sections[1].offer_groups_count, 2);

        assert_eq!(sections[2].section_id.as_deref(), Some("Jam.Tracks"));
        assert_eq!(sections[2].texture_urls.len(), 1);
        assert!(sections[2].custom_texture.is_some());

        assert_eq!(sections[3].stack_rank_start, None);
    }
}
