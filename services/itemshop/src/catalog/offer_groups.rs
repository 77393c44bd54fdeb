//! Offer group counting and texture URL collection

use serde_json::{Map, Value};
use std::collections::HashSet;
use crate::catalog::resolve::{array_field, scalar_string, str_field};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferGroupSummary {
    pub count: usize,
    pub has_texture: bool,
    pub texture_urls: Vec<String>,
}

fn group_metadata(group: &Map<String, Value>) -> Option<&Map<String, Value>> {
    group.get("metadata").and_then(Value::as_object)
}

fn usable_id(value: &Value) -> Option<String> {
    scalar_string(value).filter(|id| !id.is_empty())
}

/// `offerGroupId`, falling back to `metadata.offerGroupId`. Empty strings
/// are not identifiers.
fn offer_group_id(group: &Map<String, Value>) -> Option<String> {
    group.get("offerGroupId").and_then(usable_id).or_else(|| {
        group_metadata(group)
            .and_then(|m| m.get("offerGroupId"))
            .and_then(usable_id)
    })
}

fn texture_values(group: &Map<String, Value>) -> impl Iterator<Item = &str> {
    group_metadata(group)
        .and_then(|m| array_field(m, "textureMetadata"))
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .filter_map(|entry| str_field(entry, "value"))
}

/// Count distinct offer groups and gather their texture URLs.
///
/// Groups sharing an identifier count once; groups without one (including
/// entries that are not objects) each count on their own.
pub fn summarize(offer_groups: &[Value]) -> OfferGroupSummary {
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut anonymous = 0usize;
    let mut seen_urls: HashSet<&str> = HashSet::new();
    let mut texture_urls = Vec::new();

    for group in offer_groups {
        let Some(group) = group.as_object() else {
            anonymous += 1;
            continue;
        };

        match offer_group_id(group) {
            Some(id) => {
                seen_ids.insert(id);
            }
            None => anonymous += 1,
        }

        for url in texture_values(group) {
            if seen_urls.insert(url) {
                texture_urls.push(url.to_string());
            }
        }
    }

    OfferGroupSummary {
        count: seen_ids.len() + anonymous,
        has_texture: !texture_urls.is_empty(),
        texture_urls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list(v: Value) -> Vec<Value> {
        v.as_array().cloned().unwrap()
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let groups = list(json!([
            { "offerGroupId": "g1" },
            { "offerGroupId": "g1" },
            { "offerGroupId": "g2" },
            { "title": "no id" }
        ]));
        assert_eq!(summarize(&groups).count, 3);
    }

    #[test]
    fn test_nested_metadata_id() {
        let groups = list(json!([
            { "metadata": { "offerGroupId": "g1" } },
            { "offerGroupId": "g1" },
            { "offerGroupId": null, "metadata": { "offerGroupId": 7 } },
            { "offerGroupId": 7 }
        ]));
        assert_eq!(summarize(&groups).count, 2);
    }

    #[test]
    fn test_empty_id_counts_individually() {
        let groups = list(json!([
            { "offerGroupId": "" },
            { "offerGroupId": "" },
            { "offerGroupId": "", "metadata": { "offerGroupId": "" } }
        ]));
        assert_eq!(summarize(&groups).count, 3);
    }

    #[test]
    fn test_empty_id_falls_back_to_metadata() {
        let groups = list(json!([
            { "offerGroupId": "" },
            { "offerGroupId": "" },
            { "offerGroupId": "", "metadata": { "offerGroupId": "g1" } },
            { "metadata": { "offerGroupId": "g1" } }
        ]));
        assert_eq!(summarize(&groups).count, 3);
    }

    #[test]
    fn test_anonymous_groups_never_merge() {
        let groups = list(json!([{}, {}, 3, "x", null]));
        assert_eq!(summarize(&groups).count, 5);
    }

    #[test]
    fn test_texture_urls_dedup_first_seen() {
        let groups = list(json!([
            { "metadata": { "textureMetadata": [
                { "key": "a", "value": "https://cdn/b.png" },
                { "key": "b", "value": "https://cdn/a.png" }
            ] } },
            { "metadata": { "textureMetadata": [
                { "value": "https://cdn/a.png" },
                { "value": 12 },
                { "value": "https://cdn/c.png" },
                "bare string"
            ] } }
        ]));
        let summary = summarize(&groups);
        assert!(summary.has_texture);
        assert_eq!(
            summary.texture_urls,
            vec!["https://cdn/b.png", "https://cdn/a.png", "https://cdn/c.png"]
        );
    }

    #[test]
    fn test_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary, OfferGroupSummary::default());
        assert!(!summary.has_texture);
    }
}
