//! Stack rank validity windows
//!
//! Stack rank records are scattered across a section: directly on it, on its
//! wrapped payload, in its metadata, and on every offer group. They are pooled,
//! placeholder dates are dropped, and each `(context, productTag)` group is
//! chained into consecutive windows.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use crate::catalog::resolve::{array_field, scalar_string, str_field};
use crate::catalog::section::SectionView;

/// Placeholder start date meaning "never scheduled".
pub const SENTINEL_START_DATE: &str = "2023-01-01T00:00:00.000Z";

/// Grouping key: `(context, productTag)`.
pub type GroupKey = (Option<String>, Option<String>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityWindow {
    pub start_date: String,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackRankGroup {
    pub context: Option<String>,
    pub product_tag: Option<String>,
    pub windows: Vec<ValidityWindow>,
}

impl StackRankGroup {
    pub fn key(&self) -> GroupKey {
        (self.context.clone(), self.product_tag.clone())
    }
}

/// Every stack rank entry of the section, in source order.
fn collect_candidates<'a>(view: &SectionView<'a>) -> Vec<&'a Value> {
    let mut sources: Vec<&'a Vec<Value>> = Vec::new();

    sources.extend(array_field(view.raw, "stackRanks"));
    if view.base_is_wrapper {
        sources.extend(array_field(view.base, "stackRanks"));
    }
    if let Some(meta) = view.metadata {
        sources.extend(array_field(meta, "stackRanks"));
    }

    for group in view.offer_groups() {
        let Some(group) = group.as_object() else {
            continue;
        };
        let direct = array_field(group, "stackRanks").filter(|ranks| !ranks.is_empty());
        let ranks = direct.or_else(|| {
            group
                .get("metadata")
                .and_then(Value::as_object)
                .and_then(|m| array_field(m, "stackRanks"))
        });
        sources.extend(ranks);
    }

    sources.into_iter().flatten().collect()
}

/// Start date of a candidate, unless it is missing or the placeholder.
fn admitted_start(entry: &Map<String, Value>) -> Option<&str> {
    str_field(entry, "startDate").filter(|d| !d.is_empty() && *d != SENTINEL_START_DATE)
}

/// Group the section's stack ranks and chain each group into windows.
///
/// Groups appear in first-seen order. Within a group the sort is stable and
/// compares the ISO-8601 strings directly.
pub fn group_stack_ranks(view: &SectionView<'_>) -> Vec<StackRankGroup> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut grouped: Vec<(GroupKey, Vec<&str>)> = Vec::new();

    for entry in collect_candidates(view) {
        let Some(entry) = entry.as_object() else {
            continue;
        };
        let Some(start) = admitted_start(entry) else {
            continue;
        };
        let key: GroupKey = (
            entry.get("context").and_then(scalar_string),
            entry.get("productTag").and_then(scalar_string),
        );
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            grouped.push((key, Vec::new()));
            grouped.len() - 1
        });
        grouped[slot].1.push(start);
    }

    grouped
        .into_iter()
        .map(|((context, product_tag), mut starts)| {
            starts.sort();
            let windows = starts
                .iter()
                .enumerate()
                .map(|(i, start)| ValidityWindow {
                    start_date: start.to_string(),
                    end_date: starts.get(i + 1).map(|next| next.to_string()),
                })
                .collect();
            StackRankGroup {
                context,
                product_tag,
                windows,
            }
        })
        .collect()
}

/// All windows of a raw section, flattened across groups.
pub fn aggregate(raw: &Value) -> Vec<ValidityWindow> {
    SectionView::new(raw)
        .map(|view| {
            group_stack_ranks(&view)
                .into_iter()
                .flat_map(|g| g.windows)
                .collect()
        })
        .unwrap_or_default()
}

/// Earliest window start across all groups.
pub fn earliest_start(groups: &[StackRankGroup]) -> Option<String> {
    groups
        .iter()
        .flat_map(|g| g.windows.iter())
        .map(|w| w.start_date.as_str())
        .min()
        .map(str::to_string)
}
