//! Deep search for the sections list inside an arbitrary catalog document

use serde_json::Value;

/// Keys under which deployments have been seen to publish the sections list,
/// in lookup priority order.
pub const SECTION_LIST_KEYS: [&str; 5] = [
    "shopSections",
    "sections",
    "sectionList",
    "ShopSections",
    "shop_sections",
];

/// Find the first non-empty sections list reachable from `root`.
///
/// Depth-first: an object is first probed for the alias keys in priority
/// order, then its values are searched in document order. The first alias
/// holding an array settles that object; if the array is empty the object
/// contributes nothing and its children are not searched.
pub fn locate_sections(root: &Value) -> Option<&[Value]> {
    match root {
        Value::Object(map) => {
            let aliased = SECTION_LIST_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array));
            if let Some(list) = aliased {
                return non_empty(list);
            }
            map.values().find_map(locate_sections)
        }
        Value::Array(items) => items.iter().find_map(locate_sections),
        _ => None,
    }
}

fn non_empty(list: &[Value]) -> Option<&[Value]> {
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}
