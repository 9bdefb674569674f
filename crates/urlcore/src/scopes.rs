use std::collections::{BTreeMap, BTreeSet};

/// Prefix shared by every marker group the plugin draws.
pub const MARKER_NAMESPACE: &str = "clickable-urls";

/// Marker group key for one lexical scope. Hosts style a marker group with a
/// single scope, so each scope gets its own group.
pub fn marker_key(scope: &str) -> String {
    format!("{} {}", MARKER_NAMESPACE, scope)
}

/// Scopes that were underlined before and are no longer used.
pub fn scopes_to_remove(old: &BTreeSet<String>, new: &BTreeSet<String>) -> BTreeSet<String> {
    old.difference(new).cloned().collect()
}

/// Groups items by their scope label, keeping the input order inside each group.
pub fn group_by_scope<T, F>(
    items: impl IntoIterator<Item = T>,
    scope_of: F,
) -> BTreeMap<String, Vec<T>>
where
    F: Fn(&T) -> &str,
{
    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for item in items {
        let scope = scope_of(&item).to_string();
        groups.entry(scope).or_default().push(item);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scopes_to_remove_is_set_difference() {
        let removed = scopes_to_remove(&set(&["a", "b"]), &set(&["b", "c"]));
        assert_eq!(removed, set(&["a"]));
    }

    #[test]
    fn test_everything_removed_when_new_is_empty() {
        let removed = scopes_to_remove(&set(&["a", "b"]), &BTreeSet::new());
        assert_eq!(removed, set(&["a", "b"]));
    }

    #[test]
    fn test_nothing_removed_on_first_highlight() {
        assert!(scopes_to_remove(&BTreeSet::new(), &set(&["a"])).is_empty());
    }

    #[test]
    fn test_marker_key() {
        assert_eq!(marker_key("text.plain"), "clickable-urls text.plain");
    }

    #[test]
    fn test_group_by_scope_keeps_order() {
        let items = vec![(1, "x"), (2, "y"), (3, "x")];
        let groups = group_by_scope(items, |item| item.1);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["x"], vec![(1, "x"), (3, "x")]);
        assert_eq!(groups["y"], vec![(2, "y")]);
    }
}
