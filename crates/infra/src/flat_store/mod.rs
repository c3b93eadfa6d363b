//! Host flat stores
//!
//! Synchronous string key-value stores the simple driver writes through.
//! Both implementations charge a byte quota the way browser local storage
//! does: UTF-16 code units of key plus value, two bytes each.

pub mod file;
pub mod memory;

use std::collections::BTreeMap;

use keyval_domain::HostStoreError;

pub use file::FileFlatStore;
pub use memory::MemoryFlatStore;

/// Bytes charged for one item
pub(crate) fn item_cost(key: &str, value: &str) -> usize {
    (key.encode_utf16().count() + value.encode_utf16().count()) * 2
}

/// Bytes charged for every item in `items`
pub(crate) fn total_cost(items: &BTreeMap<String, String>) -> usize {
    items.iter().map(|(k, v)| item_cost(k, v)).sum()
}

/// Reject a write that would push `items` past `quota`
pub(crate) fn check_quota(
    items: &BTreeMap<String, String>,
    quota: Option<usize>,
    key: &str,
    value: &str,
) -> Result<(), HostStoreError> {
    let Some(limit) = quota else {
        return Ok(());
    };

    let replaced = items.get(key).map_or(0, |old| item_cost(key, old));
    let needed = total_cost(items) - replaced + item_cost(key, value);

    if needed > limit {
        return Err(HostStoreError::QuotaExceeded(format!(
            "writing '{key}' needs {needed} bytes, limit is {limit}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_cost_counts_utf16_units() {
        assert_eq!(item_cost("ab", "c"), 6);
        // U+1F600 is a surrogate pair
        assert_eq!(item_cost("k", "\u{1F600}"), 6);
    }

    /// Validates overwrites are charged net of the replaced value.
    ///
    /// Assertions:
    /// - Ensures a same-size overwrite at the limit passes.
    /// - Ensures growth past the limit is rejected.
    #[test]
    fn test_check_quota_nets_out_replaced_value() {
        let mut items = BTreeMap::new();
        items.insert("k".to_string(), "aaaa".to_string());
        let limit = Some(item_cost("k", "aaaa"));

        assert!(check_quota(&items, limit, "k", "bbbb").is_ok());
        assert!(matches!(
            check_quota(&items, limit, "k", "bbbbb"),
            Err(HostStoreError::QuotaExceeded(_))
        ));
        assert!(check_quota(&items, None, "other", "x").is_ok());
    }
}
