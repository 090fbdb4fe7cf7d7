//! Validation and lifecycle hooks for a collection.
//!
//! Hooks are a strategy object handed to the store at construction time.
//! Every method has a no-op default, so an implementation only overrides
//! what it needs. The `after_*` hooks observe committed changes and cannot
//! change the outcome of the operation that triggered them.

/// Per-collection validation and lifecycle callbacks.
pub trait StoreHooks<T>: Send + Sync {
    /// Reject an item before it is persisted. The `Err` string is the reason.
    fn validate(&self, _item: &T) -> Result<(), String> {
        Ok(())
    }

    /// Called after an item has been created and persisted.
    fn after_create(&self, _item: &T) {}

    /// Called after an item has been replaced or patched and persisted.
    fn after_update(&self, _item: &T) {}

    /// Called after an item has been removed and the removal persisted.
    fn after_delete(&self, _item: &T) {}
}

/// Hooks that accept everything and observe nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<T> StoreHooks<T> for NoHooks {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_hooks_accepts_everything() {
        let hooks = NoHooks;
        assert!(StoreHooks::<String>::validate(&hooks, &"anything".to_string()).is_ok());
    }
}
