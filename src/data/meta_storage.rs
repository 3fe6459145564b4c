// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::observability::messages::{task::AttachmentOverwritten, StructuredLog};

type Attachment = Arc<dyn Any + Send + Sync>;

/// A type-erased, string-keyed side-channel travelling with a payload.
///
/// Nodes publish derived results here without widening the payload type.
/// Cloning copies the key map only: every attachment value is shared between
/// the original and the clone.
///
/// # Examples
///
/// ```
/// use branchline::data::MetaStorage;
///
/// let mut meta = MetaStorage::new();
/// meta.set_attachment("k", 1_i32);
///
/// assert_eq!(meta.get_attachment::<i32>("k"), Some(&1));
/// // A type mismatch reads exactly like a missing key.
/// assert_eq!(meta.get_attachment::<String>("k"), None);
/// assert_eq!(meta.get_attachment::<i32>("missing"), None);
/// ```
#[derive(Clone, Default)]
pub struct MetaStorage {
    attachments: HashMap<String, Attachment>,
}

impl MetaStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `id`, replacing any previous value.
    ///
    /// Returns `true` when an existing attachment was overwritten.
    pub fn set_attachment<V>(&mut self, id: impl Into<String>, value: V) -> bool
    where
        V: Any + Send + Sync,
    {
        self.set_shared(id, Arc::new(value))
    }

    /// Store an already shared value under `id`.
    pub fn set_shared<V>(&mut self, id: impl Into<String>, value: Arc<V>) -> bool
    where
        V: Any + Send + Sync,
    {
        let id = id.into();
        let replaced = self.attachments.insert(id.clone(), value).is_some();
        if replaced {
            AttachmentOverwritten { key: &id }.log();
        }
        replaced
    }

    /// Borrow the attachment under `id` as a `V`.
    ///
    /// `None` when the key is missing or holds a different type.
    pub fn get_attachment<V: Any>(&self, id: &str) -> Option<&V> {
        self.attachments
            .get(id)
            .and_then(|value| (**value).downcast_ref::<V>())
    }

    /// Get a shared handle to the attachment under `id`.
    pub fn get_shared<V>(&self, id: &str) -> Option<Arc<V>>
    where
        V: Any + Send + Sync,
    {
        self.attachments
            .get(id)
            .and_then(|value| Arc::clone(value).downcast::<V>().ok())
    }

    pub fn remove_attachment(&mut self, id: &str) -> bool {
        self.attachments.remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.attachments.contains_key(id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attachments.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}

impl fmt::Debug for MetaStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("MetaStorage")
            .field("attachment_count", &self.attachments.len())
            .field("keys", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_set_and_get_attachment() {
        let mut meta = MetaStorage::new();
        assert!(!meta.set_attachment("k", 1_i32));

        assert_eq!(meta.get_attachment::<i32>("k"), Some(&1));
        assert!(meta.contains("k"));
        assert_eq!(meta.len(), 1);
    }

    #[test]
    fn test_type_mismatch_reads_as_absent() {
        let mut meta = MetaStorage::new();
        meta.set_attachment("k", 1_i32);

        assert!(meta.get_attachment::<String>("k").is_none());
        assert!(meta.get_attachment::<i64>("k").is_none());
        assert!(meta.get_shared::<String>("k").is_none());
    }

    #[test]
    fn test_overwrite_replaces_value_and_type() {
        let mut meta = MetaStorage::new();
        meta.set_attachment("k", 1_i32);
        assert!(meta.set_attachment("k", "now a string".to_string()));

        assert!(meta.get_attachment::<i32>("k").is_none());
        assert_eq!(
            meta.get_attachment::<String>("k").map(String::as_str),
            Some("now a string")
        );
        assert_eq!(meta.len(), 1);
    }

    #[test]
    fn test_clone_copies_map_but_shares_values() {
        let mut original = MetaStorage::new();
        original.set_attachment("counter", Mutex::new(0_u32));

        let mut copy = original.clone();
        copy.set_attachment("only_in_copy", true);

        // The key map is independent.
        assert!(!original.contains("only_in_copy"));

        // The attachment value itself is shared.
        if let Some(counter) = copy.get_attachment::<Mutex<u32>>("counter") {
            *counter.lock().unwrap() += 5;
        }
        let seen = original
            .get_attachment::<Mutex<u32>>("counter")
            .map(|c| *c.lock().unwrap());
        assert_eq!(seen, Some(5));
    }

    #[test]
    fn test_get_shared_and_remove() {
        let mut meta = MetaStorage::new();
        meta.set_shared("labels", Arc::new(vec!["a", "b"]));

        let labels = meta.get_shared::<Vec<&str>>("labels").unwrap();
        assert_eq!(labels.len(), 2);

        assert!(meta.remove_attachment("labels"));
        assert!(!meta.remove_attachment("labels"));
        assert!(meta.is_empty());
    }
}
