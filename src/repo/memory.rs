use std::collections::HashMap;

use serde_json::Value;

use super::KeyValueStore;
use crate::error::StorageError;

#[derive(Default)]
pub struct MemoryKv {
    entries: HashMap<String, Value>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryKv {
    pub fn with_seed(seed: impl IntoIterator<Item = (String, Value)>) -> Self {
        let mut kv = Self::default();
        kv.entries.extend(seed);
        kv
    }

    /// Make every subsequent `load` fail, as an unreadable store would.
    #[cfg(test)]
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make every subsequent `save` fail, as a full or locked store would.
    #[cfg(test)]
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }
}

impl KeyValueStore for MemoryKv {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        if self.fail_reads {
            return Err(StorageError::Unavailable(format!("read of {key} refused")));
        }
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Unavailable(format!("write of {key} refused")));
        }
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn save_then_load() {
        let mut kv = MemoryKv::default();
        assert!(kv.load("k").unwrap().is_none());
        kv.save("k", &json!({"a": 1})).unwrap();
        assert_eq!(kv.load("k").unwrap(), Some(json!({"a": 1})));
    }

    #[test]
    fn failing_writes_keep_previous_value() {
        let mut kv = MemoryKv::with_seed([("k".to_string(), json!(1))]);
        kv.set_fail_writes(true);
        assert!(kv.save("k", &json!(2)).is_err());
        assert_eq!(kv.get("k"), Some(&json!(1)));
    }
}
