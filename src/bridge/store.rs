//! Local data store.
//!
//! Holds this participant's own key/value namespace. The entry's `uri` is
//! fixed to the participant identity when the store is created; only
//! [`LocalDataStore::set`] and [`LocalDataStore::remove`] mutate its data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One participant's key/value data, namespaced by its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalData {
	pub uri: String,
	#[serde(default)]
	pub data: Map<String, Value>,
}

impl LocalData {
	pub fn new(uri: impl Into<String>) -> Self {
		Self {
			uri: uri.into(),
			data: Map::new(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct LocalDataStore {
	entry: LocalData,
}

impl LocalDataStore {
	pub fn new(uri: impl Into<String>) -> Self {
		Self {
			entry: LocalData::new(uri),
		}
	}

	pub fn set(&mut self, key: impl Into<String>, value: Value) {
		self.entry.data.insert(key.into(), value);
	}

	/// Remove a single key, or every key when `key` is `None`.
	pub fn remove(&mut self, key: Option<&str>) {
		match key {
			Some(key) => {
				self.entry.data.remove(key);
			}
			None => self.entry.data.clear(),
		}
	}

	pub fn get(&self) -> &LocalData {
		&self.entry
	}

	pub fn uri(&self) -> &str {
		&self.entry.uri
	}
}
