//! Global data aggregate and its merge policies.
//!
//! The aggregate holds exactly one [`LocalData`] entry per origin. Snapshots
//! coming up from children are folded in additively, since a father collects
//! from several children at once. Snapshots coming down from a father replace
//! the aggregate wholesale. Either way the receiver's own entry is written
//! back afterwards so that local changes not yet propagated survive.

use crate::bridge::store::LocalData;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-origin aggregate view, unique by `uri`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalData {
	entries: Vec<LocalData>,
}

impl GlobalData {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse a snapshot carried in an envelope message.
	///
	/// Duplicate origins inside the snapshot collapse onto the last one seen.
	pub fn from_message(message: &Value) -> Option<Self> {
		let entries: Vec<LocalData> = serde_json::from_value(message.clone()).ok()?;
		let mut snapshot = Self::new();
		for entry in entries {
			snapshot.upsert(entry);
		}
		Some(snapshot)
	}

	pub fn entries(&self) -> &[LocalData] {
		&self.entries
	}

	pub fn get(&self, uri: &str) -> Option<&LocalData> {
		self.entries.iter().find(|entry| entry.uri == uri)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Insert or overwrite the entry for `entry.uri`, keeping its position.
	pub fn upsert(&mut self, entry: LocalData) {
		match self.entries.iter_mut().find(|e| e.uri == entry.uri) {
			Some(existing) => *existing = entry,
			None => self.entries.push(entry),
		}
	}

	/// Fold a child's snapshot into the aggregate.
	pub fn merge_child_snapshot(&mut self, snapshot: GlobalData, local: &LocalData) {
		for entry in snapshot.entries {
			self.upsert(entry);
		}
		self.upsert(local.clone());
	}

	/// Adopt a father's snapshot as the new aggregate.
	pub fn replace_with_father_snapshot(&mut self, snapshot: GlobalData, local: &LocalData) {
		*self = snapshot;
		self.upsert(local.clone());
	}

	pub fn to_value(&self) -> Result<Value, serde_json::Error> {
		serde_json::to_value(self)
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn entry(uri: &str, data: Value) -> LocalData {
		serde_json::from_value(json!({"uri": uri, "data": data})).unwrap()
	}

	fn uris(global: &GlobalData) -> Vec<&str> {
		global.entries().iter().map(|e| e.uri.as_str()).collect()
	}

	#[test]
	fn test_upsert_is_idempotent() {
		let mut global = GlobalData::new();
		global.upsert(entry("A", json!({"x": 1})));
		global.upsert(entry("A", json!({"x": 1})));
		assert_eq!(global.len(), 1);
		assert_eq!(global.get("A").unwrap().data.get("x"), Some(&json!(1)));
	}

	#[test]
	fn test_upsert_overwrites_in_place() {
		let mut global = GlobalData::new();
		global.upsert(entry("A", json!({"x": 1})));
		global.upsert(entry("B", json!({})));
		global.upsert(entry("A", json!({"x": 2})));
		assert_eq!(uris(&global), vec!["A", "B"]);
		assert_eq!(global.get("A").unwrap().data.get("x"), Some(&json!(2)));
	}

	#[test]
	fn test_child_merge_is_additive() {
		let local = entry("A", json!({"a": true}));
		let mut global = GlobalData::new();
		global.upsert(local.clone());

		let snapshot =
			GlobalData::from_message(&json!([{"uri": "B", "data": {}}, {"uri": "C", "data": {}}]))
				.unwrap();
		global.merge_child_snapshot(snapshot, &local);
		assert_eq!(uris(&global), vec!["A", "B", "C"]);
	}

	#[test]
	fn test_child_merge_keeps_own_entry_authoritative() {
		let local = entry("A", json!({"v": "mine"}));
		let mut global = GlobalData::new();
		let snapshot = GlobalData::from_message(&json!([{"uri": "A", "data": {"v": "stale"}}])).unwrap();
		global.merge_child_snapshot(snapshot, &local);
		assert_eq!(global.get("A"), Some(&local));
	}

	#[test]
	fn test_father_merge_supersedes_and_preserves_self() {
		let local = entry("L", json!({"k": 1}));
		let mut global = GlobalData::new();
		global.upsert(entry("OLD", json!({})));
		global.upsert(local.clone());

		let snapshot =
			GlobalData::from_message(&json!([{"uri": "X", "data": {}}, {"uri": "Y", "data": {}}]))
				.unwrap();
		global.replace_with_father_snapshot(snapshot, &local);
		assert_eq!(uris(&global), vec!["X", "Y", "L"]);
		assert_eq!(global.get("L"), Some(&local));
	}

	#[test]
	fn test_from_message_dedupes_and_rejects_garbage() {
		let snapshot = GlobalData::from_message(&json!([
			{"uri": "A", "data": {"n": 1}},
			{"uri": "A", "data": {"n": 2}}
		]))
		.unwrap();
		assert_eq!(snapshot.len(), 1);
		assert_eq!(snapshot.get("A").unwrap().data.get("n"), Some(&json!(2)));

		assert!(GlobalData::from_message(&Value::Null).is_none());
		assert!(GlobalData::from_message(&json!({"uri": "A"})).is_none());
	}
}
