//! Persistence port for node positions.
//!
//! The canvas only talks to [`PositionStore`]; the browser-backed
//! [`LocalStorageStore`] and the in-memory [`MemoryStore`] share the same
//! encoding and the same read-merge-write update path.

use std::cell::RefCell;
use std::collections::BTreeMap;

use log::warn;
use serde_json::Value;
use thiserror::Error;
use web_sys::Storage;

use super::types::Position;

/// Node id to last saved position.
pub type PositionMap = BTreeMap<String, Position>;

/// Failures while persisting positions.
#[derive(Debug, Error)]
pub enum StoreError {
	/// No `window` or no `localStorage` (private mode, sandboxed frame).
	#[error("local storage is not available")]
	Unavailable,
	/// The merged map could not be encoded.
	#[error("failed to encode positions: {0}")]
	Serialize(#[from] serde_json::Error),
	/// The storage rejected the write, e.g. quota exceeded.
	#[error("failed to write positions: {0}")]
	Write(String),
}

/// Where a canvas keeps node positions between sessions.
pub trait PositionStore {
	/// Every persisted position. Missing or corrupt data reads as empty.
	fn load_all(&self) -> PositionMap;

	/// Insert or overwrite one entry. The full map is re-read right before
	/// the write so entries saved by other nodes are kept.
	fn save_one(&self, id: &str, position: Position) -> Result<(), StoreError>;

	/// Forget every saved position.
	fn clear(&self) -> Result<(), StoreError>;
}

/// Decode a persisted blob. A blob that is not a JSON object reads as an
/// empty map; inside an object, each malformed entry is dropped on its own.
pub(crate) fn decode_positions(raw: Option<&str>) -> PositionMap {
	let Some(raw) = raw else {
		return PositionMap::new();
	};
	let entries: BTreeMap<String, Value> = match serde_json::from_str(raw) {
		Ok(entries) => entries,
		Err(e) => {
			warn!("ignoring corrupt position data: {}", e);
			return PositionMap::new();
		}
	};
	entries
		.into_iter()
		.filter_map(|(id, value)| match serde_json::from_value(value) {
			Ok(position) => Some((id, position)),
			Err(e) => {
				warn!("dropping saved position of `{}`: {}", id, e);
				None
			}
		})
		.collect()
}

fn merge_one(raw: Option<&str>, id: &str, position: Position) -> Result<String, StoreError> {
	let mut map = decode_positions(raw);
	map.insert(id.to_string(), position);
	Ok(serde_json::to_string(&map)?)
}

/// Positions kept in the browser's `localStorage` under a single key.
#[derive(Clone, Debug)]
pub struct LocalStorageStore {
	key: String,
}

impl LocalStorageStore {
	/// Store under `key`, e.g. [`DEFAULT_STORAGE_KEY`](super::DEFAULT_STORAGE_KEY).
	pub fn new(key: impl Into<String>) -> Self {
		Self { key: key.into() }
	}

	fn storage(&self) -> Result<Storage, StoreError> {
		web_sys::window()
			.and_then(|w| w.local_storage().ok().flatten())
			.ok_or(StoreError::Unavailable)
	}

	fn read_raw(&self, storage: &Storage) -> Option<String> {
		storage.get_item(&self.key).ok().flatten()
	}
}

impl PositionStore for LocalStorageStore {
	fn load_all(&self) -> PositionMap {
		match self.storage() {
			Ok(storage) => decode_positions(self.read_raw(&storage).as_deref()),
			Err(e) => {
				warn!("{}, starting with an empty layout", e);
				PositionMap::new()
			}
		}
	}

	fn save_one(&self, id: &str, position: Position) -> Result<(), StoreError> {
		let storage = self.storage()?;
		let blob = merge_one(self.read_raw(&storage).as_deref(), id, position)?;
		storage
			.set_item(&self.key, &blob)
			.map_err(|e| StoreError::Write(format!("{:?}", e)))
	}

	fn clear(&self) -> Result<(), StoreError> {
		self.storage()?
			.remove_item(&self.key)
			.map_err(|e| StoreError::Write(format!("{:?}", e)))
	}
}

/// In-memory stand-in for `localStorage`, holding the same JSON blob.
#[derive(Debug, Default)]
pub struct MemoryStore {
	blob: RefCell<Option<String>>,
	read_only: bool,
}

impl MemoryStore {
	/// An empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// A store seeded with a raw blob, as if read from `localStorage`.
	pub fn from_json(raw: impl Into<String>) -> Self {
		Self {
			blob: RefCell::new(Some(raw.into())),
			read_only: false,
		}
	}

	/// A store whose writes fail, like a full storage quota.
	pub fn read_only(raw: Option<String>) -> Self {
		Self {
			blob: RefCell::new(raw),
			read_only: true,
		}
	}

	/// The blob as it would be written to `localStorage`.
	pub fn raw(&self) -> Option<String> {
		self.blob.borrow().clone()
	}
}

impl PositionStore for MemoryStore {
	fn load_all(&self) -> PositionMap {
		decode_positions(self.blob.borrow().as_deref())
	}

	fn save_one(&self, id: &str, position: Position) -> Result<(), StoreError> {
		let blob = merge_one(self.blob.borrow().as_deref(), id, position)?;
		if self.read_only {
			return Err(StoreError::Write("quota exceeded".into()));
		}
		*self.blob.borrow_mut() = Some(blob);
		Ok(())
	}

	fn clear(&self) -> Result<(), StoreError> {
		if self.read_only {
			return Err(StoreError::Write("quota exceeded".into()));
		}
		self.blob.borrow_mut().take();
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn pos(x: f64, y: f64) -> Position {
		Position { x, y }
	}

	#[test]
	fn missing_entry_is_empty() {
		assert!(MemoryStore::new().load_all().is_empty());
	}

	#[test]
	fn corrupt_entry_is_empty() {
		assert!(MemoryStore::from_json("{not json").load_all().is_empty());
		assert!(MemoryStore::from_json("[1, 2]").load_all().is_empty());
	}

	#[test]
	fn successive_saves_keep_both_entries() {
		let store = MemoryStore::new();
		store.save_one("n1", pos(10.0, 20.0)).unwrap();
		store.save_one("n2", pos(30.0, 40.0)).unwrap();
		let map = store.load_all();
		assert_eq!(map.len(), 2);
		assert_eq!(map["n1"], pos(10.0, 20.0));
		assert_eq!(map["n2"], pos(30.0, 40.0));
	}

	#[test]
	fn save_merges_into_fresh_snapshot() {
		let store = MemoryStore::new();
		let stale = store.load_all();
		store.save_one("n1", pos(1.0, 1.0)).unwrap();
		// a writer holding an older snapshot must not clobber n1
		assert!(stale.is_empty());
		store.save_one("n2", pos(2.0, 2.0)).unwrap();
		assert_eq!(store.load_all().keys().collect::<Vec<_>>(), vec!["n1", "n2"]);
	}

	#[test]
	fn save_overwrites_existing_entry() {
		let store = MemoryStore::from_json(r#"{"a":{"x":0,"y":0}}"#);
		store.save_one("a", pos(5.0, 6.0)).unwrap();
		assert_eq!(store.load_all()["a"], pos(5.0, 6.0));
	}

	#[test]
	fn save_over_corrupt_blob_starts_fresh() {
		let store = MemoryStore::from_json("garbage");
		store.save_one("a", pos(1.0, 2.0)).unwrap();
		assert_eq!(store.raw().as_deref(), Some(r#"{"a":{"x":1.0,"y":2.0}}"#));
	}

	#[test]
	fn write_failure_is_reported_and_data_untouched() {
		let store = MemoryStore::read_only(Some(r#"{"a":{"x":1,"y":2}}"#.into()));
		let err = store.save_one("b", pos(3.0, 4.0)).unwrap_err();
		assert!(matches!(err, StoreError::Write(_)));
		assert_eq!(store.load_all().len(), 1);
	}

	#[test]
	fn clear_removes_everything() {
		let store = MemoryStore::new();
		store.save_one("a", pos(1.0, 2.0)).unwrap();
		store.clear().unwrap();
		assert!(store.raw().is_none());
		assert!(store.load_all().is_empty());
	}

	#[test]
	fn malformed_entry_is_dropped_alone() {
		let store = MemoryStore::from_json(r#"{"a":{"x":1,"y":2},"b":{"x":null,"y":3}}"#);
		let map = store.load_all();
		assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a"]);
		assert_eq!(map["a"], pos(1.0, 2.0));
	}

	#[test]
	fn save_keeps_valid_entries_next_to_malformed_ones() {
		let store = MemoryStore::from_json(r#"{"a":{"x":1,"y":2},"b":{"x":null,"y":3}}"#);
		store.save_one("c", pos(5.0, 6.0)).unwrap();
		let map = store.load_all();
		assert_eq!(map.get("a"), Some(&pos(1.0, 2.0)));
		assert_eq!(map.get("c"), Some(&pos(5.0, 6.0)));
		assert!(!map.contains_key("b"));
	}
}
