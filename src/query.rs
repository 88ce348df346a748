use hickory_proto::rr::RecordType;
use parking_lot::Mutex;

use crate::error::DataError;

/// A single domain to query, with an optional record type.
///
/// `record_type` is None when the default type from the run configuration
/// should be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryItem {
	pub domain: String,
	pub record_type: Option<RecordType>,
}

impl QueryItem {
	pub fn new(domain: impl Into<String>, record_type: Option<RecordType>) -> Self {
		Self { domain: domain.into(), record_type }
	}

	/// Record type to send, falling back to `default` when unset.
	pub fn effective_type(&self, default: RecordType) -> RecordType {
		self.record_type.unwrap_or(default)
	}
}

/// Cyclic source of query items shared by all workers.
///
/// The items never change after construction; only the cursor is guarded.
/// The cursor always stays in `[0, len)` and wraps to 0 after the last item.
#[derive(Debug)]
pub struct QuerySource {
	items: Vec<QueryItem>,
	cursor: Mutex<usize>,
}

impl QuerySource {
	/// Build a source from loaded items. `origin` names where they came
	/// from and is only used in the error for an empty list.
	pub fn new(items: Vec<QueryItem>, origin: &str) -> Result<Self, DataError> {
		if items.is_empty() {
			return Err(DataError::Empty(origin.to_string()));
		}
		Ok(Self { items, cursor: Mutex::new(0) })
	}

	/// Return the item at the cursor and advance it, wrapping at the end.
	pub fn get(&self) -> &QueryItem {
		let mut cursor = self.cursor.lock();
		let idx = *cursor;
		*cursor = (idx + 1) % self.items.len();
		&self.items[idx]
	}

	pub fn item_count(&self) -> usize {
		self.items.len()
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;
	use std::sync::Arc;

	use super::*;

	fn items(names: &[&str]) -> Vec<QueryItem> {
		names.iter().map(|n| QueryItem::new(*n, None)).collect()
	}

	#[test]
	fn test_empty_source_rejected() {
		let result = QuerySource::new(Vec::new(), "empty.txt");
		assert!(matches!(result, Err(DataError::Empty(ref o)) if o == "empty.txt"));
	}

	#[test]
	fn test_get_is_cyclic() {
		let source = QuerySource::new(items(&["a.com", "b.com", "c.com"]), "test").unwrap();
		let got: Vec<String> = (0..7).map(|_| source.get().domain.clone()).collect();
		assert_eq!(got, vec!["a.com", "b.com", "c.com", "a.com", "b.com", "c.com", "a.com"]);
	}

	#[test]
	fn test_single_item_repeats() {
		let source = QuerySource::new(items(&["only.com"]), "test").unwrap();
		for _ in 0..5 {
			assert_eq!(source.get().domain, "only.com");
		}
		assert_eq!(source.item_count(), 1);
	}

	#[test]
	fn test_effective_type() {
		let plain = QueryItem::new("example.org", None);
		let mx = QueryItem::new("example.org", Some(RecordType::MX));
		assert_eq!(plain.effective_type(RecordType::AAAA), RecordType::AAAA);
		assert_eq!(mx.effective_type(RecordType::AAAA), RecordType::MX);
	}

	#[test]
	fn test_concurrent_get_returns_each_item_equally() {
		// 4 items, 8 threads x 100 calls = 800 = 200 full cycles
		let source = Arc::new(
			QuerySource::new(items(&["a", "b", "c", "d"]), "test").unwrap(),
		);
		let handles: Vec<_> = (0..8)
			.map(|_| {
				let source = Arc::clone(&source);
				std::thread::spawn(move || {
					(0..100).map(|_| source.get().domain.clone()).collect::<Vec<_>>()
				})
			})
			.collect();

		let mut counts: HashMap<String, usize> = HashMap::new();
		for handle in handles {
			for domain in handle.join().unwrap() {
				*counts.entry(domain).or_default() += 1;
			}
		}
		assert_eq!(counts.len(), 4);
		assert!(counts.values().all(|&c| c == 200), "uneven counts: {:?}", counts);
	}
}
