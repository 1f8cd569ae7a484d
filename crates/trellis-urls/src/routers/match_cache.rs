//! Bounded request-target memo with FIFO eviction

use super::router::RouteId;
use hyper::Method;
use std::collections::{HashMap, VecDeque};

pub const DEFAULT_MATCH_CACHE_CAPACITY: usize = 1000;

/// What a lookup is memoized under.
///
/// Host and scheme are part of the key: two requests for the same path can
/// select different routes when a domain or scheme constrained route shares
/// that path with an unconstrained one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey {
	pub method: Method,
	pub path: String,
	pub host: Option<String>,
	pub scheme: String,
}

impl MatchKey {
	pub fn new(method: &Method, path: &str, host: Option<&str>, scheme: &str) -> Self {
		Self {
			method: method.clone(),
			path: path.to_string(),
			host: host.map(str::to_ascii_lowercase),
			scheme: scheme.to_ascii_lowercase(),
		}
	}
}

/// Insertion-ordered match cache.
///
/// When full, inserting a new key evicts the single oldest-inserted key.
/// Reads do not affect eviction order, and re-inserting a present key
/// updates its value in place.
#[derive(Debug)]
pub struct MatchCache {
	capacity: usize,
	entries: HashMap<MatchKey, RouteId>,
	order: VecDeque<MatchKey>,
}

impl Default for MatchCache {
	fn default() -> Self {
		Self::new(DEFAULT_MATCH_CACHE_CAPACITY)
	}
}

impl MatchCache {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity,
			entries: HashMap::new(),
			order: VecDeque::new(),
		}
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, key: &MatchKey) -> Option<RouteId> {
		self.entries.get(key).copied()
	}

	pub fn contains(&self, key: &MatchKey) -> bool {
		self.entries.contains_key(key)
	}

	/// Insert an entry, returning the evicted key if the cache was full
	pub fn insert(&mut self, key: MatchKey, route: RouteId) -> Option<MatchKey> {
		if self.capacity == 0 {
			return None;
		}
		if let Some(existing) = self.entries.get_mut(&key) {
			*existing = route;
			return None;
		}

		let mut evicted = None;
		if self.entries.len() >= self.capacity
			&& let Some(oldest) = self.order.pop_front()
		{
			self.entries.remove(&oldest);
			evicted = Some(oldest);
		}
		self.order.push_back(key.clone());
		self.entries.insert(key, route);
		evicted
	}

	pub fn clear(&mut self) {
		self.entries.clear();
		self.order.clear();
	}
}
