use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Decides whether a worker should stop before pulling its next query.
///
/// The time limit and the query count limit are independent and the run
/// stops when either is reached. A zero limit is disabled. With both
/// disabled the run never stops on its own.
#[derive(Debug)]
pub struct StopController {
	max_run: Option<Duration>,
	max_queries: Option<u64>,
	checks: AtomicU64,
}

impl StopController {
	pub fn new(max_run_secs: u64, max_queries: u64) -> Self {
		Self {
			max_run: (max_run_secs > 0).then(|| Duration::from_secs(max_run_secs)),
			max_queries: (max_queries > 0).then_some(max_queries),
			checks: AtomicU64::new(0),
		}
	}

	/// Evaluate the stop condition for one iteration.
	///
	/// Every call that passes the time check consumes one unit of the query
	/// budget, so the number of `false` results is at most `max_queries`.
	pub fn should_stop(&self, elapsed: Duration) -> bool {
		if let Some(max_run) = self.max_run {
			if elapsed >= max_run {
				return true;
			}
		}
		if let Some(max_queries) = self.max_queries {
			if self.checks.fetch_add(1, Ordering::Relaxed) + 1 > max_queries {
				return true;
			}
		}
		false
	}

	pub fn is_unbounded(&self) -> bool {
		self.max_run.is_none() && self.max_queries.is_none()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;

	#[test]
	fn test_count_limit() {
		let stop = StopController::new(0, 3);
		let passed = (0..10).filter(|_| !stop.should_stop(Duration::ZERO)).count();
		assert_eq!(passed, 3);
	}

	#[test]
	fn test_time_limit() {
		let stop = StopController::new(2, 0);
		assert!(!stop.should_stop(Duration::from_millis(1999)));
		assert!(stop.should_stop(Duration::from_secs(2)));
		assert!(stop.should_stop(Duration::from_secs(10)));
	}

	#[test]
	fn test_either_limit_stops() {
		let stop = StopController::new(5, 100);
		assert!(stop.should_stop(Duration::from_secs(5)));

		let stop = StopController::new(5, 1);
		assert!(!stop.should_stop(Duration::ZERO));
		assert!(stop.should_stop(Duration::ZERO));
	}

	#[test]
	fn test_unlimited_never_stops() {
		let stop = StopController::new(0, 0);
		assert!(stop.is_unbounded());
		for _ in 0..1000 {
			assert!(!stop.should_stop(Duration::from_secs(86_400)));
		}
	}

	#[test]
	fn test_count_limit_shared_across_threads() {
		let stop = Arc::new(StopController::new(0, 500));
		let handles: Vec<_> = (0..8)
			.map(|_| {
				let stop = Arc::clone(&stop);
				std::thread::spawn(move || {
					let mut passed = 0;
					while !stop.should_stop(Duration::ZERO) {
						passed += 1;
					}
					passed
				})
			})
			.collect();
		let total: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
		assert_eq!(total, 500);
	}
}
