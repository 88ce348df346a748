use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

/// Point-in-time copy of the request counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
	pub total: u64,
	pub success: u64,
	pub failed: u64,
}

impl RunStats {
	/// Success rate as a percentage, or None before any query completed.
	pub fn success_rate(&self) -> Option<f64> {
		if self.total == 0 {
			None
		} else {
			Some(self.success as f64 / self.total as f64 * 100.0)
		}
	}

	/// Average queries per second over `elapsed`, 0 when no time has passed.
	pub fn qps(&self, elapsed: Duration) -> f64 {
		let secs = elapsed.as_secs_f64();
		if secs > 0.0 {
			self.total as f64 / secs
		} else {
			0.0
		}
	}
}

/// Calculate the p-th percentile from a sorted slice using nearest-rank method.
///
/// `p` is a fraction in (0, 1). The 1-based rank is `ceil(p * n)`, clamped
/// to `[1, n]`. Returns None if the slice is empty.
pub fn percentile(sorted: &[Duration], p: f64) -> Option<Duration> {
	if sorted.is_empty() {
		return None;
	}
	let n = sorted.len();
	let rank = (p * n as f64).ceil() as usize;
	let rank = rank.clamp(1, n);
	Some(sorted[rank - 1])
}

/// Latencies of the first successful queries, up to a fixed capacity.
///
/// Once full, further values are dropped. Stored values are never replaced,
/// so in a long run the percentile reflects early latencies only.
#[derive(Debug)]
pub struct RttSample {
	capacity: usize,
	values: Mutex<Vec<Duration>>,
}

impl RttSample {
	pub fn new(capacity: usize) -> Self {
		Self {
			capacity,
			// Grows on push; capacity only bounds the length
			values: Mutex::new(Vec::new()),
		}
	}

	pub fn push(&self, rtt: Duration) {
		let mut values = self.values.lock();
		if values.len() < self.capacity {
			values.push(rtt);
		}
	}

	pub fn stored_count(&self) -> usize {
		self.values.lock().len()
	}

	/// Sort the stored values and return the p-th percentile, or zero
	/// when nothing has been stored.
	pub fn percentile(&self, p: f64) -> Duration {
		let mut values = self.values.lock();
		values.sort_unstable();
		percentile(&values, p).unwrap_or(Duration::ZERO)
	}
}

/// Request counters and latency sample for one run.
///
/// Counters are independent atomics, so a snapshot taken while workers are
/// running may show `total` slightly ahead of `success + failed`.
#[derive(Debug)]
pub struct StatsCollector {
	total: AtomicU64,
	success: AtomicU64,
	failed: AtomicU64,
	rtt: Option<RttSample>,
}

impl StatsCollector {
	/// A capacity of 0 disables latency sampling.
	pub fn new(rtt_capacity: usize) -> Self {
		Self {
			total: AtomicU64::new(0),
			success: AtomicU64::new(0),
			failed: AtomicU64::new(0),
			rtt: (rtt_capacity > 0).then(|| RttSample::new(rtt_capacity)),
		}
	}

	pub fn record_outcome(&self, success: bool, rtt: Duration) {
		self.total.fetch_add(1, Ordering::Relaxed);
		if success {
			self.success.fetch_add(1, Ordering::Relaxed);
			if let Some(sample) = &self.rtt {
				sample.push(rtt);
			}
		} else {
			self.failed.fetch_add(1, Ordering::Relaxed);
		}
	}

	pub fn snapshot(&self) -> RunStats {
		RunStats {
			total: self.total.load(Ordering::Relaxed),
			success: self.success.load(Ordering::Relaxed),
			failed: self.failed.load(Ordering::Relaxed),
		}
	}

	/// Latency at fraction `p`, or None when sampling is disabled.
	pub fn percentile(&self, p: f64) -> Option<Duration> {
		self.rtt.as_ref().map(|sample| sample.percentile(p))
	}

	pub fn sample_len(&self) -> usize {
		self.rtt.as_ref().map_or(0, RttSample::stored_count)
	}
}

/// Final result of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
	pub stats: RunStats,
	/// Configured percentile, 1-99
	pub percentile: u8,
	/// None when latency sampling was disabled
	pub percentile_rtt: Option<Duration>,
	pub started_at: DateTime<Local>,
	pub finished_at: DateTime<Local>,
	pub elapsed: Duration,
}

impl RunReport {
	pub fn qps(&self) -> f64 {
		self.stats.qps(self.elapsed)
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;

	fn ms(v: u64) -> Duration {
		Duration::from_millis(v)
	}

	#[test]
	fn test_percentile_ceiling_rank() {
		let sample = RttSample::new(10);
		for v in [50, 10, 40, 20, 30] {
			sample.push(ms(v));
		}
		// sorted [10,20,30,40,50], rank = ceil(0.8 * 5) = 4
		assert_eq!(sample.percentile(0.8), ms(40));
		assert_eq!(sample.percentile(0.5), ms(30));
		assert_eq!(sample.percentile(0.01), ms(10));
		assert_eq!(sample.percentile(0.99), ms(50));
	}

	#[test]
	fn test_percentile_basic() {
		let values: Vec<Duration> = (1..=10).map(ms).collect();
		assert_eq!(percentile(&values, 0.5), Some(ms(5)));
		assert_eq!(percentile(&values, 0.95), Some(ms(10)));
		assert_eq!(percentile(&values, 0.1), Some(ms(1)));
	}

	#[test]
	fn test_percentile_empty() {
		assert_eq!(percentile(&[], 0.5), None);
		assert_eq!(RttSample::new(5).percentile(0.95), Duration::ZERO);
	}

	#[test]
	fn test_percentile_single() {
		let values = vec![ms(42)];
		assert_eq!(percentile(&values, 0.01), Some(ms(42)));
		assert_eq!(percentile(&values, 0.95), Some(ms(42)));
	}

	#[test]
	fn test_sample_keeps_first_values_only() {
		let sample = RttSample::new(3);
		for v in [5, 6, 7, 1, 1, 1] {
			sample.push(ms(v));
		}
		assert_eq!(sample.stored_count(), 3);
		// The later, smaller values never entered the sample
		assert_eq!(sample.percentile(0.01), ms(5));
	}

	#[test]
	fn test_record_outcome_counts() {
		let stats = StatsCollector::new(10);
		stats.record_outcome(true, ms(3));
		stats.record_outcome(false, ms(5000));
		stats.record_outcome(true, ms(7));

		let snap = stats.snapshot();
		assert_eq!(snap, RunStats { total: 3, success: 2, failed: 1 });
		// Failed RTTs are not sampled
		assert_eq!(stats.sample_len(), 2);
		assert_eq!(stats.percentile(0.99), Some(ms(7)));
	}

	#[test]
	fn test_sampling_disabled() {
		let stats = StatsCollector::new(0);
		stats.record_outcome(true, ms(3));
		assert_eq!(stats.sample_len(), 0);
		assert_eq!(stats.percentile(0.95), None);
		assert_eq!(stats.snapshot().success, 1);
	}

	#[test]
	fn test_sample_bounded_under_concurrency() {
		let stats = Arc::new(StatsCollector::new(100));
		let handles: Vec<_> = (0..8)
			.map(|_| {
				let stats = Arc::clone(&stats);
				std::thread::spawn(move || {
					for i in 0..1000 {
						stats.record_outcome(i % 4 != 0, ms(i));
					}
				})
			})
			.collect();
		for handle in handles {
			handle.join().unwrap();
		}

		let snap = stats.snapshot();
		assert_eq!(snap.total, 8000);
		assert_eq!(snap.success, 6000);
		assert_eq!(snap.failed, 2000);
		assert_eq!(snap.total, snap.success + snap.failed);
		assert_eq!(stats.sample_len(), 100);
	}

	#[test]
	fn test_huge_sample_capacity_allocates_lazily() {
		let stats = StatsCollector::new(1 << 60);
		stats.record_outcome(true, ms(4));
		stats.record_outcome(true, ms(2));
		assert_eq!(stats.sample_len(), 2);
		assert_eq!(stats.percentile(0.5), Some(ms(2)));

		let stats = StatsCollector::new(usize::MAX);
		stats.record_outcome(true, ms(1));
		assert_eq!(stats.sample_len(), 1);
	}

	#[test]
	fn test_success_rate_without_queries() {
		let snap = RunStats::default();
		assert_eq!(snap.success_rate(), None);

		let snap = RunStats { total: 4, success: 3, failed: 1 };
		assert_eq!(snap.success_rate(), Some(75.0));
	}

	#[test]
	fn test_qps_zero_elapsed() {
		let snap = RunStats { total: 100, success: 100, failed: 0 };
		assert_eq!(snap.qps(Duration::ZERO), 0.0);
		assert_eq!(snap.qps(Duration::from_secs(4)), 25.0);
	}
}
