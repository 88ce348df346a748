use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use hickory_proto::rr::RecordType;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::{DataSource, RunConfig};
use crate::dns::to_fqdn;
use crate::domains::load_queries;
use crate::error::StressError;
use crate::exchange::Exchange;
use crate::output;
use crate::query::QuerySource;
use crate::stats::{RunReport, RunStats, StatsCollector};
use crate::stop::StopController;

/// Interval between progress lines
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Start and end of a run. Each is set exactly once.
#[derive(Debug, Default)]
struct RunWindow {
	start: Option<(Instant, DateTime<Local>)>,
	end: Option<(Instant, DateTime<Local>)>,
}

/// A single stress run against one server.
///
/// Owns the configuration, the query source and the statistics. Workers
/// share it through an `Arc` and pull queries straight from the cyclic
/// source, so no task queue is involved.
pub struct Stress<E> {
	config: RunConfig,
	default_type: RecordType,
	source: QuerySource,
	stats: StatsCollector,
	stop: StopController,
	exchange: E,
	running: AtomicBool,
	window: Mutex<RunWindow>,
}

impl<E> Stress<E>
where
	E: Exchange + Send + Sync + 'static,
{
	/// Validate the configuration and load the query items.
	///
	/// Fails without sending any query if the configuration is invalid or
	/// the data source yields nothing.
	pub async fn init(config: RunConfig, exchange: E) -> Result<Self, StressError> {
		config.validate()?;
		let items = load_queries(&config.data_source).await?;
		let origin = match &config.data_source {
			DataSource::File(path) => path.clone(),
			DataSource::TopList { url, .. } => url.clone(),
		};
		let source = QuerySource::new(items, &origin)?;
		info!(items = source.item_count(), origin = %origin, "query items loaded");
		Self::with_source(config, source, exchange)
	}

	/// Build an engine over an already loaded query source.
	pub fn with_source(
		config: RunConfig,
		source: QuerySource,
		exchange: E,
	) -> Result<Self, StressError> {
		config.validate()?;
		let default_type = config.default_type()?;
		let stats = StatsCollector::new(config.rtt_sample_capacity);
		let stop = StopController::new(config.max_run_secs, config.max_queries);
		Ok(Self {
			config,
			default_type,
			source,
			stats,
			stop,
			exchange,
			running: AtomicBool::new(false),
			window: Mutex::new(RunWindow::default()),
		})
	}

	pub fn config(&self) -> &RunConfig {
		&self.config
	}

	pub fn source(&self) -> &QuerySource {
		&self.source
	}

	/// Run all workers to completion and return the final report.
	///
	/// Blocks until every worker has observed the stop condition. A run
	/// with neither a time nor a query limit never returns.
	pub async fn start(self: &Arc<Self>) -> Result<RunReport, StressError> {
		let (started, started_at) = {
			let mut window = self.window.lock();
			if window.start.is_some() {
				return Err(StressError::AlreadyStarted);
			}
			let start = (Instant::now(), Local::now());
			window.start = Some(start);
			start
		};
		if self.stop.is_unbounded() {
			warn!("no query or time limit configured, the run will not stop on its own");
		}

		self.running.store(true, Ordering::SeqCst);
		let progress = self.config.show_progress.then(|| {
			let engine = Arc::clone(self);
			tokio::spawn(async move { engine.show_progress().await })
		});

		info!(concurrency = self.config.concurrency, "starting workers");
		let mut handles = Vec::with_capacity(self.config.concurrency);
		for worker_id in 0..self.config.concurrency {
			let engine = Arc::clone(self);
			handles.push(tokio::spawn(async move { engine.run_worker(worker_id, started).await }));
		}
		for handle in handles {
			if let Err(e) = handle.await {
				warn!(error = %e, "worker task failed");
			}
		}

		self.running.store(false, Ordering::SeqCst);
		let finished_at = Local::now();
		self.window.lock().end = Some((Instant::now(), finished_at));
		if let Some(progress) = progress {
			progress.abort();
		}
		info!(rtt_samples = self.stats.sample_len(), "all workers finished");

		Ok(self.build_report(self.elapsed(), started_at, finished_at))
	}

	/// Worker loop: check the stop condition, pull a query, send it, record it.
	async fn run_worker(&self, worker_id: usize, started: Instant) {
		let timeout = self.config.timeout();
		let mut issued = 0u64;
		while !self.stop.should_stop(started.elapsed()) {
			let item = self.source.get();
			let record_type = item.effective_type(self.default_type);
			let fqdn = to_fqdn(&item.domain);

			let query_start = Instant::now();
			match self.exchange.exchange(&fqdn, record_type, self.config.dnssec, timeout).await {
				Ok(rtt) => {
					self.stats.record_outcome(true, rtt);
					debug!(worker_id, domain = %item.domain, %record_type, rtt_ms = rtt.as_millis() as u64, "query succeeded");
				}
				Err(e) => {
					let rtt = query_start.elapsed();
					self.stats.record_outcome(false, rtt);
					debug!(worker_id, domain = %item.domain, %record_type, rtt_ms = rtt.as_millis() as u64, error = %e, "query failed");
				}
			}
			issued += 1;
		}
		debug!(worker_id, issued, "worker stopped");
	}

	/// Print a progress line every interval while the run is active.
	async fn show_progress(&self) {
		let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
		while self.running.load(Ordering::SeqCst) {
			ticker.tick().await;
			if !self.running.load(Ordering::SeqCst) {
				break;
			}
			output::print_progress(&self.snapshot(), self.elapsed());
		}
	}

	/// Time since the run started, frozen once it has finished.
	pub fn elapsed(&self) -> Duration {
		let window = self.window.lock();
		match (window.start, window.end) {
			(Some((start, _)), Some((end, _))) => end.duration_since(start),
			(Some((start, _)), None) => start.elapsed(),
			_ => Duration::ZERO,
		}
	}

	/// Current counters; may be read while the run is in progress.
	pub fn snapshot(&self) -> RunStats {
		self.stats.snapshot()
	}

	fn build_report(
		&self,
		elapsed: Duration,
		started_at: DateTime<Local>,
		finished_at: DateTime<Local>,
	) -> RunReport {
		RunReport {
			stats: self.stats.snapshot(),
			percentile: self.config.rtt_percentile,
			percentile_rtt: self.stats.percentile(self.config.percentile_fraction()),
			started_at,
			finished_at,
			elapsed,
		}
	}
}
