use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use hickory_proto::rr::RecordType;

use crate::dns::parse_record_type;
use crate::error::ConfigError;

/// Default location of the top domains archive
pub const DEFAULT_TOP_LIST_URL: &str = "https://tranco-list.eu/top-1m.csv.zip";

/// Exchange timeout used when the configured timeout is zero
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(2);

/// Where the query items come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
	/// Line-oriented data file with optional per-line record types
	File(String),
	/// Public top domains list, downloaded once into `cache_dir`
	TopList {
		cache_dir: String,
		url: String,
		/// Number of domains to use, 0 for the whole list
		limit: usize,
	},
}

/// Configuration of a single stress run.
///
/// Zero for `max_queries` or `max_run_secs` means unlimited. Zero for
/// `rtt_sample_capacity` disables latency sampling.
#[derive(Debug, Clone)]
pub struct RunConfig {
	pub server: String,
	pub port: u32,
	pub data_source: DataSource,
	pub max_queries: u64,
	pub timeout_secs: u64,
	pub max_run_secs: u64,
	pub concurrency: usize,
	pub rtt_sample_capacity: usize,
	pub rtt_percentile: u8,
	pub dnssec: bool,
	pub default_record_type: String,
	pub show_progress: bool,
	pub show_debug: bool,
}

impl Default for RunConfig {
	fn default() -> Self {
		Self {
			server: "127.0.0.1".to_string(),
			port: 53,
			data_source: DataSource::File("example.txt".to_string()),
			max_queries: 0,
			timeout_secs: 5,
			max_run_secs: 0,
			concurrency: 1,
			rtt_sample_capacity: 50_000,
			rtt_percentile: 95,
			dnssec: false,
			default_record_type: "A".to_string(),
			show_progress: false,
			show_debug: false,
		}
	}
}

impl RunConfig {
	/// Check every field that the type system does not already constrain.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.server_ip()?;
		if self.port == 0 || self.port > 65535 {
			return Err(ConfigError::InvalidPort(self.port));
		}
		if let DataSource::File(path) = &self.data_source {
			if path.trim().is_empty() {
				return Err(ConfigError::InvalidDataFile(path.clone()));
			}
		}
		if self.concurrency < 1 {
			return Err(ConfigError::InvalidConcurrency(self.concurrency));
		}
		if self.rtt_percentile == 0 || self.rtt_percentile >= 100 {
			return Err(ConfigError::InvalidPercentile(self.rtt_percentile));
		}
		self.default_type()?;
		Ok(())
	}

	fn server_ip(&self) -> Result<IpAddr, ConfigError> {
		self.server.trim().parse()
			.map_err(|_| ConfigError::InvalidAddress(self.server.clone()))
	}

	/// Socket address of the target server.
	pub fn server_addr(&self) -> Result<SocketAddr, ConfigError> {
		let ip = self.server_ip()?;
		let port = u16::try_from(self.port)
			.ok()
			.filter(|p| *p != 0)
			.ok_or(ConfigError::InvalidPort(self.port))?;
		Ok(SocketAddr::new(ip, port))
	}

	/// Record type used for items that do not carry their own.
	pub fn default_type(&self) -> Result<RecordType, ConfigError> {
		parse_record_type(&self.default_record_type)
			.ok_or_else(|| ConfigError::InvalidRecordType(self.default_record_type.clone()))
	}

	/// Per-query timeout; zero falls back to the exchange default.
	pub fn timeout(&self) -> Duration {
		if self.timeout_secs == 0 {
			DEFAULT_EXCHANGE_TIMEOUT
		} else {
			Duration::from_secs(self.timeout_secs)
		}
	}

	/// Percentile as a fraction in (0, 1).
	pub fn percentile_fraction(&self) -> f64 {
		f64::from(self.rtt_percentile) / 100.0
	}
}
