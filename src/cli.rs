use clap::Parser;

use crate::config::{DataSource, RunConfig, DEFAULT_TOP_LIST_URL};

/// DNS server stress tool
#[derive(Parser, Debug)]
#[command(name = "dns-stress", version)]
#[command(about = "Stress a DNS server with concurrent queries and report QPS and latency")]
pub struct Cli {
	/// Data file with one "domain [type]" entry per line; the top domains
	/// list is used when omitted
	#[arg(short = 'd', long = "data-file")]
	pub data_file: Option<String>,

	/// Server to query
	#[arg(short = 's', long = "server", default_value = "127.0.0.1")]
	pub server: String,

	/// Port on which to query the server
	#[arg(short = 'p', long = "port", default_value = "53")]
	pub port: u32,

	/// Maximum number of queries to send (0 for unlimited)
	#[arg(short = 'q', long = "max-queries", default_value = "0")]
	pub max_queries: u64,

	/// Timeout for query completion in seconds (0 for the 2 s default)
	#[arg(short = 't', long = "timeout", default_value = "5")]
	pub timeout: u64,

	/// Limit for how long to run in seconds (0 for unlimited)
	#[arg(short = 'l', long = "time-limit", default_value = "0")]
	pub time_limit: u64,

	/// Number of concurrent queries
	#[arg(short = 'c', long = "concurrency", default_value = "1")]
	pub concurrency: usize,

	/// RTT statistics sample size (0 to disable)
	#[arg(short = 'r', long = "rtt-samples", default_value = "50000")]
	pub rtt_samples: usize,

	/// RTT statistics top percentile value (1-99)
	#[arg(short = 'u', long = "percentile", default_value = "95")]
	pub percentile: u8,

	/// Set the DNSSEC OK bit (implies EDNS)
	#[arg(short = 'D', long = "dnssec")]
	pub dnssec: bool,

	/// Default query type for entries without one
	#[arg(short = 'T', long = "type", default_value = "A")]
	pub query_type: String,

	/// Show real-time progress
	#[arg(short = 'g', long = "progress")]
	pub progress: bool,

	/// Show debug info
	#[arg(short = 'v', long = "debug")]
	pub debug: bool,

	/// Directory where the top domains archive is cached
	#[arg(long = "data-dir", default_value = "testdata")]
	pub data_dir: String,

	/// URL of the zipped top domains list
	#[arg(long = "top-list-url", default_value = DEFAULT_TOP_LIST_URL)]
	pub top_list_url: String,

	/// Number of top list domains to use (0 for all)
	#[arg(long = "domain-limit", default_value = "10000")]
	pub domain_limit: usize,
}

impl Cli {
	/// Convert the parsed flags into a run configuration.
	pub fn run_config(&self) -> RunConfig {
		let data_source = match &self.data_file {
			Some(path) => DataSource::File(path.clone()),
			None => DataSource::TopList {
				cache_dir: self.data_dir.clone(),
				url: self.top_list_url.clone(),
				limit: self.domain_limit,
			},
		};
		RunConfig {
			server: self.server.clone(),
			port: self.port,
			data_source,
			max_queries: self.max_queries,
			timeout_secs: self.timeout,
			max_run_secs: self.time_limit,
			concurrency: self.concurrency,
			rtt_sample_capacity: self.rtt_samples,
			rtt_percentile: self.percentile,
			dnssec: self.dnssec,
			default_record_type: self.query_type.clone(),
			show_progress: self.progress,
			show_debug: self.debug,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let cli = Cli::try_parse_from(["dns-stress", "-d", "queries.txt"]).unwrap();
		let cfg = cli.run_config();
		assert_eq!(cfg.server, "127.0.0.1");
		assert_eq!(cfg.port, 53);
		assert_eq!(cfg.data_source, DataSource::File("queries.txt".to_string()));
		assert_eq!(cfg.concurrency, 1);
		assert_eq!(cfg.rtt_sample_capacity, 50_000);
		assert_eq!(cfg.rtt_percentile, 95);
		assert_eq!(cfg.default_record_type, "A");
		assert!(!cfg.dnssec && !cfg.show_progress && !cfg.show_debug);
	}

	#[test]
	fn test_short_flags() {
		let cli = Cli::try_parse_from([
			"dns-stress", "-s", "::1", "-p", "5353", "-d", "q.txt", "-q", "100",
			"-t", "2", "-l", "30", "-c", "16", "-r", "1000", "-u", "99",
			"-D", "-T", "aaaa", "-g", "-v",
		]).unwrap();
		let cfg = cli.run_config();
		assert_eq!(cfg.server, "::1");
		assert_eq!(cfg.port, 5353);
		assert_eq!(cfg.max_queries, 100);
		assert_eq!(cfg.timeout_secs, 2);
		assert_eq!(cfg.max_run_secs, 30);
		assert_eq!(cfg.concurrency, 16);
		assert_eq!(cfg.rtt_sample_capacity, 1000);
		assert_eq!(cfg.rtt_percentile, 99);
		assert!(cfg.dnssec && cfg.show_progress && cfg.show_debug);
		assert_eq!(cfg.default_record_type, "aaaa");
		assert!(cfg.validate().is_ok());
	}

	#[test]
	fn test_top_list_when_no_data_file() {
		let cli = Cli::try_parse_from(["dns-stress", "--domain-limit", "500"]).unwrap();
		match cli.run_config().data_source {
			DataSource::TopList { cache_dir, url, limit } => {
				assert_eq!(cache_dir, "testdata");
				assert_eq!(url, DEFAULT_TOP_LIST_URL);
				assert_eq!(limit, 500);
			}
			other => panic!("expected top list source, got {:?}", other),
		}
	}

	#[test]
	fn test_negative_count_rejected() {
		assert!(Cli::try_parse_from(["dns-stress", "-q", "-1"]).is_err());
	}
}
