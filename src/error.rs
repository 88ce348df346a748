use std::io;

use thiserror::Error;

/// Invalid run configuration, detected before any query is sent
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
	#[error("invalid address: {0}")]
	InvalidAddress(String),
	#[error("invalid port: {0}")]
	InvalidPort(u32),
	#[error("invalid data file path '{0}'")]
	InvalidDataFile(String),
	#[error("invalid concurrent queries num: {0}")]
	InvalidConcurrency(usize),
	#[error("invalid RTT statistics top percentile value: {0}")]
	InvalidPercentile(u8),
	#[error("invalid qtype: {0}")]
	InvalidRecordType(String),
}

/// Failure to produce the list of query items
#[derive(Debug, Error)]
pub enum DataError {
	#[error("failed to read data file '{path}': {source}")]
	Read {
		path: String,
		#[source]
		source: io::Error,
	},
	#[error("failed to download top domains list from '{url}': {reason}")]
	Download { url: String, reason: String },
	#[error("failed to unpack top domains archive: {0}")]
	Archive(String),
	#[error("no query items loaded from {0}")]
	Empty(String),
}

/// Failure of a single query/response exchange.
///
/// The engine only distinguishes success from failure; the variants exist
/// for debug logging.
#[derive(Debug, Error)]
pub enum ExchangeError {
	#[error("invalid domain name '{domain}': {reason}")]
	InvalidName { domain: String, reason: String },
	#[error("i/o error: {0}")]
	Io(#[from] io::Error),
	#[error("timed out after {0} ms")]
	Timeout(u128),
	#[error("malformed message: {0}")]
	Malformed(String),
}

/// Errors surfaced by the stress engine to its caller
#[derive(Debug, Error)]
pub enum StressError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Data(#[from] DataError),
	#[error("stress run already started")]
	AlreadyStarted,
}
