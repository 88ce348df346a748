use std::io::{Cursor, Read};
use std::path::Path;

use tracing::{debug, info};

use crate::config::DataSource;
use crate::dns::parse_record_type;
use crate::error::DataError;
use crate::query::QueryItem;

/// Name of the CSV entry inside the top domains archive
const TOP_LIST_ENTRY: &str = "top-1m.csv";

/// Load query items from the configured source.
pub async fn load_queries(source: &DataSource) -> Result<Vec<QueryItem>, DataError> {
	match source {
		DataSource::File(path) => read_query_file(path).await,
		DataSource::TopList { cache_dir, url, limit } => {
			let domains = fetch_top_domains(cache_dir, url, *limit).await?;
			Ok(domains.into_iter().map(|d| QueryItem::new(d, None)).collect())
		}
	}
}

/// Read query items from a data file.
///
/// Blank lines and lines starting with '#' are skipped. Each remaining line
/// holds a domain and an optional record type, separated by whitespace.
/// Lines with an unknown record type are dropped. Invalid UTF-8 is replaced
/// rather than rejected, so one bad byte only affects its own line.
pub async fn read_query_file(path: &str) -> Result<Vec<QueryItem>, DataError> {
	let bytes = tokio::fs::read(path).await
		.map_err(|source| DataError::Read { path: path.to_string(), source })?;
	let items = parse_query_lines(&String::from_utf8_lossy(&bytes));
	debug!(path, items = items.len(), "loaded query items");
	Ok(items)
}

/// Parse data file content into query items.
pub fn parse_query_lines(content: &str) -> Vec<QueryItem> {
	content.lines()
		.filter(|line| !line.starts_with('#'))
		.filter_map(parse_query_line)
		.collect()
}

fn parse_query_line(line: &str) -> Option<QueryItem> {
	let mut fields = line.split_whitespace();
	let domain = fields.next()?.trim();
	let record_type = match fields.next() {
		Some(name) => Some(parse_record_type(name)?),
		None => None,
	};
	Some(QueryItem::new(domain, record_type))
}

/// Return up to `limit` domains (0 for all) from the top domains list.
///
/// The archive is downloaded once and cached in `cache_dir`; later runs
/// read the cached copy.
pub async fn fetch_top_domains(
	cache_dir: &str,
	url: &str,
	limit: usize,
) -> Result<Vec<String>, DataError> {
	let archive_name = url.rsplit('/').next()
		.filter(|name| !name.is_empty())
		.unwrap_or("top-1m.csv.zip");
	let cache_path = Path::new(cache_dir).join(archive_name);

	let cached = tokio::fs::try_exists(&cache_path).await.unwrap_or(false);
	let bytes = if cached {
		debug!(path = %cache_path.display(), "using cached top domains archive");
		read_cached(&cache_path).await?
	} else {
		tokio::fs::create_dir_all(cache_dir).await
			.map_err(|source| DataError::Read { path: cache_dir.to_string(), source })?;
		info!(url, "downloading top domains archive");
		let bytes = download(url).await?;
		tokio::fs::write(&cache_path, &bytes).await
			.map_err(|source| DataError::Read {
				path: cache_path.display().to_string(),
				source,
			})?;
		bytes
	};

	parse_top_domains_archive(&bytes, limit)
}

async fn read_cached(path: &Path) -> Result<Vec<u8>, DataError> {
	tokio::fs::read(path).await
		.map_err(|source| DataError::Read { path: path.display().to_string(), source })
}

async fn download(url: &str) -> Result<Vec<u8>, DataError> {
	let download_error = |reason: String| DataError::Download { url: url.to_string(), reason };

	let response = reqwest::get(url).await
		.map_err(|e| download_error(e.to_string()))?;
	let response = response.error_for_status()
		.map_err(|e| download_error(e.to_string()))?;
	let body = response.bytes().await
		.map_err(|e| download_error(e.to_string()))?;
	Ok(body.to_vec())
}

/// Extract domains from a zipped `rank,domain` CSV.
///
/// The second column of each record is the domain. Reading stops after
/// `limit` domains when `limit` is non-zero.
pub fn parse_top_domains_archive(bytes: &[u8], limit: usize) -> Result<Vec<String>, DataError> {
	let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
		.map_err(|e| DataError::Archive(e.to_string()))?;
	let mut entry = archive.by_name(TOP_LIST_ENTRY)
		.map_err(|e| DataError::Archive(format!("{}: {}", TOP_LIST_ENTRY, e)))?;
	let mut content = Vec::new();
	entry.read_to_end(&mut content)
		.map_err(|e| DataError::Archive(e.to_string()))?;

	let mut reader = csv::ReaderBuilder::new()
		.has_headers(false)
		.flexible(true)
		.from_reader(content.as_slice());

	let mut domains = Vec::new();
	for record in reader.records() {
		let record = record.map_err(|e| DataError::Archive(e.to_string()))?;
		let Some(domain) = record.get(1).map(str::trim).filter(|d| !d.is_empty()) else {
			continue;
		};
		domains.push(domain.to_string());
		if limit > 0 && domains.len() >= limit {
			break;
		}
	}
	Ok(domains)
}
