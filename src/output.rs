use std::io::Write;
use std::time::Duration;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::config::{DataSource, RunConfig};
use crate::stats::{RunReport, RunStats};

/// Timestamp format used in the final report
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Print a summary of the run configuration before starting.
pub fn print_config_summary(config: &RunConfig, item_count: usize) {
	println!("DNS Stress Configuration");
	println!("========================");
	println!("Server:         {}:{}", config.server, config.port);
	match &config.data_source {
		DataSource::File(path) => println!("Data file:      {}", path),
		DataSource::TopList { url, .. } => println!("Top list:       {}", url),
	}
	println!("Query items:    {}", item_count);
	println!("Default type:   {}", config.default_record_type.to_ascii_uppercase());
	println!("Concurrency:    {}", config.concurrency);
	println!("Timeout:        {} s", config.timeout().as_secs());
	println!("Max queries:    {}", limit_label(config.max_queries));
	println!("Max run time:   {}", match config.max_run_secs {
		0 => "unlimited".to_string(),
		secs => format!("{} s", secs),
	});
	let dnssec_label = if config.dnssec { "yes" } else { "no" };
	println!("DNSSEC OK:      {}", dnssec_label);
	if config.rtt_sample_capacity > 0 {
		println!(
			"RTT sample:     {} values, TP{}",
			config.rtt_sample_capacity, config.rtt_percentile,
		);
	} else {
		println!("RTT sample:     disabled");
	}
	println!();
}

fn limit_label(limit: u64) -> String {
	if limit == 0 {
		"unlimited".to_string()
	} else {
		limit.to_string()
	}
}

/// Success rate as "12.34%", or "n/a" before any query completed.
pub fn format_success_rate(stats: &RunStats) -> String {
	match stats.success_rate() {
		Some(rate) => format!("{:.2}%", rate),
		None => "n/a".to_string(),
	}
}

/// Single-line progress snapshot.
pub fn format_progress(stats: &RunStats, elapsed: Duration) -> String {
	format!(
		"[progress] total:{}, succeed:{}, failed:{}, success rate:{}, elapsed:{}s, qps:{}",
		stats.total,
		stats.success,
		stats.failed,
		format_success_rate(stats),
		elapsed.as_secs(),
		stats.qps(elapsed) as u64,
	)
}

/// Overwrite the current terminal line with a progress snapshot.
pub fn print_progress(stats: &RunStats, elapsed: Duration) {
	let mut stdout = std::io::stdout().lock();
	// Progress is best effort; a failed write is not worth reporting
	let _ = write!(stdout, "\r\x1b[K{}", format_progress(stats, elapsed));
	let _ = stdout.flush();
}

/// Build the final statistics table.
pub fn report_table(report: &RunReport) -> Table {
	let stats = &report.stats;
	let rtt_label = match report.percentile_rtt {
		Some(rtt) => format!("{}ms", rtt.as_millis()),
		None => "n/a".to_string(),
	};

	let mut table = Table::new();
	table.load_preset(UTF8_FULL);
	table.set_content_arrangement(ContentArrangement::Dynamic);
	table.add_row(vec!["Queries total".to_string(), stats.total.to_string()]);
	table.add_row(vec!["Queries succeeded".to_string(), stats.success.to_string()]);
	table.add_row(vec!["Queries failed".to_string(), stats.failed.to_string()]);
	table.add_row(vec!["Queries success rate".to_string(), format_success_rate(stats)]);
	table.add_row(vec!["Queries QPS".to_string(), format!("{}", report.qps() as u64)]);
	table.add_row(vec![format!("Queries RTT TP{}", report.percentile), rtt_label]);
	table.add_row(vec![
		"Queries started at".to_string(),
		report.started_at.format(TIME_FORMAT).to_string(),
	]);
	table.add_row(vec![
		"Queries finished at".to_string(),
		report.finished_at.format(TIME_FORMAT).to_string(),
	]);
	table.add_row(vec![
		"Queries elapsed".to_string(),
		format!("{:.2}s", report.elapsed.as_secs_f64()),
	]);
	table
}

/// Print the final statistics after all workers have finished.
pub fn print_report(report: &RunReport) {
	// Move past a progress line if one was drawn
	print!("\r\x1b[K");
	println!("\nStatistics:");
	println!("{}", report_table(report));
}
