use std::future::Future;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use hickory_proto::rr::RecordType;
use tokio::net::UdpSocket;
use tracing::trace;

use crate::dns::{build_query, parse_response};
use crate::error::ExchangeError;

/// Sends one query and waits for its response.
///
/// Returns the round-trip time on success. Errors are opaque to the
/// engine, which only counts them.
pub trait Exchange {
	fn exchange(
		&self,
		fqdn: &str,
		record_type: RecordType,
		dnssec: bool,
		timeout: Duration,
	) -> impl Future<Output = Result<Duration, ExchangeError>> + Send;
}

/// Plain DNS over UDP against a single server
#[derive(Debug, Clone)]
pub struct UdpExchange {
	server: SocketAddr,
}

impl UdpExchange {
	pub fn new(server: SocketAddr) -> Self {
		Self { server }
	}
}

impl Exchange for UdpExchange {
	/// Creates a dedicated socket and a freshly built message per query, so
	/// concurrent workers never steal each other's responses and no message
	/// state carries over between exchanges.
	async fn exchange(
		&self,
		fqdn: &str,
		record_type: RecordType,
		dnssec: bool,
		timeout: Duration,
	) -> Result<Duration, ExchangeError> {
		let txid: u16 = rand::random();
		let query_bytes = build_query(fqdn, record_type, txid, dnssec)?;

		let bind_addr = if self.server.is_ipv4() {
			"0.0.0.0:0"
		} else {
			"[::]:0"
		};
		let socket = UdpSocket::bind(bind_addr).await?;

		// Timing covers send and receive only
		let start = Instant::now();
		socket.send_to(&query_bytes, self.server).await?;

		// Use 4096-byte buffer to handle EDNS-extended responses
		let mut buf = vec![0u8; 4096];
		loop {
			let elapsed = start.elapsed();
			if elapsed >= timeout {
				return Err(ExchangeError::Timeout(timeout.as_millis()));
			}
			let remaining = timeout - elapsed;

			let (len, src) = match tokio::time::timeout(remaining, socket.recv_from(&mut buf)).await {
				Ok(received) => received?,
				Err(_) => return Err(ExchangeError::Timeout(timeout.as_millis())),
			};
			if src != self.server {
				trace!(%src, "ignoring datagram from unexpected source");
				continue;
			}

			match parse_response(&buf[..len], txid) {
				Ok(response) => {
					let rtt = start.elapsed();
					trace!(rcode = %response.rcode, answers = response.answer_count, "response received");
					return Ok(rtt);
				}
				Err(e) => {
					// Stale or mismatched datagram, keep waiting until the deadline
					trace!(error = %e, "discarding response");
				}
			}
		}
	}
}
