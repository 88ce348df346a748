use std::str::FromStr;

use hickory_proto::op::{Edns, Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::{Name, RecordType};

use crate::error::ExchangeError;

/// Advertised UDP payload size when the DO bit is set
pub const EDNS_PAYLOAD_SIZE: u16 = 4096;

/// DNS response information extracted from a parsed message
#[derive(Debug)]
pub struct DnsResponse {
	pub rcode: ResponseCode,
	pub answer_count: usize,
}

/// Parse a record type name such as "a" or "AAAA".
///
/// The name is upper-cased before lookup. Returns None for names that are
/// not a known resource record type.
pub fn parse_record_type(name: &str) -> Option<RecordType> {
	let upper = name.trim().to_ascii_uppercase();
	if upper.is_empty() {
		return None;
	}
	match RecordType::from_str(&upper) {
		Ok(RecordType::Unknown(_)) | Err(_) => None,
		Ok(rt) => Some(rt),
	}
}

/// Normalize a domain to its fully-qualified form with a trailing dot.
pub fn to_fqdn(domain: &str) -> String {
	if domain.ends_with('.') {
		domain.to_string()
	} else {
		format!("{}.", domain)
	}
}

/// Build a DNS query message for the given name and record type.
///
/// A new message is built for every call so no header flags or sections
/// carry over between exchanges. When dnssec is true, the DO (DNSSEC OK)
/// bit is set via EDNS. Returns the serialized query bytes.
pub fn build_query(
	fqdn: &str,
	record_type: RecordType,
	txid: u16,
	dnssec: bool,
) -> Result<Vec<u8>, ExchangeError> {
	let name = Name::from_ascii(fqdn)
		.map_err(|e| ExchangeError::InvalidName {
			domain: fqdn.to_string(),
			reason: e.to_string(),
		})?;

	let mut message = Message::new();
	message.set_id(txid);
	message.set_recursion_desired(true);
	message.add_query(Query::query(name, record_type));

	if dnssec {
		let edns = message.extensions_mut().get_or_insert_with(Edns::new);
		edns.set_max_payload(EDNS_PAYLOAD_SIZE);
		edns.set_dnssec_ok(true);
	}

	message.to_vec()
		.map_err(|e| ExchangeError::Malformed(format!("failed to serialize query: {}", e)))
}

/// Parse a DNS response, validating the transaction ID.
///
/// Returns an error if the response cannot be parsed, is not a response,
/// or the txid does not match.
pub fn parse_response(bytes: &[u8], expected_txid: u16) -> Result<DnsResponse, ExchangeError> {
	let message = Message::from_vec(bytes)
		.map_err(|e| ExchangeError::Malformed(format!("failed to parse response: {}", e)))?;

	if message.id() != expected_txid {
		return Err(ExchangeError::Malformed(format!(
			"txid mismatch: expected {}, got {}",
			expected_txid, message.id()
		)));
	}

	if message.message_type() != MessageType::Response {
		return Err(ExchangeError::Malformed(
			"received a query instead of a response".to_string(),
		));
	}

	Ok(DnsResponse {
		rcode: message.response_code(),
		answer_count: message.answer_count() as usize,
	})
}
