//! The attestation payload and its canonical signing form.
//!
//! SDKs sign the canonical JSON encoding of the payload, so every producer
//! and verifier must agree on it byte for byte. The canonical form is:
//! compact JSON (no whitespace), fields in alphabetical order, UTF-8,
//! booleans as literal `true`/`false`, arrays in the order the producer
//! supplied them, and the timestamp carried as the verbatim RFC 3339 string
//! that was signed. It is produced by hand here rather than through serde so
//! the wire format cannot drift with struct declaration order.

use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};

use crate::crypto::signing;
use crate::error::{Result, TrustError};

/// One attestation from an agent SDK about a live MCP connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttestationPayload {
    pub agent_id: String,
    pub capabilities_found: Vec<String>,
    pub connection_latency_ms: u64,
    pub connection_successful: bool,
    pub health_check_passed: bool,
    pub mcp_name: String,
    pub mcp_url: String,
    pub sdk_version: String,
    /// RFC 3339 timestamp, carried exactly as signed.
    pub timestamp: String,
}

impl AttestationPayload {
    /// Encode the payload in its canonical signing form.
    pub fn canonical_json(&self) -> String {
        let mut out = String::with_capacity(256);
        out.push('{');
        out.push_str("\"agent_id\":");
        push_json_str(&mut out, &self.agent_id);
        out.push_str(",\"capabilities_found\":[");
        for (i, capability) in self.capabilities_found.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            push_json_str(&mut out, capability);
        }
        out.push(']');
        out.push_str(",\"connection_latency_ms\":");
        out.push_str(&self.connection_latency_ms.to_string());
        out.push_str(",\"connection_successful\":");
        out.push_str(bool_literal(self.connection_successful));
        out.push_str(",\"health_check_passed\":");
        out.push_str(bool_literal(self.health_check_passed));
        out.push_str(",\"mcp_name\":");
        push_json_str(&mut out, &self.mcp_name);
        out.push_str(",\"mcp_url\":");
        push_json_str(&mut out, &self.mcp_url);
        out.push_str(",\"sdk_version\":");
        push_json_str(&mut out, &self.sdk_version);
        out.push_str(",\"timestamp\":");
        push_json_str(&mut out, &self.timestamp);
        out.push('}');
        out
    }

    /// Check structural requirements before verification.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::MalformedPayload` when a required field is empty
    /// or the timestamp is not valid RFC 3339.
    pub fn validate(&self) -> Result<()> {
        if self.agent_id.is_empty() {
            return Err(TrustError::MalformedPayload("agent_id is empty".into()));
        }
        if self.mcp_name.is_empty() {
            return Err(TrustError::MalformedPayload("mcp_name is empty".into()));
        }
        if self.mcp_url.is_empty() {
            return Err(TrustError::MalformedPayload("mcp_url is empty".into()));
        }
        self.timestamp_micros()?;
        Ok(())
    }

    /// The payload timestamp in microseconds since the Unix epoch.
    pub fn timestamp_micros(&self) -> Result<u64> {
        crate::time::rfc3339_to_micros(&self.timestamp)
    }

    /// Sign the canonical form, returning the signature in base64.
    pub fn sign(&self, signing_key: &SigningKey) -> String {
        signing::sign_to_base64(signing_key, self.canonical_json().as_bytes())
    }
}

fn bool_literal(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Append `s` to `out` as a JSON string literal.
///
/// Escapes the quote, backslash, and the common control characters by name;
/// any other control character below U+0020 becomes a `\u00XX` escape.
fn push_json_str(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
