//! Agent-to-MCP connection records.
//!
//! A connection is the standing relation behind many attestations: one row
//! per (agent, server url), updated every time an attestation for that pair
//! is ingested.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::agent::AgentId;

/// Unique identifier for a connection.
///
/// Format: `amcp_` + base58 of first 16 bytes of SHA-256 over agent id and
/// server url. Deterministic so ingestion upserts instead of duplicating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    pub fn derive(agent_id: &AgentId, mcp_url: &str) -> Self {
        let material = format!("connection:{}:{}", agent_id.0, mcp_url);
        let hash = Sha256::digest(material.as_bytes());
        let encoded = bs58::encode(&hash[..16]).into_string();
        Self(format!("amcp_{encoded}"))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the connection record came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    /// Inferred from traffic without an attestation.
    AutoDetected,
    /// Declared by an operator.
    UserRegistered,
    /// Backed by at least one verified attestation.
    Attested,
}

impl ConnectionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::AutoDetected => "auto_detected",
            Self::UserRegistered => "user_registered",
            Self::Attested => "attested",
        }
    }
}

/// The standing agent-to-server relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMcpConnection {
    pub id: ConnectionId,
    pub agent_id: AgentId,
    pub mcp_name: String,
    pub mcp_url: String,
    pub connection_type: ConnectionType,
    /// Total attestations ever ingested for this pair.
    pub attestation_count: u64,
    pub last_attested_at: Option<u64>,
    /// 0-100, recomputed from the currently valid attestations.
    pub confidence_score: u8,
    pub created_at: u64,
    pub updated_at: u64,
}

impl AgentMcpConnection {
    /// Create a connection for a pair seen for the first time.
    pub fn new(
        agent_id: AgentId,
        mcp_name: impl Into<String>,
        mcp_url: impl Into<String>,
        connection_type: ConnectionType,
        at: u64,
    ) -> Self {
        let mcp_url = mcp_url.into();
        Self {
            id: ConnectionId::derive(&agent_id, &mcp_url),
            agent_id,
            mcp_name: mcp_name.into(),
            mcp_url,
            connection_type,
            attestation_count: 0,
            last_attested_at: None,
            confidence_score: 0,
            created_at: at,
            updated_at: at,
        }
    }

    /// Fold one newly ingested attestation into the counters. Any prior
    /// connection type is upgraded to `Attested`.
    pub fn record_attestation(&mut self, at: u64) {
        self.connection_type = ConnectionType::Attested;
        self.attestation_count += 1;
        self.last_attested_at = Some(match self.last_attested_at {
            Some(prev) => prev.max(at),
            None => at,
        });
        self.updated_at = at;
    }
}
