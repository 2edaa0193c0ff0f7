//! Security alerts raised against agents.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::agent::AgentId;
use crate::drift::DriftReport;

/// Unique identifier for an alert.
///
/// Format: `aalt_` + base58 of first 16 bytes of SHA-256 over the alert
/// coordinates plus random bytes, so two alerts raised in the same
/// microsecond still get distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub String);

impl AlertId {
    fn derive(alert_type: &AlertType, resource_id: &str, at: u64) -> Self {
        let nonce = crate::crypto::random::random_bytes::<16>();
        let material = format!(
            "alert:{}:{}:{}:{}",
            alert_type.as_str(),
            resource_id,
            at,
            hex::encode(nonce)
        );
        let hash = Sha256::digest(material.as_bytes());
        let encoded = bs58::encode(&hash[..16]).into_string();
        Self(format!("aalt_{encoded}"))
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    ConfigurationDrift,
    KeyRotation,
    CompromisedAgent,
}

impl AlertType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ConfigurationDrift => "configuration_drift",
            Self::KeyRotation => "key_rotation",
            Self::CompromisedAgent => "compromised_agent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A persisted alert. Alerts are immutable once raised; acknowledgement and
/// routing live outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub organization_id: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    /// What kind of resource the alert is about. Currently always "agent".
    pub resource_type: String,
    pub resource_id: String,
    pub title: String,
    pub description: String,
    pub created_at: u64,
}

impl Alert {
    /// Raise a high-severity alert for configuration drift.
    ///
    /// The description names every drifted item so the alert is actionable
    /// without loading the event record.
    pub fn configuration_drift(
        organization_id: impl Into<String>,
        agent_id: &AgentId,
        report: &DriftReport,
        at: u64,
    ) -> Self {
        let alert_type = AlertType::ConfigurationDrift;
        let mut description = format!("Agent {agent_id} operated outside its declared envelope.");
        if !report.mcp_server_drift.is_empty() {
            description.push_str(&format!(
                " Undeclared MCP servers: {}.",
                report.mcp_server_drift.join(", ")
            ));
        }
        if !report.capability_drift.is_empty() {
            description.push_str(&format!(
                " Undeclared capabilities: {}.",
                report.capability_drift.join(", ")
            ));
        }

        Self {
            id: AlertId::derive(&alert_type, &agent_id.0, at),
            organization_id: organization_id.into(),
            alert_type,
            severity: AlertSeverity::High,
            resource_type: "agent".to_string(),
            resource_id: agent_id.0.clone(),
            title: "Configuration drift detected".to_string(),
            description,
            created_at: at,
        }
    }

    /// Raise a medium-severity informational alert for a key rotation.
    pub fn key_rotation(
        organization_id: impl Into<String>,
        agent_id: &AgentId,
        reason: &str,
        at: u64,
    ) -> Self {
        let alert_type = AlertType::KeyRotation;
        Self {
            id: AlertId::derive(&alert_type, &agent_id.0, at),
            organization_id: organization_id.into(),
            alert_type,
            severity: AlertSeverity::Medium,
            resource_type: "agent".to_string(),
            resource_id: agent_id.0.clone(),
            title: "Agent key rotated".to_string(),
            description: format!("Agent {agent_id} rotated its signing key (reason: {reason})."),
            created_at: at,
        }
    }

    /// Raise a critical alert when an agent is marked compromised.
    pub fn compromised_agent(
        organization_id: impl Into<String>,
        agent_id: &AgentId,
        at: u64,
    ) -> Self {
        let alert_type = AlertType::CompromisedAgent;
        Self {
            id: AlertId::derive(&alert_type, &agent_id.0, at),
            organization_id: organization_id.into(),
            alert_type,
            severity: AlertSeverity::Critical,
            resource_type: "agent".to_string(),
            resource_id: agent_id.0.clone(),
            title: "Agent marked compromised".to_string(),
            description: format!(
                "Agent {agent_id} was marked compromised. All keys for this agent are rejected."
            ),
            created_at: at,
        }
    }
}
