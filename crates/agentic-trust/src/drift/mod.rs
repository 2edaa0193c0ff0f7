//! Configuration drift detection.
//!
//! Compares what an agent *declared* at registration (which MCP servers it
//! talks to, which capabilities it exposes) against what a verification
//! event actually *observed*. Drift is strictly one-directional: an item the
//! agent uses without having declared it. Declared items that went unobserved
//! are not drift; an agent is free to use less than it registered for.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// The envelope an agent declared at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredEnvelope {
    pub mcp_servers: Vec<String>,
    pub capabilities: Vec<String>,
}

/// What a verification event observed the agent doing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedSnapshot {
    pub mcp_servers: Vec<String>,
    pub capabilities: Vec<String>,
}

/// Items observed but never declared, per dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    pub mcp_server_drift: Vec<String>,
    pub capability_drift: Vec<String>,
}

impl DriftReport {
    pub fn has_drift(&self) -> bool {
        !self.mcp_server_drift.is_empty() || !self.capability_drift.is_empty()
    }

    /// All drifted items, MCP servers first, for alert text.
    pub fn drifted_items(&self) -> Vec<&str> {
        self.mcp_server_drift
            .iter()
            .chain(self.capability_drift.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Compute the one-directional diff between declared and observed.
///
/// Output preserves the order items first appear in the observed snapshot
/// and contains no duplicates, even when the snapshot repeats an item.
pub fn detect_drift(declared: &DeclaredEnvelope, observed: &ObservedSnapshot) -> DriftReport {
    DriftReport {
        mcp_server_drift: undeclared_items(&declared.mcp_servers, &observed.mcp_servers),
        capability_drift: undeclared_items(&declared.capabilities, &observed.capabilities),
    }
}

fn undeclared_items(declared: &[String], observed: &[String]) -> Vec<String> {
    let declared_set: HashSet<&str> = declared.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut drift = Vec::new();
    for item in observed {
        if !declared_set.contains(item.as_str()) && seen.insert(item.as_str()) {
            drift.push(item.clone());
        }
    }
    drift
}
