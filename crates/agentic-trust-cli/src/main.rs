//! AgenticTrust CLI — `atrust` command.
//!
//! Provides a command-line interface for registering agents, signing and
//! ingesting MCP attestations, running verification events, and managing
//! trust scores and rotating credentials.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use agentic_trust::agent::{AgentId, AgentRecord, RotationReason};
use agentic_trust::alert::Alert;
use agentic_trust::attestation::{ingest_attestation, sweep_expired, AttestationPayload};
use agentic_trust::credential::{CredentialId, CredentialService, RevocationReason};
use agentic_trust::crypto::keys::Ed25519KeyPair;
use agentic_trust::event::{
    EventId, EventStatus, InitiatorType, Protocol, VerificationPipeline, VerificationRequest,
    VerificationType,
};
use agentic_trust::score::{
    calculate_score, confidence_from_activity, TrustScore, TrustScoreFactors,
    TrustScoreHistoryEntry,
};
use agentic_trust::storage::{
    load_agent_key, save_agent_key, AgentStore, AlertStore, AttestationStore, EventStore,
    HistoryStore,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_store_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".agentic-trust")
}

fn keys_dir(store: &Path) -> PathBuf {
    store.join("keys")
}

fn key_path(store: &Path, agent_id: &AgentId) -> PathBuf {
    keys_dir(store).join(format!("{agent_id}.atk"))
}

// ── Passphrase helper ─────────────────────────────────────────────────────────

/// Read a passphrase from `ATRUST_PASSPHRASE` if set, else from stdin.
fn read_passphrase(prompt: &str) -> Result<String> {
    if let Ok(passphrase) = std::env::var("ATRUST_PASSPHRASE") {
        return Ok(passphrase);
    }
    eprint!("{prompt}");
    let mut passphrase = String::new();
    std::io::stdin()
        .read_line(&mut passphrase)
        .context("failed to read passphrase")?;
    Ok(passphrase.trim().to_string())
}

// ── Time formatting helpers ───────────────────────────────────────────────────

fn micros_to_datetime(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    let dt = chrono::DateTime::from_timestamp(secs, 0).unwrap_or(chrono::DateTime::UNIX_EPOCH);
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Parse a duration string like "24h", "7d", "30d", "1h30m", or plain hours.
/// Returns the duration as microseconds.
fn parse_duration_to_micros(s: &str) -> Result<u64> {
    let s = s.trim();

    // Bare number is treated as hours
    if let Ok(n) = s.parse::<u64>() {
        return Ok(n * 3600 * 1_000_000);
    }

    let mut total_micros: u64 = 0;
    let mut current = String::new();

    for ch in s.chars() {
        if ch.is_ascii_digit() {
            current.push(ch);
        } else {
            let val: u64 = current
                .parse()
                .map_err(|_| anyhow!("invalid duration: {s}"))?;
            current.clear();
            match ch {
                'h' => total_micros += val * 3600 * 1_000_000,
                'd' => total_micros += val * 86400 * 1_000_000,
                'm' => total_micros += val * 60 * 1_000_000,
                's' => total_micros += val * 1_000_000,
                _ => return Err(anyhow!("unknown duration unit '{}' in '{s}'", ch)),
            }
        }
    }

    if !current.is_empty() {
        return Err(anyhow!("duration '{s}' is missing a unit (h/d/m/s)"));
    }

    if total_micros == 0 {
        return Err(anyhow!("duration must be > 0"));
    }

    Ok(total_micros)
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// AgenticTrust CLI — register agents, verify attestations, and manage
/// trust scores and credentials for AI agents.
#[derive(Parser, Debug)]
#[command(
    name = "atrust",
    about = "AgenticTrust CLI",
    version,
    long_about = "atrust — AgenticTrust CLI\n\nRegister agents, sign and ingest MCP attestations, run verification\nevents, and manage trust scores and rotating credentials."
)]
struct Cli {
    /// Store directory (default: ~/.agentic-trust)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage agent records and key files
    Agent {
        #[command(subcommand)]
        subcommand: AgentCommands,
    },

    /// Sign and verify MCP connection attestations
    Attest {
        #[command(subcommand)]
        subcommand: AttestCommands,
    },

    /// Run and inspect verification events
    Event {
        #[command(subcommand)]
        subcommand: EventCommands,
    },

    /// Inspect trust scores and their history
    Score {
        #[command(subcommand)]
        subcommand: ScoreCommands,
    },

    /// Manage rotating credentials
    Credential {
        #[command(subcommand)]
        subcommand: CredentialCommands,
    },

    /// Invalidate attestations past their validity window
    Sweep,
}

#[derive(Subcommand, Debug)]
enum AgentCommands {
    /// Register a new agent and create its encrypted key file
    Register {
        /// Agent display name
        #[arg(long)]
        name: String,

        /// Organization id
        #[arg(long)]
        org: String,

        /// Declared capability (repeatable)
        #[arg(long = "capability")]
        capabilities: Vec<String>,

        /// Declared MCP server the agent talks to (repeatable)
        #[arg(long = "talks-to")]
        talks_to: Vec<String>,
    },

    /// Display an agent record
    Show {
        /// Agent id (aagt_...)
        agent_id: String,

        /// Emit the raw record as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all registered agents
    List {
        /// Emit the raw records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rotate an agent's signing key
    RotateKey {
        /// Agent id (aagt_...)
        agent_id: String,

        /// Reason for rotation (manual, scheduled, compromised, device_lost, policy_required)
        #[arg(long)]
        reason: Option<String>,

        /// Grace window during which the previous key is still accepted (e.g. 24h, 7d)
        #[arg(long, default_value = "7d")]
        grace: String,
    },

    /// Mark an agent compromised (all of its keys are rejected)
    Compromise {
        /// Agent id (aagt_...)
        agent_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum AttestCommands {
    /// Sign an attestation payload with an agent's key file
    Sign {
        /// Agent id (aagt_...)
        #[arg(long)]
        agent: String,

        /// MCP server name
        #[arg(long)]
        mcp_name: String,

        /// MCP server URL
        #[arg(long)]
        mcp_url: String,

        /// Capability found on the server (repeatable)
        #[arg(long = "capability")]
        capabilities: Vec<String>,

        /// Connection latency in milliseconds
        #[arg(long, default_value = "0")]
        latency_ms: u64,

        /// Record the connection attempt as failed
        #[arg(long)]
        connection_failed: bool,

        /// Record the health check as failed
        #[arg(long)]
        health_failed: bool,

        /// SDK version string carried in the payload
        #[arg(long, default_value = concat!("atrust/", env!("CARGO_PKG_VERSION")))]
        sdk_version: String,

        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Verify a signed attestation and ingest it into the store
    Verify {
        /// File containing the signed attestation JSON
        input: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum EventCommands {
    /// Run one verification event through the pipeline
    Record {
        /// Agent id (aagt_...)
        #[arg(long)]
        agent: String,

        /// Organization id (default: the agent's)
        #[arg(long)]
        org: Option<String>,

        /// Protocol (mcp, a2a)
        #[arg(long, default_value = "mcp")]
        protocol: String,

        /// Verification type (identity, capability, behavior)
        #[arg(long = "type", default_value = "identity")]
        verification_type: String,

        /// Terminal outcome (success, failure)
        #[arg(long, default_value = "success")]
        outcome: String,

        /// Verifier confidence in [0,1]
        #[arg(long, default_value = "1.0")]
        confidence: f64,

        /// Verification duration in milliseconds
        #[arg(long, default_value = "0")]
        duration_ms: u64,

        /// Initiator (system, user, agent)
        #[arg(long, default_value = "system")]
        initiator: String,

        /// Observed MCP server (repeatable)
        #[arg(long = "observed-server")]
        observed_servers: Vec<String>,

        /// Observed capability (repeatable)
        #[arg(long = "observed-capability")]
        observed_capabilities: Vec<String>,

        /// Trust factor vector as a JSON object (default: fresh-registration vector)
        #[arg(long)]
        factors: Option<String>,
    },

    /// Display a verification event
    Show {
        /// Event id (aevt_...)
        event_id: String,

        /// Emit the raw record as JSON
        #[arg(long)]
        json: bool,
    },

    /// List verification events, newest first
    List {
        /// Filter by agent id
        #[arg(long)]
        agent: Option<String>,

        /// Maximum number of events to display
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Emit the raw records as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ScoreCommands {
    /// Display an agent's current trust score
    Show {
        /// Agent id (aagt_...)
        agent_id: String,

        /// Emit the raw score as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display an agent's trust score history, newest first
    History {
        /// Agent id (aagt_...)
        agent_id: String,

        /// Maximum number of entries to display
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Emit the raw entries as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CredentialCommands {
    /// Issue a root credential for an agent
    Issue {
        /// Agent id (aagt_...)
        #[arg(long)]
        agent: String,

        /// Device or session identity the credential is bound to
        #[arg(long)]
        device: String,

        /// Emit the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Exchange a refresh credential for a new one
    Refresh {
        /// The presented refresh credential value
        token: String,

        /// Emit the refresh response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Revoke a credential
    Revoke {
        /// Credential id (acrd_...)
        credential_id: String,

        /// Reason (compromised, policy_violation, manual_revocation)
        #[arg(long)]
        reason: Option<String>,

        /// Also revoke everything refreshed from it
        #[arg(long)]
        cascade: bool,
    },

    /// Show a credential's ancestry and descendants
    Lineage {
        /// Credential id (acrd_...)
        credential_id: String,

        /// Emit the raw records as JSON
        #[arg(long)]
        json: bool,
    },
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let verbose = cli.verbose;
    let store = cli.store.clone().unwrap_or_else(default_store_dir);

    let result = match cli.command {
        Commands::Agent { subcommand } => match subcommand {
            AgentCommands::Register {
                name,
                org,
                capabilities,
                talks_to,
            } => cmd_agent_register(&store, &name, &org, capabilities, talks_to, verbose),
            AgentCommands::Show { agent_id, json } => cmd_agent_show(&store, &agent_id, json),
            AgentCommands::List { json } => cmd_agent_list(&store, json),
            AgentCommands::RotateKey {
                agent_id,
                reason,
                grace,
            } => cmd_agent_rotate_key(&store, &agent_id, reason.as_deref(), &grace, verbose),
            AgentCommands::Compromise { agent_id } => cmd_agent_compromise(&store, &agent_id),
        },
        Commands::Attest { subcommand } => match subcommand {
            AttestCommands::Sign {
                agent,
                mcp_name,
                mcp_url,
                capabilities,
                latency_ms,
                connection_failed,
                health_failed,
                sdk_version,
                output,
            } => cmd_attest_sign(
                &store,
                &agent,
                &mcp_name,
                &mcp_url,
                capabilities,
                latency_ms,
                !connection_failed,
                !health_failed,
                &sdk_version,
                output.as_deref(),
            ),
            AttestCommands::Verify { input } => cmd_attest_verify(&store, &input, verbose),
        },
        Commands::Event { subcommand } => match subcommand {
            EventCommands::Record {
                agent,
                org,
                protocol,
                verification_type,
                outcome,
                confidence,
                duration_ms,
                initiator,
                observed_servers,
                observed_capabilities,
                factors,
            } => cmd_event_record(
                &store,
                &agent,
                org.as_deref(),
                &protocol,
                &verification_type,
                &outcome,
                confidence,
                duration_ms,
                &initiator,
                observed_servers,
                observed_capabilities,
                factors.as_deref(),
                verbose,
            ),
            EventCommands::Show { event_id, json } => cmd_event_show(&store, &event_id, json),
            EventCommands::List { agent, limit, json } => {
                cmd_event_list(&store, agent.as_deref(), limit, json)
            }
        },
        Commands::Score { subcommand } => match subcommand {
            ScoreCommands::Show { agent_id, json } => cmd_score_show(&store, &agent_id, json),
            ScoreCommands::History {
                agent_id,
                limit,
                json,
            } => cmd_score_history(&store, &agent_id, limit, json),
        },
        Commands::Credential { subcommand } => match subcommand {
            CredentialCommands::Issue { agent, device, json } => {
                cmd_credential_issue(&store, &agent, &device, json)
            }
            CredentialCommands::Refresh { token, json } => {
                cmd_credential_refresh(&store, &token, json)
            }
            CredentialCommands::Revoke {
                credential_id,
                reason,
                cascade,
            } => cmd_credential_revoke(&store, &credential_id, reason.as_deref(), cascade),
            CredentialCommands::Lineage {
                credential_id,
                json,
            } => cmd_credential_lineage(&store, &credential_id, json),
        },
        Commands::Sweep => cmd_sweep(&store),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ── Agent commands ────────────────────────────────────────────────────────────

/// `atrust agent register --name NAME --org ORG [--capability CAP]... [--talks-to URL]...`
fn cmd_agent_register(
    store: &Path,
    name: &str,
    org: &str,
    capabilities: Vec<String>,
    talks_to: Vec<String>,
    verbose: bool,
) -> Result<()> {
    let agents = AgentStore::new(store).context("failed to open agent store")?;

    let passphrase = read_passphrase("Enter passphrase for the new agent key: ")?;
    if passphrase.is_empty() {
        return Err(anyhow!("passphrase cannot be empty"));
    }
    if std::env::var("ATRUST_PASSPHRASE").is_err() {
        let confirm = read_passphrase("Confirm passphrase: ")?;
        if passphrase != confirm {
            return Err(anyhow!("passphrases do not match"));
        }
    }

    let keypair = Ed25519KeyPair::generate();
    let mut agent = AgentRecord::new(org, name, capabilities, talks_to, keypair.verifying_key());

    if agents.exists(&agent.id) {
        return Err(anyhow!("agent '{}' is already registered", agent.id));
    }

    std::fs::create_dir_all(keys_dir(store)).context("failed to create keys directory")?;
    let path = key_path(store, &agent.id);
    save_agent_key(&keypair, &agent.id, &path, &passphrase)
        .context("failed to save agent key file")?;

    // Seed the initial trust score from the fresh-registration vector.
    let now = agentic_trust::time::now_micros();
    let factors = TrustScoreFactors::fresh_registration();
    let value = calculate_score(&factors).context("failed to calculate initial score")?;
    agent.trust_score = Some(TrustScore::new(
        value,
        confidence_from_activity(0, None, now),
        now,
    ));
    agents.save(&agent).context("failed to save agent record")?;

    let history = HistoryStore::new(store).context("failed to open history store")?;
    let entry = TrustScoreHistoryEntry::new(
        agent.id.clone(),
        value,
        None,
        "initial registration",
        None,
        now,
    );
    history
        .append(&entry)
        .context("failed to record initial score history")?;

    println!("Registered agent '{name}'");
    println!("  ID:       {}", agent.id);
    println!("  Org:      {org}");
    println!("  Key file: {}", path.display());
    println!("  Score:    {value:.3}");

    if verbose {
        println!("  Key:      {}", agent.public_key);
        println!("  Created:  {}", micros_to_datetime(agent.created_at));
    }

    Ok(())
}

/// `atrust agent show AGENT_ID [--json]`
fn cmd_agent_show(store: &Path, agent_id: &str, json: bool) -> Result<()> {
    let agents = AgentStore::new(store).context("failed to open agent store")?;
    let agent = agents.load(&AgentId(agent_id.to_string()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&agent)?);
        return Ok(());
    }

    println!("Agent: {}", agent.name);
    println!("  ID:           {}", agent.id);
    println!("  Organization: {}", agent.organization_id);
    println!("  Public Key:   {}", agent.public_key);
    println!("  Created:      {}", micros_to_datetime(agent.created_at));
    println!("  Compromised:  {}", if agent.is_compromised { "YES" } else { "no" });

    if !agent.capabilities.is_empty() {
        println!("  Capabilities:");
        for capability in &agent.capabilities {
            println!("    - {capability}");
        }
    }
    if !agent.talks_to.is_empty() {
        println!("  Talks to:");
        for server in &agent.talks_to {
            println!("    - {server}");
        }
    }

    match agent.trust_score {
        Some(score) => println!(
            "  Trust Score:  {:.3} (confidence {:.2}, {})",
            score.value,
            score.confidence,
            micros_to_datetime(score.calculated_at)
        ),
        None => println!("  Trust Score:  none"),
    }

    if agent.rotation_history.is_empty() {
        println!("  Rotation History: none");
    } else {
        println!(
            "  Rotation History ({} rotation(s)):",
            agent.rotation_history.len()
        );
        for (i, rotation) in agent.rotation_history.iter().enumerate() {
            println!(
                "    [{}] {} — reason: {}",
                i + 1,
                micros_to_datetime(rotation.rotated_at),
                rotation.reason.as_str()
            );
            println!("        Previous key: {}...", &rotation.previous_key[..16]);
            println!("        New key:      {}...", &rotation.new_key[..16]);
        }
        if let Some(grace_until) = agent.key_rotation_grace_until {
            println!("  Previous key accepted until: {}", micros_to_datetime(grace_until));
        }
    }

    Ok(())
}

/// `atrust agent list [--json]`
fn cmd_agent_list(store: &Path, json: bool) -> Result<()> {
    let agents = AgentStore::new(store).context("failed to open agent store")?;
    let ids = agents.list().context("failed to list agents")?;

    let mut records = Vec::new();
    for id in &ids {
        records.push(agents.load(id)?);
    }
    records.sort_by(|a, b| a.name.cmp(&b.name));

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No agents registered.");
        return Ok(());
    }

    println!("{:<20} {:<30} {:<8} CREATED", "NAME", "ID", "SCORE");
    println!("{}", "-".repeat(78));
    for agent in &records {
        let score = agent
            .trust_score
            .map(|s| format!("{:.3}", s.value))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20} {:<30} {:<8} {}",
            agent.name,
            agent.id,
            score,
            micros_to_datetime(agent.created_at)
        );
    }

    Ok(())
}

/// `atrust agent rotate-key AGENT_ID [--reason REASON] [--grace DURATION]`
fn cmd_agent_rotate_key(
    store: &Path,
    agent_id: &str,
    reason_str: Option<&str>,
    grace_str: &str,
    verbose: bool,
) -> Result<()> {
    let agents = AgentStore::new(store).context("failed to open agent store")?;
    let id = AgentId(agent_id.to_string());
    let mut agent = agents.load(&id)?;

    let path = key_path(store, &id);
    if !path.exists() {
        return Err(anyhow!(
            "key file for '{}' not found (expected at {})",
            agent_id,
            path.display()
        ));
    }

    let passphrase = read_passphrase(&format!("Passphrase for agent '{}': ", agent.name))?;
    let old_keypair =
        load_agent_key(&path, &passphrase).context("failed to load key file (wrong passphrase?)")?;

    let grace_micros =
        parse_duration_to_micros(grace_str).with_context(|| format!("invalid --grace value: '{grace_str}'"))?;
    let reason = parse_rotation_reason(reason_str.unwrap_or("manual"));

    let new_keypair = Ed25519KeyPair::generate();
    agent.rotate_key(
        new_keypair.verifying_key(),
        grace_micros,
        old_keypair.signing_key(),
        reason,
    )?;

    // Keep the old key file bytes so a failed record save can be undone.
    let previous_key_file = std::fs::read(&path).ok();
    save_agent_key(&new_keypair, &agent.id, &path, &passphrase)
        .context("failed to save rotated key file")?;
    if let Err(e) = agents.save(&agent) {
        if let Some(bytes) = previous_key_file {
            let _ = std::fs::write(&path, bytes);
        }
        return Err(e).context("failed to save rotated agent record");
    }

    let alerts = AlertStore::new(store).context("failed to open alert store")?;
    let alert = Alert::key_rotation(
        agent.organization_id.clone(),
        &agent.id,
        reason_from_record(&agent),
        agentic_trust::time::now_micros(),
    );
    alerts.save(&alert).context("failed to save rotation alert")?;

    println!("Key rotated for agent '{}'", agent.name);
    println!("  ID:        {}", agent.id);
    println!("  Rotations: {}", agent.rotation_count);
    if let Some(grace_until) = agent.key_rotation_grace_until {
        println!("  Previous key accepted until: {}", micros_to_datetime(grace_until));
    }
    println!("  Alert:     {}", alert.id);

    if verbose {
        if let Some(ref previous) = agent.previous_public_key {
            println!("  Old Key: {previous}");
        }
        println!("  New Key: {}", agent.public_key);
    }

    Ok(())
}

fn reason_from_record(agent: &AgentRecord) -> &str {
    agent
        .rotation_history
        .last()
        .map(|r| r.reason.as_str())
        .unwrap_or("manual")
}

/// `atrust agent compromise AGENT_ID`
fn cmd_agent_compromise(store: &Path, agent_id: &str) -> Result<()> {
    let agents = AgentStore::new(store).context("failed to open agent store")?;
    let id = AgentId(agent_id.to_string());
    let mut agent = agents.load(&id)?;

    agent.mark_compromised();
    agents.save(&agent).context("failed to save agent record")?;

    let alerts = AlertStore::new(store).context("failed to open alert store")?;
    let alert = Alert::compromised_agent(
        agent.organization_id.clone(),
        &agent.id,
        agentic_trust::time::now_micros(),
    );
    alerts
        .save(&alert)
        .context("failed to save compromise alert")?;

    println!("Agent '{}' marked compromised", agent.name);
    println!("  ID:    {}", agent.id);
    println!("  Alert: {}", alert.id);
    println!("  All keys for this agent are now rejected.");

    Ok(())
}

// ── Attestation commands ──────────────────────────────────────────────────────

/// A signed attestation as exchanged between `attest sign` and
/// `attest verify`.
#[derive(Debug, Serialize, Deserialize)]
struct SignedAttestation {
    payload: AttestationPayload,
    signature: String,
}

/// `atrust attest sign --agent ID --mcp-name NAME --mcp-url URL [options]`
#[allow(clippy::too_many_arguments)]
fn cmd_attest_sign(
    store: &Path,
    agent_id: &str,
    mcp_name: &str,
    mcp_url: &str,
    capabilities: Vec<String>,
    latency_ms: u64,
    connection_successful: bool,
    health_check_passed: bool,
    sdk_version: &str,
    output: Option<&Path>,
) -> Result<()> {
    let id = AgentId(agent_id.to_string());
    let path = key_path(store, &id);
    if !path.exists() {
        return Err(anyhow!(
            "key file for '{}' not found (expected at {})",
            agent_id,
            path.display()
        ));
    }

    let passphrase = read_passphrase(&format!("Passphrase for agent '{}': ", agent_id))?;
    let keypair =
        load_agent_key(&path, &passphrase).context("failed to load key file (wrong passphrase?)")?;

    let payload = AttestationPayload {
        agent_id: agent_id.to_string(),
        capabilities_found: capabilities,
        connection_latency_ms: latency_ms,
        connection_successful,
        health_check_passed,
        mcp_name: mcp_name.to_string(),
        mcp_url: mcp_url.to_string(),
        sdk_version: sdk_version.to_string(),
        timestamp: agentic_trust::time::micros_to_rfc3339(agentic_trust::time::now_micros()),
    };
    payload.validate()?;

    let signed = SignedAttestation {
        signature: payload.sign(keypair.signing_key()),
        payload,
    };
    let json = serde_json::to_string_pretty(&signed)?;

    if let Some(out_path) = output {
        std::fs::write(out_path, &json)
            .with_context(|| format!("failed to write to {}", out_path.display()))?;
        println!("Wrote signed attestation to {}", out_path.display());
    } else {
        println!("{json}");
    }

    Ok(())
}

/// `atrust attest verify INPUT`
fn cmd_attest_verify(store: &Path, input: &Path, verbose: bool) -> Result<()> {
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let signed: SignedAttestation =
        serde_json::from_str(&json).context("input is not a signed attestation")?;

    let attestations = AttestationStore::new(store).context("failed to open attestation store")?;
    let agents = AgentStore::new(store).context("failed to open agent store")?;

    let outcome = ingest_attestation(&attestations, &agents, &signed.payload, &signed.signature)?;
    let attestation = &outcome.attestation;
    let connection = &outcome.connection;

    println!("Attestation verified");
    println!("  ID:        {}", attestation.id);
    println!("  Agent:     {}", attestation.agent_id);
    println!("  Server:    {} ({})", attestation.payload.mcp_name, attestation.payload.mcp_url);
    println!("  Key used:  {}", attestation.key_used.as_str());
    println!("  Verified:  {}", micros_to_datetime(attestation.verified_at));
    println!("  Expires:   {}", micros_to_datetime(attestation.expires_at));
    println!();
    println!("Connection");
    println!("  ID:           {}", connection.id);
    println!("  Type:         {}", connection.connection_type.as_str());
    println!("  Attestations: {}", connection.attestation_count);
    println!("  Confidence:   {}/100", connection.confidence_score);

    if verbose {
        println!();
        println!("  Canonical: {}", attestation.payload.canonical_json());
    }

    Ok(())
}

/// `atrust sweep`
fn cmd_sweep(store: &Path) -> Result<()> {
    let attestations = AttestationStore::new(store).context("failed to open attestation store")?;
    let report = sweep_expired(&attestations)?;

    println!("Sweep complete");
    println!("  Scanned:     {}", report.scanned);
    println!("  Invalidated: {}", report.invalidated);
    println!("  Pass start:  {}", micros_to_datetime(report.pass_started_at));

    Ok(())
}

// ── Event commands ────────────────────────────────────────────────────────────

/// `atrust event record --agent ID [options]`
#[allow(clippy::too_many_arguments)]
fn cmd_event_record(
    store: &Path,
    agent_id: &str,
    org: Option<&str>,
    protocol_str: &str,
    type_str: &str,
    outcome_str: &str,
    confidence: f64,
    duration_ms: u64,
    initiator_str: &str,
    observed_servers: Vec<String>,
    observed_capabilities: Vec<String>,
    factors_json: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let pipeline = VerificationPipeline::new(store).context("failed to open stores")?;

    let id = AgentId(agent_id.to_string());
    let organization_id = match org {
        Some(org) => org.to_string(),
        None => pipeline.agents().load(&id)?.organization_id,
    };

    let factors: TrustScoreFactors = match factors_json {
        Some(json) => serde_json::from_str(json)
            .context("--factors must be a JSON object with the eight factor fields")?,
        None => TrustScoreFactors::fresh_registration(),
    };

    let request = VerificationRequest {
        organization_id,
        agent_id: id,
        protocol: parse_protocol(protocol_str)?,
        verification_type: parse_verification_type(type_str)?,
        confidence,
        duration_ms,
        initiator_type: parse_initiator_type(initiator_str)?,
        started_at: agentic_trust::time::now_micros(),
        current_mcp_servers: observed_servers,
        current_capabilities: observed_capabilities,
    };

    let outcome = pipeline.run(&request, parse_outcome(outcome_str)?, &factors)?;

    println!("Verification event recorded");
    println!("  ID:      {}", outcome.event.id);
    println!("  Status:  {}", outcome.event.status.as_str());
    println!(
        "  Drift:   {}",
        if outcome.event.drift_detected {
            "DETECTED"
        } else {
            "none"
        }
    );
    if let Some(ref alert) = outcome.alert {
        println!("  Alert:   {}", alert.id);
        for item in outcome
            .event
            .mcp_server_drift
            .iter()
            .chain(&outcome.event.capability_drift)
        {
            println!("    - {item}");
        }
    }
    println!(
        "  Score:   {:.3} (confidence {:.2})",
        outcome.score.value, outcome.score.confidence
    );

    if verbose {
        println!("  History: {}", outcome.history_entry.id);
        println!(
            "  Previous score: {}",
            outcome
                .history_entry
                .previous_score
                .map(|s| format!("{s:.3}"))
                .unwrap_or_else(|| "none".to_string())
        );
    }

    Ok(())
}

/// `atrust event show EVENT_ID [--json]`
fn cmd_event_show(store: &Path, event_id: &str, json: bool) -> Result<()> {
    let events = EventStore::new(store).context("failed to open event store")?;
    let event = events.load(&EventId(event_id.to_string()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&event)?);
        return Ok(());
    }

    println!("Event: {}", event.id);
    println!("  Agent:     {}", event.agent_id);
    println!("  Org:       {}", event.organization_id);
    println!("  Protocol:  {}", event.protocol.as_str());
    println!("  Type:      {}", event.verification_type.as_str());
    println!("  Status:    {}", event.status.as_str());
    println!("  Initiator: {}", event.initiator_type.as_str());
    println!("  Confidence: {:.2}", event.confidence);
    println!("  Started:   {}", micros_to_datetime(event.started_at));
    if let Some(completed_at) = event.completed_at {
        println!("  Completed: {}", micros_to_datetime(completed_at));
    }
    println!(
        "  Drift:     {}",
        if event.drift_detected { "DETECTED" } else { "none" }
    );
    if !event.mcp_server_drift.is_empty() {
        println!("  Undeclared servers:");
        for item in &event.mcp_server_drift {
            println!("    - {item}");
        }
    }
    if !event.capability_drift.is_empty() {
        println!("  Undeclared capabilities:");
        for item in &event.capability_drift {
            println!("    - {item}");
        }
    }

    Ok(())
}

/// `atrust event list [--agent ID] [--limit N] [--json]`
fn cmd_event_list(store: &Path, agent_filter: Option<&str>, limit: usize, json: bool) -> Result<()> {
    let events = EventStore::new(store).context("failed to open event store")?;
    let ids = events.list().context("failed to list events")?;

    let mut records = Vec::new();
    for id in &ids {
        let event = events.load(id)?;
        if let Some(agent) = agent_filter {
            if event.agent_id.0 != agent {
                continue;
            }
        }
        records.push(event);
    }
    records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    let total = records.len();
    records.truncate(limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!("Events ({} shown, {} total):", records.len(), total);
    if records.is_empty() {
        println!("  (none)");
        return Ok(());
    }

    println!(
        "  {:<28} {:<10} {:<9} {:<6} STARTED",
        "ID", "TYPE", "STATUS", "DRIFT"
    );
    println!("  {}", "-".repeat(84));
    for event in &records {
        println!(
            "  {:<28} {:<10} {:<9} {:<6} {}",
            event.id,
            event.verification_type.as_str(),
            event.status.as_str(),
            if event.drift_detected { "yes" } else { "no" },
            micros_to_datetime(event.started_at)
        );
    }

    Ok(())
}

// ── Score commands ────────────────────────────────────────────────────────────

/// `atrust score show AGENT_ID [--json]`
fn cmd_score_show(store: &Path, agent_id: &str, json: bool) -> Result<()> {
    let agents = AgentStore::new(store).context("failed to open agent store")?;
    let agent = agents.load(&AgentId(agent_id.to_string()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&agent.trust_score)?);
        return Ok(());
    }

    match agent.trust_score {
        Some(score) => {
            println!("Trust score for {}", agent.id);
            println!("  Value:      {:.3}", score.value);
            println!("  Confidence: {:.2}", score.confidence);
            println!("  Calculated: {}", micros_to_datetime(score.calculated_at));
        }
        None => {
            println!("Agent {} has no trust score yet.", agent.id);
            println!("  Run `atrust event record --agent {}` to calculate one.", agent.id);
        }
    }

    Ok(())
}

/// `atrust score history AGENT_ID [--limit N] [--json]`
fn cmd_score_history(store: &Path, agent_id: &str, limit: usize, json: bool) -> Result<()> {
    let history = HistoryStore::new(store).context("failed to open history store")?;
    let id = AgentId(agent_id.to_string());

    let entries = history.list_for_agent(&id)?;
    let total = entries.len();
    // Oldest-first on disk; display newest first.
    let shown: Vec<&TrustScoreHistoryEntry> = entries.iter().rev().take(limit).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!("Score history for {} ({} shown, {} total):", id, shown.len(), total);
    if shown.is_empty() {
        println!("  (none)");
        return Ok(());
    }

    println!("  {:<25} {:<8} {:<8} REASON", "RECORDED", "SCORE", "PREV");
    println!("  {}", "-".repeat(80));
    for entry in &shown {
        println!(
            "  {:<25} {:<8.3} {:<8} {}",
            micros_to_datetime(entry.recorded_at),
            entry.score,
            entry
                .previous_score
                .map(|s| format!("{s:.3}"))
                .unwrap_or_else(|| "-".to_string()),
            entry.change_reason
        );
    }

    Ok(())
}

// ── Credential commands ───────────────────────────────────────────────────────

/// `atrust credential issue --agent ID --device DEVICE [--json]`
fn cmd_credential_issue(store: &Path, agent_id: &str, device: &str, json: bool) -> Result<()> {
    let agents = AgentStore::new(store).context("failed to open agent store")?;
    let id = AgentId(agent_id.to_string());
    if !agents.exists(&id) {
        return Err(anyhow!("agent '{}' is not registered", agent_id));
    }

    let service = CredentialService::new(store).context("failed to open credential store")?;
    let issued = service.issue(&id, device)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "credential": issued.credential,
                "token": issued.token,
            }))?
        );
        return Ok(());
    }

    println!("Credential issued");
    println!("  ID:      {}", issued.credential.id);
    println!("  Agent:   {}", issued.credential.agent_id);
    println!("  Device:  {}", issued.credential.device_identity);
    println!("  Expires: {}", micros_to_datetime(issued.credential.expires_at));
    println!();
    println!("  Token (shown once, store it now):");
    println!("    {}", issued.token);

    Ok(())
}

/// `atrust credential refresh TOKEN [--json]`
fn cmd_credential_refresh(store: &Path, token: &str, json: bool) -> Result<()> {
    let service = CredentialService::new(store).context("failed to open credential store")?;
    let outcome = service.refresh(token)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.response)?);
        return Ok(());
    }

    println!("Credential refreshed");
    println!("  New ID:    {}", outcome.credential.id);
    println!("  Rotation:  {}", outcome.credential.rotation_count);
    println!("  Expires:   {}", micros_to_datetime(outcome.credential.expires_at));
    println!("  Token type: {} (access expires in {}s)", outcome.response.token_type, outcome.response.expires_in);
    println!();
    println!("  Access credential:");
    println!("    {}", outcome.response.access_credential);
    println!("  Refresh credential (shown once, store it now):");
    println!("    {}", outcome.response.refresh_credential);

    Ok(())
}

/// `atrust credential revoke CREDENTIAL_ID [--reason REASON] [--cascade]`
fn cmd_credential_revoke(
    store: &Path,
    credential_id: &str,
    reason_str: Option<&str>,
    cascade: bool,
) -> Result<()> {
    let service = CredentialService::new(store).context("failed to open credential store")?;
    let reason = parse_revocation_reason(reason_str.unwrap_or("manual_revocation"));

    let revoked = service.revoke(&CredentialId(credential_id.to_string()), reason, cascade)?;

    println!("Revoked {} credential(s)", revoked.len());
    for id in &revoked {
        println!("  - {id}");
    }

    Ok(())
}

/// `atrust credential lineage CREDENTIAL_ID [--json]`
fn cmd_credential_lineage(store: &Path, credential_id: &str, json: bool) -> Result<()> {
    let service = CredentialService::new(store).context("failed to open credential store")?;
    let lineage = service.lineage(&CredentialId(credential_id.to_string()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "ancestry": lineage.ancestry,
                "descendants": lineage.descendants,
            }))?
        );
        return Ok(());
    }

    println!("Ancestry (root first):");
    for (depth, credential) in lineage.ancestry.iter().enumerate() {
        let marker = if credential.revoked { " [REVOKED]" } else { "" };
        println!(
            "  {}{} (rotation {}){}",
            "  ".repeat(depth),
            credential.id,
            credential.rotation_count,
            marker
        );
    }

    println!("Descendants ({}):", lineage.descendants.len());
    if lineage.descendants.is_empty() {
        println!("  (none)");
    } else {
        for credential in &lineage.descendants {
            let marker = if credential.revoked { " [REVOKED]" } else { "" };
            let parent = credential
                .parent_id
                .as_ref()
                .map(|p| p.0.as_str())
                .unwrap_or("-");
            println!(
                "  {} (rotation {}, from {}){}",
                credential.id, credential.rotation_count, parent, marker
            );
        }
    }

    Ok(())
}

// ── Parsing helpers ───────────────────────────────────────────────────────────

fn parse_rotation_reason(s: &str) -> RotationReason {
    match s.to_lowercase().as_str() {
        "scheduled" => RotationReason::Scheduled,
        "compromised" => RotationReason::Compromised,
        "device_lost" | "devicelost" => RotationReason::DeviceLost,
        "policy_required" | "policyrequired" => RotationReason::PolicyRequired,
        _ => RotationReason::Manual,
    }
}

fn parse_revocation_reason(s: &str) -> RevocationReason {
    match s.to_lowercase().as_str() {
        "compromised" => RevocationReason::Compromised,
        "policy_violation" | "policyviolation" => RevocationReason::PolicyViolation,
        _ => RevocationReason::ManualRevocation,
    }
}

fn parse_protocol(s: &str) -> Result<Protocol> {
    match s.to_lowercase().as_str() {
        "mcp" => Ok(Protocol::Mcp),
        "a2a" => Ok(Protocol::A2a),
        other => Err(anyhow!("unknown protocol: '{}'. Use: mcp, a2a", other)),
    }
}

fn parse_verification_type(s: &str) -> Result<VerificationType> {
    match s.to_lowercase().as_str() {
        "identity" => Ok(VerificationType::Identity),
        "capability" => Ok(VerificationType::Capability),
        "behavior" => Ok(VerificationType::Behavior),
        other => Err(anyhow!(
            "unknown verification type: '{}'. Use: identity, capability, behavior",
            other
        )),
    }
}

fn parse_initiator_type(s: &str) -> Result<InitiatorType> {
    match s.to_lowercase().as_str() {
        "system" => Ok(InitiatorType::System),
        "user" => Ok(InitiatorType::User),
        "agent" => Ok(InitiatorType::Agent),
        other => Err(anyhow!(
            "unknown initiator type: '{}'. Use: system, user, agent",
            other
        )),
    }
}

fn parse_outcome(s: &str) -> Result<EventStatus> {
    match s.to_lowercase().as_str() {
        "success" => Ok(EventStatus::Success),
        "failure" => Ok(EventStatus::Failure),
        other => Err(anyhow!(
            "unknown outcome: '{}'. Use: success, failure",
            other
        )),
    }
}
