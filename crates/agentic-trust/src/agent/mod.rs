//! Agent records — identity, declared envelope, and key rotation.
//!
//! An agent's id derives from the public key it registered with and stays
//! stable across key rotations. The record carries the declared operating
//! envelope (which MCP servers it talks to, which capabilities it claims)
//! that drift detection checks observed behavior against.

pub mod record;

pub use record::{AgentId, AgentRecord, KeyRotation, RotationReason};
