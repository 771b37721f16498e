//! The agent engine.
//!
//! An agent owns one conversation. Each **step**:
//!
//! 1. **Appends** the pending input (if any) to the agent's history
//! 2. **Builds context** (system prompt + the most recent messages)
//! 3. **Sends to LLM** via the configured provider
//! 4. **Appends** the reply and returns it
//!
//! Steps and appends on the same agent never overlap.

pub mod engine;

pub use engine::{Agent, AgentEngine, StepOutcome};
