//! Configuration and history records exchanged with the builder UI.
//!
//! Field names follow the JSON the front-end reads and writes (snake_case),
//! so every type here round-trips through `serde_json` unchanged.

mod agent;
mod flow;
mod groupchat;
mod llm;
mod session;
mod skill;
pub mod wire;

pub use agent::*;
pub use flow::*;
pub use groupchat::*;
pub use llm::*;
pub use session::*;
pub use skill::*;
pub use wire::Timestamp;
