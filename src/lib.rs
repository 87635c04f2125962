//! Intent solver library
//!
//! Maintains a pool of unsolved intents announced by a transaction node,
//! searches for subsets whose want/give profiles are mutually satisfiable,
//! composes and verifies them through the node, and submits successful
//! compositions to the node's mempool.

pub mod config;
pub mod feed;
pub mod intent;
pub mod node_client;
pub mod pool;
pub mod search;
pub mod service;

// Re-export public types for convenience
pub use config::{SearchConfig, ServiceConfig, SolverConfig};
pub use feed::{EventFeed, NodeEvent};
pub use intent::{ActionData, Intent, ResourceKind, ResourceProfile};
pub use node_client::{ComposeOutcome, CompositionApi, NodeAck, NodeClient, ProgramOutput};
pub use pool::PendingPool;
pub use search::{candidate_subsets, profiles_match, SearchStrategy};
pub use service::solver::Solver;
