//! Learning: state encoding, policy agents, reward shaping, table persistence

pub mod agent;
pub mod encoder;
pub mod persistence;
pub mod reward;

pub use agent::{PolicyAgent, QTable, TableSnapshot};
pub use encoder::{encode, EncodedState, StateKey};
pub use persistence::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use reward::{Reward, RewardReason};
