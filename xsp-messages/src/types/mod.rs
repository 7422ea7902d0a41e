use std::fmt::Display;
use std::fmt::Formatter;

use alloy_primitives::Address;
use alloy_primitives::Bytes;
use alloy_primitives::B256;
use alloy_primitives::U256;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use thiserror::Error;

pub mod abi;
pub mod block;
pub mod proof;
pub mod request;

/// A cross-chain message as seen by the signal service: who sent it and the hash of the
/// message body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Signal {
    pub sender: Address,
    pub msg_hash: B256,
}

impl Signal {
    pub fn new(
        sender: Address,
        msg_hash: B256,
    ) -> Self {
        Self { sender, msg_hash }
    }
}

/// The value a storage slot must hold before a proof over it is worth producing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SlotStatus {
    /// The signal service recorded the signal as sent.
    Sent,

    /// The destination bridge marked the message as failed, so it can be released on its
    /// origin.
    Failed,
}

impl SlotStatus {
    pub fn value(&self) -> U256 {
        match self {
            SlotStatus::Sent => U256::from(1u8),
            SlotStatus::Failed => U256::from(3u8),
        }
    }
}

impl Display for SlotStatus {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            SlotStatus::Sent => write!(f, "sent({:#x})", self.value()),
            SlotStatus::Failed => write!(f, "failed({:#x})", self.value()),
        }
    }
}

/// A raw RPC payload that does not have the shape a conformant node returns.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("logs bloom must be 256 bytes, got {0}")]
    BloomLength(usize),

    #[error("field `{field}` does not fit in {bits} bits: {value}")]
    Overflow {
        field: &'static str,
        bits: u32,
        value: U256,
    },

    #[error("invalid quantity `{0}`")]
    Quantity(String),

    #[error("node returned block {got} when asked for {requested}")]
    HashMismatch { requested: B256, got: B256 },

    #[error("expected exactly one storage proof, got {0}")]
    StorageProofCount(usize),

    #[error("malformed proof bytes: {0}")]
    Decode(String),
}

/// Prints the number of nodes and their total size instead of the node bytes.
#[allow(clippy::ptr_arg)]
pub fn nodes_pretty(nodes: &Vec<Bytes>) -> String {
    let size: usize = nodes.iter().map(|n| n.len()).sum();
    format!("{} nodes / {size} bytes", nodes.len())
}
