pub mod routing;
pub mod types;

pub type BlockNr = u64;
pub type ChainId = u64;
pub type ProofBytes = alloy_primitives::Bytes;
