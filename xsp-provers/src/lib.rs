pub mod client;
pub mod encoder;
pub mod error;
pub mod header_sync;
pub mod key;
pub mod prover;
pub mod retry;
pub mod storage_proof;


pub use error::ProverError;
pub use prover::Prover;
