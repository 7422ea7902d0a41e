use alloy::primitives::keccak256;
use alloy::primitives::B256;
use xsp_messages::types::Signal;

/// Storage slot the signal service writes the signal's status to.
///
/// The sender's 20 bytes and the message hash's 32 bytes are hashed tightly packed; the result
/// is used as the slot directly, not as a mapping key.
pub fn derive_key(signal: &Signal) -> B256 {
    let mut packed = [0u8; 52];
    packed[..20].copy_from_slice(signal.sender.as_slice());
    packed[20..].copy_from_slice(signal.msg_hash.as_slice());
    keccak256(packed)
}
