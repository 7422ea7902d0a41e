//! Solidity-side layouts shared with the verifying contracts.
//!
//! Field order and widths here are the wire format: the destination contract decodes the
//! proof with `abi.decode(proof, (SignalProof))`.
use alloy::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct BlockHeader {
        bytes32 parentHash;
        bytes32 ommersHash;
        address beneficiary;
        bytes32 stateRoot;
        bytes32 transactionsRoot;
        bytes32 receiptsRoot;
        bytes32[8] logsBloom;
        uint256 difficulty;
        uint128 height;
        uint64 gasLimit;
        uint64 gasUsed;
        uint64 timestamp;
        bytes extraData;
        bytes32 mixHash;
        uint64 nonce;
        uint256 baseFeePerGas;
        bytes32 withdrawalsRoot;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct SignalProof {
        BlockHeader header;
        bytes proof;
    }
}
