use std::str::FromStr;

use alloy_primitives::Address;
use alloy_primitives::Bytes;
use alloy_primitives::B256;
use alloy_primitives::U256;
use serde_derive::Deserialize;

use crate::types::abi::BlockHeader;
use crate::types::FormatError;

/// Size of an Ethereum logs bloom filter.
pub const LOGS_BLOOM_BYTES: usize = 256;

/// Number of `bytes32` words the bloom filter occupies in [`BlockHeader`].
pub const LOGS_BLOOM_WORDS: usize = LOGS_BLOOM_BYTES / 32;

/// A JSON-RPC numeric field.
///
/// Nodes send quantities as `0x`-prefixed hex strings; some test nodes and older tooling send
/// decimal strings or bare JSON numbers, which are accepted as well.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "QuantityRepr")]
pub struct Quantity(U256);

#[derive(Deserialize)]
#[serde(untagged)]
enum QuantityRepr {
    Text(String),
    Number(u64),
}

impl TryFrom<QuantityRepr> for Quantity {
    type Error = FormatError;

    fn try_from(repr: QuantityRepr) -> Result<Self, Self::Error> {
        match repr {
            QuantityRepr::Text(text) => text.parse(),
            QuantityRepr::Number(n) => Ok(Quantity(U256::from(n))),
        }
    }
}

impl FromStr for Quantity {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        U256::from_str(s.trim())
            .map(Quantity)
            .map_err(|_| FormatError::Quantity(s.to_owned()))
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Quantity(U256::from(value))
    }
}

impl Quantity {
    pub fn value(&self) -> U256 {
        self.0
    }

    fn as_u64(
        &self,
        field: &'static str,
    ) -> Result<u64, FormatError> {
        u64::try_from(self.0).map_err(|_| {
            FormatError::Overflow {
                field,
                bits: 64,
                value: self.0,
            }
        })
    }

    fn as_u128(
        &self,
        field: &'static str,
    ) -> Result<u128, FormatError> {
        u128::try_from(self.0).map_err(|_| {
            FormatError::Overflow {
                field,
                bits: 128,
                value: self.0,
            }
        })
    }
}

/// The subset of an `eth_getBlockByHash` response the header encoding needs.
///
/// Every field a pre-London block also carries is required; only `baseFeePerGas` and
/// `withdrawalsRoot` may be missing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    pub hash: B256,
    pub parent_hash: B256,
    pub sha3_uncles: B256,
    pub miner: Address,
    pub state_root: B256,
    pub transactions_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: Bytes,
    pub difficulty: Quantity,
    pub number: Quantity,
    pub gas_limit: Quantity,
    pub gas_used: Quantity,
    pub timestamp: Quantity,
    pub extra_data: Bytes,
    pub mix_hash: B256,
    pub nonce: Quantity,
    #[serde(default)]
    pub base_fee_per_gas: Option<Quantity>,
    #[serde(default)]
    pub withdrawals_root: Option<B256>,
}

impl RawBlock {
    /// Fails unless the node answered with the block that was asked for.
    pub fn ensure_hash(
        &self,
        requested: B256,
    ) -> Result<(), FormatError> {
        if self.hash != requested {
            return Err(FormatError::HashMismatch {
                requested,
                got: self.hash,
            });
        }
        Ok(())
    }
}

impl TryFrom<&RawBlock> for BlockHeader {
    type Error = FormatError;

    fn try_from(block: &RawBlock) -> Result<Self, Self::Error> {
        Ok(BlockHeader {
            parentHash: block.parent_hash,
            ommersHash: block.sha3_uncles,
            beneficiary: block.miner,
            stateRoot: block.state_root,
            transactionsRoot: block.transactions_root,
            receiptsRoot: block.receipts_root,
            logsBloom: bloom_words(&block.logs_bloom)?,
            difficulty: block.difficulty.value(),
            height: block.number.as_u128("number")?,
            gasLimit: block.gas_limit.as_u64("gasLimit")?,
            gasUsed: block.gas_used.as_u64("gasUsed")?,
            timestamp: block.timestamp.as_u64("timestamp")?,
            extraData: block.extra_data.clone(),
            mixHash: block.mix_hash,
            nonce: block.nonce.as_u64("nonce")?,
            baseFeePerGas: block
                .base_fee_per_gas
                .map(|fee| fee.value())
                .unwrap_or_default(),
            withdrawalsRoot: block.withdrawals_root.unwrap_or_default(),
        })
    }
}

/// Splits a 256-byte bloom filter into consecutive 32-byte words, keeping byte order.
pub fn bloom_words(bloom: &[u8]) -> Result<[B256; LOGS_BLOOM_WORDS], FormatError> {
    if bloom.len() != LOGS_BLOOM_BYTES {
        return Err(FormatError::BloomLength(bloom.len()));
    }

    let mut words = [B256::ZERO; LOGS_BLOOM_WORDS];
    for (word, chunk) in words.iter_mut().zip(bloom.chunks_exact(32)) {
        *word = B256::from_slice(chunk);
    }
    Ok(words)
}

#[cfg(test)]
mod test {
    use super::*;

    fn raw_block_json() -> serde_json::Value {
        serde_json::json!({
            "hash": "0x1c9f6a8b0e2d4c3f5a7b9d1e3f5a7c9e1b3d5f7a9c1e3b5d7f9a1c3e5b7d9f1a",
            "parentHash": "0xa7881266ca0a344c43cb24175d9dbd243b58d45d6ae6ad71310a273a3d1d3afb",
            "sha3Uncles": "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
            "miner": "0xea674fdde714fd979de3edf0f56aa9716b898ec8",
            "stateRoot": "0xc0dcf937b3f6136dd70a1ad11cc57b040fd410f3c49a5146f20c732895a3cc21",
            "transactionsRoot": "0x7273ade6b6ed865a9975ac281da23b90b141a8b607d874d2cd95e65e81336f8e",
            "receiptsRoot": "0x74bb61e381e9238a08b169580f3cbf9b8b79d7d5ee708d3e286103eb291dfd08",
            "logsBloom": format!("0x{}", (0..=255u8).map(|b| format!("{b:02x}")).collect::<String>()),
            "difficulty": "0x7b",
            "number": "0x1",
            "gasLimit": "0x7b",
            "gasUsed": "0x7b",
            "timestamp": "0x644a636f",
            "extraData": "0x65746865726d696e652d75732d7765737431",
            "mixHash": "0xf5ba25df1e92e89a09e0b32063b81795f631100801158f5fa733f2ba26843bd0",
            "nonce": "0x000000000000007b",
            "size": "0x220",
            "transactions": [],
            "uncles": []
        })
    }

    fn raw_block(json: serde_json::Value) -> RawBlock {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_quantity_forms() {
        assert_eq!("0x7b".parse::<Quantity>().unwrap(), Quantity::from(123));
        assert_eq!("123".parse::<Quantity>().unwrap(), Quantity::from(123));
        assert_eq!(
            serde_json::from_str::<Quantity>("123").unwrap(),
            Quantity::from(123)
        );
        assert_eq!(
            serde_json::from_str::<Quantity>("\"0x000000000000007b\"").unwrap(),
            Quantity::from(123)
        );
        assert!("0xzz".parse::<Quantity>().is_err());
    }

    #[test]
    fn test_header_fields() {
        let block = raw_block(raw_block_json());
        let header = BlockHeader::try_from(&block).unwrap();

        assert_eq!(header.parentHash, block.parent_hash);
        assert_eq!(header.ommersHash, block.sha3_uncles);
        assert_eq!(header.beneficiary, block.miner);
        assert_eq!(header.difficulty, U256::from(123));
        assert_eq!(header.height, 1);
        assert_eq!(header.gasLimit, 123);
        assert_eq!(header.gasUsed, 123);
        assert_eq!(header.timestamp, 1682596719);
        assert_eq!(header.nonce, 123);
        assert_eq!(&header.extraData[..], b"ethermine-us-west1");
    }

    #[test]
    fn test_pre_london_defaults() {
        let header = BlockHeader::try_from(&raw_block(raw_block_json())).unwrap();
        assert_eq!(header.baseFeePerGas, U256::ZERO);
        assert_eq!(header.withdrawalsRoot, B256::ZERO);

        let mut json = raw_block_json();
        json["baseFeePerGas"] = "1".into();
        json["withdrawalsRoot"] =
            "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421".into();
        let header = BlockHeader::try_from(&raw_block(json)).unwrap();
        assert_eq!(header.baseFeePerGas, U256::from(1));
        assert_ne!(header.withdrawalsRoot, B256::ZERO);
    }

    #[test]
    fn test_bloom_chunks_keep_order() {
        let block = raw_block(raw_block_json());
        let words = bloom_words(&block.logs_bloom).unwrap();

        assert_eq!(words.len(), 8);
        for (i, word) in words.iter().enumerate() {
            let expected: Vec<u8> = (i * 32..(i + 1) * 32).map(|b| b as u8).collect();
            assert_eq!(word.as_slice(), expected.as_slice(), "word {i}");
        }
    }

    #[test]
    fn test_bloom_wrong_length() {
        let mut json = raw_block_json();
        json["logsBloom"] = "0x00ff".into();
        assert_eq!(
            BlockHeader::try_from(&raw_block(json)),
            Err(FormatError::BloomLength(2))
        );
    }

    #[test]
    fn test_missing_required_field() {
        let mut json = raw_block_json();
        json.as_object_mut().unwrap().remove("mixHash");
        assert!(serde_json::from_value::<RawBlock>(json).is_err());
    }

    #[test]
    fn test_gas_limit_overflow() {
        let mut json = raw_block_json();
        json["gasLimit"] = "0x10000000000000000".into();
        assert!(matches!(
            BlockHeader::try_from(&raw_block(json)),
            Err(FormatError::Overflow {
                field: "gasLimit",
                bits: 64,
                ..
            })
        ));
    }

    #[test]
    fn test_ensure_hash() {
        let block = raw_block(raw_block_json());
        assert!(block.ensure_hash(block.hash).is_ok());
        assert!(matches!(
            block.ensure_hash(B256::ZERO),
            Err(FormatError::HashMismatch { .. })
        ));
    }
}
