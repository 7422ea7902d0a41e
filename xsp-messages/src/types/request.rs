use std::fmt::Display;
use std::fmt::Formatter;

use alloy_primitives::Bytes;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::types::Signal;
use crate::types::SlotStatus;
use crate::BlockNr;
use crate::ChainId;

/// Which side of a bridged message the proof is built for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    /// Prove on the destination chain that the source chain sent the signal.
    Claim,

    /// Prove on the source chain that the message failed on the destination chain.
    Release,
}

impl Flow {
    pub fn expected_status(&self) -> SlotStatus {
        match self {
            Flow::Claim => SlotStatus::Sent,
            Flow::Release => SlotStatus::Failed,
        }
    }
}

impl Display for Flow {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Flow::Claim => write!(f, "claim"),
            Flow::Release => write!(f, "release"),
        }
    }
}

#[derive(Clone, PartialEq, Deserialize, Serialize)]
pub struct ProofRequest {
    /// Chosen by the caller and echoed back in the reply.
    pub request_id: String,

    pub flow: Flow,

    pub signal: Signal,

    /// Chain the message was sent from.
    pub src_chain_id: ChainId,

    /// Chain the message was sent to.
    pub dest_chain_id: ChainId,

    /// Block the message was sent in, if known. A synced header older than this block cannot
    /// prove the signal yet.
    #[serde(default)]
    pub sent_in_block: Option<BlockNr>,
}

impl std::fmt::Debug for ProofRequest {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "REQ<{}, {}, {}->{}>",
            self.request_id, self.flow, self.src_chain_id, self.dest_chain_id
        )
    }
}

/// How a caller should react to a failed request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryClass {
    /// The other chain has not caught up yet; ask again later.
    RetryLater,

    /// The message is not in the expected state; re-check its status first.
    DoNotRetry,

    /// Transient transport failure.
    RetryWithBackoff,

    /// A node sent something that cannot be encoded.
    Bug,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    HeaderNotFound,
    InvalidProof,
    Rpc,
    Timeout,
    Encoding,
}

impl ErrorKind {
    pub fn retry_class(&self) -> RetryClass {
        match self {
            ErrorKind::HeaderNotFound => RetryClass::RetryLater,
            ErrorKind::InvalidProof => RetryClass::DoNotRetry,
            ErrorKind::Rpc | ErrorKind::Timeout => RetryClass::RetryWithBackoff,
            ErrorKind::Encoding => RetryClass::Bug,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::HeaderNotFound => "header_not_found",
            ErrorKind::InvalidProof => "invalid_proof",
            ErrorKind::Rpc => "rpc",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Encoding => "encoding",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReplyError {
    pub kind: ErrorKind,
    pub retry: RetryClass,
    pub message: String,
}

#[derive(Clone, PartialEq, Deserialize, Serialize)]
pub struct ProofReply {
    pub request_id: String,

    #[serde(flatten)]
    outcome: Outcome,
}

#[derive(Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    Proof(Bytes),
    Error(ReplyError),
}

impl std::fmt::Debug for ProofReply {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match &self.outcome {
            Outcome::Proof(proof) => write!(f, "REPLY<{}, {} bytes>", self.request_id, proof.len()),
            Outcome::Error(err) => write!(f, "REPLY<{}, {:?}>", self.request_id, err.kind),
        }
    }
}

impl ProofReply {
    pub fn success(
        request_id: String,
        proof: Bytes,
    ) -> Self {
        Self {
            request_id,
            outcome: Outcome::Proof(proof),
        }
    }

    pub fn failure(
        request_id: String,
        kind: ErrorKind,
        message: String,
    ) -> Self {
        Self {
            request_id,
            outcome: Outcome::Error(ReplyError {
                kind,
                retry: kind.retry_class(),
                message,
            }),
        }
    }

    /// Flatten the reply into either the proof bytes or the error.
    pub fn inner(&self) -> Result<&Bytes, &ReplyError> {
        match &self.outcome {
            Outcome::Proof(proof) => Ok(proof),
            Outcome::Error(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod test {
    use alloy_primitives::Address;
    use alloy_primitives::B256;

    use super::*;

    #[test]
    fn test_request_json() {
        let request: ProofRequest = serde_json::from_str(
            r#"{
                "request_id": "r-1",
                "flow": "release",
                "signal": {
                    "sender": "0x0000000000000000000000000000000000000001",
                    "msg_hash": "0x0000000000000000000000000000000000000000000000000000000000000002"
                },
                "src_chain_id": 167000,
                "dest_chain_id": 1
            }"#,
        )
        .unwrap();

        assert_eq!(request.flow, Flow::Release);
        assert_eq!(request.signal.sender, Address::with_last_byte(1));
        assert_eq!(request.signal.msg_hash, B256::with_last_byte(2));
        assert_eq!(request.sent_in_block, None);
        assert_eq!(format!("{request:?}"), "REQ<r-1, release, 167000->1>");
    }

    #[test]
    fn test_reply_flatten() {
        let ok = ProofReply::success("a".into(), Bytes::from(vec![1, 2]));
        assert_eq!(ok.inner().unwrap().len(), 2);

        let err = ProofReply::failure("b".into(), ErrorKind::Timeout, "slow node".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"]["kind"], "timeout");
        assert_eq!(json["error"]["retry"], "retry_with_backoff");

        let err = err.inner().unwrap_err();
        assert_eq!(err.retry, RetryClass::RetryWithBackoff);
    }

    #[test]
    fn test_flow_status() {
        assert_eq!(Flow::Claim.expected_status(), SlotStatus::Sent);
        assert_eq!(Flow::Release.expected_status(), SlotStatus::Failed);
    }
}
