//! Classic Stellar transaction assembly
//!
//! The bridge builds two kinds of transactions: a single payment to the
//! deposit address the payment API hands out, and a change-trust that opens
//! a trustline for a bridge asset. Both are returned as unsigned envelopes;
//! signing happens in the wallet (see [`crate::TransactionSigner`]).

use bon::Builder;
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    ChangeTrustOp, DecoratedSignature, Limits, Memo, Operation, OperationBody, PaymentOp,
    Preconditions, ReadXdr, SequenceNumber, TimeBounds, TimePoint, Transaction,
    TransactionEnvelope, TransactionExt, TransactionSignaturePayload,
    TransactionSignaturePayloadTaggedTransaction, TransactionV1Envelope, VecM, WriteXdr,
};

use super::{StellarAddress, StellarAsset, StellarMemo, StellarNetwork, Stroops};
use crate::error::{BridgeError, Result};

/// Base fee per operation, in stroops.
pub const BASE_FEE: u32 = 100;

/// Validity window for payment transactions.
pub const PAYMENT_TIMEOUT_SECS: u64 = 30;

/// Validity window for change-trust transactions.
pub const CHANGE_TRUST_TIMEOUT_SECS: u64 = 300;

/// Largest trustline limit the ledger accepts.
pub const MAX_TRUST_LIMIT: Stroops = Stroops::new(i64::MAX);

/// A single-operation payment
///
/// `sequence` is the source account's current sequence number as reported by
/// Horizon; the built transaction uses the next one.
///
/// ```rust
/// use rozo_bridge::stellar::{PaymentTransaction, StellarAddress, StellarAsset, StellarMemo, Stroops};
///
/// let source: StellarAddress = "GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN".parse()?;
/// let tx = PaymentTransaction::builder()
///     .source(source)
///     .sequence(41)
///     .destination(source)
///     .asset(StellarAsset::usdc())
///     .amount(Stroops::parse("10.50")?)
///     .memo(StellarMemo::text("order-7")?)
///     .now_unix(1_700_000_000)
///     .build()
///     .into_unsigned()?;
///
/// assert_eq!(tx.sequence(), 42);
/// let xdr = tx.to_envelope_xdr()?;
/// assert!(!xdr.is_empty());
/// # Ok::<(), rozo_bridge::BridgeError>(())
/// ```
#[derive(Builder, Debug, Clone)]
pub struct PaymentTransaction {
    source: StellarAddress,
    sequence: i64,
    destination: StellarAddress,
    asset: StellarAsset,
    amount: Stroops,
    #[builder(default)]
    memo: StellarMemo,
    #[builder(default = BASE_FEE)]
    fee: u32,
    #[builder(default = PAYMENT_TIMEOUT_SECS)]
    timeout_secs: u64,
    /// Wall clock used for the upper time bound
    now_unix: u64,
}

impl PaymentTransaction {
    pub fn into_unsigned(self) -> Result<UnsignedTransaction> {
        if !self.amount.is_positive() {
            return Err(BridgeError::InvalidAmount {
                reason: format!("payment amount must be positive, got {}", self.amount),
            });
        }

        let operation = Operation {
            source_account: None,
            body: OperationBody::Payment(PaymentOp {
                destination: self.destination.to_muxed_account(),
                asset: self.asset.to_xdr_asset(),
                amount: self.amount.as_i64(),
            }),
        };

        UnsignedTransaction::assemble(
            &self.source,
            self.sequence,
            self.fee,
            self.now_unix,
            self.timeout_secs,
            self.memo.to_xdr()?,
            operation,
        )
    }
}

/// A change-trust operation opening (or resizing) a trustline
#[derive(Builder, Debug, Clone)]
pub struct ChangeTrustTransaction {
    source: StellarAddress,
    sequence: i64,
    asset: StellarAsset,
    #[builder(default = MAX_TRUST_LIMIT)]
    limit: Stroops,
    #[builder(default = BASE_FEE)]
    fee: u32,
    #[builder(default = CHANGE_TRUST_TIMEOUT_SECS)]
    timeout_secs: u64,
    now_unix: u64,
}

impl ChangeTrustTransaction {
    pub fn into_unsigned(self) -> Result<UnsignedTransaction> {
        let operation = Operation {
            source_account: None,
            body: OperationBody::ChangeTrust(ChangeTrustOp {
                line: self.asset.to_change_trust_asset(),
                limit: self.limit.as_i64(),
            }),
        };

        UnsignedTransaction::assemble(
            &self.source,
            self.sequence,
            self.fee,
            self.now_unix,
            self.timeout_secs,
            Memo::None,
            operation,
        )
    }
}

/// A transaction ready to hand to a signer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    tx: Transaction,
}

impl UnsignedTransaction {
    fn assemble(
        source: &StellarAddress,
        current_sequence: i64,
        fee: u32,
        now_unix: u64,
        timeout_secs: u64,
        memo: Memo,
        operation: Operation,
    ) -> Result<Self> {
        let seq_num = current_sequence
            .checked_add(1)
            .ok_or_else(|| BridgeError::SigningFailed {
                reason: "account sequence number exhausted".to_string(),
            })?;

        let operations: VecM<Operation, 100> = vec![operation].try_into()?;

        Ok(Self {
            tx: Transaction {
                source_account: source.to_muxed_account(),
                fee,
                seq_num: SequenceNumber(seq_num),
                cond: Preconditions::Time(TimeBounds {
                    min_time: TimePoint(0),
                    max_time: TimePoint(now_unix.saturating_add(timeout_secs)),
                }),
                memo,
                operations,
                ext: TransactionExt::V0,
            },
        })
    }

    pub fn sequence(&self) -> i64 {
        self.tx.seq_num.0
    }

    pub fn fee(&self) -> u32 {
        self.tx.fee
    }

    pub fn max_time(&self) -> u64 {
        match &self.tx.cond {
            Preconditions::Time(bounds) => bounds.max_time.0,
            _ => 0,
        }
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    /// Hash that signers sign and Horizon reports as the transaction id.
    pub fn hash(&self, network: StellarNetwork) -> Result<[u8; 32]> {
        signature_payload_hash(&self.tx, network)
    }

    pub fn into_envelope(self) -> TransactionEnvelope {
        TransactionEnvelope::Tx(TransactionV1Envelope {
            tx: self.tx,
            signatures: VecM::default(),
        })
    }

    /// Base64 XDR of the unsigned envelope, the format wallets accept.
    pub fn to_envelope_xdr(&self) -> Result<String> {
        Ok(self
            .clone()
            .into_envelope()
            .to_xdr_base64(Limits::none())?)
    }
}

/// SHA-256 over the network id and the tagged transaction.
pub fn signature_payload_hash(tx: &Transaction, network: StellarNetwork) -> Result<[u8; 32]> {
    let payload = TransactionSignaturePayload {
        network_id: network.network_id(),
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    let bytes = payload.to_xdr(Limits::none())?;
    Ok(Sha256::digest(bytes).into())
}

pub fn decode_envelope(xdr: &str) -> Result<TransactionEnvelope> {
    Ok(TransactionEnvelope::from_xdr_base64(xdr.trim(), Limits::none())?)
}

pub fn encode_envelope(envelope: &TransactionEnvelope) -> Result<String> {
    Ok(envelope.to_xdr_base64(Limits::none())?)
}

/// Hex transaction hash of a v1 envelope.
pub fn envelope_hash(envelope: &TransactionEnvelope, network: StellarNetwork) -> Result<String> {
    match envelope {
        TransactionEnvelope::Tx(v1) => Ok(alloy_primitives::hex::encode(signature_payload_hash(
            &v1.tx, network,
        )?)),
        _ => Err(BridgeError::SigningFailed {
            reason: "only v1 transaction envelopes are supported".to_string(),
        }),
    }
}

/// Appends a signature to a v1 envelope.
pub fn attach_signature(
    envelope: TransactionEnvelope,
    signature: DecoratedSignature,
) -> Result<TransactionEnvelope> {
    match envelope {
        TransactionEnvelope::Tx(mut v1) => {
            let mut signatures = v1.signatures.to_vec();
            signatures.push(signature);
            v1.signatures = signatures.try_into()?;
            Ok(TransactionEnvelope::Tx(v1))
        }
        _ => Err(BridgeError::SigningFailed {
            reason: "only v1 transaction envelopes are supported".to_string(),
        }),
    }
}

/// Number of signatures on an envelope.
pub fn signature_count(envelope: &TransactionEnvelope) -> usize {
    match envelope {
        TransactionEnvelope::TxV0(v0) => v0.signatures.len(),
        TransactionEnvelope::Tx(v1) => v1.signatures.len(),
        TransactionEnvelope::TxFeeBump(bump) => bump.signatures.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stellar_xdr::curr::Asset;

    const SOURCE: &str = "GA5ZSEJYB37JRC5AVCIA5MOP4RHTM335X2KGX3IHOJAPP5RE34K4KZVN";
    const DESTINATION: &str = "GDHU6WRG4IEQXM5NZ4BMPKOXHW76MZM4Y2IEMFDVXBSDP6SJY4ITNPP2";

    fn payment(amount: &str) -> PaymentTransaction {
        PaymentTransaction::builder()
            .source(SOURCE.parse().unwrap())
            .sequence(100)
            .destination(DESTINATION.parse().unwrap())
            .asset(StellarAsset::usdc())
            .amount(Stroops::parse(amount).unwrap())
            .memo(StellarMemo::text("rozo-memo").unwrap())
            .now_unix(1_700_000_000)
            .build()
    }

    #[test]
    fn test_payment_fields() {
        let unsigned = payment("12.5").into_unsigned().unwrap();
        assert_eq!(unsigned.sequence(), 101);
        assert_eq!(unsigned.fee(), BASE_FEE);
        assert_eq!(unsigned.max_time(), 1_700_000_000 + PAYMENT_TIMEOUT_SECS);

        let tx = unsigned.transaction();
        assert!(matches!(tx.memo, Memo::Text(_)));
        assert_eq!(tx.operations.len(), 1);
        match &tx.operations[0].body {
            OperationBody::Payment(op) => {
                assert_eq!(op.amount, 125_000_000);
                assert!(matches!(op.asset, Asset::CreditAlphanum4(_)));
            }
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn test_zero_amount_rejected() {
        assert!(matches!(
            payment("0").into_unsigned(),
            Err(BridgeError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_envelope_xdr_decodes_back() {
        let unsigned = payment("1").into_unsigned().unwrap();
        let xdr = unsigned.to_envelope_xdr().unwrap();
        let decoded = decode_envelope(&xdr).unwrap();
        assert_eq!(signature_count(&decoded), 0);
        assert_eq!(decoded, unsigned.clone().into_envelope());
    }

    #[test]
    fn test_hash_depends_on_network() {
        let unsigned = payment("1").into_unsigned().unwrap();
        let public = unsigned.hash(StellarNetwork::Public).unwrap();
        let testnet = unsigned.hash(StellarNetwork::Testnet).unwrap();
        assert_ne!(public, testnet);

        let envelope = unsigned.into_envelope();
        assert_eq!(
            envelope_hash(&envelope, StellarNetwork::Public).unwrap(),
            alloy_primitives::hex::encode(public)
        );
    }

    #[test]
    fn test_change_trust_defaults() {
        let unsigned = ChangeTrustTransaction::builder()
            .source(SOURCE.parse().unwrap())
            .sequence(7)
            .asset(StellarAsset::eurc())
            .now_unix(1_000)
            .build()
            .into_unsigned()
            .unwrap();

        assert_eq!(unsigned.sequence(), 8);
        assert_eq!(unsigned.max_time(), 1_000 + CHANGE_TRUST_TIMEOUT_SECS);
        assert_eq!(unsigned.transaction().memo, Memo::None);
        match &unsigned.transaction().operations[0].body {
            OperationBody::ChangeTrust(op) => assert_eq!(op.limit, i64::MAX),
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn test_sequence_overflow() {
        let result = ChangeTrustTransaction::builder()
            .source(SOURCE.parse().unwrap())
            .sequence(i64::MAX)
            .asset(StellarAsset::usdc())
            .now_unix(0)
            .build()
            .into_unsigned();
        assert!(result.is_err());
    }
}
