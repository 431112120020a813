// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Local ed25519 signer for headless use.

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use std::fmt;
use stellar_strkey::Strkey;
use stellar_xdr::curr::{DecoratedSignature, Signature, SignatureHint, TransactionEnvelope};
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::stellar::{
    attach_signature, decode_envelope, encode_envelope, signature_payload_hash, StellarAddress,
    StellarNetwork,
};
use crate::traits::{TransactionSigner, WalletConnector};
use crate::wallet::ConnectorView;

/// Wallet id reported by [`KeypairSigner`] when used as a connector.
pub const KEYPAIR_WALLET_ID: &str = "keypair";

/// Signs transactions with an in-process secret key.
///
/// Acts as both the signer and the wallet connector, so scripts and services
/// can drive the same flows a browser wallet would.
///
/// ```rust
/// use rozo_bridge::providers::KeypairSigner;
///
/// let signer = KeypairSigner::from_bytes([7u8; 32]);
/// assert!(signer.address().to_string().starts_with('G'));
/// ```
#[derive(Clone)]
pub struct KeypairSigner {
    key: SigningKey,
}

impl KeypairSigner {
    /// Parses an `S...` secret seed.
    pub fn from_secret(secret: &str) -> Result<Self> {
        match Strkey::from_string(secret.trim()) {
            Ok(Strkey::PrivateKeyEd25519(key)) => Ok(Self::from_bytes(key.0)),
            _ => Err(BridgeError::InvalidConfig(
                "secret key must be an S... strkey".to_string(),
            )),
        }
    }

    pub fn from_bytes(seed: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn address(&self) -> StellarAddress {
        StellarAddress::Account(self.key.verifying_key().to_bytes())
    }

    /// Signs a decoded envelope, appending a decorated signature.
    pub fn sign_envelope(
        &self,
        envelope: TransactionEnvelope,
        network: StellarNetwork,
    ) -> Result<TransactionEnvelope> {
        let hash = match &envelope {
            TransactionEnvelope::Tx(v1) => signature_payload_hash(&v1.tx, network)?,
            _ => {
                return Err(BridgeError::SigningFailed {
                    reason: "only v1 transaction envelopes are supported".to_string(),
                })
            }
        };

        let public_key = self.key.verifying_key().to_bytes();
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&public_key[28..]);

        let signature = self.key.sign(&hash);
        let decorated = DecoratedSignature {
            hint: SignatureHint(hint),
            signature: Signature(signature.to_bytes().to_vec().try_into()?),
        };
        attach_signature(envelope, decorated)
    }
}

impl fmt::Debug for KeypairSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairSigner")
            .field("address", &self.address().to_string())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
    async fn sign_transaction(
        &self,
        envelope_xdr: &str,
        network: StellarNetwork,
    ) -> Result<String> {
        let envelope = decode_envelope(envelope_xdr)?;
        let signed = self.sign_envelope(envelope, network)?;
        debug!(address = %self.address(), network = %network, event = "transaction_signed");
        encode_envelope(&signed)
    }
}

#[async_trait]
impl WalletConnector for KeypairSigner {
    async fn connect(&self, _wallet_id: &str) -> Result<String> {
        Ok(self.address().to_string())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    async fn push_view(&self, _view: &ConnectorView) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stellar::{signature_count, PaymentTransaction, StellarAsset, Stroops};
    use ed25519_dalek::{Verifier, VerifyingKey};

    fn unsigned_xdr(signer: &KeypairSigner) -> String {
        PaymentTransaction::builder()
            .source(signer.address())
            .sequence(1)
            .destination(signer.address())
            .asset(StellarAsset::usdc())
            .amount(Stroops::parse("1").unwrap())
            .now_unix(1_700_000_000)
            .build()
            .into_unsigned()
            .unwrap()
            .to_envelope_xdr()
            .unwrap()
    }

    #[test]
    fn test_secret_round_trip() {
        let seed = [42u8; 32];
        let secret = Strkey::PrivateKeyEd25519(stellar_strkey::ed25519::PrivateKey(seed)).to_string();
        let signer = KeypairSigner::from_secret(&secret).unwrap();
        assert_eq!(signer.address(), KeypairSigner::from_bytes(seed).address());
    }

    #[test]
    fn test_public_key_is_not_a_secret() {
        let signer = KeypairSigner::from_bytes([1u8; 32]);
        assert!(KeypairSigner::from_secret(&signer.address().to_string()).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = KeypairSigner::from_bytes([3u8; 32]);
        let debug = format!("{signer:?}");
        assert!(debug.contains(&signer.address().to_string()));
        assert!(!debug.contains("key:"));
    }

    #[tokio::test]
    async fn test_signature_verifies_against_payload_hash() {
        let signer = KeypairSigner::from_bytes([9u8; 32]);
        let signed_xdr = signer
            .sign_transaction(&unsigned_xdr(&signer), StellarNetwork::Testnet)
            .await
            .unwrap();

        let envelope = decode_envelope(&signed_xdr).unwrap();
        assert_eq!(signature_count(&envelope), 1);

        let TransactionEnvelope::Tx(v1) = &envelope else {
            panic!("expected v1 envelope");
        };
        let hash = signature_payload_hash(&v1.tx, StellarNetwork::Testnet).unwrap();
        let decorated = &v1.signatures[0];
        let public_key = signer.address().public_key_bytes();
        assert_eq!(decorated.hint.0, public_key[28..]);

        let signature_bytes: [u8; 64] = decorated.signature.0.to_vec().try_into().unwrap();
        let signature = ed25519_dalek::Signature::from_bytes(&signature_bytes);
        VerifyingKey::from_bytes(&public_key)
            .unwrap()
            .verify(&hash, &signature)
            .unwrap();
    }

    #[tokio::test]
    async fn test_connector_reports_own_address() {
        let signer = KeypairSigner::from_bytes([5u8; 32]);
        let address = signer.connect(KEYPAIR_WALLET_ID).await.unwrap();
        assert_eq!(address, signer.address().to_string());
    }
}
