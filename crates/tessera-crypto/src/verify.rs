//! Signature verification for standard transactions

use crate::keys::{KeyError, PublicKey};
use crate::signature::verify_signature;
use tessera_types::{StdSignDoc, StdTx};
use thiserror::Error;

/// Errors that can occur during signature verification
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(#[from] KeyError),

    #[error("public key mismatch: expected {expected}, got {actual}")]
    PublicKeyMismatch { expected: String, actual: String },

    #[error("invalid sign doc: {0}")]
    InvalidSignDoc(String),

    #[error("expected {expected} signatures, got {actual}")]
    SignatureCount { expected: usize, actual: usize },

    #[error("signature verification failed for address: {0}")]
    SignatureVerificationFailed(String),
}

/// Check every signature of `tx` against its signer, in order
///
/// Each signature must come from the key behind the matching signer
/// address and cover the sign document rebuilt from the signature's own
/// account number and sequence.
pub fn verify_std_tx(tx: &StdTx, chain_id: &str) -> Result<(), VerificationError> {
    let signers = tx.get_signers();
    if signers.len() != tx.signatures.len() {
        return Err(VerificationError::SignatureCount {
            expected: signers.len(),
            actual: tx.signatures.len(),
        });
    }

    for (signer, sig) in signers.iter().zip(&tx.signatures) {
        let pubkey = PublicKey::from_encoded(&sig.pub_key)?;
        let derived = pubkey.to_address(signer.network());
        if derived != *signer {
            return Err(VerificationError::PublicKeyMismatch {
                expected: signer.to_string(),
                actual: derived.to_string(),
            });
        }

        let sign_bytes = StdSignDoc::new(
            chain_id,
            sig.account_number,
            sig.sequence,
            &tx.fee,
            &tx.msgs,
            &tx.memo,
        )
        .and_then(|doc| doc.to_bytes())
        .map_err(|e| VerificationError::InvalidSignDoc(e.to_string()))?;

        verify_signature(&pubkey, &sign_bytes, &sig.signature)
            .map_err(|_| VerificationError::SignatureVerificationFailed(signer.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::PrivateKey;
    use crate::signature::sign_message;
    use std::sync::Arc;
    use tessera_math::{Coin, Coins, Int};
    use tessera_types::msgs::bank::MsgSend;
    use tessera_types::{AccAddress, Msg, Network, StdFee, StdSignature};

    fn signed_tx(key: &PrivateKey, chain_id: &str) -> StdTx {
        let from = key.public_key().to_address(Network::Mainnet);
        let to = AccAddress::new(Network::Mainnet, [5; 20]);
        let coins = Coins::from(Coin::new("stake", Int::from_u64(1)).unwrap());
        let msgs: Vec<Arc<dyn Msg>> = vec![Arc::new(MsgSend::new(from, to, coins))];
        let fee = StdFee::new(Coins::empty(), 20000);

        let doc = StdSignDoc::new(chain_id, 3, 8, &fee, &msgs, "").unwrap();
        let signature = sign_message(key, &doc.to_bytes().unwrap()).unwrap();

        StdTx::new(
            msgs,
            fee,
            vec![StdSignature {
                pub_key: key.public_key().to_encoded(),
                signature,
                account_number: 3,
                sequence: 8,
            }],
            "",
        )
    }

    #[test]
    fn test_verify_signed_tx() {
        let key = PrivateKey::secp256k1_from_slice(&[3u8; 32]).unwrap();
        let tx = signed_tx(&key, "irishub");
        assert!(verify_std_tx(&tx, "irishub").is_ok());
    }

    #[test]
    fn test_wrong_chain_fails() {
        let key = PrivateKey::secp256k1_from_slice(&[3u8; 32]).unwrap();
        let tx = signed_tx(&key, "irishub");
        assert!(matches!(
            verify_std_tx(&tx, "other-chain"),
            Err(VerificationError::SignatureVerificationFailed(_))
        ));
    }

    #[test]
    fn test_foreign_key_is_rejected() {
        let key = PrivateKey::secp256k1_from_slice(&[3u8; 32]).unwrap();
        let other = PrivateKey::secp256k1_from_slice(&[4u8; 32]).unwrap();
        let mut tx = signed_tx(&key, "irishub");
        tx.signatures[0].pub_key = other.public_key().to_encoded();
        assert!(matches!(
            verify_std_tx(&tx, "irishub"),
            Err(VerificationError::PublicKeyMismatch { .. })
        ));
    }
}
