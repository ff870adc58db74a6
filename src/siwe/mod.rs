//! Sign-In With Ethereum (EIP-4361) message verification.
//!
//! A sign-in message is a structured plain-text blob signed with the
//! wallet's secp256k1 key via `personal_sign` (EIP-191). Verification
//! recovers the signer's public key from the signature, derives the
//! Ethereum address from its keccak hash, and compares it with the address
//! the message declares.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};
use std::str::FromStr;
use thiserror::Error;

const DOMAIN_LINE_SUFFIX: &str = " wants you to sign in with your Ethereum account:";
const EIP191_PREFIX: &str = "\x19Ethereum Signed Message:\n";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SiweError {
    #[error("malformed sign-in message: {0}")]
    MalformedMessage(String),

    #[error("malformed signature")]
    MalformedSignature,

    #[error("could not recover signer from signature")]
    Recovery,

    #[error("recovered signer does not match message address")]
    SignatureMismatch,
}

/// A parsed EIP-4361 message.
///
/// The raw text is retained because the signature covers the message
/// byte-for-byte, not its parsed form. Optional trailing fields
/// (Expiration Time, Resources, ...) are tolerated but not interpreted.
#[derive(Debug, Clone)]
pub struct SiweMessage {
    raw: String,
    pub domain: String,
    pub address: String,
    pub statement: Option<String>,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: String,
}

impl FromStr for SiweMessage {
    type Err = SiweError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |detail: &str| SiweError::MalformedMessage(detail.to_string());

        let mut lines = s.lines();

        let domain_line = lines.next().ok_or_else(|| malformed("empty message"))?;
        let domain = domain_line
            .strip_suffix(DOMAIN_LINE_SUFFIX)
            .ok_or_else(|| malformed("missing sign-in preamble"))?
            .trim()
            .to_string();
        if domain.is_empty() {
            return Err(malformed("empty domain"));
        }

        let address = lines
            .next()
            .ok_or_else(|| malformed("missing address line"))?
            .trim()
            .to_string();
        if !is_eth_address(&address) {
            return Err(malformed("address is not a 0x-prefixed 20-byte hex string"));
        }

        let mut statement = None;
        let mut uri = None;
        let mut version = None;
        let mut chain_id = None;
        let mut nonce = None;
        let mut issued_at = None;

        for line in lines {
            if line.is_empty() {
                continue;
            }
            if let Some(value) = line.strip_prefix("URI: ") {
                uri = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix("Version: ") {
                version = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix("Chain ID: ") {
                chain_id = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| malformed("chain id is not a number"))?,
                );
            } else if let Some(value) = line.strip_prefix("Nonce: ") {
                nonce = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix("Issued At: ") {
                issued_at = Some(value.to_string());
            } else if uri.is_none() && statement.is_none() {
                // Free-form statement between the address and the fields
                statement = Some(line.to_string());
            }
            // Unknown labeled fields after URI (Expiration Time, Request ID,
            // Resources entries) are tolerated.
        }

        Ok(SiweMessage {
            raw: s.to_string(),
            domain,
            address,
            statement,
            uri: uri.ok_or_else(|| malformed("missing URI field"))?,
            version: version.ok_or_else(|| malformed("missing Version field"))?,
            chain_id: chain_id.ok_or_else(|| malformed("missing Chain ID field"))?,
            nonce: nonce.ok_or_else(|| malformed("missing Nonce field"))?,
            issued_at: issued_at.ok_or_else(|| malformed("missing Issued At field"))?,
        })
    }
}

impl SiweMessage {
    /// Verify a hex-encoded 65-byte `r || s || v` signature over this
    /// message. On success returns the verified wallet address exactly as
    /// the message declared it.
    pub fn verify(&self, signature: &str) -> Result<&str, SiweError> {
        let sig_bytes = hex::decode(signature.trim_start_matches("0x"))
            .map_err(|_| SiweError::MalformedSignature)?;
        if sig_bytes.len() != 65 {
            return Err(SiweError::MalformedSignature);
        }

        // Wallets emit v as 27/28; raw recovery ids are 0/1
        let v = sig_bytes[64];
        let recovery_byte = if v >= 27 { v - 27 } else { v };
        if recovery_byte > 1 {
            return Err(SiweError::MalformedSignature);
        }
        let recovery_id =
            RecoveryId::try_from(recovery_byte).map_err(|_| SiweError::MalformedSignature)?;
        let signature =
            Signature::from_slice(&sig_bytes[..64]).map_err(|_| SiweError::MalformedSignature)?;

        let prehash = eip191_hash(self.raw.as_bytes());
        let recovered_key = VerifyingKey::recover_from_prehash(&prehash, &signature, recovery_id)
            .map_err(|_| SiweError::Recovery)?;

        let recovered_address = address_from_key(&recovered_key);
        if recovered_address.eq_ignore_ascii_case(&self.address) {
            Ok(&self.address)
        } else {
            Err(SiweError::SignatureMismatch)
        }
    }
}

fn is_eth_address(s: &str) -> bool {
    s.len() == 42
        && s.starts_with("0x")
        && s[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// EIP-191 `personal_sign` digest: keccak over the prefixed message.
pub fn eip191_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(EIP191_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Derives the Ethereum address: last 20 bytes of the keccak hash of the
/// uncompressed public key (without the 0x04 tag byte).
fn address_from_key(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    fn test_key() -> SigningKey {
        SigningKey::from_slice(&[0x42; 32]).unwrap()
    }

    fn message_for(address: &str) -> String {
        format!(
            "studio.vibezmaster.xyz wants you to sign in with your Ethereum account:\n\
             {}\n\
             \n\
             Sign in to Vibezmaster Studio.\n\
             \n\
             URI: https://studio.vibezmaster.xyz\n\
             Version: 1\n\
             Chain ID: 84532\n\
             Nonce: 32891756\n\
             Issued At: 2025-06-01T12:00:00Z",
            address
        )
    }

    fn sign(key: &SigningKey, message: &str) -> String {
        let prehash = eip191_hash(message.as_bytes());
        let (signature, recovery_id) = key.sign_prehash_recoverable(&prehash).unwrap();
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        format!("0x{}", hex::encode(bytes))
    }

    #[test]
    fn parses_canonical_message() {
        let raw = message_for("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
        let message: SiweMessage = raw.parse().unwrap();

        assert_eq!(message.domain, "studio.vibezmaster.xyz");
        assert_eq!(
            message.address,
            "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"
        );
        assert_eq!(
            message.statement.as_deref(),
            Some("Sign in to Vibezmaster Studio.")
        );
        assert_eq!(message.uri, "https://studio.vibezmaster.xyz");
        assert_eq!(message.version, "1");
        assert_eq!(message.chain_id, 84532);
        assert_eq!(message.nonce, "32891756");
        assert_eq!(message.issued_at, "2025-06-01T12:00:00Z");
    }

    #[test]
    fn rejects_messages_without_preamble_or_address() {
        assert!("hello".parse::<SiweMessage>().is_err());
        assert!(message_for("0x1234").parse::<SiweMessage>().is_err());

        let missing_nonce = "example.com wants you to sign in with your Ethereum account:\n\
             0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045\n\
             \n\
             URI: https://example.com\n\
             Version: 1\n\
             Chain ID: 1\n\
             Issued At: 2025-06-01T12:00:00Z";
        assert!(matches!(
            missing_nonce.parse::<SiweMessage>(),
            Err(SiweError::MalformedMessage(_))
        ));
    }

    #[test]
    fn verifies_a_signature_from_the_declared_address() {
        let key = test_key();
        let address = address_from_key(key.verifying_key());

        let raw = message_for(&address);
        let message: SiweMessage = raw.parse().unwrap();
        let signature = sign(&key, &raw);

        assert_eq!(message.verify(&signature).unwrap(), address);
    }

    #[test]
    fn address_comparison_is_case_insensitive() {
        let key = test_key();
        let address = address_from_key(key.verifying_key()).to_uppercase();
        let address = format!("0x{}", &address[2..]);

        let raw = message_for(&address);
        let message: SiweMessage = raw.parse().unwrap();
        let signature = sign(&key, &raw);

        assert!(message.verify(&signature).is_ok());
    }

    #[test]
    fn rejects_a_signature_from_a_different_key() {
        let signer = SigningKey::from_slice(&[0x24; 32]).unwrap();
        let declared = address_from_key(test_key().verifying_key());

        let raw = message_for(&declared);
        let message: SiweMessage = raw.parse().unwrap();
        let signature = sign(&signer, &raw);

        assert_eq!(
            message.verify(&signature),
            Err(SiweError::SignatureMismatch)
        );
    }

    #[test]
    fn rejects_a_signature_over_a_tampered_message() {
        let key = test_key();
        let address = address_from_key(key.verifying_key());

        let raw = message_for(&address);
        let signature = sign(&key, &raw);

        let tampered = raw.replace("Nonce: 32891756", "Nonce: 99999999");
        let message: SiweMessage = tampered.parse().unwrap();

        assert!(message.verify(&signature).is_err());
    }

    #[test]
    fn rejects_malformed_signatures() {
        let key = test_key();
        let address = address_from_key(key.verifying_key());
        let message: SiweMessage = message_for(&address).parse().unwrap();

        assert_eq!(
            message.verify("not hex"),
            Err(SiweError::MalformedSignature)
        );
        assert_eq!(
            message.verify("0xdeadbeef"),
            Err(SiweError::MalformedSignature)
        );
        // 65 bytes but an impossible recovery byte
        let bad_v = format!("0x{}{:02x}", "11".repeat(64), 9);
        assert_eq!(message.verify(&bad_v), Err(SiweError::MalformedSignature));
    }
}
