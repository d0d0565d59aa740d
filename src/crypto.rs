//! secp256k1 key material, addresses, hashing and message signing.
//!
//! Addresses follow the Ethereum convention: the last 20 bytes of the
//! keccak256 hash of the uncompressed public key, rendered with an EIP-55
//! mixed-case checksum. Message signatures are EIP-191 personal-message
//! signatures (`r || s || v`, `v = 27 + recovery id`).

use k256::ecdsa::SigningKey;
use secrecy::{ExposeSecret, SecretString};
use sha3::{Digest, Keccak256};

use crate::error::ValidationError;

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash text the way the registry expects document hashes: `0x`-prefixed
/// keccak256 hex of the UTF-8 bytes.
pub fn hash_data(text: &str) -> String {
    format!("0x{}", hex::encode(keccak256(text.as_bytes())))
}

/// Parse a `0x`-prefixed 32-byte hex private key.
pub fn parse_private_key(key: &SecretString) -> Result<SigningKey, ValidationError> {
    let raw = key.expose_secret().trim();
    let hex_part = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or(ValidationError::PrivateKey)?;
    if hex_part.len() != 64 {
        return Err(ValidationError::PrivateKey);
    }
    let bytes = hex::decode(hex_part).map_err(|_| ValidationError::PrivateKey)?;
    SigningKey::from_slice(&bytes).map_err(|_| ValidationError::PrivateKey)
}

/// Generate a fresh private key from OS randomness.
pub fn generate_private_key() -> SecretString {
    let key = SigningKey::random(&mut rand::rngs::OsRng);
    SecretString::from(format!("0x{}", hex::encode(key.to_bytes())))
}

/// Derive the checksummed address of a private key.
pub fn address_of(key: &SecretString) -> Result<String, ValidationError> {
    let signing_key = parse_private_key(key)?;
    let point = signing_key.verifying_key().to_encoded_point(false);
    // Skip the 0x04 uncompressed-point tag.
    let hash = keccak256(&point.as_bytes()[1..]);
    Ok(to_checksum_address(&hash[12..]))
}

/// EIP-55 mixed-case rendering of a 20-byte address.
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());
    let checksummed: String = lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect();
    format!("0x{checksummed}")
}

/// Sign `message` as an EIP-191 personal message. Returns `0x` + 65-byte hex.
pub fn sign_message(message: &str, key: &SecretString) -> Result<String, ValidationError> {
    let signing_key = parse_private_key(key)?;
    let prefixed = format!("\x19Ethereum Signed Message:\n{}{}", message.len(), message);
    let digest = keccak256(prefixed.as_bytes());
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(&digest)
        .map_err(|_| ValidationError::PrivateKey)?;

    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(27 + recovery_id.to_byte());
    Ok(format!("0x{}", hex::encode(bytes)))
}
