use std::io::Cursor;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes128;
use aes_gcm::{AesGcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zip::read::ZipArchive;

use crate::error::{PayloadError, Result};

pub const KEY_LEN: usize = 16;
pub const NONCE_LEN: usize = 16;
pub const TAG_LEN: usize = 16;

// AES-128-GCM with the payload format's 16-byte nonce.
type WorkflowCipher = AesGcm<Aes128, U16>;

/// Decode the base64 text body of a payload blob. The remote file may be
/// line-wrapped, so ASCII whitespace is stripped first.
pub fn decode_blob(text: &[u8]) -> Result<Vec<u8>> {
    let compact: Vec<u8> = text
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    BASE64
        .decode(&compact)
        .map_err(|e| PayloadError::InvalidPayload(format!("base64 decode failed: {e}")))
}

/// Authenticated decryption of `nonce ‖ tag ‖ ciphertext` under `key`.
/// A tag mismatch surfaces as [`PayloadError::Integrity`], never as
/// silently wrong plaintext.
pub fn decrypt(data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    if key.len() != KEY_LEN {
        return Err(PayloadError::InvalidPayload(format!(
            "payload key must be {KEY_LEN} bytes, got {}",
            key.len()
        )));
    }
    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(PayloadError::InvalidPayload(format!(
            "payload blob too short: {} bytes",
            data.len()
        )));
    }
    let (nonce, rest) = data.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);

    let cipher = WorkflowCipher::new_from_slice(key)
        .map_err(|e| PayloadError::InvalidPayload(format!("bad key: {e}")))?;

    // The AEAD API expects ciphertext with the tag appended.
    let mut buf = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    buf.extend_from_slice(ciphertext);
    buf.extend_from_slice(tag);

    cipher
        .decrypt(Nonce::<U16>::from_slice(nonce), buf.as_ref())
        .map_err(|_| PayloadError::Integrity)
}

/// Counterpart of [`decrypt`], producing the `nonce ‖ tag ‖ ciphertext`
/// wire layout. Used by the payload packaging side and by tests.
pub fn encrypt(plaintext: &[u8], key: &[u8], nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>> {
    if key.len() != KEY_LEN {
        return Err(PayloadError::InvalidPayload(format!(
            "payload key must be {KEY_LEN} bytes, got {}",
            key.len()
        )));
    }
    let cipher = WorkflowCipher::new_from_slice(key)
        .map_err(|e| PayloadError::InvalidPayload(format!("bad key: {e}")))?;
    let sealed = cipher
        .encrypt(Nonce::<U16>::from_slice(nonce), plaintext)
        .map_err(|_| PayloadError::InvalidPayload("encryption failed".into()))?;

    let split = sealed.len() - TAG_LEN;
    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(nonce);
    out.extend_from_slice(&sealed[split..]);
    out.extend_from_slice(&sealed[..split]);
    Ok(out)
}

/// Open decrypted payload bytes as an in-memory zip archive.
pub fn open_archive(plaintext: Vec<u8>) -> Result<ZipArchive<Cursor<Vec<u8>>>> {
    Ok(ZipArchive::new(Cursor::new(plaintext))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"1234567890abcdef";
    const NONCE: [u8; NONCE_LEN] = [7u8; NONCE_LEN];

    #[test]
    fn roundtrip_recovers_plaintext() {
        let blob = encrypt(b"workflow bundle", KEY, &NONCE).unwrap();
        assert_eq!(decrypt(&blob, KEY).unwrap(), b"workflow bundle");
    }

    #[test]
    fn flipped_tag_bit_fails_integrity() {
        let mut blob = encrypt(b"workflow bundle", KEY, &NONCE).unwrap();
        blob[NONCE_LEN] ^= 0x01;
        assert!(matches!(decrypt(&blob, KEY), Err(PayloadError::Integrity)));
    }

    #[test]
    fn flipped_ciphertext_bit_fails_integrity() {
        let mut blob = encrypt(b"workflow bundle", KEY, &NONCE).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x80;
        assert!(matches!(decrypt(&blob, KEY), Err(PayloadError::Integrity)));
    }

    #[test]
    fn wrong_key_fails_integrity() {
        let blob = encrypt(b"workflow bundle", KEY, &NONCE).unwrap();
        assert!(matches!(
            decrypt(&blob, b"fedcba0987654321"),
            Err(PayloadError::Integrity)
        ));
    }

    #[test]
    fn truncated_blob_is_invalid() {
        assert!(matches!(
            decrypt(&[0u8; 20], KEY),
            Err(PayloadError::InvalidPayload(_))
        ));
    }

    #[test]
    fn decode_blob_ignores_line_wrapping() {
        let blob = encrypt(b"abc", KEY, &NONCE).unwrap();
        let mut text = BASE64.encode(&blob);
        text.insert(10, '\n');
        text.push('\n');
        assert_eq!(decode_blob(text.as_bytes()).unwrap(), blob);
    }
}
