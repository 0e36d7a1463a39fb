use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{KeyInit, XChaCha20Poly1305, XNonce};
use daybook_core::{DaybookError, DbResult};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::warn;

const KEY_BYTES: usize = 32;
const NONCE_BYTES: usize = 24;
const KEY_CONTEXT: &str = "daybook-queue-encryption";

/// At-rest codec for the persisted queue blob. Authenticated encryption with
/// a fresh random nonce embedded in the output, keyed by a one-way hash over
/// stable local-environment data. This guards against casual inspection of
/// local storage, not against an attacker with code execution on the device.
///
/// The codec never loses data: any failure on the encrypt side returns the
/// plaintext unchanged, and any failure on the decrypt side returns the input
/// unchanged (which also tolerates legacy blobs written before encryption
/// existed).
#[derive(Debug, Clone)]
pub struct Codec {
    key: [u8; KEY_BYTES],
}

impl Codec {
    pub fn from_environment() -> Self {
        Self {
            key: derive_environment_key(),
        }
    }

    pub fn with_key(key: [u8; KEY_BYTES]) -> Self {
        Self { key }
    }

    pub fn encrypt(&self, plaintext: &str) -> String {
        match self.try_encrypt(plaintext) {
            Ok(blob) => blob,
            Err(error) => {
                warn!("queue blob encryption failed, storing plaintext: {error}");
                plaintext.to_string()
            }
        }
    }

    pub fn decrypt(&self, blob: &str) -> String {
        match self.try_decrypt(blob) {
            Ok(plaintext) => plaintext,
            Err(error) => {
                warn!("queue blob decryption failed, returning input unchanged: {error}");
                blob.to_string()
            }
        }
    }

    /// Heuristic used to pick a decode path. False positives and negatives
    /// are acceptable; callers must never reject data based on this.
    pub fn looks_encrypted(blob: &str) -> bool {
        BASE64
            .decode(blob.as_bytes())
            .is_ok_and(|decoded| decoded.len() > NONCE_BYTES)
    }

    fn try_encrypt(&self, plaintext: &str) -> DbResult<String> {
        let cipher = XChaCha20Poly1305::new_from_slice(&self.key)
            .map_err(|err| DaybookError::crypto(format!("invalid codec key: {err}")))?;

        let mut nonce = [0u8; NONCE_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| DaybookError::crypto("failed to seal queue blob"))?;

        let mut combined = Vec::with_capacity(NONCE_BYTES + ciphertext.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(combined))
    }

    fn try_decrypt(&self, blob: &str) -> DbResult<String> {
        let combined = BASE64
            .decode(blob.as_bytes())
            .map_err(|err| DaybookError::crypto(format!("blob is not base64: {err}")))?;

        if combined.len() <= NONCE_BYTES {
            return Err(DaybookError::crypto(format!(
                "blob too short for embedded nonce: {} bytes",
                combined.len()
            )));
        }

        let (nonce, ciphertext) = combined.split_at(NONCE_BYTES);
        let cipher = XChaCha20Poly1305::new_from_slice(&self.key)
            .map_err(|err| DaybookError::crypto(format!("invalid codec key: {err}")))?;

        let plaintext = cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| DaybookError::crypto("failed to open queue blob"))?;

        String::from_utf8(plaintext)
            .map_err(|err| DaybookError::crypto(format!("decrypted blob is not utf8: {err}")))
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::from_environment()
    }
}

// No network round trip and no user secret: the key is a digest over fixed
// application context plus whatever identity the local environment exposes.
fn derive_environment_key() -> [u8; KEY_BYTES] {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default();
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(KEY_CONTEXT.as_bytes());
    hasher.update(b":");
    hasher.update(std::env::consts::OS.as_bytes());
    hasher.update(b":");
    hasher.update(user.as_bytes());
    hasher.update(b":");
    hasher.update(home.as_bytes());
    let digest = hasher.finalize();

    let mut key = [0u8; KEY_BYTES];
    key.copy_from_slice(&digest);
    key
}
