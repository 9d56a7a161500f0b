// ABOUTME: Credential codec: Argon2 password hashing and ChaCha20Poly1305 credential sealing
// ABOUTME: User passwords are one-way; stored service logins must round-trip to plaintext

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};
use rand::{RngCore, rngs::OsRng};

use crate::error::{AppError, Result};

const KEY_SIZE: usize = 32; // 256 bits for ChaCha20Poly1305
const NONCE_SIZE: usize = 12; // 96 bits for ChaCha20Poly1305
const KEY_SALT: &[u8] = b"connection-manager/credential-key";

/// Hashes user passwords and seals the service credentials kept in `login`.
///
/// The sealing key is derived once from the deployment secret, so every
/// instance configured with the same secret can open existing rows.
#[derive(Clone)]
pub struct CredentialCodec {
    cipher: ChaCha20Poly1305,
    // Verified against when a login names an unknown user, so both
    // rejection paths cost one Argon2 run.
    dummy_hash: String,
}

impl CredentialCodec {
    pub fn new(secret: &str) -> Result<Self> {
        let key = derive_key(secret, KEY_SALT)?;
        let cipher = ChaCha20Poly1305::new_from_slice(&key)
            .map_err(|_| AppError::Crypto("Invalid key size".to_string()))?;
        let dummy_hash = hash_password("connection-manager-dummy")?;

        Ok(Self { cipher, dummy_hash })
    }

    pub fn encrypt_credential(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| AppError::Crypto("Encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    pub fn decrypt_credential(&self, sealed: &str) -> Result<String> {
        let bytes = STANDARD
            .decode(sealed)
            .map_err(|_| AppError::Crypto("Stored credential is not base64".to_string()))?;
        if bytes.len() < NONCE_SIZE {
            return Err(AppError::Crypto("Stored credential is truncated".to_string()));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| AppError::Crypto("Decryption failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| AppError::Crypto("Invalid UTF-8 in decrypted credential".to_string()))
    }

    /// Burns one verification so unknown users cost the same as wrong passwords.
    pub fn verify_dummy(&self, password: &str) {
        let _ = verify_password(password, &self.dummy_hash);
    }
}

/// Argon2id PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::Crypto("Failed to hash password".to_string()))
}

pub fn verify_password(password: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn derive_key(secret: &str, salt: &[u8]) -> Result<[u8; KEY_SIZE]> {
    let mut key = [0u8; KEY_SIZE];
    Argon2::default()
        .hash_password_into(secret.as_bytes(), salt, &mut key)
        .map_err(|_| AppError::Crypto("Failed to derive credential key".to_string()))?;
    Ok(key)
}
