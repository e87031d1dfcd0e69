//! Solver for the site's challenge cookie.
//!
//! The landing page embeds three hex literals as `toNumbers("...")` calls: an
//! AES key, an IV and a ciphertext.  The browser decrypts the ciphertext with
//! AES-CBC and stores the hex of the plaintext in the `__test` cookie; we do
//! the same.

use aes::cipher::consts::U16;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockSizeUser, KeyInit};
use aes::{Aes128, Aes192, Aes256};
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

/// Pattern wrapping each hex token in the challenge page.
pub const TOKEN_PATTERN: &str = r#"toNumbers\("([a-f0-9]+)"\)"#;

const BLOCK_LEN: usize = 16;

/// Turns a challenge page into the cookie value the server expects.
pub trait ChallengeSolver: Send + Sync {
    /// Solves the challenge embedded in `page` and returns the cookie value.
    fn solve(&self, page: &str) -> Result<String>;
}

/// The key, IV and ciphertext pulled out of a challenge page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeTokens {
    /// AES key; 16, 24 or 32 bytes.
    pub key: Vec<u8>,
    /// CBC initialization vector.
    pub iv: Vec<u8>,
    /// Encrypted cookie value.
    pub ciphertext: Vec<u8>,
}

impl ChallengeTokens {
    /// Decrypts the ciphertext.
    pub fn decrypt(&self) -> Result<Vec<u8>> {
        decrypt_cbc(&self.key, &self.iv, &self.ciphertext)
    }
}

/// The scheme served by the proxy today: regex token scan plus AES-CBC.
#[derive(Debug, Clone)]
pub struct AesChallenge {
    pattern: Regex,
}

impl AesChallenge {
    /// Creates a solver using [`TOKEN_PATTERN`].
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(TOKEN_PATTERN).map_err(|e| {
            Error::validation(
                format!("bad token pattern: {e}"),
                Some("TOKEN_PATTERN".to_string()),
            )
        })?;
        Ok(Self { pattern })
    }

    /// Extracts the first three hex tokens from `page`.
    ///
    /// Tokens beyond the third are ignored.
    pub fn extract_tokens(&self, page: &str) -> Result<ChallengeTokens> {
        let found: Vec<&str> = self
            .pattern
            .captures_iter(page)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .take(3)
            .collect();
        debug!(tokens = found.len(), "scanned challenge page");
        let [key, iv, ciphertext] = found.as_slice() else {
            return Err(Error::challenge(format!(
                "expected 3 challenge tokens in the page, found {}",
                found.len()
            )));
        };
        Ok(ChallengeTokens {
            key: hex::decode(key)?,
            iv: hex::decode(iv)?,
            ciphertext: hex::decode(ciphertext)?,
        })
    }
}

impl ChallengeSolver for AesChallenge {
    fn solve(&self, page: &str) -> Result<String> {
        let tokens = self.extract_tokens(page)?;
        let plaintext = tokens.decrypt()?;
        Ok(hex::encode(plaintext))
    }
}

/// Decrypts `data` with AES in CBC mode, without removing any padding.
///
/// The AES variant follows the key length.  The IV must be one block and the
/// ciphertext a non-empty whole number of blocks.
pub fn decrypt_cbc(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let iv: [u8; BLOCK_LEN] = iv.try_into().map_err(|_| {
        Error::challenge(format!(
            "IV must be {BLOCK_LEN} bytes, got {}",
            iv.len()
        ))
    })?;
    if data.is_empty() || data.len() % BLOCK_LEN != 0 {
        return Err(Error::challenge(format!(
            "ciphertext must be a non-empty multiple of {BLOCK_LEN} bytes, got {}",
            data.len()
        )));
    }
    match key.len() {
        16 => Ok(cbc_blocks(&Aes128::new_from_slice(key).map_err(bad_key)?, &iv, data)),
        24 => Ok(cbc_blocks(&Aes192::new_from_slice(key).map_err(bad_key)?, &iv, data)),
        32 => Ok(cbc_blocks(&Aes256::new_from_slice(key).map_err(bad_key)?, &iv, data)),
        n => Err(Error::challenge(format!(
            "key must be 16, 24 or 32 bytes, got {n}"
        ))),
    }
}

fn bad_key(err: aes::cipher::InvalidLength) -> Error {
    Error::challenge(format!("invalid key: {err}"))
}

fn cbc_blocks<C>(cipher: &C, iv: &[u8; BLOCK_LEN], data: &[u8]) -> Vec<u8>
where
    C: BlockDecrypt + BlockSizeUser<BlockSize = U16>,
{
    let mut out = Vec::with_capacity(data.len());
    let mut previous = *iv;
    for chunk in data.chunks_exact(BLOCK_LEN) {
        let mut block = GenericArray::clone_from_slice(chunk);
        cipher.decrypt_block(&mut block);
        for (byte, prev) in block.iter_mut().zip(previous.iter()) {
            *byte ^= prev;
        }
        out.extend_from_slice(&block);
        previous.copy_from_slice(chunk);
    }
    out
}
