//! Minecraft Dungeons save container encryption and decryption
//!
//! A `.dat` save is an 8-byte header (`D001` followed by four zero bytes) and
//! an AES-256-ECB ciphertext of the JSON document. The plaintext is padded
//! with spaces to the block size rather than PKCS7, so no padding is
//! stripped on decryption; the text is trimmed instead.

#[allow(deprecated)]
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Format magic at the start of every save container
pub const MAGIC: [u8; 4] = *b"D001";

/// Full container header: magic plus four reserved zero bytes
pub const HEADER: [u8; 8] = [0x44, 0x30, 0x30, 0x31, 0x00, 0x00, 0x00, 0x00];

/// Placeholder for the 32-byte key the game encrypts its saves with
///
/// This is not the game's key. Containers produced by [`encode_save`] decode
/// with [`decode_save`], but files written by the game only decode once this
/// constant holds the real key. [`decode`] and [`encode`] accept any key.
pub const GAME_KEY: [u8; 32] = [
    0x57, 0x41, 0x53, 0x44, 0x4B, 0x33, 0x6E, 0x54, 0x62, 0x37, 0x72, 0x59, 0x38, 0x75, 0x4C, 0x67,
    0x32, 0x50, 0x63, 0x4D, 0x71, 0x39, 0x68, 0x46, 0x76, 0x36, 0x7A, 0x58, 0x6A, 0x31, 0x4E, 0x65,
];

/// Errors that can occur while decoding or encoding a save container
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Save file is {0} bytes, shorter than the 8-byte header")]
    TooShort(usize),

    #[error("Invalid save header: expected 44 30 30 31 00 00 00 00, found {0:02X?}")]
    BadMagic([u8; 8]),

    #[error("Encrypted payload size {0} is not a multiple of 16 bytes")]
    InvalidSize(usize),

    #[error("Invalid key length {0}, expected 32 bytes")]
    InvalidKeyLength(usize),

    #[error("Decrypted payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

fn cipher(key: &[u8]) -> Result<Aes256, CryptoError> {
    Aes256::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength(key.len()))
}

/// Check the 8-byte container header and return the ciphertext that follows it
pub fn split_header(data: &[u8]) -> Result<&[u8], CryptoError> {
    if data.len() < HEADER.len() {
        return Err(CryptoError::TooShort(data.len()));
    }

    let (header, body) = data.split_at(HEADER.len());
    if header != HEADER {
        let mut found = [0u8; 8];
        found.copy_from_slice(header);
        return Err(CryptoError::BadMagic(found));
    }

    Ok(body)
}

/// Decrypt a save container to its JSON text
///
/// # Format
/// - Input: 8-byte header, then AES-256-ECB ciphertext (no padding scheme)
/// - After decryption: UTF-8 JSON right-padded with spaces
pub fn decode(data: &[u8], key: &[u8]) -> Result<String, CryptoError> {
    let body = split_header(data)?;

    if body.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidSize(body.len()));
    }

    let cipher = cipher(key)?;

    let mut decrypted = body.to_vec();
    for chunk in decrypted.chunks_exact_mut(BLOCK_SIZE) {
        #[allow(deprecated)]
        cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
    }

    let text = String::from_utf8(decrypted)?;
    Ok(text
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string())
}

/// Encrypt JSON text into a save container
///
/// # Format
/// - Right-pads the text with spaces to 16-byte blocks
/// - Encrypts with AES-256-ECB
/// - Prepends the 8-byte header
pub fn encode(text: &str, key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = cipher(key)?;

    let mut payload = text.as_bytes().to_vec();
    let remainder = payload.len() % BLOCK_SIZE;
    if remainder != 0 {
        payload.resize(payload.len() + BLOCK_SIZE - remainder, b' ');
    }

    for chunk in payload.chunks_exact_mut(BLOCK_SIZE) {
        #[allow(deprecated)]
        cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
    }

    let mut out = Vec::with_capacity(HEADER.len() + payload.len());
    out.extend_from_slice(&HEADER);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decrypt with the game's key
pub fn decode_save(data: &[u8]) -> Result<String, CryptoError> {
    decode(data, &GAME_KEY)
}

/// Encrypt with the game's key
pub fn encode_save(text: &str) -> Result<Vec<u8>, CryptoError> {
    encode(text, &GAME_KEY)
}
