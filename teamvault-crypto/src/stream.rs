//! Chunked stream encryption for file blobs.
//!
//! File contents are sealed in 64 KiB chunks as they are read, so a blob is
//! never buffered whole. Each stream is encrypted under its own subkey,
//! derived (SHA-256, domain-separated) from the working key and a random
//! 16-byte stream id, so the long-lived working key can seal any number of
//! blobs without a (key, nonce) pair ever repeating. Within a stream the
//! chunk counter is the nonce, and each chunk carries a final-chunk flag in
//! the associated data, so reordering, truncation, and cross-stream
//! splicing all fail the tag check.
//!
//! Wire format: `[version][stream_id; 16]` then one frame per chunk:
//! `[final flag][sealed length as u32 BE][sealed chunk]`.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{DerivedKey, KEY_SIZE};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::io::{Read, Write};

use crate::cipher::FORMAT_VERSION;

/// Plaintext bytes per sealed chunk.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Size of the random per-stream id in bytes.
pub const STREAM_ID_SIZE: usize = 16;

const FLAG_MORE: u8 = 0;
const FLAG_FINAL: u8 = 1;

/// The per-stream encryption key.
fn stream_subkey(key: &DerivedKey, stream_id: &[u8; STREAM_ID_SIZE]) -> DerivedKey {
    let mut hasher = Sha256::new();
    hasher.update(b"teamvault-stream-key-v1");
    hasher.update(key.as_bytes());
    hasher.update(stream_id);
    let digest: [u8; KEY_SIZE] = hasher.finalize().into();
    DerivedKey::from_bytes(digest)
}

fn chunk_nonce(counter: u64) -> Nonce {
    let mut nonce = [0u8; 12];
    nonce[4..].copy_from_slice(&counter.to_be_bytes());
    *Nonce::from_slice(&nonce)
}

/// Reads until `buf` is full or EOF; returns the number of bytes read.
fn read_chunk(reader: &mut (impl Read + ?Sized), buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Encrypts `reader` into `writer` chunk by chunk.
///
/// Returns the number of plaintext bytes consumed.
pub fn encrypt_stream(
    key: &DerivedKey,
    reader: &mut (impl Read + ?Sized),
    writer: &mut (impl Write + ?Sized),
) -> CryptoResult<u64> {
    let mut stream_id = [0u8; STREAM_ID_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut stream_id);
    let subkey = stream_subkey(key, &stream_id);
    let cipher = ChaCha20Poly1305::new(subkey.as_bytes().into());

    writer.write_all(&[FORMAT_VERSION])?;
    writer.write_all(&stream_id)?;

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut pending = read_chunk(reader, &mut buf)?;
    let mut pending_buf = buf[..pending].to_vec();

    let mut counter: u64 = 0;
    let mut total: u64 = 0;

    loop {
        let next = read_chunk(reader, &mut buf)?;
        let flag = if next == 0 { FLAG_FINAL } else { FLAG_MORE };

        let sealed = cipher
            .encrypt(
                &chunk_nonce(counter),
                Payload {
                    msg: &pending_buf,
                    aad: &[flag],
                },
            )
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        writer.write_all(&[flag])?;
        writer.write_all(&(sealed.len() as u32).to_be_bytes())?;
        writer.write_all(&sealed)?;

        total += pending as u64;
        counter += 1;

        if next == 0 {
            break;
        }
        pending = next;
        pending_buf.clear();
        pending_buf.extend_from_slice(&buf[..pending]);
    }

    Ok(total)
}

/// Decrypts an encrypted stream into `writer`.
///
/// Fails with [`CryptoError::Decryption`] on a wrong key, a tampered or
/// reordered chunk, a truncated stream, or trailing data after the final
/// chunk. Returns the number of plaintext bytes produced.
pub fn decrypt_stream(
    key: &DerivedKey,
    reader: &mut (impl Read + ?Sized),
    writer: &mut (impl Write + ?Sized),
) -> CryptoResult<u64> {
    let mut header = [0u8; 1 + STREAM_ID_SIZE];
    reader
        .read_exact(&mut header)
        .map_err(|_| CryptoError::Decryption("truncated stream header".to_string()))?;
    if header[0] != FORMAT_VERSION {
        return Err(CryptoError::UnsupportedVersion(header[0]));
    }
    let mut stream_id = [0u8; STREAM_ID_SIZE];
    stream_id.copy_from_slice(&header[1..]);

    let subkey = stream_subkey(key, &stream_id);
    let cipher = ChaCha20Poly1305::new(subkey.as_bytes().into());

    let mut counter: u64 = 0;
    let mut total: u64 = 0;

    loop {
        let mut frame_header = [0u8; 5];
        reader
            .read_exact(&mut frame_header)
            .map_err(|_| CryptoError::Decryption("truncated stream".to_string()))?;

        let flag = frame_header[0];
        if flag != FLAG_MORE && flag != FLAG_FINAL {
            return Err(CryptoError::Decryption("malformed chunk frame".to_string()));
        }
        let sealed_len =
            u32::from_be_bytes([frame_header[1], frame_header[2], frame_header[3], frame_header[4]])
                as usize;
        if sealed_len > CHUNK_SIZE + crate::cipher::TAG_SIZE {
            return Err(CryptoError::Decryption("oversized chunk".to_string()));
        }

        let mut sealed = vec![0u8; sealed_len];
        reader
            .read_exact(&mut sealed)
            .map_err(|_| CryptoError::Decryption("truncated chunk".to_string()))?;

        let plaintext = cipher
            .decrypt(
                &chunk_nonce(counter),
                Payload {
                    msg: &sealed,
                    aad: &[flag],
                },
            )
            .map_err(|_| CryptoError::Decryption("wrong key or tampered data".to_string()))?;

        writer.write_all(&plaintext)?;
        total += plaintext.len() as u64;
        counter += 1;

        if flag == FLAG_FINAL {
            // Final chunk must end the stream
            let mut probe = [0u8; 1];
            match reader.read(&mut probe)? {
                0 => return Ok(total),
                _ => {
                    return Err(CryptoError::Decryption(
                        "trailing data after final chunk".to_string(),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subkey_is_domain_separated_sha256_over_key_and_stream_id() {
        let key = DerivedKey::from_bytes([3u8; KEY_SIZE]);
        let id = [9u8; STREAM_ID_SIZE];

        let mut hasher = Sha256::new();
        hasher.update(b"teamvault-stream-key-v1");
        hasher.update(key.as_bytes());
        hasher.update(id);
        let expected: [u8; KEY_SIZE] = hasher.finalize().into();

        assert_eq!(stream_subkey(&key, &id).as_bytes(), &expected);
    }

    #[test]
    fn distinct_stream_ids_yield_distinct_subkeys() {
        let key = DerivedKey::from_bytes([3u8; KEY_SIZE]);
        let a = stream_subkey(&key, &[0u8; STREAM_ID_SIZE]);
        let b = stream_subkey(&key, &[1u8; STREAM_ID_SIZE]);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }
}
