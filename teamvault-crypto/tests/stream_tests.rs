use std::io::Cursor;
use teamvault_crypto::{
    decrypt_stream, encrypt_stream, generate_random_key, CHUNK_SIZE, STREAM_ID_SIZE,
};

fn roundtrip(data: &[u8]) -> Vec<u8> {
    let key = generate_random_key();
    let mut sealed = Vec::new();
    let written = encrypt_stream(&key, &mut Cursor::new(data), &mut sealed).unwrap();
    assert_eq!(written, data.len() as u64);

    let mut plain = Vec::new();
    let read = decrypt_stream(&key, &mut Cursor::new(&sealed), &mut plain).unwrap();
    assert_eq!(read, data.len() as u64);
    plain
}

#[test]
fn empty_stream_roundtrips() {
    assert_eq!(roundtrip(b""), b"");
}

#[test]
fn small_stream_roundtrips() {
    assert_eq!(roundtrip(b"attachment contents"), b"attachment contents");
}

#[test]
fn multi_chunk_stream_roundtrips() {
    let data = vec![0x5Au8; CHUNK_SIZE * 2 + 113];
    assert_eq!(roundtrip(&data), data);
}

#[test]
fn exact_chunk_boundary_roundtrips() {
    let data = vec![0x42u8; CHUNK_SIZE];
    assert_eq!(roundtrip(&data), data);
}

#[test]
fn wrong_key_fails() {
    let key = generate_random_key();
    let other = generate_random_key();

    let mut sealed = Vec::new();
    encrypt_stream(&key, &mut Cursor::new(b"blob"), &mut sealed).unwrap();

    let mut out = Vec::new();
    assert!(decrypt_stream(&other, &mut Cursor::new(&sealed), &mut out).is_err());
}

#[test]
fn truncated_stream_fails() {
    let key = generate_random_key();
    let data = vec![1u8; CHUNK_SIZE + 50];

    let mut sealed = Vec::new();
    encrypt_stream(&key, &mut Cursor::new(&data), &mut sealed).unwrap();
    sealed.truncate(sealed.len() - 10);

    let mut out = Vec::new();
    assert!(decrypt_stream(&key, &mut Cursor::new(&sealed), &mut out).is_err());
}

#[test]
fn dropping_final_chunk_fails() {
    let key = generate_random_key();
    let data = vec![1u8; CHUNK_SIZE + 50];

    let mut sealed = Vec::new();
    encrypt_stream(&key, &mut Cursor::new(&data), &mut sealed).unwrap();

    // Cut the stream right after the first frame: stream header + frame
    // header (5) + sealed first chunk (CHUNK_SIZE + 16)
    sealed.truncate((1 + STREAM_ID_SIZE) + 5 + CHUNK_SIZE + 16);

    let mut out = Vec::new();
    assert!(decrypt_stream(&key, &mut Cursor::new(&sealed), &mut out).is_err());
}

#[test]
fn frames_grafted_onto_another_stream_fail() {
    let key = generate_random_key();

    let mut a = Vec::new();
    encrypt_stream(&key, &mut Cursor::new(b"first blob"), &mut a).unwrap();
    let mut b = Vec::new();
    encrypt_stream(&key, &mut Cursor::new(b"first blob"), &mut b).unwrap();

    // b's frames under a's stream header: the per-stream key no longer
    // matches, even though both blobs were sealed under the same working key
    let mut spliced = a[..1 + STREAM_ID_SIZE].to_vec();
    spliced.extend_from_slice(&b[1 + STREAM_ID_SIZE..]);

    let mut out = Vec::new();
    assert!(decrypt_stream(&key, &mut Cursor::new(&spliced), &mut out).is_err());
}

#[test]
fn tampered_chunk_fails() {
    let key = generate_random_key();

    let mut sealed = Vec::new();
    encrypt_stream(&key, &mut Cursor::new(b"some file content"), &mut sealed).unwrap();
    let last = sealed.len() - 1;
    sealed[last] ^= 0xFF;

    let mut out = Vec::new();
    assert!(decrypt_stream(&key, &mut Cursor::new(&sealed), &mut out).is_err());
}

#[test]
fn trailing_data_after_final_chunk_fails() {
    let key = generate_random_key();

    let mut sealed = Vec::new();
    encrypt_stream(&key, &mut Cursor::new(b"content"), &mut sealed).unwrap();
    sealed.push(0x00);

    let mut out = Vec::new();
    assert!(decrypt_stream(&key, &mut Cursor::new(&sealed), &mut out).is_err());
}

// Property-based tests
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]
        #[test]
        fn stream_always_roundtrips(data in proptest::collection::vec(any::<u8>(), 0..(CHUNK_SIZE * 2))) {
            prop_assert_eq!(roundtrip(&data), data);
        }
    }
}
