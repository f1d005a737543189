use std::collections::BTreeMap;
use teamvault_crypto::{generate_random_key, TokenConfig, TokenError, TokenSigner};

fn signer() -> TokenSigner {
    TokenSigner::new(TokenConfig::single([7u8; 32]))
}

#[test]
fn sign_verify_roundtrip_returns_key() {
    let signer = signer();
    let key = generate_random_key();

    let token = signer.sign("file-1", &key, 2000).unwrap();
    let recovered = signer.verify_at("file-1", &token, 1000).unwrap();

    assert_eq!(recovered.as_bytes(), key.as_bytes());
}

#[test]
fn expired_token_rejected() {
    let signer = signer();
    let key = generate_random_key();

    let token = signer.sign("file-1", &key, 2000).unwrap();
    let result = signer.verify_at("file-1", &token, 3000);

    assert!(matches!(result, Err(TokenError::Expired)));
}

#[test]
fn token_for_other_file_rejected() {
    let signer = signer();
    let key = generate_random_key();

    let token = signer.sign("file-1", &key, 2000).unwrap();
    let result = signer.verify_at("file-2", &token, 1000);

    assert!(matches!(result, Err(TokenError::Mismatch)));
}

#[test]
fn forged_signature_rejected() {
    let signer = signer();
    let other = TokenSigner::new(TokenConfig::single([8u8; 32]));
    let key = generate_random_key();

    let token = other.sign("file-1", &key, 2000).unwrap();
    let result = signer.verify_at("file-1", &token, 1000);

    assert!(matches!(result, Err(TokenError::Invalid(_))));
}

#[test]
fn tampered_payload_rejected() {
    let signer = signer();
    let key = generate_random_key();

    let token = signer.sign("file-1", &key, 2000).unwrap();
    let mut chars: Vec<char> = token.chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    let tampered: String = chars.into_iter().collect();

    assert!(signer.verify_at("file-1", &tampered, 1000).is_err());
}

#[test]
fn garbage_token_rejected() {
    let signer = signer();
    assert!(matches!(
        signer.verify_at("file-1", "not-a-token", 1000),
        Err(TokenError::Invalid(_))
    ));
}

#[test]
fn rotated_signer_still_verifies_old_tokens() {
    let old = TokenSigner::new(TokenConfig::single([7u8; 32]));
    let key = generate_random_key();
    let token = old.sign("file-1", &key, 2000).unwrap();

    // Rotate: add version 2 as active, keep version 1 verifiable
    let mut keys = BTreeMap::new();
    keys.insert(1, [7u8; 32]);
    keys.insert(2, [9u8; 32]);
    let rotated = TokenSigner::new(TokenConfig::new(keys, 2).unwrap());

    let recovered = rotated.verify_at("file-1", &token, 1000).unwrap();
    assert_eq!(recovered.as_bytes(), key.as_bytes());

    // And new tokens use the new key
    let token2 = rotated.sign("file-2", &key, 2000).unwrap();
    assert!(rotated.verify_at("file-2", &token2, 1000).is_ok());
}

#[test]
fn config_rejects_missing_active_version() {
    let mut keys = BTreeMap::new();
    keys.insert(1, [7u8; 32]);
    assert!(TokenConfig::new(keys, 2).is_err());
}
