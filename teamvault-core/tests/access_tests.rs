use pretty_assertions::assert_eq;
use serde_json::json;
use teamvault_core::{EntryAccess, VaultConfig, VaultError};
use teamvault_crypto::TokenConfig;
use teamvault_model::{EntryPatch, SecretFields, SecretPatch};
use teamvault_storage::Stores;

const OWNER_CRED: &str = "alpha-credential";
const MEMBER_CRED: &str = "beta-credential";

/// Owner "u1" and member "u2" of one team; "u3" exists but is no member.
fn setup() -> (EntryAccess, String) {
    let stores = Stores::open_in_memory().unwrap();
    let config = VaultConfig::new(TokenConfig::single([7u8; 32]), [9u8; 32]);
    let access = EntryAccess::new(stores, config);

    access.create_user("u1").unwrap();
    access.create_user("u2").unwrap();
    access.create_user("u3").unwrap();

    let team = access.create_team("u1", OWNER_CRED, "acme").unwrap();
    access
        .add_member("u1", OWNER_CRED, &team.id, "u2", MEMBER_CRED)
        .unwrap();

    (access, team.id)
}

// ── Entries ──────────────────────────────────────────────────────

#[test]
fn create_entry_returns_summary_with_zero_children() {
    let (access, team_id) = setup();

    let sum = access
        .create_entry("u1", &team_id, "GitHub", "login", 0)
        .unwrap();
    assert_eq!(sum.name, "GitHub");
    assert_eq!(sum.team_id, team_id);

    let result = access.find_entry("u1", OWNER_CRED, &sum.id).unwrap();
    assert_eq!(result.secrets.len(), 0);
    assert_eq!(result.files.len(), 0);
    assert_eq!(result.shares.len(), 0);
}

#[test]
fn non_member_cannot_create_entries() {
    let (access, team_id) = setup();
    let result = access.create_entry("u3", &team_id, "GitHub", "", 0);
    assert!(matches!(result, Err(VaultError::Forbidden(_))));
}

#[test]
fn unchanged_update_is_a_noop() {
    let (access, team_id) = setup();
    let sum = access
        .create_entry("u1", &team_id, "GitHub", "login", 5)
        .unwrap();

    let patch = EntryPatch::from_json(json!({"priority": 5})).unwrap();
    let outcome = access.update_entry("u1", &sum.id, &patch).unwrap();
    assert!(outcome.is_none());

    let patch = EntryPatch::from_json(json!({"priority": 3})).unwrap();
    let updated = access.update_entry("u1", &sum.id, &patch).unwrap().unwrap();
    assert_eq!(updated.priority, 3);
}

#[test]
fn soft_delete_hides_and_restore_reveals() {
    let (access, team_id) = setup();
    let sum = access.create_entry("u1", &team_id, "GitHub", "", 0).unwrap();

    access.set_entry_deleted("u1", &sum.id, true).unwrap();
    assert!(matches!(
        access.find_entry("u1", OWNER_CRED, &sum.id),
        Err(VaultError::NotFound(_))
    ));
    // Deleting an already-deleted entry resolves nothing
    assert!(matches!(
        access.set_entry_deleted("u1", &sum.id, true),
        Err(VaultError::NotFound(_))
    ));

    access.set_entry_deleted("u1", &sum.id, false).unwrap();
    assert!(access.find_entry("u1", OWNER_CRED, &sum.id).is_ok());
}

#[test]
fn team_listing_requires_membership() {
    let (access, team_id) = setup();
    access.create_entry("u1", &team_id, "A", "", 0).unwrap();
    access.create_entry("u1", &team_id, "B", "", 0).unwrap();

    let sums = access.find_entries_by_team("u2", &team_id).unwrap();
    assert_eq!(sums.len(), 2);

    assert!(matches!(
        access.find_entries_by_team("u3", &team_id),
        Err(VaultError::Forbidden(_))
    ));
}

// ── Secrets ──────────────────────────────────────────────────────

#[test]
fn secret_roundtrips_for_members_only() {
    let (access, team_id) = setup();
    let sum = access.create_entry("u1", &team_id, "GitHub", "", 0).unwrap();

    let fields = SecretFields {
        name: "Login".into(),
        password: "mYPaSsWoRd".into(),
        ..Default::default()
    };
    let secret = access
        .create_secret("u1", OWNER_CRED, &sum.id, &fields)
        .unwrap();

    // Entry's secret list grew by one ID
    let result = access.find_entry("u1", OWNER_CRED, &sum.id).unwrap();
    assert_eq!(result.secrets.len(), 1);
    assert_eq!(result.secrets[0].id, secret.id);
    assert_eq!(result.secrets[0].password, "mYPaSsWoRd");

    // Another member reads it back with their own credential
    let result = access.find_entry("u2", MEMBER_CRED, &sum.id).unwrap();
    assert_eq!(result.secrets[0].password, "mYPaSsWoRd");

    // Non-member is rejected regardless of credential validity
    assert!(matches!(
        access.find_entry("u3", OWNER_CRED, &sum.id),
        Err(VaultError::Forbidden(_))
    ));
}

#[test]
fn wrong_credential_is_rejected_before_any_decryption() {
    let (access, team_id) = setup();
    let sum = access.create_entry("u1", &team_id, "GitHub", "", 0).unwrap();

    let result = access.find_entry("u1", "wrong-credential", &sum.id);
    assert!(matches!(result, Err(VaultError::InvalidCredential)));
}

#[test]
fn empty_secret_rejected() {
    let (access, team_id) = setup();
    let sum = access.create_entry("u1", &team_id, "GitHub", "", 0).unwrap();

    let result = access.create_secret("u1", OWNER_CRED, &sum.id, &SecretFields::default());
    assert!(matches!(result, Err(VaultError::EmptyUpdate)));
}

#[test]
fn unknown_secret_field_rejected_at_the_boundary() {
    let result = SecretPatch::from_json(json!({"color": "red"})).map_err(VaultError::from);
    assert!(matches!(result, Err(VaultError::InvalidProperty(_))));

    let result = SecretPatch::from_json(json!({})).map_err(VaultError::from);
    assert!(matches!(result, Err(VaultError::EmptyUpdate)));
}

#[test]
fn secret_update_persists_and_noops_on_same_value() {
    let (access, team_id) = setup();
    let sum = access.create_entry("u1", &team_id, "GitHub", "", 0).unwrap();
    let secret = access
        .create_secret(
            "u1",
            OWNER_CRED,
            &sum.id,
            &SecretFields { name: "Login".into(), password: "old".into(), ..Default::default() },
        )
        .unwrap();

    let patch = SecretPatch::from_json(json!({"password": "new"})).unwrap();
    let updated = access
        .update_secret("u1", OWNER_CRED, &sum.id, &secret.id, &patch)
        .unwrap();
    assert_eq!(updated.password, "new");
    assert_eq!(updated.name, "Login");

    // Same value again: current state comes back, nothing rewritten
    let again = access
        .update_secret("u1", OWNER_CRED, &sum.id, &secret.id, &patch)
        .unwrap();
    assert_eq!(again.password, "new");
    assert_eq!(again.updated, updated.updated);
}

#[test]
fn updating_a_secret_not_on_the_entry_fails() {
    let (access, team_id) = setup();
    let sum = access.create_entry("u1", &team_id, "GitHub", "", 0).unwrap();

    let patch = SecretPatch::from_json(json!({"name": "x"})).unwrap();
    let result = access.update_secret("u1", OWNER_CRED, &sum.id, "no-such-secret", &patch);
    assert!(matches!(result, Err(VaultError::NotFound(_))));
}

#[test]
fn delete_secret_removes_reference_and_record() {
    let (access, team_id) = setup();
    let sum = access.create_entry("u1", &team_id, "GitHub", "", 0).unwrap();
    let secret = access
        .create_secret(
            "u1",
            OWNER_CRED,
            &sum.id,
            &SecretFields { name: "Login".into(), ..Default::default() },
        )
        .unwrap();

    access.delete_secret("u1", &sum.id, &secret.id).unwrap();

    let result = access.find_entry("u1", OWNER_CRED, &sum.id).unwrap();
    assert_eq!(result.secrets.len(), 0);

    // Deleting again: the reference is already gone
    assert!(matches!(
        access.delete_secret("u1", &sum.id, &secret.id),
        Err(VaultError::NotFound(_))
    ));
}

// ── Team management ──────────────────────────────────────────────

#[test]
fn only_the_owner_can_add_members() {
    let (access, team_id) = setup();
    let result = access.add_member("u2", MEMBER_CRED, &team_id, "u3", "gamma");
    assert!(matches!(result, Err(VaultError::Forbidden(_))));
}

#[test]
fn adding_an_existing_member_fails() {
    let (access, team_id) = setup();
    let result = access.add_member("u1", OWNER_CRED, &team_id, "u2", MEMBER_CRED);
    assert!(matches!(result, Err(VaultError::InvalidProperty(_))));
}

#[test]
fn new_member_can_derive_the_team_key() {
    let (access, team_id) = setup();
    access
        .add_member("u1", OWNER_CRED, &team_id, "u3", "gamma-credential")
        .unwrap();
    let sum = access.create_entry("u3", &team_id, "Jira", "", 0).unwrap();
    assert!(access.find_entry("u3", "gamma-credential", &sum.id).is_ok());
}
