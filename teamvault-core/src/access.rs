//! The entry-access orchestrator.
//!
//! Every operation is an independent call: resolve the entry, check
//! membership against its team, derive the working key when decryption is
//! needed, then touch the stores. Derived keys and plaintext never outlive
//! the call. The orchestrator is the only writer that mutates an entry's
//! child-ID sets, which keeps them consistent with the child stores.

use crate::config::VaultConfig;
use crate::error::{VaultError, VaultResult};
use crate::upload::{check_file_name, UploadPayload};
use std::io::Write;
use teamvault_crypto::{
    derive_scoped_key, generate_random_key, unwrap_key, wrap_key, CryptoError, DerivedKey,
    TokenSigner, KEY_SIZE,
};
use teamvault_model::{
    Entry, EntryPatch, EntryResult, EntrySum, FileMeta, SecretFields, SecretPatch, SecretResult,
    ShareResult, Team, User,
};
use teamvault_storage::Stores;
use tracing::debug;

/// Which stored reference a download request is scoped to.
pub enum DownloadRef {
    /// Avatar: `file_id` must equal the user's stored avatar ID.
    User { user_id: String },
    /// Logo: `file_id` must equal the team's stored logo ID.
    Team { team_id: String },
    /// Attachment: a valid signed token is the only way in without a
    /// session.
    Entry { entry_id: String, token: String },
}

pub struct EntryAccess {
    stores: Stores,
    signer: TokenSigner,
    surface_secret: [u8; KEY_SIZE],
    token_ttl_secs: i64,
}

impl EntryAccess {
    pub fn new(stores: Stores, config: VaultConfig) -> Self {
        Self {
            stores,
            signer: TokenSigner::new(config.token),
            surface_secret: config.surface_secret,
            token_ttl_secs: config.token_ttl_secs,
        }
    }

    // ── Users and teams ──────────────────────────────────────────

    pub fn create_user(&self, user_id: &str) -> VaultResult<User> {
        let user = User::new(user_id);
        self.stores.users.create(&user)?;
        Ok(user)
    }

    /// Creates a team with a fresh random team key, wrapped for the owner.
    pub fn create_team(&self, owner_id: &str, owner_credential: &str, name: &str) -> VaultResult<Team> {
        let team_key = generate_random_key();
        let wrapped = wrap_key(&team_key, owner_credential)
            .map_err(|e| VaultError::Internal(e.to_string()))?;
        let team = Team::new(name, owner_id, wrapped);
        self.stores.teams.create(&team)?;
        debug!(team_id = %team.id, "team created");
        Ok(team)
    }

    /// Adds a member. The owner presents their credential to unwrap the
    /// team key, which is then re-wrapped under the new member's
    /// credential.
    pub fn add_member(
        &self,
        owner_id: &str,
        owner_credential: &str,
        team_id: &str,
        member_id: &str,
        member_credential: &str,
    ) -> VaultResult<()> {
        let mut team = self.load_team(team_id)?;
        if !team.is_owner(owner_id) {
            return Err(VaultError::Forbidden("not the team owner".to_string()));
        }
        let team_key = self.derive_team_key(&team, owner_id, owner_credential)?;
        let wrapped = wrap_key(&team_key, member_credential)
            .map_err(|e| VaultError::Internal(e.to_string()))?;
        if !team.add_member(member_id, wrapped) {
            return Err(VaultError::InvalidProperty("already a member".to_string()));
        }
        team.updated = teamvault_model::now_ms();
        self.stores.teams.update(&team)?;
        debug!(team_id, member_id, "member added");
        Ok(())
    }

    // ── Entries ──────────────────────────────────────────────────

    pub fn create_entry(
        &self,
        user_id: &str,
        team_id: &str,
        name: &str,
        category: &str,
        priority: i32,
    ) -> VaultResult<EntrySum> {
        let team = self.load_team(team_id)?;
        self.check_member_write(&team, user_id)?;

        let entry = Entry::new(team_id, name, category, priority);
        self.stores.entries.create(&entry)?;
        debug!(entry_id = %entry.id, team_id, "entry created");
        Ok(entry.summary())
    }

    /// Resolves an entry with decrypted children. Each attachment carries a
    /// freshly signed download URL, so expired upload-time tokens are
    /// replaced on every read.
    pub fn find_entry(
        &self,
        user_id: &str,
        presented_key: &str,
        entry_id: &str,
    ) -> VaultResult<EntryResult> {
        let entry = self.load_entry_live(entry_id)?;
        let team = self.load_team(&entry.team_id)?;
        self.check_member(&team, user_id)?;
        let key = self.derive_team_key(&team, user_id, presented_key)?;

        // Empty ID lists short-circuit without touching the child stores
        let secrets = if entry.secrets.is_empty() {
            Vec::new()
        } else {
            self.stores.secrets.find_secrets(&key, &entry.secrets)?
        };
        let files = if entry.files.is_empty() {
            Vec::new()
        } else {
            self.find_file_metas(&key, &entry)?
        };
        let shares = entry
            .shares
            .iter()
            .map(|id| ShareResult { id: id.clone() })
            .collect();

        Ok(entry.result(secrets, files, shares))
    }

    pub fn find_entries_by_team(&self, user_id: &str, team_id: &str) -> VaultResult<Vec<EntrySum>> {
        let team = self.load_team(team_id)?;
        self.check_member(&team, user_id)?;
        let entries = self.stores.entries.find_by_team(team_id, false)?;
        Ok(entries.iter().map(Entry::summary).collect())
    }

    /// Applies a typed patch. `Ok(None)` when nothing changed value-wise —
    /// a no-op, not an error, and no persistence write happens.
    pub fn update_entry(
        &self,
        user_id: &str,
        entry_id: &str,
        patch: &EntryPatch,
    ) -> VaultResult<Option<EntrySum>> {
        let mut entry = self.load_entry_live(entry_id)?;
        let team = self.load_team(&entry.team_id)?;
        self.check_member_write(&team, user_id)?;

        if !patch.apply(&mut entry) {
            return Ok(None);
        }
        entry.updated = teamvault_model::now_ms();
        self.stores.entries.update(&entry)?;
        debug!(entry_id, "entry updated");
        Ok(Some(entry.summary()))
    }

    /// Soft delete (or restore, with `deleted = false`). Reversible.
    pub fn set_entry_deleted(
        &self,
        user_id: &str,
        entry_id: &str,
        deleted: bool,
    ) -> VaultResult<EntrySum> {
        let mut entry = self
            .stores
            .entries
            .find(entry_id)?
            .ok_or_else(|| VaultError::NotFound(format!("entry {entry_id}")))?;
        // Deleting requires a live entry, restoring a deleted one
        if entry.is_deleted == deleted {
            return Err(VaultError::NotFound(format!("entry {entry_id}")));
        }
        let team = self.load_team(&entry.team_id)?;
        self.check_member_write(&team, user_id)?;

        entry.is_deleted = deleted;
        entry.updated = teamvault_model::now_ms();
        self.stores.entries.update(&entry)?;
        debug!(entry_id, deleted, "entry soft-delete flag set");
        Ok(entry.summary())
    }

    // ── Secrets ──────────────────────────────────────────────────

    pub fn create_secret(
        &self,
        user_id: &str,
        presented_key: &str,
        entry_id: &str,
        fields: &SecretFields,
    ) -> VaultResult<SecretResult> {
        if fields.is_empty() {
            return Err(VaultError::EmptyUpdate);
        }
        let mut entry = self.load_entry_live(entry_id)?;
        let team = self.load_team(&entry.team_id)?;
        self.check_member_write(&team, user_id)?;
        let key = self.derive_team_key(&team, user_id, presented_key)?;

        let secret = self.stores.secrets.create(&key, fields)?;
        entry.add_secret(&secret.id);
        entry.updated = teamvault_model::now_ms();
        self.stores.entries.update(&entry)?;
        debug!(entry_id, secret_id = %secret.id, "secret created");
        Ok(secret)
    }

    /// Applies a typed patch to a secret. An unchanged patch skips the
    /// persistence write and returns the current state.
    pub fn update_secret(
        &self,
        user_id: &str,
        presented_key: &str,
        entry_id: &str,
        secret_id: &str,
        patch: &SecretPatch,
    ) -> VaultResult<SecretResult> {
        let entry = self.load_entry_live(entry_id)?;
        if !entry.has_secret(secret_id) {
            return Err(VaultError::NotFound(format!("secret {secret_id}")));
        }
        let team = self.load_team(&entry.team_id)?;
        self.check_member_write(&team, user_id)?;
        let key = self.derive_team_key(&team, user_id, presented_key)?;

        let current = self
            .stores
            .secrets
            .find_secret(&key, secret_id)?
            .ok_or_else(|| VaultError::NotFound(format!("secret {secret_id}")))?;

        let mut fields = SecretFields {
            name: current.name.clone(),
            url: current.url.clone(),
            password: current.password.clone(),
            note: current.note.clone(),
        };
        if !patch.apply(&mut fields) {
            return Ok(current);
        }
        let updated = self
            .stores
            .secrets
            .update(&key, secret_id, &fields, current.created)?;
        debug!(entry_id, secret_id, "secret updated");
        Ok(updated)
    }

    pub fn delete_secret(&self, user_id: &str, entry_id: &str, secret_id: &str) -> VaultResult<()> {
        let mut entry = self.load_entry_live(entry_id)?;
        let team = self.load_team(&entry.team_id)?;
        self.check_member_write(&team, user_id)?;

        if !entry.remove_secret(secret_id) {
            return Err(VaultError::NotFound(format!("secret {secret_id}")));
        }
        entry.updated = teamvault_model::now_ms();
        self.stores.entries.update(&entry)?;
        self.stores.secrets.delete(secret_id)?;
        debug!(entry_id, secret_id, "secret deleted");
        Ok(())
    }

    // ── Files ────────────────────────────────────────────────────

    /// Uploads an avatar for the user. Image extensions only; the blob is
    /// sealed under the user-scoped key so the anonymous download path can
    /// open it.
    pub fn upload_avatar(&self, user_id: &str, payload: UploadPayload) -> VaultResult<FileMeta> {
        let mut user = self
            .stores
            .users
            .find(user_id)?
            .ok_or_else(|| VaultError::NotFound(format!("user {user_id}")))?;

        let mut part = payload.first_part()?;
        check_file_name(&part.filename, true)?;

        let key = derive_scoped_key(&self.surface_secret, &["user", user_id]);
        let meta =
            self.stores
                .files
                .create(&key, &part.filename, &part.content_type, &mut part.content)?;

        user.avatar = Some(meta.id.clone());
        user.updated = teamvault_model::now_ms();
        self.stores.users.update(&user)?;
        debug!(user_id, file_id = %meta.id, "avatar uploaded");
        Ok(meta)
    }

    /// Uploads a team logo. Owner only.
    pub fn upload_logo(
        &self,
        user_id: &str,
        team_id: &str,
        payload: UploadPayload,
    ) -> VaultResult<FileMeta> {
        let mut team = self.load_team(team_id)?;
        if !team.is_owner(user_id) {
            return Err(VaultError::Forbidden("not the team owner".to_string()));
        }

        let mut part = payload.first_part()?;
        check_file_name(&part.filename, true)?;

        let key = derive_scoped_key(&self.surface_secret, &["team", team_id]);
        let meta =
            self.stores
                .files
                .create(&key, &part.filename, &part.content_type, &mut part.content)?;

        team.logo = Some(meta.id.clone());
        team.updated = teamvault_model::now_ms();
        self.stores.teams.update(&team)?;
        debug!(team_id, file_id = %meta.id, "logo uploaded");
        Ok(meta)
    }

    /// Uploads an entry attachment sealed under the team working key. The
    /// returned metadata carries a download URL embedding a signed token,
    /// which is the only way to fetch the attachment without a session.
    pub fn upload_attachment(
        &self,
        user_id: &str,
        presented_key: &str,
        entry_id: &str,
        payload: UploadPayload,
    ) -> VaultResult<FileMeta> {
        let mut entry = self.load_entry_live(entry_id)?;
        let team = self.load_team(&entry.team_id)?;
        self.check_member_write(&team, user_id)?;
        let key = self.derive_team_key(&team, user_id, presented_key)?;

        let mut part = payload.first_part()?;
        check_file_name(&part.filename, false)?;

        let mut meta =
            self.stores
                .files
                .create(&key, &part.filename, &part.content_type, &mut part.content)?;

        entry.add_file(&meta.id);
        entry.updated = teamvault_model::now_ms();
        self.stores.entries.update(&entry)?;

        meta.download_url = Some(self.attachment_url(&key, entry_id, &meta.id)?);
        debug!(entry_id, file_id = %meta.id, "attachment uploaded");
        Ok(meta)
    }

    /// Hard delete of an entry attachment: removes the entry's reference
    /// and the stored blob. Irreversible, unlike entry soft delete.
    pub fn delete_entry_file(
        &self,
        user_id: &str,
        entry_id: &str,
        file_id: &str,
    ) -> VaultResult<()> {
        let mut entry = self.load_entry_live(entry_id)?;
        let team = self.load_team(&entry.team_id)?;
        self.check_member_write(&team, user_id)?;

        if !entry.remove_file(file_id) {
            return Err(VaultError::NotFound(format!("file {file_id}")));
        }
        entry.updated = teamvault_model::now_ms();
        self.stores.entries.update(&entry)?;
        self.stores.files.delete(file_id)?;
        debug!(entry_id, file_id, "attachment deleted");
        Ok(())
    }

    /// Resolves a download request and streams the plaintext into `out`.
    pub fn download(
        &self,
        file_id: &str,
        reference: DownloadRef,
        out: &mut dyn Write,
    ) -> VaultResult<FileMeta> {
        let key = match reference {
            DownloadRef::User { user_id } => {
                let user = self
                    .stores
                    .users
                    .find(&user_id)?
                    .ok_or_else(|| VaultError::NotFound(format!("user {user_id}")))?;
                if user.avatar.as_deref() != Some(file_id) {
                    return Err(VaultError::NotFound("not the stored avatar".to_string()));
                }
                derive_scoped_key(&self.surface_secret, &["user", &user_id])
            }
            DownloadRef::Team { team_id } => {
                let team = self.load_team(&team_id)?;
                if team.logo.as_deref() != Some(file_id) {
                    return Err(VaultError::NotFound("not the stored logo".to_string()));
                }
                derive_scoped_key(&self.surface_secret, &["team", &team_id])
            }
            DownloadRef::Entry { entry_id, token } => {
                let key = self.signer.verify(file_id, &token)?;
                let entry = self.load_entry_live(&entry_id)?;
                if !entry.has_file(file_id) {
                    return Err(VaultError::NotFound(format!("file {file_id}")));
                }
                key
            }
        };

        self.stores
            .files
            .read_to(&key, file_id, out)?
            .ok_or_else(|| VaultError::NotFound(format!("file {file_id}")))
    }

    // ── Internal checks ──────────────────────────────────────────

    fn load_team(&self, team_id: &str) -> VaultResult<Team> {
        self.stores
            .teams
            .find(team_id)?
            .ok_or_else(|| VaultError::NotFound(format!("team {team_id}")))
    }

    /// Resolves a live (not soft-deleted) entry.
    fn load_entry_live(&self, entry_id: &str) -> VaultResult<Entry> {
        let entry = self
            .stores
            .entries
            .find(entry_id)?
            .ok_or_else(|| VaultError::NotFound(format!("entry {entry_id}")))?;
        if entry.is_deleted {
            return Err(VaultError::NotFound(format!("entry {entry_id}")));
        }
        Ok(entry)
    }

    /// Read-level membership check.
    fn check_member(&self, team: &Team, user_id: &str) -> VaultResult<()> {
        if team.is_member(user_id) {
            Ok(())
        } else {
            Err(VaultError::Forbidden(format!(
                "user {user_id} is not a member of team {}",
                team.id
            )))
        }
    }

    /// Write-level membership check. The same test as [`Self::check_member`]
    /// today; kept separate so policy can diverge.
    fn check_member_write(&self, team: &Team, user_id: &str) -> VaultResult<()> {
        self.check_member(team, user_id)
    }

    /// Derives the team working key from a member's presented credential.
    fn derive_team_key(
        &self,
        team: &Team,
        user_id: &str,
        presented_key: &str,
    ) -> VaultResult<DerivedKey> {
        self.check_member(team, user_id)?;
        let wrapped = team.wrapped_keys.get(user_id).ok_or_else(|| {
            VaultError::Forbidden(format!("no wrapped key for user {user_id}"))
        })?;
        unwrap_key(wrapped, presented_key).map_err(|e| match e {
            CryptoError::Decryption(_) | CryptoError::InvalidKeyLength { .. } => {
                VaultError::InvalidCredential
            }
            other => VaultError::Internal(other.to_string()),
        })
    }

    /// Signs a download URL for an attachment, valid for the configured
    /// token lifetime.
    fn attachment_url(
        &self,
        key: &DerivedKey,
        entry_id: &str,
        file_id: &str,
    ) -> VaultResult<String> {
        let expires_at = chrono::Utc::now().timestamp() + self.token_ttl_secs;
        let token = self
            .signer
            .sign(file_id, key, expires_at)
            .map_err(|e| VaultError::Internal(e.to_string()))?;
        Ok(format!(
            "/download/{file_id}?refType=entry&refID={entry_id}&signed={token}"
        ))
    }

    /// Metadata for an entry's attachments, each carrying a freshly signed
    /// download URL. Absent IDs are treated as absent.
    fn find_file_metas(&self, key: &DerivedKey, entry: &Entry) -> VaultResult<Vec<FileMeta>> {
        let mut metas = Vec::with_capacity(entry.files.len());
        for id in &entry.files {
            if let Some(mut meta) = self.stores.files.meta(id)? {
                meta.download_url = Some(self.attachment_url(key, &entry.id, id)?);
                metas.push(meta);
            }
        }
        Ok(metas)
    }
}
