//! Share workflows: direct shares and whitelisted share links.
//!
//! Sharing re-wraps a note's file key for each recipient under a session
//! key agreed between a fresh ephemeral key pair and the recipient's
//! identity public key. Every envelope gets its own ephemeral pair, which is
//! dropped as soon as the envelope is sealed. Receiving runs the same
//! agreement from the other side with the identity private key.

use crate::api::Backend;
use crate::client::{DecryptedNote, NoteClient};
use crate::error::{ClientError, ClientResult};
use crate::keystore::KeyStore;
use sealnote_crypto::{decrypt_note, open_file_key, seal_file_key, unwrap_key, SealedFileKey, SymmetricKey};
use sealnote_types::protocol::{
    CreateShareLinkRequest, DirectShareCreated, DirectShareSummary, LinkEntry, ShareLinkCreated,
    ShareLinkSummary, ShareWithUserRequest,
};
use sealnote_types::{LinkToken, NoteId, ShareId, Username};
use tracing::{info, warn};

/// Result of [`NoteClient::create_share_link`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareLinkOutcome {
    pub link: ShareLinkCreated,
    /// Recipients left off the whitelist because they have no published key.
    pub skipped: Vec<Username>,
}

impl<B: Backend, K: KeyStore> NoteClient<B, K> {
    /// Unwraps the owner's file key for `note_id`.
    fn owned_file_key(&self, note_id: &NoteId) -> ClientResult<SymmetricKey> {
        let session = self.session()?;
        let record = self.backend.get_note(session.token(), note_id)?;
        Ok(unwrap_key(&record.wrapped_key, session.master_key().as_bytes())?)
    }

    pub fn share_with_user(
        &self,
        note_id: &NoteId,
        recipient: &Username,
        ttl_secs: i64,
    ) -> ClientResult<DirectShareCreated> {
        let session = self.session()?;
        let recipient_key = self.backend.get_public_key(recipient)?;
        let sealed = seal_file_key(&self.owned_file_key(note_id)?, &recipient_key)?;

        let created = self.backend.create_direct_share(
            session.token(),
            ShareWithUserRequest {
                note_id: *note_id,
                recipient: recipient.clone(),
                ephemeral_public_key: sealed.ephemeral_public_key,
                wrapped_key: sealed.wrapped_key,
                ttl_secs,
            },
        )?;
        info!(user = %session.username(), %note_id, %recipient, share_id = %created.share_id, "shared note");
        Ok(created)
    }

    /// Creates a link that only the listed users can open.
    ///
    /// Recipients without a published key are skipped and reported; fails
    /// with [`ClientError::NoRecipients`] if nobody is left. Duplicates are
    /// collapsed.
    pub fn create_share_link(
        &self,
        note_id: &NoteId,
        recipients: &[Username],
        ttl_secs: i64,
    ) -> ClientResult<ShareLinkOutcome> {
        let session = self.session()?;
        let file_key = self.owned_file_key(note_id)?;

        let mut entries: Vec<LinkEntry> = Vec::with_capacity(recipients.len());
        let mut skipped = Vec::new();
        for recipient in recipients {
            if entries.iter().any(|e| &e.username == recipient) || skipped.contains(recipient) {
                continue;
            }
            let public_key = match self.backend.get_public_key(recipient) {
                Ok(key) => key,
                Err(ClientError::NotFound) => {
                    warn!(%recipient, "no public key, leaving off share link");
                    skipped.push(recipient.clone());
                    continue;
                }
                Err(e) => return Err(e),
            };
            let sealed = seal_file_key(&file_key, &public_key)?;
            entries.push(LinkEntry {
                username: recipient.clone(),
                ephemeral_public_key: sealed.ephemeral_public_key,
                wrapped_key: sealed.wrapped_key,
            });
        }
        drop(file_key);
        if entries.is_empty() {
            return Err(ClientError::NoRecipients);
        }

        let recipient_count = entries.len();
        let link = self.backend.create_link(
            session.token(),
            CreateShareLinkRequest {
                note_id: *note_id,
                entries,
                ttl_secs,
            },
        )?;
        info!(
            user = %session.username(),
            %note_id,
            token = link.token.log_prefix(),
            recipients = recipient_count,
            skipped = skipped.len(),
            "created share link"
        );
        Ok(ShareLinkOutcome { link, skipped })
    }

    /// Opens a share link. Accepts the bare token or the full URL.
    pub fn access_share_link(&self, link: &str) -> ClientResult<DecryptedNote> {
        let token = LinkToken::from_link_or_token(link)?;
        let session = self.session()?;
        let identity = session.identity()?;

        let access = self.backend.resolve_link(session.token(), &token)?;
        let file_key = open_file_key(
            &SealedFileKey {
                ephemeral_public_key: access.ephemeral_public_key,
                wrapped_key: access.wrapped_key,
            },
            identity,
        )?;
        let content = decrypt_note(&access.ciphertext, &file_key, &access.iv)?;
        Ok(DecryptedNote {
            note_id: access.note_id,
            filename: access.filename,
            content,
        })
    }

    pub fn revoke_share_link(&self, link: &str) -> ClientResult<()> {
        let token = LinkToken::from_link_or_token(link)?;
        let session = self.session()?;
        self.backend.revoke_link(session.token(), &token)?;
        info!(user = %session.username(), token = token.log_prefix(), "revoked share link");
        Ok(())
    }

    pub fn list_shared_with_me(&self) -> ClientResult<Vec<DirectShareSummary>> {
        let session = self.session()?;
        self.backend.list_direct_shares(session.token())
    }

    /// Opens a note shared directly with this user.
    pub fn receive_shared_note(&self, share_id: &ShareId) -> ClientResult<DecryptedNote> {
        let session = self.session()?;
        let identity = session.identity()?;

        let shared = self.backend.resolve_direct_share(session.token(), share_id)?;
        let file_key = open_file_key(
            &SealedFileKey {
                ephemeral_public_key: shared.ephemeral_public_key,
                wrapped_key: shared.wrapped_key,
            },
            identity,
        )?;
        let content = decrypt_note(&shared.ciphertext, &file_key, &shared.iv)?;
        Ok(DecryptedNote {
            note_id: shared.note_id,
            filename: shared.filename,
            content,
        })
    }

    pub fn list_my_share_links(&self) -> ClientResult<Vec<ShareLinkSummary>> {
        let session = self.session()?;
        self.backend.list_links(session.token())
    }
}
