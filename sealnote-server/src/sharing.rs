//! Share handlers: direct shares and share links.
//!
//! The server only moves envelopes around. It checks ownership, lifetimes,
//! whitelists, and the shape of the keys it is handed; it never holds a key
//! that could open one.

use crate::auth::AuthenticatedUser;
use crate::error::{ServerError, ServerResult};
use crate::server::NoteServer;
use sealnote_crypto::{base64_decode, parse_public_key};
use sealnote_storage::{LinkEnvelope, NewDirectShare};
use sealnote_types::protocol::{
    CreateShareLinkRequest, DirectShareCreated, DirectShareList, DirectShareSummary, LinkAccess,
    SharedNote, ShareLinkCreated, ShareLinkList, ShareLinkSummary, ShareWithUserRequest,
};
use sealnote_types::{LinkToken, Response, ShareId, UserId, Username};

fn check_envelope(ephemeral_public_key: &str, wrapped_key: &str) -> ServerResult<()> {
    parse_public_key(ephemeral_public_key)
        .map_err(|_| ServerError::BadRequest("ephemeral key is not a P-256 point".into()))?;
    base64_decode(wrapped_key)
        .map_err(|_| ServerError::BadRequest("wrapped key is not base64".into()))?;
    Ok(())
}

impl NoteServer {
    fn check_ttl(&self, ttl_secs: i64) -> ServerResult<()> {
        if ttl_secs < 1 || ttl_secs > self.config.max_share_ttl_secs {
            return Err(ServerError::BadRequest(format!(
                "ttl must be between 1 and {} seconds",
                self.config.max_share_ttl_secs
            )));
        }
        Ok(())
    }

    fn require_user(&self, username: &Username) -> ServerResult<UserId> {
        self.store
            .find_user(username)?
            .map(|user| user.id)
            .ok_or(ServerError::NotFound)
    }

    pub(crate) fn share_with_user(
        &self,
        caller: &AuthenticatedUser,
        req: ShareWithUserRequest,
    ) -> ServerResult<Response> {
        self.check_ttl(req.ttl_secs)?;
        check_envelope(&req.ephemeral_public_key, &req.wrapped_key)?;
        let recipient_id = self.require_user(&req.recipient)?;

        let grant = self.store.create_direct_share(NewDirectShare {
            note_id: req.note_id,
            sender_id: caller.id,
            recipient_id,
            ephemeral_public_key: req.ephemeral_public_key,
            wrapped_key: req.wrapped_key,
            ttl_secs: req.ttl_secs,
        })?;
        Ok(Response::SharedWithUser(DirectShareCreated {
            share_id: grant.id,
            expires_at: grant.expires_at,
        }))
    }

    pub(crate) fn create_share_link(
        &self,
        caller: &AuthenticatedUser,
        req: CreateShareLinkRequest,
    ) -> ServerResult<Response> {
        self.check_ttl(req.ttl_secs)?;
        if req.entries.is_empty() {
            return Err(ServerError::BadRequest("share link needs at least one recipient".into()));
        }
        let mut entries = Vec::with_capacity(req.entries.len());
        for entry in req.entries {
            check_envelope(&entry.ephemeral_public_key, &entry.wrapped_key)?;
            self.require_user(&entry.username)?;
            entries.push(LinkEnvelope {
                username: entry.username,
                ephemeral_public_key: entry.ephemeral_public_key,
                wrapped_key: entry.wrapped_key,
            });
        }

        let grant = self
            .store
            .create_share_link(&req.note_id, &caller.id, &entries, req.ttl_secs)?;
        Ok(Response::ShareLinkCreated(ShareLinkCreated {
            url: self.config.share_url(&grant.token),
            token: grant.token,
            expires_at: grant.expires_at,
        }))
    }

    /// Missing, expired, and not-whitelisted are all `NotFound`.
    pub(crate) fn access_share_link(
        &self,
        caller: &AuthenticatedUser,
        token: &LinkToken,
    ) -> ServerResult<Response> {
        let resolved = self
            .store
            .resolve_share_link(token, &caller.username)?
            .ok_or(ServerError::NotFound)?;
        Ok(Response::ShareLinkAccess(LinkAccess {
            note_id: resolved.note.id,
            filename: resolved.note.filename,
            ciphertext: resolved.note.ciphertext,
            iv: resolved.note.iv,
            ephemeral_public_key: resolved.envelope.ephemeral_public_key,
            wrapped_key: resolved.envelope.wrapped_key,
        }))
    }

    pub(crate) fn list_shared_with_me(&self, caller: &AuthenticatedUser) -> ServerResult<Response> {
        let shares = self
            .store
            .list_direct_shares(&caller.id)?
            .into_iter()
            .map(|share| DirectShareSummary {
                share_id: share.id,
                note_id: share.note_id,
                sender: share.sender,
                expires_at: share.expires_at,
            })
            .collect();
        Ok(Response::SharedWithMe(DirectShareList { shares }))
    }

    pub(crate) fn get_shared_note(
        &self,
        caller: &AuthenticatedUser,
        share_id: &ShareId,
    ) -> ServerResult<Response> {
        let record = self
            .store
            .resolve_direct_share(share_id, &caller.id)?
            .ok_or(ServerError::NotFound)?;
        Ok(Response::SharedNote(SharedNote {
            share_id: record.share.id,
            note_id: record.note.id,
            sender: record.share.sender,
            filename: record.note.filename,
            ciphertext: record.note.ciphertext,
            iv: record.note.iv,
            ephemeral_public_key: record.share.ephemeral_public_key,
            wrapped_key: record.share.wrapped_key,
            expires_at: record.share.expires_at,
        }))
    }

    pub(crate) fn list_my_share_links(&self, caller: &AuthenticatedUser) -> ServerResult<Response> {
        let links = self
            .store
            .list_share_links(&caller.id)?
            .into_iter()
            .map(|link| ShareLinkSummary {
                token: link.token,
                note_id: link.note_id,
                expires_at: link.expires_at,
                shared_with: link.shared_with,
            })
            .collect();
        Ok(Response::MyShareLinks(ShareLinkList { links }))
    }
}
