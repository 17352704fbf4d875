//! Short link records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{EntryId, LinkId};

/// A token-addressed reference to a single file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    /// Record identity.
    pub id: LinkId,
    /// Unique URL-safe token.
    pub token: String,
    /// Target file. Never a directory.
    pub file_item_id: EntryId,
    /// Expiry instant, `None` for links that never expire.
    pub expires_at: Option<DateTime<Utc>>,
    /// Secret the caller must present, if any.
    pub access_code: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl ShortLink {
    /// Whether the link has expired as of `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Whether resolving the link requires an access code.
    #[must_use]
    pub fn requires_code(&self) -> bool {
        self.access_code.is_some()
    }
}

impl fmt::Debug for ShortLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortLink")
            .field("id", &self.id)
            .field("token", &self.token)
            .field("file_item_id", &self.file_item_id)
            .field("expires_at", &self.expires_at)
            .field("has_access_code", &self.access_code.is_some())
            .field("created_at", &self.created_at)
            .finish()
    }
}
