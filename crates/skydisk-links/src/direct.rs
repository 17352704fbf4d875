//! Direct-link negotiation.
//!
//! Tiers, first success wins:
//! 1. a presigned URL minted by the backend
//! 2. a short link, when the caller asked for a positive lifetime
//! 3. the authenticated download endpoint

use std::time::Duration;

use skydisk_backend::StorageBackend;
use skydisk_core::{CatalogEntry, DiskError, DiskResult, StorageSource};
use tracing::{debug, warn};

use crate::issuer::LinkIssuer;

/// The outcome of direct-link negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectLink {
    /// Backend presigned URL.
    Presigned(String),
    /// Short link created for the request.
    ShortLink {
        /// Public URL of the link.
        url: String,
        /// Token of the link.
        token: String,
    },
    /// Stable authenticated download endpoint.
    Download(String),
}

impl DirectLink {
    /// The URL to hand to the caller.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Presigned(url) | Self::Download(url) | Self::ShortLink { url, .. } => url,
        }
    }
}

impl LinkIssuer {
    /// Pick the best URL for reading `entry` directly.
    ///
    /// A presign failure is logged and the next tier is tried.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidTarget`] for directories, or the error of
    /// short-link creation when that tier is reached and fails.
    pub async fn direct_link(
        &self,
        entry: &CatalogEntry,
        source: &StorageSource,
        backend: &dyn StorageBackend,
        ttl: Option<Duration>,
    ) -> DiskResult<DirectLink> {
        if entry.is_directory {
            return Err(DiskError::InvalidTarget(format!(
                "'{}' is a directory and cannot be linked",
                entry.full_path()
            )));
        }

        match backend.presigned_url(source, entry, ttl).await {
            Ok(Some(url)) => {
                debug!(entry_id = %entry.id, "direct link served by presigned URL");
                return Ok(DirectLink::Presigned(url));
            },
            Ok(None) => {},
            Err(e) => warn!(
                entry_id = %entry.id,
                source_id = %source.id,
                error = %e,
                "presigned URL unavailable, falling back"
            ),
        }

        if ttl.is_some_and(|t| !t.is_zero()) {
            let link = self.create(entry, ttl, None).await?;
            debug!(entry_id = %entry.id, "direct link served by short link");
            return Ok(DirectLink::ShortLink {
                url: self.short_url(&link.token),
                token: link.token,
            });
        }

        Ok(DirectLink::Download(self.download_url(entry)))
    }
}
