//! Short-link creation and resolution.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use skydisk_catalog::CatalogStore;
use skydisk_core::{CatalogEntry, DiskError, DiskResult, LinkId, ShortLink, StorageSource};
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use crate::token::generate_token;

/// A short link that passed every check, with what it points at.
#[derive(Debug, Clone)]
pub struct ResolvedLink {
    /// The link record.
    pub link: ShortLink,
    /// Target file.
    pub entry: CatalogEntry,
    /// Source holding the file.
    pub source: StorageSource,
}

/// Issues and resolves short links.
#[derive(Clone)]
pub struct LinkIssuer {
    catalog: Arc<dyn CatalogStore>,
    public_base_url: String,
}

impl std::fmt::Debug for LinkIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkIssuer")
            .field("public_base_url", &self.public_base_url)
            .finish_non_exhaustive()
    }
}

fn expiry(now: DateTime<Utc>, ttl: Option<Duration>) -> DiskResult<Option<DateTime<Utc>>> {
    let Some(ttl) = ttl.filter(|t| !t.is_zero()) else {
        return Ok(None);
    };
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .map(Some)
        .ok_or_else(|| {
            DiskError::InvalidArgument(format!("link lifetime {ttl:?} is out of range"))
        })
}

impl LinkIssuer {
    /// Create an issuer whose URLs start with `public_base_url`.
    ///
    /// An empty base yields host-relative URLs.
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogStore>, public_base_url: impl Into<String>) -> Self {
        let base: String = public_base_url.into();
        Self {
            catalog,
            public_base_url: base.trim().trim_end_matches('/').to_owned(),
        }
    }

    /// Public URL of a short-link token.
    #[must_use]
    pub fn short_url(&self, token: &str) -> String {
        format!("{}/s/{token}", self.public_base_url)
    }

    /// Authenticated download URL of an entry.
    #[must_use]
    pub fn download_url(&self, entry: &CatalogEntry) -> String {
        format!("{}/api/files/{}/download", self.public_base_url, entry.id)
    }

    /// Create a short link to `file`.
    ///
    /// A missing or zero `ttl` creates a link that never expires. A blank
    /// access code is treated as none; any other code is stored as given.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::InvalidTarget`] for directories,
    /// [`DiskError::InvalidArgument`] for a lifetime too large to represent
    /// and [`DiskError::Conflict`] on a token collision.
    pub async fn create(
        &self,
        file: &CatalogEntry,
        ttl: Option<Duration>,
        access_code: Option<&str>,
    ) -> DiskResult<ShortLink> {
        if file.is_directory {
            return Err(DiskError::InvalidTarget(format!(
                "'{}' is a directory and cannot be linked",
                file.full_path()
            )));
        }
        let now = Utc::now();
        let link = ShortLink {
            id: LinkId::new(),
            token: generate_token(),
            file_item_id: file.id,
            expires_at: expiry(now, ttl)?,
            access_code: access_code
                .filter(|c| !c.trim().is_empty())
                .map(str::to_owned),
            created_at: now,
        };
        let link = self.catalog.insert_link(link).await?;
        info!(
            entry_id = %file.id,
            expires_at = ?link.expires_at,
            protected = link.requires_code(),
            "created short link"
        );
        Ok(link)
    }

    /// Resolve `token`, checking expiry and access code.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::NotFound`] for an unknown token or a dangling
    /// target, [`DiskError::Expired`] past the expiry and
    /// [`DiskError::AccessDenied`] for a missing or wrong code.
    pub async fn resolve(&self, token: &str, access_code: Option<&str>) -> DiskResult<ResolvedLink> {
        let token = token.trim();
        let link = self
            .catalog
            .find_link_by_token(token)
            .await?
            .ok_or_else(|| DiskError::NotFound(format!("short link '{token}'")))?;

        if link.is_expired_at(Utc::now()) {
            return Err(DiskError::Expired {
                token: link.token,
            });
        }
        if let Some(expected) = &link.access_code {
            let supplied = access_code.unwrap_or_default();
            if !bool::from(expected.as_bytes().ct_eq(supplied.as_bytes())) {
                debug!(token = %link.token, "short link access code rejected");
                return Err(DiskError::AccessDenied {
                    token: link.token,
                });
            }
        }

        let entry = self
            .catalog
            .get_entry(link.file_item_id)
            .await?
            .ok_or_else(|| DiskError::NotFound(format!("target of short link '{token}'")))?;
        let source = self
            .catalog
            .get_source(entry.storage_source_id)
            .await?
            .ok_or_else(|| DiskError::NotFound(format!("storage source {}", entry.storage_source_id)))?;
        Ok(ResolvedLink {
            link,
            entry,
            source,
        })
    }

    /// Remove links whose expiry has passed. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::Catalog`] if the catalog fails.
    pub async fn cleanup_expired(&self) -> DiskResult<u64> {
        let removed = self.catalog.delete_expired_links(Utc::now()).await?;
        if removed > 0 {
            info!(removed, "purged expired short links");
        }
        Ok(removed)
    }

    /// Every link, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::Catalog`] if the catalog fails.
    pub async fn list(&self) -> DiskResult<Vec<ShortLink>> {
        Ok(self.catalog.list_links().await?)
    }
}
