//! SkyDisk Drive - the operation surface over every storage source.
//!
//! [`Drive`] ties the directory tree, the backend registry and the link
//! issuer together. Every public operation runs inside a request span that
//! records its outcome and duration.
//!
//! # Example
//!
//! ```rust,no_run
//! use skydisk_config::Config;
//! use skydisk_drive::Drive;
//!
//! # async fn run() -> Result<(), skydisk_core::DiskError> {
//! let config = Config::default();
//! let drive = Drive::bootstrap(&config).await?;
//! let local = drive.find_source("local-default").await?;
//! for entry in drive.browse(local.id, "").await? {
//!     println!("{}", entry.full_path());
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod bootstrap;
mod download;
mod drive;
mod purge;

pub use bootstrap::LOCAL_SOURCE_NAME;
pub use download::{Disposition, FileDownload, ShortLinkGrant};
pub use drive::Drive;
pub use purge::PurgeTask;
pub use skydisk_links::{DirectLink, ResolvedLink};
