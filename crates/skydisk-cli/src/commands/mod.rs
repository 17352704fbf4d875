//! CLI command implementations.

pub(crate) mod config;
pub(crate) mod files;
pub(crate) mod links;
pub(crate) mod sources;

use anyhow::Context;
use skydisk_core::EntryId;
use skydisk_drive::FileDownload;
use std::path::Path;

/// Parse an entry id argument.
pub(crate) fn parse_entry_id(raw: &str) -> anyhow::Result<EntryId> {
    raw.parse()
        .with_context(|| format!("'{raw}' is not a valid entry id"))
}

/// Write a download to `output`, or to stdout when absent.
pub(crate) async fn write_download(
    mut download: FileDownload,
    output: Option<&Path>,
) -> anyhow::Result<u64> {
    let written = match output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("cannot create {}", path.display()))?;
            tokio::io::copy(&mut download.reader, &mut file).await?
        },
        None => {
            let mut stdout = tokio::io::stdout();
            let written = tokio::io::copy(&mut download.reader, &mut stdout).await?;
            tokio::io::AsyncWriteExt::flush(&mut stdout).await?;
            written
        },
    };
    Ok(written)
}
