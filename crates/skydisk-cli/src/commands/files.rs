//! File and directory commands.

use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use skydisk_core::{CatalogEntry, SourceId};
use skydisk_drive::Drive;

use super::{parse_entry_id, write_download};
use crate::theme::{Theme, format_size};

fn print_entries(title: &str, entries: &[CatalogEntry]) {
    if entries.is_empty() {
        println!("{}", Theme::info("Nothing here"));
        return;
    }
    println!("\n{}", Theme::header(title));
    println!(
        "{:<36} {:>10} {:<16} {}",
        "ID".dimmed(),
        "SIZE".dimmed(),
        "CREATED".dimmed(),
        "PATH".dimmed()
    );
    println!("{}", Theme::separator());
    for entry in entries {
        let (size, path) = if entry.is_directory {
            ("-".to_owned(), format!("{}/", entry.full_path()).blue().bold().to_string())
        } else {
            (format_size(entry.size), entry.full_path())
        };
        println!(
            "{:<36} {:>10} {:<16} {}",
            entry.id.to_string(),
            size,
            Theme::timestamp(&entry.created_at),
            path
        );
    }
    println!();
}

/// Upload a local file.
pub(crate) async fn upload(
    drive: &Drive,
    source: &str,
    file: &Path,
    directory: &str,
    name: Option<&str>,
    content_type: Option<&str>,
) -> anyhow::Result<()> {
    let source = drive.find_source(source).await?;
    let filename = match name {
        Some(name) => name.to_owned(),
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", file.display()))?,
    };
    let handle = tokio::fs::File::open(file)
        .await
        .with_context(|| format!("cannot open {}", file.display()))?;
    let size = handle.metadata().await?.len();

    let entry = drive
        .upload(
            source.id,
            directory,
            &filename,
            content_type,
            Some(size),
            Box::pin(handle),
        )
        .await?;
    println!(
        "{}",
        Theme::success(&format!(
            "Uploaded {} ({}) to {}",
            entry.full_path(),
            format_size(entry.size),
            source.name
        ))
    );
    println!("{}", Theme::dimmed(&format!("id: {}", entry.id)));
    Ok(())
}

/// List one directory.
pub(crate) async fn browse(drive: &Drive, source: &str, directory: &str) -> anyhow::Result<()> {
    let source = drive.find_source(source).await?;
    let entries = drive.browse(source.id, directory).await?;
    let title = if directory.trim_matches('/').is_empty() {
        format!("{}:/", source.name)
    } else {
        format!("{}:/{}", source.name, directory.trim_matches('/'))
    };
    print_entries(&title, &entries);
    Ok(())
}

/// List every entry of one or all sources.
pub(crate) async fn list_files(drive: &Drive, source: Option<&str>) -> anyhow::Result<()> {
    let source_id: Option<SourceId> = match source {
        Some(reference) => Some(drive.find_source(reference).await?.id),
        None => None,
    };
    let entries = drive.list_files(source_id).await?;
    print_entries("Files", &entries);
    Ok(())
}

/// Create a directory.
pub(crate) async fn mkdir(drive: &Drive, source: &str, path: &str) -> anyhow::Result<()> {
    let source = drive.find_source(source).await?;
    let entry = drive.create_directory(source.id, path).await?;
    println!(
        "{}",
        Theme::success(&format!("Created {}:/{}", source.name, entry.full_path()))
    );
    Ok(())
}

/// Download or preview a file.
pub(crate) async fn get(
    drive: &Drive,
    id: &str,
    output: Option<&Path>,
    inline: bool,
) -> anyhow::Result<()> {
    let id = parse_entry_id(id)?;
    let download = if inline {
        drive.preview(id).await?
    } else {
        drive.download(id).await?
    };
    let filename = download.filename.clone();
    let content_type = download.content_type.clone();
    let written = write_download(download, output).await?;
    if let Some(path) = output {
        println!(
            "{}",
            Theme::success(&format!(
                "Saved {filename} ({content_type}, {}) to {}",
                format_size(written),
                path.display()
            ))
        );
    }
    Ok(())
}

/// Rename an entry.
pub(crate) async fn rename(drive: &Drive, id: &str, name: &str) -> anyhow::Result<()> {
    let id = parse_entry_id(id)?;
    let entry = drive.rename(id, name).await?;
    println!("{}", Theme::success(&format!("Renamed to {}", entry.full_path())));
    Ok(())
}

/// Delete an entry.
pub(crate) async fn remove(drive: &Drive, id: &str) -> anyhow::Result<()> {
    let id = parse_entry_id(id)?;
    let entry = drive.tree().entry(id).await?;
    drive.delete(id).await?;
    let what = if entry.is_directory { "directory" } else { "file" };
    println!(
        "{}",
        Theme::success(&format!("Deleted {what} {}", entry.full_path()))
    );
    Ok(())
}
