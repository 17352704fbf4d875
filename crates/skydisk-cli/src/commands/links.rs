//! Link commands - short links, direct links and resolution.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use colored::Colorize;
use skydisk_drive::{DirectLink, Drive};

use super::{parse_entry_id, write_download};
use crate::theme::{Theme, format_size};

/// Create a short link.
pub(crate) async fn create(
    drive: &Drive,
    id: &str,
    ttl_secs: Option<u64>,
    code: Option<&str>,
) -> anyhow::Result<()> {
    let id = parse_entry_id(id)?;
    let grant = drive
        .create_short_link(id, ttl_secs.map(Duration::from_secs), code)
        .await?;
    println!("{}", Theme::success("Short link created"));
    println!("  {} {}", "url:".dimmed(), grant.url.bold());
    println!("  {} {}", "token:".dimmed(), grant.token);
    if let Some(code) = grant.access_code {
        println!("  {} {}", "code:".dimmed(), code);
    }
    match ttl_secs {
        Some(secs) if secs > 0 => println!("  {} {secs}s", "expires in:".dimmed()),
        _ => println!("  {} never", "expires:".dimmed()),
    }
    Ok(())
}

/// List every short link.
pub(crate) async fn list(drive: &Drive) -> anyhow::Result<()> {
    let links = drive.list_short_links().await?;
    if links.is_empty() {
        println!("{}", Theme::info("No short links"));
        return Ok(());
    }

    let now = Utc::now();
    println!("\n{}", Theme::header("Short Links"));
    println!(
        "{:<12} {:<36} {:<18} {}",
        "TOKEN".dimmed(),
        "FILE".dimmed(),
        "EXPIRES".dimmed(),
        "CODE".dimmed()
    );
    println!("{}", Theme::separator());
    for link in links {
        let expires = match link.expires_at {
            None => "never".to_owned(),
            Some(_) if link.is_expired_at(now) => "expired".red().to_string(),
            Some(at) => Theme::timestamp(&at),
        };
        let code = if link.requires_code() { "yes" } else { "no" };
        println!(
            "{:<12} {:<36} {:<18} {}",
            link.token,
            link.file_item_id.to_string(),
            expires,
            code
        );
    }
    println!();
    Ok(())
}

/// Negotiate a direct link.
pub(crate) async fn direct(drive: &Drive, id: &str, ttl_secs: Option<u64>) -> anyhow::Result<()> {
    let id = parse_entry_id(id)?;
    let link = drive
        .create_direct_link(id, ttl_secs.map(Duration::from_secs))
        .await?;
    let kind = match &link {
        DirectLink::Presigned(_) => "presigned URL",
        DirectLink::ShortLink { .. } => "short link",
        DirectLink::Download(_) => "download endpoint",
    };
    println!("{}", link.url());
    eprintln!("{}", Theme::dimmed(&format!("served by {kind}")));
    Ok(())
}

/// Resolve a token, optionally saving the file.
pub(crate) async fn resolve(
    drive: &Drive,
    token: &str,
    code: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let Some(path) = output else {
        let resolved = drive.resolve_short_link(token, code).await?;
        println!("{}", Theme::success("Link is valid"));
        println!("  {} {}", "file:".dimmed(), resolved.entry.full_path());
        println!("  {} {}", "id:".dimmed(), resolved.entry.id);
        println!("  {} {}", "source:".dimmed(), resolved.source.name);
        println!("  {} {}", "size:".dimmed(), format_size(resolved.entry.size));
        return Ok(());
    };

    let download = drive.open_short_link(token, code).await?;
    let filename = download.filename.clone();
    let written = write_download(download, Some(path)).await?;
    println!(
        "{}",
        Theme::success(&format!(
            "Saved {filename} ({}) to {}",
            format_size(written),
            path.display()
        ))
    );
    Ok(())
}

/// Purge expired links now.
pub(crate) async fn purge(drive: &Drive) -> anyhow::Result<()> {
    let removed = drive.purge_expired_links().await?;
    println!(
        "{}",
        Theme::success(&format!("Removed {removed} expired link(s)"))
    );
    Ok(())
}
