//! Sources command - list configured storage sources.

use colored::Colorize;
use skydisk_drive::Drive;

use crate::theme::Theme;

/// List every storage source.
pub(crate) async fn list_sources(drive: &Drive) -> anyhow::Result<()> {
    let sources = drive.list_storage_sources().await?;
    if sources.is_empty() {
        println!("{}", Theme::info("No storage sources configured"));
        return Ok(());
    }

    println!("\n{}", Theme::header("Storage Sources"));
    println!(
        "{:<36} {:<14} {}",
        "ID".dimmed(),
        "TYPE".dimmed(),
        "NAME".dimmed()
    );
    println!("{}", Theme::separator());
    for source in sources {
        println!(
            "{:<36} {:<14} {}",
            source.id.to_string(),
            source.storage_type.to_string(),
            source.name.bold()
        );
    }
    println!();
    Ok(())
}
