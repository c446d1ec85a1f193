//! Index statistics and health overview.
//!
//! Reads the persisted artifact pair without rebuilding and prints what is
//! indexed. Used by `lctx stats` to check that a build happened and that the
//! pair on disk is consistent.

use anyhow::Result;

use legal_context_core::index::NearestNeighborIndex;

use crate::config::Config;
use crate::store::IndexStore;

/// Run the stats command: inspect the artifacts and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let store = IndexStore::from_config(&config.index);

    let index_size = std::fs::metadata(store.index_path())
        .map(|m| m.len())
        .unwrap_or(0);
    let fragments_size = std::fs::metadata(store.fragments_path())
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Legal Context: Index Stats");
    println!("==========================");
    println!();
    println!("  Corpus:      {}", config.corpus.root.display());
    println!(
        "  Index:       {} ({})",
        store.index_path().display(),
        format_bytes(index_size)
    );
    println!(
        "  Fragments:   {} ({})",
        store.fragments_path().display(),
        format_bytes(fragments_size)
    );
    println!();

    match store.load() {
        Ok(data) => {
            let total_chars: usize = data.fragments.iter().map(|f| f.chars().count()).sum();
            println!("  Status:      ok");
            println!("  Built:       {}", format_ts_relative(data.info.built_at.timestamp()));
            println!("  Documents:   {}", data.info.document_count);
            println!("  Fragments:   {}", data.fragments.len());
            println!("  Frag. size:  {}", data.info.fragment_size);
            println!("  Dimensions:  {}", data.index.dims());
            println!("  Characters:  {}", total_chars);
        }
        Err(reason) => {
            println!("  Status:      not built ({})", reason);
            println!("  Run `lctx build` to index the corpus.");
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_format_ts_relative_recent() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_ts_relative(now), "just now");
        assert_eq!(format_ts_relative(now - 7200), "2 hours ago");
    }
}
