use anyhow::Context;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use crate::config::Config;
use crate::db::Store;
use crate::services::{ReportFilter, write_csv};

/// Reads straight from the store, without an actor check.
pub async fn cmd_report(
    config: &Config,
    filter: &ReportFilter,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let query = filter.to_query()?;
    let store = Store::new(&config.general.database_path).await?;
    let rows = store.visits().query(&query).await?;

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_csv(&rows, BufWriter::new(file))?;
            eprintln!("✓ {} visits written to {}", rows.len(), path.display());
        }
        None => write_csv(&rows, io::stdout().lock())?,
    }

    Ok(())
}
