use std::collections::HashMap;

use crate::config::Config;
use crate::constants::limits::MAX_AUDIT_PAGE_SIZE;
use crate::db::{AuditQuery, Store};

pub async fn cmd_audit(config: &Config, limit: u64) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let (entries, _) = store
        .audit()
        .query(&AuditQuery {
            page_size: limit.clamp(1, MAX_AUDIT_PAGE_SIZE),
            ..AuditQuery::default()
        })
        .await?;

    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }

    let usernames: HashMap<i32, String> = store
        .users()
        .list()
        .await?
        .into_iter()
        .map(|u| (u.id.value(), u.username))
        .collect();

    println!("Audit log (last {}):", entries.len());
    println!("{:-<70}", "");

    for entry in entries {
        let actor = entry.actor_id.map_or_else(
            || "system".to_string(),
            |id| {
                usernames
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| format!("deleted (ID: {id})"))
            },
        );
        println!(
            "• {} {} {}#{} by {}",
            entry.created_at, entry.action, entry.entity_type, entry.entity_id, actor
        );
        println!(
            "  {} | {}",
            entry.description,
            entry.source_address.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
