//! CLI command implementations.

use std::path::Path;
use std::rc::Rc;

use crate::panel::{export_file_name, format_relative, ControlPanel};
use crate::store::FileStore;
use crate::types::{now, BlockError, BlockResult, BlockedUser};

async fn open(store_path: &Path) -> BlockResult<ControlPanel> {
    ControlPanel::load(Rc::new(FileStore::new(store_path))).await
}

fn user_json(user: &BlockedUser) -> serde_json::Value {
    serde_json::json!({
        "username": user.display_username,
        "canonical": user.canonical_username,
        "identity": user.identity_hint,
        "blocked_at": user.blocked_at.to_rfc3339(),
        "method": user.method.name(),
    })
}

/// List blocked users, most recent first.
pub async fn cmd_list(store_path: &Path, search: Option<&str>, json: bool) -> BlockResult<()> {
    let panel = open(store_path).await?;
    let query = search.unwrap_or("");
    let users = panel.filtered(query);

    if json {
        let list: Vec<serde_json::Value> = users.iter().map(|u| user_json(u)).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&list).unwrap_or_default()
        );
        return Ok(());
    }

    if users.is_empty() {
        if query.is_empty() {
            println!("No blocked users yet");
        } else {
            println!("No users found matching your search");
        }
        return Ok(());
    }
    let now = now();
    for user in users {
        println!(
            "@{:<24} {:>12}  {}",
            user.display_username,
            format_relative(user.blocked_at, now),
            user.method.name()
        );
    }
    Ok(())
}

/// Block a user by handle.
pub async fn cmd_block(
    store_path: &Path,
    username: &str,
    identity: Option<&str>,
    json: bool,
) -> BlockResult<()> {
    let mut panel = open(store_path).await?;
    let added = panel.block(username, identity).await?;

    if json {
        println!("{}", serde_json::json!({"username": username, "added": added}));
    } else if added {
        println!("Blocked @{}", username);
    } else {
        println!("@{} is already blocked", username);
    }
    Ok(())
}

/// Unblock a user by handle.
pub async fn cmd_unblock(store_path: &Path, username: &str, json: bool) -> BlockResult<()> {
    let mut panel = open(store_path).await?;
    if !panel.unblock(username).await? {
        return Err(BlockError::NotFound(username.to_string()));
    }

    if json {
        println!("{}", serde_json::json!({"username": username, "removed": true}));
    } else {
        println!("Unblocked @{}", username);
    }
    Ok(())
}

/// Unblock everyone. Requires explicit confirmation.
pub async fn cmd_clear(store_path: &Path, confirmed: bool, json: bool) -> BlockResult<()> {
    if !confirmed {
        return Err(BlockError::InvalidArgument(
            "refusing to unblock all users without --yes; this cannot be undone".to_string(),
        ));
    }
    let mut panel = open(store_path).await?;
    let removed = panel.clear_all().await?;

    if json {
        println!("{}", serde_json::json!({"removed": removed}));
    } else {
        println!("Unblocked {} users", removed);
    }
    Ok(())
}

/// Export the block list, to a file or stdout.
pub async fn cmd_export(store_path: &Path, out: Option<&Path>, pretty: bool) -> BlockResult<()> {
    let panel = open(store_path).await?;
    let now = now();
    let text = panel.export(now).to_json(pretty || out.is_some())?;

    match out {
        Some(out) => {
            let target = if out.is_dir() {
                out.join(export_file_name(now))
            } else {
                out.to_path_buf()
            };
            std::fs::write(&target, text)?;
            eprintln!(
                "Exported {} blocked users to {}",
                panel.users().len(),
                target.display()
            );
        }
        None => println!("{}", text),
    }
    Ok(())
}

/// Merge an export file into the block list.
pub async fn cmd_import(store_path: &Path, file: &Path, json: bool) -> BlockResult<()> {
    let text = std::fs::read_to_string(file)?;
    let mut panel = open(store_path).await?;
    let report = panel.import(&text).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"accepted": report.accepted, "skipped": report.skipped})
        );
    } else if report.accepted == 0 {
        println!("No new users to import");
    } else {
        println!(
            "Successfully imported {} new blocked users",
            report.accepted
        );
    }
    Ok(())
}

/// Show or change the config record.
pub async fn cmd_config(
    store_path: &Path,
    mode: Option<&str>,
    buttons: Option<&str>,
    json: bool,
) -> BlockResult<()> {
    let mut panel = open(store_path).await?;
    if mode.is_some() || buttons.is_some() {
        let config = panel.config().with_overrides(mode, buttons)?;
        panel.set_config(config).await?;
    }
    let config = panel.config();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&config).unwrap_or_default()
        );
    } else {
        println!("Block mode: {}", config.block_mode.name());
        println!("Button visibility: {}", config.button_visibility.name());
    }
    Ok(())
}

/// Show summary figures.
pub async fn cmd_stats(store_path: &Path, json: bool) -> BlockResult<()> {
    let panel = open(store_path).await?;
    let stats = panel.stats();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "blocked": stats.blocked,
                "hidden_estimate": stats.hidden_estimate,
                "store": store_path.display().to_string(),
            })
        );
    } else {
        println!("Store: {}", store_path.display());
        println!("Blocked users: {}", stats.blocked);
        println!("Items hidden (estimate): {}", stats.hidden_estimate);
    }
    Ok(())
}
