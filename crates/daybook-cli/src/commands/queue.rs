use daybook_core::{DaybookError, DbResult, ExitCode};
use serde_json::json;

use crate::{GlobalOptions, QueueCommand, print_json, with_workspace_context};

pub(crate) fn cmd_status(globals: &GlobalOptions) -> DbResult<ExitCode> {
    with_workspace_context(globals, |ctx| {
        let queue = ctx.queue.read_all();
        let oldest = queue.first().map(|op| op.enqueued_at.to_rfc3339());

        if globals.json {
            print_json(&json!({
                "ok": true,
                "result": {
                    "workspace": ctx.paths.root.display().to_string(),
                    "profile": ctx.profile,
                    "queue_slot": ctx.queue_slot,
                    "pending": queue.len(),
                    "oldest_enqueued_at": oldest,
                }
            }))?;
        } else {
            println!("Workspace: {}", ctx.paths.root.display());
            println!("Profile: {} (slot '{}')", ctx.profile, ctx.queue_slot);
            println!("Pending operations: {}", queue.len());
            println!(
                "Oldest enqueued: {}",
                oldest.unwrap_or_else(|| "none".to_string())
            );
        }

        Ok(ExitCode::Success)
    })
}

pub(crate) fn cmd_queue(command: QueueCommand, globals: &GlobalOptions) -> DbResult<ExitCode> {
    with_workspace_context(globals, |ctx| match command {
        QueueCommand::List => {
            let queue = ctx.queue.read_all();

            if globals.json {
                print_json(&json!({"ok": true, "result": queue}))?;
            } else if queue.is_empty() {
                println!("Queue is empty.");
            } else {
                for op in &queue {
                    println!(
                        "{} | {:?}/{:?} | retries {} | {}",
                        op.id,
                        op.domain,
                        op.action,
                        op.retry_count,
                        op.enqueued_at.to_rfc3339()
                    );
                }
            }

            Ok(ExitCode::Success)
        }
        QueueCommand::Count => {
            let count = ctx.queue.pending_count();

            if globals.json {
                print_json(&json!({"ok": true, "result": {"pending": count}}))?;
            } else {
                println!("{count}");
            }

            Ok(ExitCode::Success)
        }
        QueueCommand::Clear => {
            if !globals.yes {
                return Err(DaybookError::usage(
                    "queue clear drops pending offline changes; rerun with --yes",
                ));
            }

            let dropped = ctx.queue.pending_count();
            ctx.queue.clear()?;

            if globals.json {
                print_json(&json!({"ok": true, "result": {"dropped": dropped}}))?;
            } else {
                println!("Dropped {dropped} pending operations.");
            }

            Ok(ExitCode::Success)
        }
    })
}
