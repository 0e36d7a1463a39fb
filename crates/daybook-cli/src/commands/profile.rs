use daybook_core::{DbResult, ExitCode};
use daybook_fs::{
    init_workspace, list_profiles, load_config, resolve_workspace, run_doctor, save_config,
    set_active_profile,
};
use serde_json::json;

use crate::{GlobalOptions, ProfileCommand, print_json, workspace_target};

pub(crate) fn cmd_init(globals: &GlobalOptions) -> DbResult<ExitCode> {
    let target = workspace_target(globals)?;
    let result = init_workspace(Some(&target))?;

    if globals.json {
        print_json(&json!({
            "ok": true,
            "result": {
                "workspace": result.paths.root.display().to_string(),
                "created": result
                    .created
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>(),
            }
        }))?;
    } else {
        println!("Initialized workspace at {}.", result.paths.root.display());
        for path in &result.created {
            println!("  created {}", path.display());
        }
    }

    Ok(ExitCode::Success)
}

pub(crate) fn cmd_doctor(globals: &GlobalOptions) -> DbResult<ExitCode> {
    let target = workspace_target(globals)?;
    let paths = resolve_workspace(Some(&target))?;
    let report = run_doctor(&paths, globals.profile.as_deref())?;

    if globals.json {
        print_json(&json!({"ok": report.healthy, "result": report}))?;
    } else {
        println!("Workspace: {}", report.workspace);
        for check in &report.checks {
            let mark = if check.ok { "ok" } else { "FAIL" };
            println!("  [{mark}] {}: {}", check.name, check.details);
        }
    }

    Ok(if report.healthy {
        ExitCode::Success
    } else {
        ExitCode::Usage
    })
}

pub(crate) fn cmd_profile(command: ProfileCommand, globals: &GlobalOptions) -> DbResult<ExitCode> {
    let target = workspace_target(globals)?;
    if !target.join(".daybook").is_dir() {
        init_workspace(Some(&target))?;
    }
    let paths = resolve_workspace(Some(&target))?;

    match command {
        ProfileCommand::List => {
            let config = load_config(&paths)?;
            let profiles = list_profiles(&config);

            if globals.json {
                print_json(&json!({"ok": true, "result": profiles}))?;
            } else {
                for profile in profiles {
                    let marker = if profile.active { "*" } else { " " };
                    println!("{marker} {} (slot '{}')", profile.name, profile.queue_slot);
                }
            }

            Ok(ExitCode::Success)
        }
        ProfileCommand::Use { name } => {
            let mut config = load_config(&paths)?;
            set_active_profile(&mut config, &name)?;
            save_config(&paths, &config)?;

            if globals.json {
                print_json(&json!({"ok": true, "result": {"profile": name}}))?;
            } else {
                println!("Switched active profile to '{name}'.");
            }

            Ok(ExitCode::Success)
        }
    }
}
