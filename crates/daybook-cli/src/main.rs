mod commands;

use clap::{Parser, Subcommand};
use daybook_core::{DaybookError, DbResult, ExitCode};
use daybook_crypto::Codec;
use daybook_fs::{
    WorkspacePaths, init_workspace, load_config, resolve_profile, resolve_workspace,
};
use daybook_queue::{QueueStore, SqliteSlot};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "daybook",
    version,
    about = "Workspace tool for the daybook offline queue",
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, global = true)]
    profile: Option<String>,

    #[arg(long, global = true, value_name = "PATH")]
    workspace: Option<PathBuf>,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    no_color: bool,

    #[arg(long, global = true)]
    debug: bool,

    #[arg(long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Init,
    Doctor,
    Status,
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    Queue {
        #[command(subcommand)]
        command: QueueCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ProfileCommand {
    List,
    Use { name: String },
}

#[derive(Debug, Subcommand)]
enum QueueCommand {
    List,
    Count,
    Clear,
}

#[derive(Debug, Clone)]
struct GlobalOptions {
    profile: Option<String>,
    workspace: Option<PathBuf>,
    json: bool,
    yes: bool,
}

#[derive(Debug)]
struct WorkspaceContext {
    paths: WorkspacePaths,
    profile: String,
    queue_slot: String,
    queue: QueueStore<SqliteSlot>,
}

fn main() {
    let cli = Cli::parse();
    configure_logging(cli.debug, cli.json, cli.no_color);

    let globals = GlobalOptions {
        profile: cli.profile,
        workspace: cli.workspace,
        json: cli.json,
        yes: cli.yes,
    };

    let result = run_command(cli.command, &globals);

    let exit = match result {
        Ok(code) => code,
        Err(error) => {
            render_error(&error, globals.json);
            error.exit_code()
        }
    };

    std::process::exit(exit.as_i32());
}

fn configure_logging(debug: bool, json: bool, no_color: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_ansi(!no_color)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn run_command(command: Command, globals: &GlobalOptions) -> DbResult<ExitCode> {
    match command {
        Command::Init => commands::profile::cmd_init(globals),
        Command::Doctor => commands::profile::cmd_doctor(globals),
        Command::Status => commands::queue::cmd_status(globals),
        Command::Profile { command } => commands::profile::cmd_profile(command, globals),
        Command::Queue { command } => commands::queue::cmd_queue(command, globals),
    }
}

fn with_workspace_context<F>(globals: &GlobalOptions, run: F) -> DbResult<ExitCode>
where
    F: FnOnce(WorkspaceContext) -> DbResult<ExitCode>,
{
    let target = workspace_target(globals)?;
    if !target.join(".daybook").is_dir() {
        init_workspace(Some(&target))?;
    }

    let paths = resolve_workspace(Some(&target))?;
    let config = load_config(&paths)?;
    let resolved = resolve_profile(&config, globals.profile.as_deref())?;

    let slot = SqliteSlot::open(&paths.state_db_path, &resolved.queue_slot)?;
    let queue = QueueStore::new(slot, Codec::from_environment());

    run(WorkspaceContext {
        paths,
        profile: resolved.name,
        queue_slot: resolved.queue_slot,
        queue,
    })
}

fn workspace_target(globals: &GlobalOptions) -> DbResult<PathBuf> {
    if let Some(path) = &globals.workspace {
        return absolutize(path);
    }

    std::env::current_dir().map_err(|err| {
        DaybookError::io(format!(
            "failed to resolve current directory for default workspace: {err}"
        ))
    })
}

fn absolutize(path: &Path) -> DbResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let cwd = std::env::current_dir().map_err(|err| {
        DaybookError::io(format!(
            "failed to resolve current directory for path: {err}"
        ))
    })?;

    Ok(cwd.join(path))
}

fn render_error(error: &DaybookError, json_output: bool) {
    if json_output {
        let payload = json!({
            "ok": false,
            "error": {
                "kind": error.kind,
                "message": &error.message,
            }
        });
        let serialized = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| {
            "{\"ok\":false,\"error\":{\"kind\":\"io\",\"message\":\"failed to serialize error\"}}"
                .to_string()
        });
        eprintln!("{serialized}");
    } else {
        eprintln!("error: {}", error.message);
    }
}

fn print_json<T: Serialize>(value: &T) -> DbResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| DaybookError::io(format!("failed to render JSON output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
