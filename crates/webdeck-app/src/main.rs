mod cli;
mod clipboard;
mod config;
mod install;
mod shell;

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use webdeck_common::AppId;
use webdeck_host::{FrameHost, HeadlessFactory, LoadState};
use webdeck_store::{open_default_storage, FileStorage, ShellStore, StorageBackend};
use webdeck_update::{NoopWorkerControl, UpdateCoordinator};

use cli::Command;
use shell::Shell;

type CliShell = Shell<HeadlessFactory, NoopWorkerControl>;

fn main() {
    let args = cli::parse();
    let settings = config::load_settings();

    let log_directive = args
        .log_level
        .clone()
        .unwrap_or_else(|| settings.log_filter.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "webdeck=info".parse().unwrap()),
            ),
        )
        .init();

    let backend: Box<dyn StorageBackend> = match &args.data_dir {
        Some(dir) => match FileStorage::at(dir) {
            Ok(storage) => Box::new(storage),
            Err(e) => {
                eprintln!("error: cannot open data dir: {e}");
                std::process::exit(1);
            }
        },
        None => open_default_storage(),
    };

    let store = ShellStore::load(backend);
    let host = FrameHost::new(HeadlessFactory::new())
        .with_timeout(Duration::from_secs(settings.blocked_timeout_secs));
    let update = UpdateCoordinator::new(NoopWorkerControl);
    let mut shell = Shell::new(store, host, update)
        .with_clipboard_limit(settings.clipboard_history_limit);

    if let Err(e) = run(&mut shell, args.command) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(shell: &mut CliShell, command: Command) -> webdeck_common::Result<()> {
    match command {
        Command::Add { url, name, icon } => {
            let id = shell.register_app(name.as_deref(), &url, icon)?;
            if let Some(app) = shell.store().get_app(&id) {
                println!("added {} ({})", app.name, id);
            }
        }
        Command::List => {
            if shell.store().apps().is_empty() {
                println!("no apps registered");
            }
            for app in shell.store().apps() {
                let open = if shell.store().open_apps().contains(&app.id) {
                    " [open]"
                } else {
                    ""
                };
                println!("{}  {}  {}{}", app.id, app.name, app.url, open);
            }
        }
        Command::Open { app } => {
            let id = resolve(shell, &app)?;
            shell.open_app(&id)?;
            println!("active: {}", describe(shell, &id));
        }
        Command::Close { app } => {
            let id = resolve(shell, &app)?;
            shell.close_app(&id);
            match shell.store().active() {
                Some(active) => println!("active: {}", describe(shell, &active.clone())),
                None => println!("no active app"),
            }
        }
        Command::Home => {
            shell.go_home();
            println!("home");
        }
        Command::Zoom { app, factor } => {
            let id = resolve(shell, &app)?;
            shell.set_zoom(&id, factor);
            println!("zoom: {:.0}%", shell.store().get_zoom(&id) * 100.0);
        }
        Command::Remove { app } => {
            let id = resolve(shell, &app)?;
            shell.delete_app(&id);
            println!("removed {id}");
        }
        Command::Limit { n } => {
            shell.set_lru_limit(n);
            println!("open-app limit: {}", shell.store().lru_limit());
        }
        Command::Reload { app } => {
            let id = match app {
                Some(token) => Some(resolve(shell, &token)?),
                None => None,
            };
            shell.reload(id.as_ref());
            println!("reloaded");
        }
        Command::Clip => {
            // A refused clipboard is a notice, not a failure.
            match clipboard::SystemClipboard::new().and_then(|mut c| c.get_text()) {
                Ok(text) => {
                    shell.capture_clipboard(&text);
                    println!("captured {} chars", text.len());
                }
                Err(e) => println!("{e}"),
            }
            for entry in shell.clipboard().entries() {
                println!("- {entry}");
            }
        }
        Command::Status => {
            println!("open apps (oldest first):");
            if shell.store().open_apps().is_empty() {
                println!("  none");
            }
            for id in shell.store().open_apps().to_vec() {
                let marker = if shell.store().active() == Some(&id) {
                    "*"
                } else {
                    " "
                };
                let state = match shell.load_state(&id) {
                    Some(LoadState::Loading) => "loading",
                    Some(LoadState::Loaded) => "loaded",
                    Some(LoadState::Blocked) => "blocked",
                    None => "-",
                };
                println!("{marker} {}  [{state}]", describe(shell, &id));
            }
            println!("limit: {}", shell.store().lru_limit());
        }
    }
    Ok(())
}

/// Resolve a user-supplied token to an app id: exact id, id prefix, or
/// case-insensitive name match.
fn resolve(shell: &CliShell, token: &str) -> webdeck_common::Result<AppId> {
    let apps = shell.store().apps();
    let lowered = token.to_lowercase();
    let matched = apps.iter().find(|a| {
        a.id.as_str() == token
            || a.id.as_str().starts_with(token)
            || a.name.to_lowercase() == lowered
    });
    match matched {
        Some(app) => Ok(app.id.clone()),
        None => Err(webdeck_common::WebdeckError::UnknownApp(token.to_string())),
    }
}

fn describe(shell: &CliShell, id: &AppId) -> String {
    match shell.store().get_app(id) {
        Some(app) => format!("{} ({})", app.name, app.url),
        None => id.to_string(),
    }
}
