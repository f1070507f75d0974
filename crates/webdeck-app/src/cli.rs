use clap::{Parser, Subcommand};

/// Webdeck — a multi-app shell session over registered web apps.
#[derive(Parser, Debug)]
#[command(name = "webdeck", version, about)]
pub struct Args {
    /// Log level override (e.g. debug, webdeck=debug).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Snapshot directory override (defaults to the platform data dir).
    #[arg(long)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a new app and open it.
    Add {
        /// Absolute URL of the app.
        url: String,
        /// Display name (defaults to the URL's hostname).
        #[arg(long)]
        name: Option<String>,
        /// Icon (emoji or short string).
        #[arg(long)]
        icon: Option<String>,
    },
    /// List registered apps.
    List,
    /// Open (or re-activate) an app by id prefix or name.
    Open { app: String },
    /// Close an open app.
    Close { app: String },
    /// Clear the active app without closing anything.
    Home,
    /// Set an app's zoom factor (clamped to 0.5..=2.0).
    Zoom { app: String, factor: f64 },
    /// Remove an app from the registry.
    Remove { app: String },
    /// Set the bound on concurrently open apps.
    Limit { n: usize },
    /// Reload an app's surface (defaults to the active app).
    Reload { app: Option<String> },
    /// Capture the system clipboard into the session's history.
    Clip,
    /// Show the session: open apps, active app, load states.
    Status,
}

pub fn parse() -> Args {
    Args::parse()
}
