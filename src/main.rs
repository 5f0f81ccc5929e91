mod balance;
mod db;
mod directory;
mod engine;
mod error;
mod ipc;
mod model;
mod registry;
mod roster;
mod session;
mod settings;
#[cfg(test)]
mod test_support;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SUBJALTD_LOG";
const WORKSPACE_ENV: &str = "SUBJALTD_WORKSPACE";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("subjaltd=info"));
    // stdout carries the protocol; logs go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

fn main() {
    init_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "subjaltd starting");

    let mut state = ipc::AppState::default();
    if let Some(path) = std::env::var_os(WORKSPACE_ENV).filter(|v| !v.is_empty()) {
        if let Err(e) = ipc::select_workspace(&mut state, PathBuf::from(path)) {
            warn!(error = ?e, "startup workspace could not be opened");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                warn!(error = %e, "unparseable request line");
                let reply = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", reply);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    info!("stdin closed, shutting down");
}
