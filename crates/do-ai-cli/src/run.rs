// SPDX-License-Identifier: MIT

//! Top-level argv dispatch (§6 "Command-line surface"): peels the leading
//! `idle` token(s) or recognizes the `relay` subcommand, then hands off to
//! the supervisor or the relay service. Kept outside `main.rs` so it's
//! exercisable from tests without a real process/tty.

use clap::Parser;

use crate::config::{self, Args, RuntimeConfig};
use crate::error::SupervisorError;

const USAGE: &str = "\
do-ai [idle] <command> [args...]    run the PTY supervisor
do-ai relay [--listen ADDR] ...     run the relay service
do-ai -h | --help | help            print this message

idle accepts one duration token (5s, 2m30s, 5min) or two summed together
(5min 10s). A bare integer is seconds.";

/// Initialize tracing from the resolved log format, mirroring the
/// teacher's `run::init_tracing` (env filter, `RUST_LOG` default `info`).
/// `DO_AI_DEBUG=1` raises the default filter to `debug` for the `do_ai`
/// target only, without touching other crates' verbosity (§6 env vars).
/// `RUST_LOG`, when set, always wins over both.
pub fn init_tracing(log_format: &str) {
    use tracing_subscriber::fmt;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter(std::env::var("DO_AI_DEBUG").ok().as_deref())));
    let result = match log_format {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

/// The `EnvFilter` fallback used when `RUST_LOG` is unset, as a function of
/// `DO_AI_DEBUG`. Split out from `init_tracing` so the selection logic is
/// testable without racing other tests over the process-global subscriber.
fn default_filter(do_ai_debug: Option<&str>) -> &'static str {
    if do_ai_debug == Some("1") {
        "info,do_ai=debug"
    } else {
        "info"
    }
}

/// Parse `argv` (program name excluded) and run the selected mode to
/// completion, returning the process exit code (§6 "Exit codes").
pub async fn run(argv: Vec<String>) -> i32 {
    match argv.first().map(String::as_str) {
        Some("-h") | Some("--help") | Some("help") => {
            println!("{USAGE}");
            0
        }
        Some("relay") => match crate::relay_cmd::run(&argv[1..]).await {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("fatal: {e:#}");
                1
            }
        },
        _ => run_supervisor(argv).await,
    }
}

async fn run_supervisor(argv: Vec<String>) -> i32 {
    let (idle, consumed) = config::parse_idle_prefix(&argv);
    let rest = &argv[consumed..];

    let mut full = vec!["do-ai".to_owned()];
    full.extend_from_slice(rest);
    let args = match Args::try_parse_from(full) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return 2;
        }
    };
    if let Err(e) = args.validate() {
        eprintln!("error: {e}");
        return 2;
    }

    init_tracing(&args.log_format);

    let file_config = match config::load_file_config() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("fatal: {e:#}");
            return 1;
        }
    };
    let runtime = RuntimeConfig::build(args, idle, file_config);

    match crate::supervisor::run(runtime).await {
        Ok(code) => code,
        Err(e @ SupervisorError::Usage(_)) => {
            eprintln!("{e}");
            e.exit_code()
        }
        Err(e @ SupervisorError::Startup(_)) => {
            tracing::error!("{e}");
            e.exit_code()
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
