// SPDX-License-Identifier: MIT

//! `do-ai relay` subcommand: parses its own argv slice and hands off to
//! the relay crate's `run`. Kept separate from the supervisor's `Args` so
//! the two don't fight over `clap`'s positional/subcommand grammar (§6).

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "do-ai relay", about = "Relay service: session registry, control queue, notifier.")]
struct RelayCli {
    #[command(flatten)]
    config: do_ai_relay::RelayConfig,
}

/// `argv` is the full process argv with `relay` already stripped (argv[0]
/// replaced by a synthetic program name for clap's usage strings).
pub async fn run(argv: &[String]) -> anyhow::Result<()> {
    let mut full = vec!["do-ai relay".to_owned()];
    full.extend_from_slice(argv);
    let cli = RelayCli::parse_from(full);
    do_ai_relay::run(cli.config).await
}

#[cfg(test)]
#[path = "relay_cmd_tests.rs"]
mod tests;
