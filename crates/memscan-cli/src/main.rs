//! Entry point: parses argv, wires up the Linux target backend, and runs
//! the interactive command loop on stdin/stdout.

mod cli_args;
mod format;
mod options;
mod parse;
mod repl;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli_args::Args;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = args
        .log
        .map_or_else(EnvFilter::try_from_default_env, EnvFilter::try_new)
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let target: Box<dyn memscan_session::TargetIo> = Box::new(memscan_target_linux::LinuxTarget::new());
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    repl::run(stdin.lock(), stdout.lock(), target, args.pid)
}
