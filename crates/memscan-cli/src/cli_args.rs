//! Initial argv parsing (spec §6): the pid to attach to at startup and the
//! log verbosity, both optional.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "memscan", about = "Interactive memory scanner")]
pub struct Args {
    /// Attach to this pid immediately instead of waiting for a `pid`
    /// command.
    #[arg(short, long)]
    pub pid: Option<i32>,

    /// Override the log filter (`RUST_LOG` syntax); defaults to `warn`.
    #[arg(long)]
    pub log: Option<String>,
}
