use clap::Parser;

mod compile;
mod utils;

use compile::handle_compile;

/// `loopc <source_path>` — compile a loop source file to its bytecode
/// artifact. No subcommands: the CLI contract is exactly this one operation
/// (§6), unlike the multi-subcommand driver this binary started from.
#[derive(Parser)]
#[command(
    author,
    version,
    about = "loop language bytecode compiler",
    long_about = None,
    disable_help_subcommand = true
)]
struct Cli {
    /// Source file to compile (no extension; `.loop` is appended).
    source_path: String,
}

fn main() {
    let cli = Cli::parse();
    handle_compile(&cli.source_path);
}
