use std::process::ExitCode;

use clap::Parser;
use scripts::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let Cli {
        artifacts,
        plan,
        verbosity,
        command,
    } = Cli::parse();

    tracing_subscriber::fmt()
        .pretty()
        .with_max_level(verbosity.level())
        .with_writer(std::io::stderr)
        .init();

    match command.run(&artifacts, plan.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
