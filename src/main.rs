use clap::Parser;
use mneme::cli::Cli;
use mneme::commands;
use mneme::error::{EXIT_FAILURE, MnemeError};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = commands::run(cli).await {
        let (message, code) = match e.downcast_ref::<MnemeError>() {
            Some(err) => (err.user_message(), err.exit_code()),
            None => (format!("{e:#}"), EXIT_FAILURE),
        };
        eprintln!("Error: {message}");
        std::process::exit(code);
    }
}
