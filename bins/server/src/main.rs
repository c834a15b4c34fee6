mod config;
mod error;

use clap::Parser;
use config::Cli;

mod cmd;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cmd::serve::run(cli).await {
        Ok(cmd::serve::Stopped::ServerExited) => {}
        // Exit before the runtime is dropped: dropping it would wait on
        // blocking Kafka calls and close every live consumer.
        Ok(cmd::serve::Stopped::Signal) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
