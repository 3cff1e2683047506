use cqueue_producer_cli::{run_cli, CliError};
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    match run_cli().await {
        Ok(status) => std::process::exit(status.code()),
        Err(e) => {
            match e {
                // No subscriber to log through
                CliError::Logging(_) => eprintln!("cqueue-producer: {}", e),
                CliError::Client(_) => error!("CLI error: {}", e),
            }
            std::process::exit(1);
        }
    }
}
