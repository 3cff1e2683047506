//! # cqueue-producer
//!
//! Command-line producer that posts a single message to a Rackspace Cloud
//! Queue.
//!
//! The run is strictly linear: parse arguments, configure logging,
//! authenticate, check the queue exists, post. Every stage ends the run with
//! its own exit code on failure; nothing is retried.

use clap::builder::{NonEmptyStringValueParser, PossibleValuesParser, TypedValueParser};
use clap::Parser;
use cloud_queues::{
    expand_user_path, ClientConfig, ClientId, CloudQueuesClient, IdentityType, MessageTtl,
    QueueName, QueueService, QueueServiceError, Region, ValidationError,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, error, info, Dispatch};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Default location of the credentials file
pub const DEFAULT_CREDENTIALS_FILE: &str = "~/.rackspace_cloud_credentials";

const CREDENTIALS_FORMAT_HINT: &str = "Use a credential file in the following format:

    [rackspace_cloud]
    username = myusername
    api_key = 01234567890abcdef
    region = LON";

const AUTHENTICATION_HINT: &str =
    "Please check and confirm that the API username, key, and region are in place and correct.";

// ============================================================================
// CLI Structure
// ============================================================================

/// cqueue-producer - post a message to a Rackspace Cloud Queue
#[derive(Parser, Debug, Clone)]
#[command(name = "cqueue-producer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A simple Cloud Queues producer")]
pub struct Cli {
    /// The name of your message queue
    #[arg(short, long, value_name = "QUEUE", value_parser = parse_queue_name)]
    pub queue: QueueName,

    /// The message that you want to put in your queue
    #[arg(short, long, value_name = "MESSAGE", value_parser = NonEmptyStringValueParser::new())]
    pub message: String,

    /// The location of your credentials file
    #[arg(short, long, value_name = "CREDENTIALS_FILE", default_value = DEFAULT_CREDENTIALS_FILE)]
    pub credfile: PathBuf,

    /// Region where your queue lives
    #[arg(short, long, value_name = "REGION", default_value = "LON", value_parser = region_parser())]
    pub region: Region,

    /// The time to live for the message in seconds (60 to 1209600)
    #[arg(short, long, value_name = "TTL", default_value = "60", value_parser = parse_ttl)]
    pub ttl: MessageTtl,

    /// Turn on debug verbosity
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit log lines as JSON
    #[arg(long)]
    pub json_logs: bool,
}

fn parse_queue_name(value: &str) -> Result<QueueName, String> {
    value.parse().map_err(|e: ValidationError| e.to_string())
}

/// Parse a TTL, accepting only whole seconds in `MessageTtl::MIN..=MessageTtl::MAX`
pub fn parse_ttl(value: &str) -> Result<MessageTtl, String> {
    value.parse().map_err(|e| match e {
        ValidationError::OutOfRange { message, .. }
        | ValidationError::InvalidFormat { message, .. } => message,
        other => other.to_string(),
    })
}

fn region_parser() -> impl TypedValueParser<Value = Region> {
    PossibleValuesParser::new(Region::ALL.map(|r| r.code())).try_map(|s| s.parse::<Region>())
}

// ============================================================================
// Exit Status
// ============================================================================

/// Outcome of a run, mapped one-to-one onto the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Message posted
    Success,
    /// Credentials or region rejected
    AuthenticationFailed,
    /// Credentials file does not exist
    CredentialsNotFound,
    /// Queue does not exist in the region
    QueueNotFound,
    /// Service refused or failed the post
    PostFailed,
    /// Unexpected failure while authenticating or looking up the queue
    ServiceError,
}

impl ExitStatus {
    /// Process exit code
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => 0,
            Self::AuthenticationFailed => 1,
            Self::CredentialsNotFound => 2,
            Self::QueueNotFound => 3,
            Self::PostFailed => 4,
            Self::ServiceError => 5,
        }
    }
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// Failures setting up the run, before any queue operation
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Logging setup failed: {0}")]
    Logging(#[from] tracing::dispatcher::SetGlobalDefaultError),

    #[error("Queue client setup failed: {0}")]
    Client(#[from] QueueServiceError),
}

// ============================================================================
// Logging
// ============================================================================

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub format: LogFormat,
    pub ansi: bool,
}

impl LoggingConfig {
    /// Logging settings requested on the command line
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            verbose: cli.verbose,
            format: if cli.json_logs {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            ansi: false,
        }
    }

    /// Enable or disable ANSI colours.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Filter directives: debug for this program's crates when verbose,
    /// warnings and above for everything else
    pub fn filter_directives(&self) -> String {
        if self.verbose {
            "warn,cqueue_producer=debug,cqueue_producer_cli=debug,cloud_queues=debug".to_string()
        } else {
            "warn".to_string()
        }
    }
}

/// Build the log dispatcher for `config`, writing to `writer`
///
/// The dispatcher is returned rather than installed so the caller decides
/// whether it becomes the process-wide default.
pub fn build_dispatch<W>(config: &LoggingConfig, writer: W) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.filter_directives()))
        .with_writer(writer)
        .with_target(false)
        .with_ansi(config.ansi);

    match config.format {
        LogFormat::Text => Dispatch::new(builder.finish()),
        LogFormat::Json => Dispatch::new(builder.json().finish()),
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<ExitStatus, CliError> {
    let cli = Cli::parse();

    let logging = LoggingConfig::from_cli(&cli).with_ansi(std::io::stderr().is_terminal());
    tracing::dispatcher::set_global_default(build_dispatch(&logging, std::io::stderr))?;

    let mut client = CloudQueuesClient::new(ClientConfig::default())?;

    Ok(execute(&mut client, &cli).await)
}

/// Authenticate, check the queue and post the message described by `cli`
pub async fn execute<S>(service: &mut S, cli: &Cli) -> ExitStatus
where
    S: QueueService + ?Sized,
{
    service.set_identity_type(IdentityType::Rackspace);
    debug!("Identity type set to {:?}", IdentityType::Rackspace);

    let credentials_path = expand_user_path(&cli.credfile);
    debug!(
        path = %credentials_path.display(),
        region = %cli.region,
        "Authenticating"
    );

    match service.authenticate(&credentials_path, cli.region).await {
        Ok(()) => {}
        Err(QueueServiceError::CredentialsFileNotFound { path }) => {
            error!("Credentials file '{}' not found", path.display());
            info!("{}", CREDENTIALS_FORMAT_HINT);
            return ExitStatus::CredentialsNotFound;
        }
        Err(e) if e.is_authentication_failure() => {
            error!(error = %e, "Authentication failed");
            info!("{}", AUTHENTICATION_HINT);
            return ExitStatus::AuthenticationFailed;
        }
        Err(e) => {
            error!(error = %e, "Unable to reach the identity service");
            return ExitStatus::ServiceError;
        }
    }

    let client_id = ClientId::new();
    service.set_client_id(client_id);
    debug!(client_id = %client_id, "Generated client ID");

    match service.queue_exists(&cli.queue).await {
        Ok(true) => {
            info!("Queue matching '{}' found in '{}'", cli.queue, cli.region);
        }
        Ok(false) => {
            error!("No queues named '{}' found in '{}'", cli.queue, cli.region);
            return ExitStatus::QueueNotFound;
        }
        Err(e) => {
            error!(error = %e, "Unable to look up queue '{}'", cli.queue);
            return ExitStatus::ServiceError;
        }
    }

    match service
        .post_message(&cli.queue, &cli.message, cli.ttl)
        .await
    {
        Ok(posted) => {
            info!(
                message_id = %posted.id,
                ttl = cli.ttl.as_secs(),
                "Successfully posted message to '{}'",
                cli.queue
            );
            ExitStatus::Success
        }
        Err(e) => {
            error!(error = %e, "Unable to post message to '{}'", cli.queue);
            ExitStatus::PostFailed
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
