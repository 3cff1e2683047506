//! Common utilities for binary tests
//!
//! Each test starts a wiremock server standing in for both the identity
//! service and the queue endpoint, writes a credentials file whose
//! `auth_endpoint` points at it, then runs the real `cqueue-producer` binary.

use serde_json::json;
use std::io::Write;
use std::process::Output;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const QUEUE_PATH: &str = "/v1/123456/queues/demo";

/// Mock cloud plus a credentials file that targets it
pub struct MockCloud {
    pub server: MockServer,
    pub credentials: NamedTempFile,
}

impl MockCloud {
    pub async fn start() -> Self {
        let server = MockServer::start().await;

        let mut credentials = NamedTempFile::new().expect("Failed to create credentials file");
        write!(
            credentials,
            "[rackspace_cloud]\n\
             username = myusername\n\
             api_key = 01234567890abcdef\n\
             auth_endpoint = {}/v2.0/\n",
            server.uri()
        )
        .expect("Failed to write credentials file");
        credentials.flush().expect("Failed to flush credentials file");

        Self {
            server,
            credentials,
        }
    }

    pub fn credentials_path(&self) -> String {
        self.credentials.path().display().to_string()
    }

    /// Identity service that issues a token with a LON queue endpoint
    pub async fn mount_identity(&self) {
        let body = json!({
            "access": {
                "token": { "id": "token-123", "expires": "2030-01-01T00:00:00Z" },
                "serviceCatalog": [
                    {
                        "name": "cloudQueues",
                        "type": "rax:queues",
                        "endpoints": [
                            {
                                "region": "LON",
                                "publicURL": format!("{}/v1/123456", self.server.uri())
                            }
                        ]
                    }
                ]
            }
        });

        Mock::given(method("POST"))
            .and(path("/v2.0/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Queue existence check answering with `status`
    pub async fn mount_queue_head(&self, status: u16) {
        Mock::given(method("HEAD"))
            .and(path(QUEUE_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Message post answering with `template`, expected exactly `times` times
    pub async fn mount_post(&self, template: ResponseTemplate, times: u64) {
        Mock::given(method("POST"))
            .and(path(format!("{}/messages", QUEUE_PATH)))
            .respond_with(template)
            .expect(times)
            .mount(&self.server)
            .await;
    }
}

/// Run the producer binary off the async runtime so the mock server keeps serving
pub async fn run_producer(args: Vec<String>) -> Output {
    tokio::task::spawn_blocking(move || {
        assert_cmd::Command::cargo_bin("cqueue-producer")
            .expect("Binary should be built")
            .args(&args)
            .output()
            .expect("Failed to run cqueue-producer")
    })
    .await
    .expect("Producer task panicked")
}

/// Standard arguments for posting to `demo` with the given credentials file
pub fn producer_args(credentials: &str, extra: &[&str]) -> Vec<String> {
    let mut args: Vec<String> = ["-q", "demo", "-m", "hello world", "-c", credentials]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.extend(extra.iter().map(|s| s.to_string()));
    args
}
