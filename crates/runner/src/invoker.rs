//! Request transports: one external `curl` process per call, or an in-process HTTP client

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use halmock_common::{HarnessConfig, TransportKind};

/// Why a request never produced a response
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} exited with status {code:?}: {stderr}")]
    Exit {
        binary: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response is not valid UTF-8")]
    InvalidUtf8,
}

/// Sends one JSON-RPC payload and returns the raw response text
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short label for logs
    fn name(&self) -> &'static str;

    /// Send `payload` as-is. The payload is not validated.
    async fn send(&self, payload: &str) -> Result<String, TransportError>;
}

/// Build the transport selected by the configuration
pub fn from_config(config: &HarnessConfig) -> Result<Box<dyn Transport>, TransportError> {
    let timeout = config.timeout_secs.map(Duration::from_secs);
    Ok(match config.transport {
        TransportKind::Curl => Box::new(CurlTransport::new(
            config.curl_binary.clone(),
            config.endpoint.clone(),
            timeout,
        )),
        TransportKind::Http => Box::new(HttpTransport::new(config.endpoint.clone(), timeout)?),
    })
}

/// Invokes `curl` once per request
#[derive(Debug, Clone)]
pub struct CurlTransport {
    binary: PathBuf,
    endpoint: String,
    timeout: Option<Duration>,
}

impl CurlTransport {
    pub fn new(binary: impl Into<PathBuf>, endpoint: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            binary: binary.into(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Arguments passed to curl for `payload`
    pub fn args(&self, payload: &str) -> Vec<String> {
        let mut args = vec![
            "--silent".to_string(),
            "--header".to_string(),
            "Content-Type: application/json".to_string(),
            "--request".to_string(),
            "POST".to_string(),
        ];
        if let Some(timeout) = self.timeout {
            args.push("--max-time".to_string());
            args.push(timeout.as_secs().max(1).to_string());
        }
        args.push("-d".to_string());
        args.push(payload.to_string());
        args.push(self.endpoint.clone());
        args
    }
}

#[async_trait]
impl Transport for CurlTransport {
    fn name(&self) -> &'static str {
        "curl"
    }

    async fn send(&self, payload: &str) -> Result<String, TransportError> {
        let binary = self.binary.display().to_string();
        debug!("{} -> {}", binary, payload);

        let output = Command::new(&self.binary)
            .args(self.args(payload))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| TransportError::Spawn {
                binary: binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TransportError::Exit {
                binary,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut text = String::from_utf8(output.stdout).map_err(|_| TransportError::InvalidUtf8)?;
        strip_line_ending(&mut text);
        Ok(text)
    }
}

/// POSTs the payload with reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, payload: &str) -> Result<String, TransportError> {
        debug!("POST {} -> {}", self.endpoint, payload);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .body(payload.to_string())
            .send()
            .await?;

        // Error statuses still carry a JSON-RPC body worth comparing.
        let mut text = response.text().await?;
        strip_line_ending(&mut text);
        Ok(text)
    }
}

/// Drop one trailing `\n` or `\r\n`
fn strip_line_ending(text: &mut String) {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
}
