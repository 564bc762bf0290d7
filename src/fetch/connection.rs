//! Upstream connections
//!
//! The coordinator never talks to the network directly; it asks a
//! `ConnectionFactory` for a connection to a fully formed URL. Production
//! uses `HttpConnectionFactory`, tests use the simulated factory.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::debug;

use crate::error::{ReconcileError, Result};

// == Connection Traits ==
/// One open upstream connection.
#[async_trait]
pub trait Connection: Send {
    /// Reads the whole response body.
    ///
    /// Parsing starts only once the body is complete. That keeps the timeout
    /// around network I/O alone and keeps the synchronous parser off the
    /// socket. Responses are bounded by the query limit, and the parser
    /// still streams events over the buffer without building a tree.
    async fn read_body(&mut self) -> Result<Vec<u8>>;

    /// Releases the connection. Must be safe to call more than once.
    fn close(&mut self);
}

/// Opens connections to upstream URLs.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>>;
}

// == Open Connection ==
/// Closes the wrapped connection when dropped, including when the owning
/// future is cancelled by a timeout.
pub struct OpenConnection {
    inner: Box<dyn Connection>,
}

impl OpenConnection {
    pub fn new(inner: Box<dyn Connection>) -> Self {
        Self { inner }
    }

    pub async fn read_body(&mut self) -> Result<Vec<u8>> {
        self.inner.read_body().await
    }
}

impl Drop for OpenConnection {
    fn drop(&mut self) {
        self.inner.close();
    }
}

// == HTTP ==
/// reqwest-backed connection factory.
#[derive(Debug, Clone)]
pub struct HttpConnectionFactory {
    client: reqwest::Client,
}

impl HttpConnectionFactory {
    /// # Arguments
    /// * `timeout` - Upper bound for connecting and reading one response
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("authority_reconcile/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ConnectionFactory for HttpConnectionFactory {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/xml")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReconcileError::Connection(format!(
                "Upstream returned {} for {}",
                status, url
            )));
        }

        Ok(Box::new(HttpConnection {
            response: Some(response),
        }))
    }
}

struct HttpConnection {
    response: Option<reqwest::Response>,
}

#[async_trait]
impl Connection for HttpConnection {
    async fn read_body(&mut self) -> Result<Vec<u8>> {
        let response = self
            .response
            .take()
            .ok_or_else(|| ReconcileError::Connection("Connection already consumed".to_string()))?;
        Ok(response.bytes().await?.to_vec())
    }

    fn close(&mut self) {
        // Dropping an unread response returns the socket to reqwest
        self.response = None;
    }
}
