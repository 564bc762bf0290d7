//! Simulated upstream
//!
//! A `ConnectionFactory` that serves canned bodies from memory. It counts
//! calls and open connections so tests can check coalescing and cleanup.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{ReconcileError, Result};
use crate::fetch::{Connection, ConnectionFactory};

#[derive(Debug, Clone)]
enum Route {
    Body(Arc<Vec<u8>>),
    Fail(String),
}

/// In-memory connection factory.
///
/// Routes match when their pattern is a substring of the percent-decoded
/// URL; the first match wins.
#[derive(Debug, Default)]
pub struct SimulatedConnectionFactory {
    routes: Vec<(String, Route)>,
    delay: Duration,
    calls: AtomicUsize,
    open: Arc<AtomicUsize>,
    requested: Mutex<Vec<String>>,
}

impl SimulatedConnectionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for URLs containing `pattern`.
    pub fn with_body(mut self, pattern: &str, body: impl Into<Vec<u8>>) -> Self {
        self.routes
            .push((pattern.to_string(), Route::Body(Arc::new(body.into()))));
        self
    }

    /// Fails to connect for URLs containing `pattern`.
    pub fn with_failure(mut self, pattern: &str, message: &str) -> Self {
        self.routes
            .push((pattern.to_string(), Route::Fail(message.to_string())));
        self
    }

    /// Delays every body read.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of `connect` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Connections opened and not yet closed.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().clone()
    }

    fn route(&self, url: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, route)| route)
    }
}

#[async_trait]
impl ConnectionFactory for SimulatedConnectionFactory {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let decoded = urlencoding::decode(url)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| url.to_string());
        self.requested.lock().push(decoded.clone());

        match self.route(&decoded) {
            Some(Route::Body(body)) => {
                self.open.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(SimulatedConnection {
                    body: Arc::clone(body),
                    delay: self.delay,
                    open: Arc::clone(&self.open),
                    closed: false,
                }))
            }
            Some(Route::Fail(message)) => Err(ReconcileError::Connection(message.clone())),
            None => Err(ReconcileError::Connection(format!("No route for {}", decoded))),
        }
    }
}

struct SimulatedConnection {
    body: Arc<Vec<u8>>,
    delay: Duration,
    open: Arc<AtomicUsize>,
    closed: bool,
}

#[async_trait]
impl Connection for SimulatedConnection {
    async fn read_body(&mut self) -> Result<Vec<u8>> {
        if self.closed {
            return Err(ReconcileError::Connection("Connection closed".to_string()));
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.body.as_ref().clone())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::OpenConnection;

    #[tokio::test]
    async fn test_serves_matching_route() {
        let factory = SimulatedConnectionFactory::new()
            .with_body("given-names:Igor", "<a/>")
            .with_body("orcid", "<b/>");

        let url = "https://pub.orcid.org/?q=given-names%3AIgor";
        let mut connection = OpenConnection::new(factory.connect(url).await.unwrap());
        assert_eq!(connection.read_body().await.unwrap(), b"<a/>");
        assert_eq!(factory.open_connections(), 1);

        drop(connection);
        assert_eq!(factory.open_connections(), 0);
        assert_eq!(factory.calls(), 1);
        assert_eq!(
            factory.requested_urls(),
            vec!["https://pub.orcid.org/?q=given-names:Igor".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failure_and_missing_routes() {
        let factory = SimulatedConnectionFactory::new().with_failure("down", "refused");

        assert!(matches!(
            factory.connect("https://down.example").await,
            Err(ReconcileError::Connection(msg)) if msg == "refused"
        ));
        assert!(factory.connect("https://elsewhere.example").await.is_err());
        assert_eq!(factory.calls(), 2);
        assert_eq!(factory.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let factory = SimulatedConnectionFactory::new().with_body("x", "<x/>");
        let mut connection = factory.connect("x").await.unwrap();
        connection.close();
        connection.close();
        assert_eq!(factory.open_connections(), 0);
        assert!(connection.read_body().await.is_err());
    }
}
