//! Periodic reachability probe feeding the connectivity indicator.

use crate::services::api::{ApiError, Request, RequestClient};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    Reachable,
    Unreachable {
        status: Option<StatusCode>,
        message: String,
    },
}

impl Liveness {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Liveness::Reachable)
    }
}

impl From<Result<(), ApiError>> for Liveness {
    fn from(result: Result<(), ApiError>) -> Self {
        match result {
            Ok(()) => Liveness::Reachable,
            Err(err) => Liveness::Unreachable {
                status: err.status(),
                message: err.to_string(),
            },
        }
    }
}

/// One lightweight request against the ping endpoint. The body is ignored.
pub async fn probe<C>(client: &C, path: &str) -> Liveness
where
    C: RequestClient + ?Sized,
{
    let result = client
        .request(&Request::markup(path).refreshed())
        .await
        .map(|_| ());
    let liveness = Liveness::from(result);
    if let Liveness::Unreachable { status, message } = &liveness {
        debug!(path, ?status, message = %message, "liveness probe failed");
    }
    liveness
}

/// Stops the prober it was returned with, either explicitly or on drop.
pub struct PollingHandle {
    stop: Option<oneshot::Sender<()>>,
}

impl PollingHandle {
    pub fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

/// Probes `path` every `interval`, first probe one interval after start, and
/// hands each result to `report`.
pub fn spawn_prober<C, F>(
    runtime: &Handle,
    client: Arc<C>,
    path: String,
    interval: Duration,
    report: F,
) -> PollingHandle
where
    C: RequestClient + ?Sized + 'static,
    F: Fn(Liveness) + Send + 'static,
{
    let (stop_tx, mut stop_rx) = oneshot::channel();

    runtime.spawn(async move {
        let mut ticker = time::interval_at(time::Instant::now() + interval, interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let liveness = probe(client.as_ref(), &path).await;
                    report(liveness);
                }
                _ = &mut stop_rx => break,
            }
        }
    });

    PollingHandle {
        stop: Some(stop_tx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api::test_support::StubClient;
    use crate::services::api::{ApiClientConfig, HttpClient, Payload};
    use crossbeam_channel::unbounded;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn probe_reports_reachability() {
        let up = StubClient::default().with("/api/ping", Payload::Markup("pong".into()));
        assert_eq!(probe(&up, "/api/ping").await, Liveness::Reachable);

        let down = StubClient::default().failing("/api/ping", 503);
        match probe(&down, "/api/ping").await {
            Liveness::Unreachable { status, .. } => {
                assert_eq!(status, Some(StatusCode::SERVICE_UNAVAILABLE))
            }
            other => panic!("expected unreachable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let config = ApiClientConfig::try_from_url("http://127.0.0.1:9/")
            .unwrap()
            .with_timeout(Duration::from_millis(500));
        let client = HttpClient::new(config).unwrap();
        let liveness = probe(&client, "/api/ping").await;
        assert!(!liveness.is_reachable());
    }

    #[test]
    fn prober_reports_every_interval_until_stopped() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET).path("/api/ping");
            then.status(200).body("pong");
        });

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let config = ApiClientConfig::try_from_url(&server.url("/")).unwrap();
        let client = Arc::new(HttpClient::new(config).unwrap());
        let (tx, rx) = unbounded();

        let handle = spawn_prober(
            runtime.handle(),
            client,
            "/api/ping".into(),
            Duration::from_millis(20),
            move |liveness| {
                let _ = tx.send(liveness);
            },
        );

        for _ in 0..3 {
            let liveness = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert!(liveness.is_reachable());
        }

        handle.stop();
        std::thread::sleep(Duration::from_millis(100));
        while rx.try_recv().is_ok() {}
        std::thread::sleep(Duration::from_millis(100));
        assert!(rx.try_recv().is_err());
    }
}
