// src/ingest/notifier.rs

//! Ingest notifier: reports each completed job (success or failure) to the
//! external ingestion endpoint.
//!
//! Notification failure never fails the job or the batch: transport and
//! authentication errors are logged and swallowed. Failed jobs are notified
//! too, so downstream ingestion is aware of the data directory even for a
//! failed run.

use std::future::Future;
use std::pin::Pin;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::model::IngestSection;
use crate::dispatch::job::DispatchResult;

/// One completion event as sent to the ingestion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestEvent {
    pub instrument: String,
    /// Directory identifier (the job's output directory name).
    pub identifier: String,
    pub ingesttype: String,
    pub datadir: String,
    /// Process start timestamp, taken once per dispatch invocation.
    pub start: String,
    pub reingest: bool,
    pub testonly: bool,
    pub dev: bool,
}

/// Trait abstracting the ingestion-service request.
pub trait IngestTransport: Send + Sync {
    fn send<'a>(
        &'a self,
        event: &'a IngestEvent,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;
}

/// Production transport: authenticated GET with query parameters.
pub struct HttpIngestTransport {
    url: String,
    user: String,
    password: String,
    client: reqwest::Client,
}

impl HttpIngestTransport {
    pub fn new(ingest: &IngestSection) -> Self {
        Self {
            url: ingest.url.clone(),
            user: ingest.user.clone(),
            password: ingest.password.clone(),
            client: reqwest::Client::new(),
        }
    }
}

impl IngestTransport for HttpIngestTransport {
    fn send<'a>(
        &'a self,
        event: &'a IngestEvent,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.client
                .get(&self.url)
                .basic_auth(&self.user, Some(&self.password))
                .query(&[
                    ("instrument", event.instrument.as_str()),
                    ("koaid", event.identifier.as_str()),
                    ("ingesttype", event.ingesttype.as_str()),
                    ("datadir", event.datadir.as_str()),
                    ("start", event.start.as_str()),
                ])
                .query(&[
                    ("reingest", event.reingest),
                    ("testonly", event.testonly),
                    ("dev", event.dev),
                ])
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        })
    }
}

/// Builds and sends one [`IngestEvent`] per [`DispatchResult`].
pub struct Notifier {
    instrument: String,
    ingest: IngestSection,
    start: String,
    transport: Box<dyn IngestTransport>,
}

impl Notifier {
    pub fn new(
        instrument: impl Into<String>,
        ingest: IngestSection,
        transport: Box<dyn IngestTransport>,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            ingest,
            start: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            transport,
        }
    }

    /// Notify the ingestion service about one completed job.
    ///
    /// Called exactly once per result by the pool worker, regardless of
    /// `succeeded`. Errors are logged and swallowed.
    pub async fn notify(&self, result: &DispatchResult) {
        let event = self.event_for(result);

        info!(
            datadir = %event.datadir,
            succeeded = result.succeeded,
            "notifying ingestion service"
        );

        if let Err(err) = self.transport.send(&event).await {
            warn!(
                datadir = %event.datadir,
                error = %err,
                "ingest notification failed; continuing"
            );
        }
    }

    fn event_for(&self, result: &DispatchResult) -> IngestEvent {
        let datadir = result.job.working_output.to_string_lossy().into_owned();
        let identifier = result
            .job
            .working_output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| datadir.clone());

        IngestEvent {
            instrument: self.instrument.clone(),
            identifier,
            ingesttype: self.ingest.ingesttype.clone(),
            datadir,
            start: self.start.clone(),
            reingest: self.ingest.reingest,
            testonly: self.ingest.testonly,
            dev: self.ingest.dev,
        }
    }
}
