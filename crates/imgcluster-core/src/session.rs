//! A staging session: one batch, its intake controller, and the latest
//! cluster views.

use anyhow::{Context, Result};

use crate::error::TransportError;
use crate::images::RawImage;
use crate::images::codec::{ImageCodec, RasterCodec};
use crate::pipeline::{
    Batch, ClusterView, DataUriEncoder, FileSource, IntakeController, IntakeReport,
    PreviewEncoder, correlate,
};
use crate::service::ClusteringService;

/// Owns the batch and serializes every mutation through `&mut self`.
pub struct Session<S, C = RasterCodec, P = DataUriEncoder> {
    controller: IntakeController<C, P>,
    service: S,
    batch: Batch,
    clusters: Vec<ClusterView>,
}

impl<S, C, P> Session<S, C, P>
where
    S: ClusteringService,
    C: ImageCodec,
    P: PreviewEncoder,
{
    pub fn new(controller: IntakeController<C, P>, service: S) -> Self {
        Self {
            controller,
            service,
            batch: Batch::new(),
            clusters: Vec::new(),
        }
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Cluster views from the last successful submission.
    pub fn clusters(&self) -> &[ClusterView] {
        &self.clusters
    }

    pub fn controller(&self) -> &IntakeController<C, P> {
        &self.controller
    }

    /// Runs one intake pass over `candidates`, extending the batch.
    pub async fn add_files(&mut self, candidates: Vec<RawImage>) -> IntakeReport {
        self.controller.intake(candidates, &mut self.batch).await
    }

    /// Pulls a selection from `source` and runs one intake pass over it.
    ///
    /// # Errors
    /// Returns an error if the source cannot produce a selection.
    pub async fn add_from(&mut self, source: &mut impl FileSource) -> Result<IntakeReport> {
        let candidates = source.select().context("Failed to read file selection")?;
        Ok(self.add_files(candidates).await)
    }

    /// Sends the batch to the service and replaces the cluster views.
    ///
    /// An empty batch is not sent. On failure the batch and the previous
    /// cluster views are left as they were.
    ///
    /// # Errors
    /// Returns the service's [`TransportError`] unchanged.
    pub async fn submit(&mut self) -> Result<&[ClusterView], TransportError> {
        if self.batch.is_empty() {
            tracing::debug!("empty batch, nothing to submit");
            return Ok(self.clusters.as_slice());
        }

        let results = self.service.cluster(&self.batch).await?;
        self.clusters = correlate(&results, &self.batch);
        Ok(self.clusters.as_slice())
    }

    /// Clears the batch, cluster views and truncation signals.
    pub fn reset(&mut self) {
        self.batch.reset();
        self.clusters.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::IntakePolicy;
    use crate::error::TransportErrorKind;
    use crate::pipeline::normalize::fake::{FakeCodec, image};
    use crate::service::ClusterResult;

    #[derive(Default)]
    struct FakeService {
        reply: Mutex<Option<Result<Vec<ClusterResult>, TransportError>>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl FakeService {
        fn replying(reply: Result<Vec<ClusterResult>, TransportError>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                ..Self::default()
            }
        }

        fn set_reply(&self, reply: Result<Vec<ClusterResult>, TransportError>) {
            *self.reply.lock().unwrap() = Some(reply);
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl ClusteringService for FakeService {
        async fn cluster(&self, batch: &Batch) -> Result<Vec<ClusterResult>, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push(batch.names().map(str::to_string).collect());
            self.reply.lock().unwrap().clone().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn group(name: &str, ids: &[&str]) -> ClusterResult {
        ClusterResult {
            name: name.to_string(),
            image_ids: ids.iter().map(ToString::to_string).collect(),
            description: None,
        }
    }

    fn session(service: FakeService) -> Session<FakeService, FakeCodec, DataUriEncoder> {
        let controller = IntakeController::with_collaborators(
            IntakePolicy::default(),
            FakeCodec::default(),
            DataUriEncoder,
        );
        Session::new(controller, service)
    }

    fn images(names: &[&str]) -> Vec<RawImage> {
        names.iter().map(|name| image(name, 100, 100)).collect()
    }

    #[tokio::test]
    async fn test_submit_correlates_against_batch() {
        let mut session = session(FakeService::replying(Ok(vec![group(
            "Group A",
            &["img2", "img1", "gone"],
        )])));
        session.add_files(images(&["img1", "img2", "img3"])).await;

        let views = session.submit().await.unwrap().to_vec();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].members, ["img2", "img1"]);
        assert_eq!(
            views[0].previews[0],
            session.batch().get("img2").unwrap().preview
        );
        assert_eq!(session.batch().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_sent() {
        let mut session = session(FakeService::default());

        let views = session.submit().await.unwrap();

        assert!(views.is_empty());
        assert_eq!(session.service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_keeps_batch_and_previous_clusters() {
        let mut session = session(FakeService::replying(Ok(vec![group("A", &["a"])])));
        session.add_files(images(&["a", "b"])).await;
        session.submit().await.unwrap();

        session.service.set_reply(Err(TransportError::new(
            TransportErrorKind::Connect,
            "down",
        )));
        let err = session.submit().await.unwrap_err();

        assert_eq!(err.kind, TransportErrorKind::Connect);
        assert_eq!(session.batch().len(), 2);
        assert_eq!(session.clusters().len(), 1);
        assert_eq!(session.clusters()[0].name, "A");
    }

    #[tokio::test]
    async fn test_reset_clears_everything_and_is_idempotent() {
        let mut session = session(FakeService::replying(Ok(vec![group("A", &["a"])])));
        session.add_files(images(&["a"])).await;
        session.submit().await.unwrap();

        session.reset();
        session.reset();

        assert!(session.batch().is_empty());
        assert!(session.clusters().is_empty());
        assert!(!session.batch().truncated());
    }

    #[tokio::test]
    async fn test_add_from_source_extends_batch() {
        let mut session = session(FakeService::default());
        let mut first = images(&["a"]);
        let mut second = images(&["b", "c"]);

        session.add_from(&mut first).await.unwrap();
        let report = session.add_from(&mut second).await.unwrap();

        assert_eq!(report.added, ["b", "c"]);
        assert_eq!(session.batch().names().collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_submission_sends_selection_order() {
        let mut session = session(FakeService::default());
        session.add_files(images(&["z", "a", "m"])).await;
        session.submit().await.unwrap();

        assert_eq!(session.service.calls.lock().unwrap()[0], ["z", "a", "m"]);
    }
}
