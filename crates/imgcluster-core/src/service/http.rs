//! Multipart HTTP client for the clustering service.

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};

use super::{ClusterResponse, ClusterResult, ClusteringService};
use crate::config::ServiceConfig;
use crate::error::TransportError;
use crate::pipeline::Batch;

/// Posts the batch as one multipart form and parses the clusters back.
#[derive(Debug, Clone)]
pub struct HttpClusteringClient {
    endpoint: String,
    field_name: String,
    http: reqwest::Client,
}

impl HttpClusteringClient {
    pub fn new(endpoint: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            field_name: field_name.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Builds a client from `[service]`, honoring `IMGCLUSTER_ENDPOINT` and
    /// the optional request timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            endpoint: config.effective_endpoint(),
            field_name: config.field_name.clone(),
            http,
        })
    }

    /// Replaces the endpoint resolved from config.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(&self, batch: &Batch) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for entry in batch {
            let image = &entry.image.image;
            let part = Part::bytes(image.data().to_vec())
                .file_name(image.name().to_string())
                .mime_str(image.mime_type())
                .map_err(|e| TransportError::form(image.name(), e.to_string()))?;
            form = form.part(self.field_name.clone(), part);
        }
        Ok(form)
    }

    async fn post(&self, batch: &Batch) -> Result<Vec<ClusterResult>, TransportError> {
        let form = self.form(batch)?;
        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::from_request(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::from_request(&e))?;

        if !status.is_success() {
            return Err(TransportError::http_status(status.as_u16(), &body));
        }

        let parsed: ClusterResponse =
            serde_json::from_str(&body).map_err(|e| TransportError::parse(e.to_string()))?;
        Ok(parsed.clusters)
    }
}

impl ClusteringService for HttpClusteringClient {
    async fn cluster(&self, batch: &Batch) -> Result<Vec<ClusterResult>, TransportError> {
        tracing::info!(
            endpoint = %self.endpoint,
            files = batch.len(),
            bytes = batch.total_bytes(),
            "submitting batch"
        );

        match self.post(batch).await {
            Ok(clusters) => {
                tracing::info!(clusters = clusters.len(), "clustering finished");
                Ok(clusters)
            }
            Err(err) => {
                tracing::warn!(kind = %err.kind, error = %err, "clustering failed");
                Err(err)
            }
        }
    }
}
