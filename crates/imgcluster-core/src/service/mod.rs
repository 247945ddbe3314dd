//! The remote clustering service seam.

mod http;

use std::future::Future;

use serde::{Deserialize, Deserializer, Serialize};

pub use self::http::HttpClusteringClient;
use crate::error::TransportError;
use crate::pipeline::Batch;

/// One named group of file identifiers as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub name: String,
    #[serde(default)]
    pub image_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Response body of the clustering endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterResponse {
    /// A missing key and an explicit `null` both mean no clusters.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub clusters: Vec<ClusterResult>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Groups a staged batch into named clusters.
///
/// Implementations either return every cluster or a single
/// [`TransportError`]; partial results are never surfaced.
pub trait ClusteringService {
    fn cluster(
        &self,
        batch: &Batch,
    ) -> impl Future<Output = Result<Vec<ClusterResult>, TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_without_clusters_is_empty() {
        let response: ClusterResponse = serde_json::from_str("{}").unwrap();
        assert!(response.clusters.is_empty());
    }

    #[test]
    fn test_null_clusters_is_empty() {
        let response: ClusterResponse = serde_json::from_str(r#"{"clusters":null}"#).unwrap();
        assert!(response.clusters.is_empty());
    }

    #[test]
    fn test_non_list_clusters_is_rejected() {
        assert!(serde_json::from_str::<ClusterResponse>(r#"{"clusters":"A"}"#).is_err());
    }

    #[test]
    fn test_description_is_optional() {
        let response: ClusterResponse = serde_json::from_str(
            r#"{"clusters":[{"name":"A","image_ids":["x"]},{"name":"B","image_ids":[],"description":"d"}]}"#,
        )
        .unwrap();

        assert_eq!(response.clusters[0].description, None);
        assert_eq!(response.clusters[1].description.as_deref(), Some("d"));
    }
}
