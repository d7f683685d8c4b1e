//! Resource catalog client
//!
//! The catalog maps a logical element id to the concrete identifiers the
//! backends need. Retry policy belongs to the catalog implementation, never
//! to the resolver.

use crate::error::{TelemetryError, TelemetryResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// One catalog element as returned by a lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudElement {
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub log_group: Option<String>,
    #[serde(default)]
    pub element_type: Option<String>,
}

/// Lookup interface over the external resource catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceCatalog: Send + Sync {
    /// Resolve one element. Exactly one outbound call per invocation.
    async fn lookup(&self, api_url: &str, element_id: &str) -> TelemetryResult<CloudElement>;
}

/// HTTP catalog client: `GET {api_url}/{element_id}` returning a JSON element
pub struct HttpCatalog {
    http_client: Client,
}

impl HttpCatalog {
    /// Create a catalog client with its own HTTP client
    pub fn new(request_timeout: Duration) -> TelemetryResult<Self> {
        let http_client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| TelemetryError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http_client })
    }

    /// Create a catalog client sharing an existing HTTP client
    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }

    fn element_url(api_url: &str, element_id: &str) -> String {
        format!("{}/{}", api_url.trim_end_matches('/'), element_id)
    }
}

#[async_trait]
impl ResourceCatalog for HttpCatalog {
    #[instrument(skip(self), level = "debug")]
    async fn lookup(&self, api_url: &str, element_id: &str) -> TelemetryResult<CloudElement> {
        let url = Self::element_url(api_url, element_id);
        tracing::debug!("Catalog lookup: {}", url);

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            TelemetryError::identity_for_element(format!("catalog request failed: {}", e), element_id)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelemetryError::identity_for_element(
                format!("catalog returned status {}: {}", status.as_u16(), body.trim()),
                element_id,
            )
            .with_context(url));
        }

        response.json::<CloudElement>().await.map_err(|e| {
            TelemetryError::identity_for_element(
                format!("catalog response could not be decoded: {}", e),
                element_id,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_url_joins_cleanly() {
        assert_eq!(
            HttpCatalog::element_url("http://cmdb/api/elements/", "42"),
            "http://cmdb/api/elements/42"
        );
        assert_eq!(
            HttpCatalog::element_url("http://cmdb/api/elements", "42"),
            "http://cmdb/api/elements/42"
        );
    }

    #[test]
    fn test_cloud_element_decodes_camel_case() {
        let element: CloudElement = serde_json::from_str(
            r#"{"instanceId":"i-0abc","logGroup":"/ecs/app","elementType":"EC2","extra":1}"#,
        )
        .unwrap();
        assert_eq!(element.instance_id.as_deref(), Some("i-0abc"));
        assert_eq!(element.log_group.as_deref(), Some("/ecs/app"));
    }
}
