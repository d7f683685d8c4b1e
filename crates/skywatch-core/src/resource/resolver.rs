//! Resource identity resolution

use super::catalog::{CloudElement, ResourceCatalog};
use super::identity::{ResourceIdentity, ResourceType};
use crate::error::{TelemetryError, TelemetryResult};
use std::sync::Arc;

/// Reference to an element in the external catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRef {
    pub element_id: String,
    /// Catalog endpoint; the configured default is used when absent
    pub api_url: Option<String>,
}

impl CatalogRef {
    pub fn new(element_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            api_url: None,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }
}

/// What the caller knows about the target resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRequest {
    pub explicit_id: Option<String>,
    pub catalog: Option<CatalogRef>,
    pub resource_type: ResourceType,
}

impl IdentityRequest {
    pub fn explicit(id: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            explicit_id: Some(id.into()),
            catalog: None,
            resource_type,
        }
    }

    pub fn from_catalog(catalog: CatalogRef, resource_type: ResourceType) -> Self {
        Self {
            explicit_id: None,
            catalog: Some(catalog),
            resource_type,
        }
    }

    fn explicit_id(&self) -> Option<&str> {
        self.explicit_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Turns an [`IdentityRequest`] into a concrete [`ResourceIdentity`].
///
/// Read-only: the only side effect is the catalog call, made at most once
/// per resolution and never retried here.
#[derive(Clone)]
pub struct ResourceIdentityResolver {
    catalog: Arc<dyn ResourceCatalog>,
    default_api_url: String,
}

impl ResourceIdentityResolver {
    pub fn new(catalog: Arc<dyn ResourceCatalog>, default_api_url: impl Into<String>) -> Self {
        Self {
            catalog,
            default_api_url: default_api_url.into(),
        }
    }

    /// Resolve the resource id. An explicit id always wins.
    pub async fn resolve(&self, request: &IdentityRequest) -> TelemetryResult<ResourceIdentity> {
        if let Some(id) = request.explicit_id() {
            return Ok(ResourceIdentity::new(id, request.resource_type.clone()));
        }

        let catalog_ref = request.catalog.as_ref().ok_or_else(|| {
            TelemetryError::identity("no resource id or catalog element supplied")
        })?;
        let element = self.lookup(catalog_ref).await?;

        match element.instance_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => Ok(ResourceIdentity::new(id, request.resource_type.clone())),
            None => Err(TelemetryError::identity_for_element(
                "catalog element has no instance id",
                &catalog_ref.element_id,
            )),
        }
    }

    /// Resolve a log group name. An explicit log group always wins.
    pub async fn resolve_log_group(
        &self,
        explicit: Option<&str>,
        catalog_ref: Option<&CatalogRef>,
    ) -> TelemetryResult<String> {
        if let Some(group) = explicit.map(str::trim).filter(|g| !g.is_empty()) {
            return Ok(group.to_string());
        }

        let catalog_ref = catalog_ref.ok_or_else(|| {
            TelemetryError::identity("no log group or catalog element supplied")
        })?;
        let element = self.lookup(catalog_ref).await?;

        element
            .log_group
            .filter(|g| !g.trim().is_empty())
            .ok_or_else(|| {
                TelemetryError::identity_for_element(
                    "catalog element has no log group",
                    &catalog_ref.element_id,
                )
            })
    }

    async fn lookup(&self, catalog_ref: &CatalogRef) -> TelemetryResult<CloudElement> {
        let api_url = catalog_ref
            .api_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| {
                tracing::debug!("Using default catalog url");
                self.default_api_url.as_str()
            });
        tracing::info!(
            "Resolving element {} via catalog {}",
            catalog_ref.element_id,
            api_url
        );

        self.catalog
            .lookup(api_url, &catalog_ref.element_id)
            .await
            .map_err(|e| match e {
                TelemetryError::IdentityResolution { .. } => e,
                other => TelemetryError::identity_for_element(
                    other.to_string(),
                    &catalog_ref.element_id,
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::catalog::MockResourceCatalog;
    use mockall::predicate::eq;

    const DEFAULT_URL: &str = "http://cmdb.local/api/elements";

    fn element(instance_id: Option<&str>, log_group: Option<&str>) -> CloudElement {
        CloudElement {
            instance_id: instance_id.map(String::from),
            log_group: log_group.map(String::from),
            element_type: None,
        }
    }

    #[tokio::test]
    async fn test_explicit_id_skips_catalog() {
        let mut catalog = MockResourceCatalog::new();
        catalog.expect_lookup().never();
        let resolver = ResourceIdentityResolver::new(Arc::new(catalog), DEFAULT_URL);

        let request = IdentityRequest {
            explicit_id: Some("i-explicit".to_string()),
            catalog: Some(CatalogRef::new("42")),
            resource_type: ResourceType::Ec2,
        };
        let identity = resolver.resolve(&request).await.unwrap();
        assert_eq!(identity, ResourceIdentity::new("i-explicit", ResourceType::Ec2));
    }

    #[tokio::test]
    async fn test_catalog_lookup_uses_default_url_once() {
        let mut catalog = MockResourceCatalog::new();
        catalog
            .expect_lookup()
            .with(eq(DEFAULT_URL), eq("42"))
            .times(1)
            .returning(|_, _| Ok(element(Some("i-from-cmdb"), None)));
        let resolver = ResourceIdentityResolver::new(Arc::new(catalog), DEFAULT_URL);

        let request = IdentityRequest::from_catalog(CatalogRef::new("42"), ResourceType::Ec2);
        let identity = resolver.resolve(&request).await.unwrap();
        assert_eq!(identity.id, "i-from-cmdb");
    }

    #[tokio::test]
    async fn test_catalog_failure_is_identity_error_without_retry() {
        let mut catalog = MockResourceCatalog::new();
        catalog
            .expect_lookup()
            .with(eq("http://other/api"), eq("7"))
            .times(1)
            .returning(|_, _| Err(TelemetryError::http("connection refused")));
        let resolver = ResourceIdentityResolver::new(Arc::new(catalog), DEFAULT_URL);

        let request = IdentityRequest::from_catalog(
            CatalogRef::new("7").with_api_url("http://other/api"),
            ResourceType::Rds,
        );
        let err = resolver.resolve(&request).await.unwrap_err();
        match err {
            TelemetryError::IdentityResolution { element_id, .. } => {
                assert_eq!(element_id.as_deref(), Some("7"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_nothing_supplied_fails() {
        let mut catalog = MockResourceCatalog::new();
        catalog.expect_lookup().never();
        let resolver = ResourceIdentityResolver::new(Arc::new(catalog), DEFAULT_URL);

        let request = IdentityRequest {
            explicit_id: Some("   ".to_string()),
            catalog: None,
            resource_type: ResourceType::Ec2,
        };
        assert!(matches!(
            resolver.resolve(&request).await,
            Err(TelemetryError::IdentityResolution { .. })
        ));
    }

    #[tokio::test]
    async fn test_log_group_from_catalog() {
        let mut catalog = MockResourceCatalog::new();
        catalog
            .expect_lookup()
            .times(1)
            .returning(|_, _| Ok(element(None, Some("/aws/ecs/prod"))));
        let resolver = ResourceIdentityResolver::new(Arc::new(catalog), DEFAULT_URL);

        let group = resolver
            .resolve_log_group(None, Some(&CatalogRef::new("9")))
            .await
            .unwrap();
        assert_eq!(group, "/aws/ecs/prod");
    }

    #[tokio::test]
    async fn test_missing_log_group_is_error() {
        let mut catalog = MockResourceCatalog::new();
        catalog
            .expect_lookup()
            .returning(|_, _| Ok(element(Some("i-1"), None)));
        let resolver = ResourceIdentityResolver::new(Arc::new(catalog), DEFAULT_URL);

        assert!(
            resolver
                .resolve_log_group(Some(""), Some(&CatalogRef::new("9")))
                .await
                .is_err()
        );
    }
}
