//! Panel requests end to end with in-process backends

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use skywatch_core::logs::{
    BackendQueryStatus, LogBackend, QueryId, QueryResultsPage, ResultField, StartQueryRequest,
};
use skywatch_core::metrics::{MetricDataOutput, MetricDataRequest, MetricDataResult};
use skywatch_core::resource::{CatalogRef, CloudElement, StaticInventory};
use skywatch_core::{
    BackendError, EngineConfig, MetricBackend, PanelRequest, ResourceCatalog, ResourceType,
    ResponseType, TelemetryEngine, TelemetryError, TelemetryResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

const PANELS: &str = r#"
[fanout]
max_concurrency = 4

[poller]
initial_interval = "1s"
max_interval = "2s"
deadline = "30s"

[[panels]]
query_name = "cpu_utilization_panel"
resource_type = "EC2"
kind = "metric"

[[panels.series]]
label = "CPUUtilization"
metric_name = "CPUUtilization"

[[panels]]
query_name = "nlb_connection_panel"
resource_type = "NLB"
kind = "metric"

[[panels.series]]
label = "Successful"
metric_name = "NewFlowCount"
statistic = "Sum"

[[panels.series]]
label = "Failed"
metric_name = "TCP_Client_Reset_Count"
statistic = "Sum"

[[panels]]
query_name = "cluster_cpu_panel"
resource_type = "EC2"
kind = "metric"
fan_out = true
summary = "Maximum"

[[panels.series]]
label = "CPUUtilization"
metric_name = "CPUUtilization"

[[panels]]
query_name = "error_log_panel"
resource_type = "ECS"
kind = "log"
query = "fields @timestamp, @message | filter @message like /ERROR/"
"#;

const START: &str = "2024-05-01T11:55:00Z";
const END: &str = "2024-05-01T12:00:00Z";

fn start() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(START).unwrap().with_timezone(&Utc)
}

/// Two points per query, labelled with the queried dimension value.
/// Resources whose id starts with `bad-` fail.
#[derive(Default)]
struct EchoMetrics {
    requests: Mutex<Vec<MetricDataRequest>>,
}

#[async_trait]
impl MetricBackend for EchoMetrics {
    async fn get_metric_data(
        &self,
        request: &MetricDataRequest,
    ) -> Result<MetricDataOutput, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        let query = &request.metric_data_queries[0];
        let value = &query.dimensions[0].value;
        if value.starts_with("bad-") {
            return Err(BackendError::with_code("Throttling", "Rate exceeded"));
        }
        Ok(MetricDataOutput {
            metric_data_results: vec![MetricDataResult {
                id: query.id.clone(),
                label: Some(value.clone()),
                timestamps: vec![start(), start() + ChronoDuration::seconds(60)],
                values: vec![10.0, 30.0],
                status_code: Some("Complete".to_string()),
            }],
            messages: vec![],
        })
    }
}

#[derive(Default)]
struct CountingCatalog {
    lookups: AtomicUsize,
}

#[async_trait]
impl ResourceCatalog for CountingCatalog {
    async fn lookup(&self, api_url: &str, element_id: &str) -> TelemetryResult<CloudElement> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        assert_eq!(api_url, "http://cmdb.internal/api/elements");
        Ok(CloudElement {
            instance_id: Some(format!("i-{}", element_id)),
            log_group: Some(format!("/aws/ecs/{}", element_id)),
            element_type: None,
        })
    }
}

struct OneShotLogs;

#[async_trait]
impl LogBackend for OneShotLogs {
    async fn start_query(&self, request: &StartQueryRequest) -> Result<QueryId, BackendError> {
        assert_eq!(request.log_group_name, "/aws/ecs/orders");
        Ok(QueryId::new("q-7"))
    }

    async fn get_query_results(
        &self,
        _query_id: &QueryId,
    ) -> Result<QueryResultsPage, BackendError> {
        Ok(QueryResultsPage::new(
            BackendQueryStatus::Complete,
            vec![vec![
                ResultField::new("@timestamp", "2024-05-01 11:58:00.000"),
                ResultField::new("@message", "ERROR payment declined"),
            ]],
        ))
    }
}

struct Harness {
    engine: TelemetryEngine,
    metrics: Arc<EchoMetrics>,
    catalog: Arc<CountingCatalog>,
}

fn harness() -> Harness {
    let config: EngineConfig = toml::from_str(PANELS).unwrap();
    let metrics = Arc::new(EchoMetrics::default());
    let catalog = Arc::new(CountingCatalog::default());
    let inventory = StaticInventory::new().with_resources(ResourceType::Ec2, ["i-1", "i-2", "bad-3"]);
    let engine = TelemetryEngine::new(
        &config,
        metrics.clone(),
        Some(Arc::new(OneShotLogs)),
        catalog.clone(),
        Some(Arc::new(inventory)),
    )
    .unwrap();
    Harness {
        engine,
        metrics,
        catalog,
    }
}

fn request(query_name: &str, resource_type: &str) -> PanelRequest {
    PanelRequest::new(query_name, resource_type).with_window(Some(START), Some(END))
}

#[tokio::test]
async fn test_single_series_json_and_frame() {
    let h = harness();
    let request = request("cpu_utilization_panel", "AWS/EC2").with_resource_id("i-0abc");

    let response = h.engine.run(&request, &CancellationToken::new()).await.unwrap();
    assert_eq!(h.metrics.requests.lock().unwrap().len(), 1);
    assert_eq!(h.catalog.lookups.load(Ordering::SeqCst), 0);

    let json = response.to_value(ResponseType::Json).unwrap();
    assert_eq!(json["queryName"], "cpu_utilization_panel");
    assert_eq!(json["series"]["CPUUtilization"][1]["Value"], 30.0);

    let frame = response.to_value(ResponseType::Frame).unwrap();
    assert_eq!(
        frame["CPUUtilization"]["MetricDataResults"][0]["Label"],
        "i-0abc"
    );

    let sent = &h.metrics.requests.lock().unwrap()[0];
    let query = &sent.metric_data_queries[0];
    assert_eq!(query.namespace, "AWS/EC2");
    assert_eq!(query.dimensions[0].name, "InstanceId");
    assert_eq!(sent.start_time, start());
}

#[tokio::test]
async fn test_namespaced_type_matches_bare_type() {
    let h = harness();
    let cancel = CancellationToken::new();
    let a = h
        .engine
        .run(&request("cpu_utilization_panel", "AWS/EC2").with_resource_id("i-1"), &cancel)
        .await
        .unwrap();
    let b = h
        .engine
        .run(&request("cpu_utilization_panel", "EC2").with_resource_id("i-1"), &cancel)
        .await
        .unwrap();
    assert_eq!(a.data().series, b.data().series);
}

#[tokio::test]
async fn test_multi_series_panel_keys_by_label() {
    let h = harness();
    let request = request("nlb_connection_panel", "NLB").with_resource_id("net/prod-nlb/50dc6c495c0c9188");

    let rendered = h
        .engine
        .run_rendered(
            &request.with_response_type(ResponseType::Frame),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    let frame: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert!(frame.get("Successful").is_some());
    assert!(frame.get("Failed").is_some());

    let requests = h.metrics.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].metric_data_queries[0].namespace, "AWS/NetworkELB");
    assert_eq!(requests[1].metric_data_queries[0].metric_name, "TCP_Client_Reset_Count");
}

#[tokio::test]
async fn test_catalog_resolves_identity_once() {
    let h = harness();
    let request = request("cpu_utilization_panel", "EC2")
        .with_catalog(CatalogRef::new("42").with_api_url("http://cmdb.internal/api/elements"));

    let response = h.engine.run(&request, &CancellationToken::new()).await.unwrap();
    assert_eq!(h.catalog.lookups.load(Ordering::SeqCst), 1);
    let sent = &h.metrics.requests.lock().unwrap()[0];
    assert_eq!(sent.metric_data_queries[0].dimensions[0].value, "i-42");
    assert!(!response.data().has_no_data());
}

#[tokio::test]
async fn test_fanout_panel_reports_partial_failure() {
    let h = harness();
    let request = request("cluster_cpu_panel", "EC2").with_resources(["i-1", "i-2", "bad-3"]);

    let response = h.engine.run(&request, &CancellationToken::new()).await.unwrap();
    let data = response.data();
    assert_eq!(data.series.len(), 2);
    assert_eq!(data.summaries["i-1"], 30.0);
    assert!(data.failures["bad-3"].contains("Rate exceeded"));

    let json = response.to_value(ResponseType::Json).unwrap();
    assert!(json["failures"]["bad-3"].is_string());
}

#[tokio::test]
async fn test_fanout_panel_covers_inventory_when_no_targets_given() {
    let h = harness();
    let request = request("cluster_cpu_panel", "AWS/EC2");

    let response = h.engine.run(&request, &CancellationToken::new()).await.unwrap();
    let data = response.data();
    assert_eq!(data.series.len(), 2);
    assert!(data.series.contains_key("i-1") && data.series.contains_key("i-2"));
    assert!(data.failures.contains_key("bad-3"));
    assert_eq!(h.metrics.requests.lock().unwrap().len(), 3);
    assert_eq!(h.catalog.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fanout_with_every_resource_failing() {
    let h = harness();
    let request = request("cluster_cpu_panel", "EC2").with_resources(["bad-1", "bad-2"]);

    let err = h.engine.run(&request, &CancellationToken::new()).await.unwrap_err();
    match err {
        TelemetryError::FanoutExhausted { attempted, failures } => {
            assert_eq!(attempted, 2);
            assert_eq!(failures.len(), 2);
        }
        other => panic!("expected exhausted fan-out, got {other:?}"),
    }
}

#[tokio::test]
async fn test_log_panel_resolves_group_through_catalog() {
    let h = harness();
    let request = request("error_log_panel", "ECS")
        .with_catalog(CatalogRef::new("orders").with_api_url("http://cmdb.internal/api/elements"));

    let response = h.engine.run(&request, &CancellationToken::new()).await.unwrap();
    let records = &response.data().records;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("@message"), Some("ERROR payment declined"));

    let frame = response.to_value(ResponseType::Frame).unwrap();
    assert_eq!(frame["/aws/ecs/orders"][0]["Status"], "Complete");
}

#[tokio::test]
async fn test_malformed_window_fails_before_any_call() {
    let h = harness();
    let request = PanelRequest::new("cpu_utilization_panel", "EC2")
        .with_resource_id("i-1")
        .with_window(Some("yesterday"), None);

    let err = h.engine.run(&request, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, TelemetryError::TimeParse { .. }));
    assert!(h.metrics.requests.lock().unwrap().is_empty());
}
