//! Panel execution methods

use crate::client::TelemetryClient;
use anyhow::Context;
use skywatch_core::{
    CancellationToken, PanelRequest, PanelResponse, ResponseType, TelemetryResult,
};

impl TelemetryClient {
    /// Run one panel to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No panel is registered for the query name and resource type
    /// - The time window or resource identity cannot be resolved
    /// - The backend query fails (for fan-out panels: every resource failed)
    /// - A log query fails or exceeds the poll deadline
    pub async fn run_panel(&self, request: &PanelRequest) -> TelemetryResult<PanelResponse> {
        self.run_panel_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Run one panel; cancelling `cancel` stops outstanding queries
    pub async fn run_panel_with_cancel(
        &self,
        request: &PanelRequest,
        cancel: &CancellationToken,
    ) -> TelemetryResult<PanelResponse> {
        self.engine.run(request, cancel).await
    }

    /// Run one panel and render it in the request's response type
    pub async fn run_panel_rendered(&self, request: &PanelRequest) -> TelemetryResult<String> {
        self.engine
            .run_rendered(request, &CancellationToken::new())
            .await
    }

    /// One-call convenience: run a panel for an explicit resource id and
    /// return the chosen representation as JSON.
    pub async fn query(
        &self,
        query_name: &str,
        resource_type: &str,
        resource_id: &str,
        response_type: &str,
    ) -> anyhow::Result<serde_json::Value> {
        let response_type: ResponseType = response_type.parse()?;
        let request = PanelRequest::new(query_name, resource_type)
            .with_resource_id(resource_id)
            .with_response_type(response_type);

        let response = self
            .run_panel(&request)
            .await
            .with_context(|| format!("running panel '{}' for {}", query_name, resource_id))?;
        let value = response
            .to_value(response_type)
            .context("rendering panel response")?;
        Ok(value)
    }
}
