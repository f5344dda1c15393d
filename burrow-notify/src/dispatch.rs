//! Fire-and-forget HTTP dispatch to a matched handler's target function
//! (spec §4.8): a 30 s timeout, `X-Amz-Invocation-Type: Event`, and
//! failures that are logged but never propagated to the triggering bucket
//! operation.

use std::time::Duration;

use serde_json::Value;

#[derive(Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    function_service_base_url: String,
}

impl Dispatcher {
    pub fn new(function_service_base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client builds with the configured TLS backend");
        Self {
            client,
            function_service_base_url: function_service_base_url.into(),
        }
    }

    pub async fn dispatch(&self, target_arn: &str, event_json: &Value) {
        let Some(function_name) = burrow_core::arn::parse_lambda_arn(target_arn) else {
            tracing::warn!(target_arn, "notification target is not a lambda function ARN, skipping");
            return;
        };
        let url = format!(
            "{}/2015-03-31/functions/{function_name}/invocations",
            self.function_service_base_url
        );
        match self
            .client
            .post(&url)
            .header("X-Amz-Invocation-Type", "Event")
            .json(event_json)
            .send()
            .await
        {
            Ok(resp) if !resp.status().is_success() => {
                tracing::warn!(target_arn, status = %resp.status(), "notification dispatch returned an error status");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(target_arn, error = %e, "notification dispatch failed");
            }
        }
    }
}
