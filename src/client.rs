// src/client.rs

use log::{debug, error, info};
use reqwest::Client;
use serde_json::Value;
use std::time::Instant;

use crate::commands::{
    COMMAND_CONTENT, Command, CommandRequest, TEST_CASE_NAME, TEST_RUN_NAME,
    TEST_SET_NAME, TEST_SET_REPORT_NAME,
};
use crate::config::GatewayConfig;
use crate::errors::{GatewayError, Result};
use crate::models::{CommandResponse, GraphQLRequest, SubmitCodeResponse};

const SUBMIT_CODE_MUTATION: &str = r#"
mutation SubmitCode($language: String!, $schema: String!, $code: String!) {
  submitCode(language: $language, schema: $schema, code: $code) {
    code_submission_id
  }
}
"#;

/// HTTP client for the code execution gateway.
///
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    config: GatewayConfig,
}

impl GatewayClient {
    /// Creates a new `GatewayClient` from an existing `reqwest` client.
    pub fn new(client: Client, config: GatewayConfig) -> Self {
        Self { client, config }
    }

    /// Builds a `reqwest` client honouring the configured timeout.
    pub fn from_config(config: GatewayConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::new(builder.build()?, config))
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Submits a code snippet and returns the id the backend assigned to it.
    ///
    /// Any failure is logged and turned into `None`.
    pub async fn submit_code(&self, language: &str, schema: &str, code: &str) -> Option<String> {
        match self.try_submit_code(language, schema, code).await {
            Ok(id) => Some(id),
            Err(e) => {
                error!("❌ Code submission failed: {}", e);
                None
            }
        }
    }

    /// Same as [`GatewayClient::submit_code`] but keeps the failure reason.
    pub async fn try_submit_code(&self, language: &str, schema: &str, code: &str) -> Result<String> {
        let request = GraphQLRequest::new(SUBMIT_CODE_MUTATION)
            .variable("language", language)
            .variable("schema", schema)
            .variable("code", code);

        info!("📡 Submitting {} code to {}", language, self.config.endpoint);

        let resp = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(GatewayError::ApiError {
                status: status.as_u16(),
                body: text,
            });
        }

        let body: SubmitCodeResponse = serde_json::from_str(&text)?;

        body.data
            .and_then(|d| d.submit_code)
            .and_then(|s| s.code_submission_id)
            .filter(|id| !id.is_empty())
            .ok_or(GatewayError::MissingSubmissionId(text))
    }

    /// POSTs a GraphQL request and wraps whatever comes back in an envelope.
    ///
    /// Never fails: transport and parse errors become `success: false`.
    pub async fn post_request(&self, request: &GraphQLRequest) -> CommandResponse {
        let start = Instant::now();

        let resp = match self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                error!("❌ Request to {} failed: {}", self.config.endpoint, e);
                return CommandResponse::failed(e.to_string());
            }
        };

        let status = resp.status();
        debug!(
            "📥 Gateway response status: {} ({}ms)",
            status,
            start.elapsed().as_millis()
        );

        match resp.json::<Value>().await {
            Ok(body) => CommandResponse::answered(status.is_success(), body),
            Err(e) => {
                error!("❌ Could not decode gateway response: {}", e);
                CommandResponse::failed(e.to_string())
            }
        }
    }

    /// Sends any command. Parameter mismatches are reported without a network call.
    pub async fn run_command(&self, request: CommandRequest) -> CommandResponse {
        let command = request.command;
        match request.into_graphql() {
            Ok(body) => {
                info!("🎯 Running {}", command);
                self.post_request(&body).await
            }
            Err(e) => {
                error!("❌ Refusing to send {}: {}", command, e);
                CommandResponse::failed(e.to_string())
            }
        }
    }

    pub async fn fetch_test_sets(&self, code_submission_id: &str) -> CommandResponse {
        self.run_command(CommandRequest::new(Command::FetchTestSets, code_submission_id))
            .await
    }

    pub async fn fetch_test_list(
        &self,
        code_submission_id: &str,
        test_set_name: &str,
    ) -> CommandResponse {
        self.run_command(
            CommandRequest::new(Command::FetchTestsList, code_submission_id)
                .param(TEST_SET_NAME, test_set_name),
        )
        .await
    }

    pub async fn fetch_test(
        &self,
        code_submission_id: &str,
        test_set_name: &str,
        test_case_name: &str,
    ) -> CommandResponse {
        self.run_command(
            CommandRequest::new(Command::FetchTest, code_submission_id)
                .param(TEST_SET_NAME, test_set_name)
                .param(TEST_CASE_NAME, test_case_name),
        )
        .await
    }

    /// Runs an arbitrary curl invocation inside the submission's sandbox.
    pub async fn curl_command(
        &self,
        code_submission_id: &str,
        command_content: &str,
    ) -> CommandResponse {
        self.run_command(
            CommandRequest::new(Command::Curl, code_submission_id)
                .param(COMMAND_CONTENT, command_content),
        )
        .await
    }

    pub async fn fetch_mock(&self, code_submission_id: &str, test_set_name: &str) -> CommandResponse {
        self.run_command(
            CommandRequest::new(Command::FetchMock, code_submission_id)
                .param(TEST_SET_NAME, test_set_name),
        )
        .await
    }

    pub async fn fetch_test_run(&self, code_submission_id: &str) -> CommandResponse {
        self.run_command(CommandRequest::new(Command::FetchTestRuns, code_submission_id))
            .await
    }

    /// Lists the report files of a test run (coverage.yaml and friends).
    pub async fn fetch_report(&self, code_submission_id: &str, test_run_name: &str) -> CommandResponse {
        self.run_command(
            CommandRequest::new(Command::FetchTestSetReports, code_submission_id)
                .param(TEST_RUN_NAME, test_run_name),
        )
        .await
    }

    /// Fetches the contents of one report.
    pub async fn fetch_detailed_report(
        &self,
        code_submission_id: &str,
        test_run_name: &str,
        test_set_report_name: &str,
    ) -> CommandResponse {
        self.run_command(
            CommandRequest::new(Command::FetchReport, code_submission_id)
                .param(TEST_RUN_NAME, test_run_name)
                .param(TEST_SET_REPORT_NAME, test_set_report_name),
        )
        .await
    }

    pub async fn remove_duplicates(
        &self,
        code_submission_id: &str,
        test_set_name: &str,
    ) -> CommandResponse {
        self.run_command(
            CommandRequest::new(Command::RemoveDuplicates, code_submission_id)
                .param(TEST_SET_NAME, test_set_name),
        )
        .await
    }
}
