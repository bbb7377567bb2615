// src/subscription.rs

use futures::StreamExt;
use log::{error, info};
use serde::Serialize;
use serde_json::Value;

use crate::commands::{CODE_SUBMISSION_ID, COMMAND, TEST_SET_NAME};
use crate::models::GraphQLRequest;
use crate::transport::{EventStream, SubscriptionTransport};

pub const RUN_COMMAND_SUBSCRIPTION: &str = r#"
subscription RunCommand($code_submission_id: String!, $command: String!, $test_set_name: String) {
  runCommand(code_submission_id: $code_submission_id, command: $command, test_set_name: $test_set_name)
}
"#;

/// Values the live subscription is bound to.
///
/// `command` is kept as a plain string: the live stream also serves backend
/// commands that are not part of [`crate::commands::Command`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunCommandParams {
    pub code_submission_id: String,
    pub command: String,
    pub test_set_name: Option<String>,
}

impl RunCommandParams {
    pub fn new(code_submission_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            code_submission_id: code_submission_id.into(),
            command: command.into(),
            test_set_name: None,
        }
    }

    pub fn test_set_name(mut self, test_set_name: impl Into<String>) -> Self {
        self.test_set_name = Some(test_set_name.into());
        self
    }

    /// An absent `test_set_name` is left out of the variables entirely.
    fn to_request(&self) -> GraphQLRequest {
        let request = GraphQLRequest::new(RUN_COMMAND_SUBSCRIPTION)
            .variable(CODE_SUBMISSION_ID, self.code_submission_id.as_str())
            .variable(COMMAND, self.command.as_str());
        match &self.test_set_name {
            Some(name) => request.variable(TEST_SET_NAME, name.as_str()),
            None => request,
        }
    }
}

/// What a view observes: latest data, whether we are waiting, last error.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct SubscriptionState {
    pub data: Option<Value>,
    pub loading: bool,
    pub error: Option<String>,
}

/// A `runCommand` subscription that stays dormant until submitted.
///
/// Nothing touches the network before [`RunCommandSubscription::handle_submit`].
/// Dropping the handle drops the stream and with it the connection.
pub struct RunCommandSubscription<T: SubscriptionTransport> {
    transport: T,
    params: RunCommandParams,
    submitted: bool,
    stream: Option<EventStream>,
    state: SubscriptionState,
}

impl<T: SubscriptionTransport> RunCommandSubscription<T> {
    pub fn new(transport: T, params: RunCommandParams) -> Self {
        Self {
            transport,
            params,
            submitted: false,
            stream: None,
            state: SubscriptionState::default(),
        }
    }

    pub fn params(&self) -> &RunCommandParams {
        &self.params
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn state(&self) -> &SubscriptionState {
        &self.state
    }

    /// Activates the subscription with the captured values.
    ///
    /// Only the first call after construction (or after [`Self::rearm`])
    /// subscribes; later calls are no-ops.
    pub async fn handle_submit(&mut self) {
        if self.submitted {
            return;
        }
        self.submitted = true;
        self.state = SubscriptionState {
            loading: true,
            ..SubscriptionState::default()
        };

        info!(
            "🎯 Starting {} for submission {}",
            self.params.command, self.params.code_submission_id
        );

        match self.transport.subscribe(self.params.to_request()).await {
            Ok(stream) => self.stream = Some(stream),
            Err(e) => {
                error!("❌ Could not start {}: {}", self.params.command, e);
                self.state.loading = false;
                self.state.error = Some(e.to_string());
            }
        }
    }

    /// Waits for the next pushed update and folds it into the state.
    ///
    /// Returns `None` while skipped (not submitted) and once the stream ended.
    pub async fn next_update(&mut self) -> Option<&SubscriptionState> {
        let event = self.stream.as_mut()?.next().await;

        match event {
            Some(Ok(result)) => {
                self.state.loading = false;
                if let Some(data) = result.get("data").filter(|d| !d.is_null()) {
                    self.state.data = Some(data.clone());
                }
                self.state.error = result
                    .get("errors")
                    .and_then(Value::as_array)
                    .filter(|errors| !errors.is_empty())
                    .map(|errors| Value::Array(errors.clone()).to_string());
            }
            Some(Err(e)) => {
                error!("❌ {} stream failed: {}", self.params.command, e);
                self.state.loading = false;
                self.state.error = Some(e.to_string());
                self.stream = None;
            }
            None => {
                self.state.loading = false;
                self.stream = None;
                return None;
            }
        }

        Some(&self.state)
    }

    /// Replaces the bound values and returns to the dormant state.
    ///
    /// Any active stream is dropped; the next [`Self::handle_submit`]
    /// subscribes with `params`.
    pub fn rearm(&mut self, params: RunCommandParams) {
        self.params = params;
        self.submitted = false;
        self.stream = None;
        self.state = SubscriptionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{GatewayError, Result};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Records every subscribe call and replays a fixed set of events.
    #[derive(Clone, Default)]
    struct RecordingTransport {
        calls: Arc<Mutex<Vec<GraphQLRequest>>>,
        events: Vec<Value>,
        fail: bool,
    }

    impl RecordingTransport {
        fn with_events(events: Vec<Value>) -> Self {
            Self {
                events,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<GraphQLRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SubscriptionTransport for RecordingTransport {
        async fn subscribe(&self, request: GraphQLRequest) -> Result<EventStream> {
            self.calls.lock().unwrap().push(request);
            if self.fail {
                return Err(GatewayError::Protocol("connection refused".to_string()));
            }
            let events: Vec<Result<Value>> = self.events.iter().cloned().map(Ok).collect();
            Ok(futures::stream::iter(events).boxed())
        }
    }

    #[tokio::test]
    async fn test_skipped_until_submitted() {
        let transport = RecordingTransport::with_events(vec![json!({"data": {"runCommand": "ok"}})]);
        let mut subscription = RunCommandSubscription::new(
            transport.clone(),
            RunCommandParams::new("sub-1", "FETCH_TEST_SETS"),
        );

        assert!(subscription.next_update().await.is_none());
        assert!(!subscription.is_submitted());
        assert_eq!(subscription.state(), &SubscriptionState::default());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_activates_exactly_once_with_captured_values() {
        let transport = RecordingTransport::with_events(vec![
            json!({"data": {"runCommand": "line 1"}}),
            json!({"data": {"runCommand": "line 2"}}),
        ]);

        let mut test_set = String::from("test-set-0");
        let mut subscription = RunCommandSubscription::new(
            transport.clone(),
            RunCommandParams::new("sub-1", "FETCH_TESTS_LIST").test_set_name(test_set.clone()),
        );
        test_set.push_str("-changed");

        subscription.handle_submit().await;
        assert!(subscription.state().loading);
        subscription.handle_submit().await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].query, RUN_COMMAND_SUBSCRIPTION);
        assert_eq!(
            Value::Object(calls[0].variables.clone()),
            json!({
                "code_submission_id": "sub-1",
                "command": "FETCH_TESTS_LIST",
                "test_set_name": "test-set-0"
            })
        );

        let first = subscription.next_update().await.cloned().unwrap();
        assert_eq!(first.data, Some(json!({"runCommand": "line 1"})));
        assert!(!first.loading);

        let second = subscription.next_update().await.cloned().unwrap();
        assert_eq!(second.data, Some(json!({"runCommand": "line 2"})));

        assert!(subscription.next_update().await.is_none());
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_test_set_name_is_omitted() {
        let transport = RecordingTransport::default();
        let mut subscription = RunCommandSubscription::new(
            transport.clone(),
            RunCommandParams::new("sub-1", "FETCH_TEST_SETS"),
        );
        subscription.handle_submit().await;

        let variables = &transport.calls()[0].variables;
        assert!(!variables.contains_key("test_set_name"));
        assert_eq!(variables["command"], "FETCH_TEST_SETS");
    }

    #[tokio::test]
    async fn test_graphql_errors_surface_in_state() {
        let transport = RecordingTransport::with_events(vec![json!({
            "data": null,
            "errors": [{"message": "submission not found"}]
        })]);
        let mut subscription = RunCommandSubscription::new(
            transport,
            RunCommandParams::new("missing", "FETCH_TEST_SETS"),
        );
        subscription.handle_submit().await;

        let state = subscription.next_update().await.cloned().unwrap();
        assert_eq!(state.data, None);
        assert!(state.error.unwrap().contains("submission not found"));
    }

    #[tokio::test]
    async fn test_transport_failure_sets_error() {
        let transport = RecordingTransport {
            fail: true,
            ..RecordingTransport::default()
        };
        let mut subscription = RunCommandSubscription::new(
            transport,
            RunCommandParams::new("sub-1", "FETCH_TEST_SETS"),
        );
        subscription.handle_submit().await;

        assert!(!subscription.state().loading);
        assert!(subscription.state().error.as_ref().unwrap().contains("connection refused"));
        assert!(subscription.next_update().await.is_none());
    }

    #[tokio::test]
    async fn test_rearm_subscribes_again_with_new_values() {
        let transport = RecordingTransport::with_events(vec![json!({"data": {"runCommand": "done"}})]);
        let mut subscription = RunCommandSubscription::new(
            transport.clone(),
            RunCommandParams::new("sub-1", "FETCH_TEST_SETS"),
        );
        subscription.handle_submit().await;
        subscription.next_update().await;

        subscription.rearm(RunCommandParams::new("sub-2", "FETCH_MOCK").test_set_name("test-set-1"));
        assert!(!subscription.is_submitted());
        assert_eq!(subscription.state(), &SubscriptionState::default());
        assert_eq!(transport.calls().len(), 1);

        subscription.handle_submit().await;
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].variables["code_submission_id"], "sub-2");
        assert_eq!(calls[1].variables["command"], "FETCH_MOCK");
        assert_eq!(calls[1].variables["test_set_name"], "test-set-1");
    }
}
