// src/commands.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{GatewayError, Result};
use crate::models::GraphQLRequest;

pub const CODE_SUBMISSION_ID: &str = "code_submission_id";
pub const COMMAND: &str = "command";
pub const TEST_SET_NAME: &str = "test_set_name";
pub const TEST_CASE_NAME: &str = "test_case_name";
pub const COMMAND_CONTENT: &str = "command_content";
pub const TEST_RUN_NAME: &str = "test_run_name";
pub const TEST_SET_REPORT_NAME: &str = "test_set_report_name";

/// Backend operations multiplexed through the `runCommand` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    FetchTestSets,
    FetchTestsList,
    FetchTest,
    Curl,
    FetchMock,
    FetchTestRuns,
    FetchTestSetReports,
    FetchReport,
    RemoveDuplicates,
}

impl Command {
    pub const ALL: [Command; 9] = [
        Command::FetchTestSets,
        Command::FetchTestsList,
        Command::FetchTest,
        Command::Curl,
        Command::FetchMock,
        Command::FetchTestRuns,
        Command::FetchTestSetReports,
        Command::FetchReport,
        Command::RemoveDuplicates,
    ];

    /// Name sent in the `command` variable.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::FetchTestSets => "FETCH_TEST_SETS",
            Command::FetchTestsList => "FETCH_TESTS_LIST",
            Command::FetchTest => "FETCH_TEST",
            Command::Curl => "CURL",
            Command::FetchMock => "FETCH_MOCK",
            Command::FetchTestRuns => "FETCH_TEST_RUNS",
            Command::FetchTestSetReports => "FETCH_TEST_SET_REPORTS",
            Command::FetchReport => "FETCH_REPORT",
            Command::RemoveDuplicates => "REMOVE_DUPLICATES",
        }
    }

    /// Parameters the backend expects besides the submission id, in the
    /// order they are declared in the operation.
    pub fn parameters(&self) -> &'static [&'static str] {
        match self {
            Command::FetchTestSets | Command::FetchTestRuns => &[],
            Command::FetchTestsList | Command::FetchMock | Command::RemoveDuplicates => {
                &[TEST_SET_NAME]
            }
            Command::FetchTest => &[TEST_SET_NAME, TEST_CASE_NAME],
            Command::Curl => &[COMMAND_CONTENT],
            Command::FetchTestSetReports => &[TEST_RUN_NAME],
            Command::FetchReport => &[TEST_RUN_NAME, TEST_SET_REPORT_NAME],
        }
    }

    /// GraphQL operation name used in the subscription document.
    pub fn operation_name(&self) -> &'static str {
        match self {
            Command::FetchTestSets => "FetchTestSets",
            Command::FetchTestsList => "FetchTestList",
            Command::FetchTest => "FetchTest",
            Command::Curl => "CurlCommand",
            Command::FetchMock => "FetchMock",
            Command::FetchTestRuns
            | Command::FetchTestSetReports
            | Command::FetchReport
            | Command::RemoveDuplicates => "RunCommand",
        }
    }

    /// Builds the `runCommand` subscription document for this command.
    pub fn document(&self) -> String {
        let mut declarations = vec![
            format!("${}: String!", CODE_SUBMISSION_ID),
            format!("${}: String!", COMMAND),
        ];
        let mut arguments = vec![
            format!("{0}: ${0}", CODE_SUBMISSION_ID),
            format!("{0}: ${0}", COMMAND),
        ];
        for name in self.parameters() {
            declarations.push(format!("${}: String!", name));
            arguments.push(format!("{0}: ${0}", name));
        }

        format!(
            "subscription {}({}) {{\n  runCommand({})\n}}",
            self.operation_name(),
            declarations.join(", "),
            arguments.join(", ")
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        Command::ALL
            .iter()
            .copied()
            .find(|command| command.as_str() == s)
            .ok_or_else(|| GatewayError::UnknownCommand(s.to_string()))
    }
}

/// A command bound to a submission and its named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub command: Command,
    pub code_submission_id: String,
    pub params: Vec<(String, String)>,
}

impl CommandRequest {
    pub fn new(command: Command, code_submission_id: impl Into<String>) -> Self {
        Self {
            command,
            code_submission_id: code_submission_id.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Checks the parameters against the command table and produces the POST body.
    pub fn into_graphql(self) -> Result<GraphQLRequest> {
        let expected = self.command.parameters();

        if let Some((name, _)) = self
            .params
            .iter()
            .find(|(name, _)| !expected.contains(&name.as_str()))
        {
            return Err(GatewayError::UnexpectedParameter {
                command: self.command.to_string(),
                name: name.clone(),
            });
        }

        if let Some((_, (name, _))) = self
            .params
            .iter()
            .enumerate()
            .find(|(index, (name, _))| self.params[..*index].iter().any(|(seen, _)| seen == name))
        {
            return Err(GatewayError::DuplicateParameter {
                command: self.command.to_string(),
                name: name.clone(),
            });
        }

        let mut request = GraphQLRequest::new(self.command.document())
            .variable(CODE_SUBMISSION_ID, self.code_submission_id)
            .variable(COMMAND, self.command.as_str());

        for name in expected {
            let value = self
                .params
                .iter()
                .find(|(param, _)| param == name)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| GatewayError::MissingParameter {
                    command: self.command.to_string(),
                    name: name.to_string(),
                })?;
            request = request.variable(*name, value);
        }

        Ok(request)
    }
}
