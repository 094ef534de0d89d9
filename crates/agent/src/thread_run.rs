//! Polling state machine for assistant thread runs ("execute_thread").
//!
//! A run is created against an assistant and polled until it completes or
//! fails. Whenever it stops in `requires_action`, the requested functions
//! run one after another and their outputs go back in a single batch.
//! The loop is bounded by an iteration count and a wall-clock budget.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use signalforge_config::{AppConfig, DEFAULT_FALLBACK_MESSAGE, ThreadsConfig};
use signalforge_core::envelope::ResultEnvelope;
use signalforge_core::error::{Error, FunctionError, Result, ThreadError};
use signalforge_core::message::{Message, MessageToolCall};
use signalforge_core::thread::{Run, RunStatus, ThreadProvider, ToolOutput};
use signalforge_functions::FunctionRegistry;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// What the state machine did in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunAction {
    Wait,
    RunFunction,
    FunctionError,
    SubmitOutputs,
    Complete,
    Fail,
    TimeOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunLogEntry {
    pub iteration: u32,
    pub action: RunAction,
    pub outcome: String,
    pub at: DateTime<Utc>,
}

impl fmt::Display for RunLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.iteration, self.outcome)
    }
}

/// Per-call state. Created by `execute_thread`, dropped when it returns.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadRunState {
    pub thread_id: String,
    pub run_id: String,
    pub status: RunStatus,
    pub iteration_count: u32,
    pub history: Vec<RunLogEntry>,
}

impl ThreadRunState {
    fn new(thread_id: String, run: &Run) -> Self {
        Self {
            thread_id,
            run_id: run.id.clone(),
            status: run.status,
            iteration_count: 0,
            history: Vec::new(),
        }
    }

    fn log(&mut self, action: RunAction, outcome: impl Into<String>) {
        self.history.push(RunLogEntry {
            iteration: self.iteration_count,
            action,
            outcome: outcome.into(),
            at: Utc::now(),
        });
    }

    /// The run history shown to callers. Idle polls are left out.
    pub fn render_history(&self) -> String {
        self.history
            .iter()
            .filter(|entry| entry.action != RunAction::Wait)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n-----\n")
    }
}

/// A prompt to run on an assistant thread.
#[derive(Debug, Clone)]
pub struct ThreadRequest {
    pub assistant_id: String,
    pub prompt: String,
    /// Turns placed on the thread before the prompt
    pub history: Vec<Message>,
}

impl ThreadRequest {
    pub fn new(assistant_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            prompt: prompt.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }
}

pub struct ThreadRunStateMachine {
    threads: Arc<dyn ThreadProvider>,
    registry: Arc<FunctionRegistry>,
    poll_interval: Duration,
    max_iterations: u32,
    max_wall_time: Duration,
    fallback_message: String,
}

impl ThreadRunStateMachine {
    pub fn new(threads: Arc<dyn ThreadProvider>, registry: Arc<FunctionRegistry>) -> Self {
        Self::with_limits(threads, registry, &ThreadsConfig::default())
    }

    pub fn with_limits(
        threads: Arc<dyn ThreadProvider>,
        registry: Arc<FunctionRegistry>,
        limits: &ThreadsConfig,
    ) -> Self {
        Self {
            threads,
            registry,
            poll_interval: limits.poll_interval(),
            max_iterations: limits.max_iterations,
            max_wall_time: limits.max_wall_time(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }

    pub fn from_config(
        threads: Arc<dyn ThreadProvider>,
        registry: Arc<FunctionRegistry>,
        config: &AppConfig,
    ) -> Self {
        Self::with_limits(threads, registry, &config.threads)
            .with_fallback_message(config.messages.fallback.clone())
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    /// Run a prompt on a fresh thread. Never fails: every error becomes an envelope.
    pub async fn execute_thread(&self, request: ThreadRequest) -> ResultEnvelope {
        if request.prompt.is_empty() {
            return ResultEnvelope::bad_request("No prompt provided for thread execution");
        }

        let mut messages = request.history.clone();
        messages.push(Message::user(request.prompt.as_str()));

        let thread_id = match self.threads.create_thread(messages).await {
            Ok(id) => id,
            Err(e) => return self.provider_failure(&Error::from(e)),
        };
        let run = match self.threads.create_run(&thread_id, &request.assistant_id).await {
            Ok(run) => run,
            Err(e) => return self.provider_failure(&Error::from(e)),
        };
        info!(
            thread_id = %thread_id,
            run_id = %run.id,
            assistant_id = %request.assistant_id,
            functions = ?self.registry.names(),
            "Thread run created"
        );

        let mut state = ThreadRunState::new(thread_id, &run);
        match self.drive(&mut state, run).await {
            Ok(text) => {
                info!(
                    thread_id = %state.thread_id,
                    iterations = state.iteration_count,
                    history = %state.render_history(),
                    "Thread run completed"
                );
                ResultEnvelope::ok(text)
            }
            Err(Error::Thread(e)) => {
                if matches!(e, ThreadError::PollTimeout { .. }) {
                    self.cancel(&state).await;
                }
                error!(error = %e, thread_id = %state.thread_id, run_id = %state.run_id, "Thread run failed");
                ResultEnvelope::internal(format!(
                    "{}\n\nRun History:{}",
                    self.fallback_message,
                    state.render_history()
                ))
            }
            Err(e) => self.provider_failure(&e),
        }
    }

    async fn drive(&self, state: &mut ThreadRunState, mut run: Run) -> Result<String> {
        let started = Instant::now();

        loop {
            state.iteration_count += 1;
            state.status = run.status;
            let iteration = state.iteration_count;

            match run.status {
                RunStatus::Queued | RunStatus::InProgress => {
                    state.log(RunAction::Wait, format!("Run {}", run.status));
                }
                RunStatus::RequiresAction => {
                    debug!(iteration, calls = run.required_tool_calls.len(), "Run requires action");
                    let outputs = self.run_tool_calls(state, &run.required_tool_calls).await;
                    if !outputs.is_empty() {
                        let count = outputs.len();
                        self.threads
                            .submit_tool_outputs(&state.thread_id, &run.id, outputs)
                            .await?;
                        state.log(RunAction::SubmitOutputs, format!("Submitted {count} tool output(s)"));
                    }
                }
                RunStatus::Completed => return self.completed_text(state).await,
                status => {
                    let reason = run.last_error.clone().unwrap_or_else(|| "Unknown error".into());
                    state.log(
                        RunAction::Fail,
                        format!("Thread run failed with status: {status}\nReason: {reason}"),
                    );
                    return Err(ThreadError::RunTerminalFailure {
                        status: status.to_string(),
                        reason,
                    }
                    .into());
                }
            }

            let elapsed = started.elapsed();
            if iteration >= self.max_iterations || elapsed >= self.max_wall_time {
                state.log(
                    RunAction::TimeOut,
                    format!("Thread run still {} after {iteration} polls", run.status),
                );
                return Err(ThreadError::PollTimeout {
                    iterations: iteration,
                    elapsed_secs: elapsed.as_secs(),
                }
                .into());
            }

            tokio::time::sleep(self.poll_interval).await;
            run = self.threads.retrieve_run(&state.thread_id, &state.run_id).await?;
        }
    }

    /// Run each requested function in order, producing one output per call.
    async fn run_tool_calls(
        &self,
        state: &mut ThreadRunState,
        calls: &[MessageToolCall],
    ) -> Vec<ToolOutput> {
        let mut outputs = Vec::with_capacity(calls.len());

        for call in calls {
            if !call.is_function() {
                debug!(kind = %call.kind, "Skipping non-function tool call");
                continue;
            }
            info!(
                iteration = state.iteration_count,
                function = %call.name,
                arguments = %call.arguments,
                "Running requested function"
            );

            let output = match self.registry.invoke(&call.name, &call.arguments).await {
                Ok(result) => {
                    state.log(
                        RunAction::RunFunction,
                        format!(
                            "Ran function: {}\nArguments: {}\nResult: {}",
                            call.name, call.arguments, result.message
                        ),
                    );
                    serde_json::to_string(&result).unwrap_or_else(|e| {
                        error_output(500, &format!("Error executing function \"{}\": {e}", call.name))
                    })
                }
                Err(e) => {
                    let (status, message) = describe_failure(&call.name, &e);
                    warn!(function = %call.name, error = %message, "Function call failed");
                    state.log(RunAction::FunctionError, format!("Error: {message}"));
                    error_output(status, &message)
                }
            };

            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output,
            });
        }
        outputs
    }

    async fn completed_text(&self, state: &mut ThreadRunState) -> Result<String> {
        let messages = self.threads.list_messages(&state.thread_id).await?;
        let text = messages
            .first()
            .and_then(|m| m.first_text())
            .map(str::to_string);

        match text {
            Some(text) => {
                state.log(
                    RunAction::Complete,
                    format!("Thread run completed with first text message:\n{text}"),
                );
                Ok(text)
            }
            None => {
                state.log(RunAction::Fail, "Thread run completed without a text message");
                Err(ThreadError::NoTextResponse(state.thread_id.clone()).into())
            }
        }
    }

    async fn cancel(&self, state: &ThreadRunState) {
        if let Err(e) = self.threads.cancel_run(&state.thread_id, &state.run_id).await {
            warn!(error = %e, run_id = %state.run_id, "Failed to cancel timed-out run");
        }
    }

    fn provider_failure(&self, e: &Error) -> ResultEnvelope {
        error!(error = %e, provider = self.threads.name(), "Thread execution failed");
        ResultEnvelope::internal(self.fallback_message.as_str())
    }
}

/// Status code and message reported back to the run for a failed call.
fn describe_failure(function: &str, e: &FunctionError) -> (u16, String) {
    match e {
        FunctionError::NotFound { .. } => (404, e.to_string()),
        FunctionError::ExecutionFailed { .. } => (500, e.to_string()),
        other => (500, format!("Error executing function \"{function}\": {other}")),
    }
}

fn error_output(status: u16, message: &str) -> String {
    serde_json::json!({ "status": status, "error": message }).to_string()
}
