//! Orchestration on top of a function registry.
//!
//! Two execution surfaces share the same registry:
//!
//! 1. **execute** ([`ToolCallDispatcher`]): one model request, at most a
//!    bounded number of local function calls, optionally a second request
//!    that interprets the results
//! 2. **execute_thread** ([`ThreadRunStateMachine`]): a polled assistant run
//!    that may stop several times for tool outputs before it completes
//!
//! Both return a [`ResultEnvelope`](signalforge_core::ResultEnvelope) and
//! never surface internal errors to the caller.

pub mod assistant;
pub mod dispatcher;
pub mod thread_run;

pub use assistant::{AssistantProvisioner, AssistantRequest};
pub use dispatcher::{ExecuteRequest, ToolCallDispatcher};
pub use thread_run::{RunAction, RunLogEntry, ThreadRequest, ThreadRunState, ThreadRunStateMachine};
