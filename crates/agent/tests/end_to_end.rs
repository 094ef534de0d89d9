//! Schema rows → registry → dispatcher / thread runner, with scripted providers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use signalforge_agent::{ExecuteRequest, ThreadRequest, ThreadRunStateMachine, ToolCallDispatcher};
use signalforge_config::ThreadsConfig;
use signalforge_core::context::RequestContext;
use signalforge_core::envelope::ResultEnvelope;
use signalforge_core::error::ProviderError;
use signalforge_core::function::{FunctionEntry, FunctionGroup};
use signalforge_core::message::{Message, MessageToolCall};
use signalforge_core::provider::{
    FunctionDeclaration, Provider, ProviderRequest, ProviderResponse, ToolChoice,
};
use signalforge_core::schema::{MetadataType, ObjectType};
use signalforge_core::thread::{
    AssistantSpec, Run, RunStatus, ThreadMessage, ThreadProvider, ToolOutput,
};
use signalforge_functions::{FunctionRegistry, builtin_catalog};
use signalforge_schema::{build_function_properties, build_required_properties};

// --- Fixtures ---

fn object_types() -> Vec<ObjectType> {
    serde_json::from_value(json!([
        {"id": "product", "name": "Product", "description": "Something we sell", "created_at": "2024-01-01"},
        {"id": "feedback", "name": "Feedback", "parent_object_type_id": "product"}
    ]))
    .unwrap()
}

fn metadata_types() -> Vec<MetadataType> {
    serde_json::from_value(json!([
        {"id": "url", "name": "URL", "data_type": "string", "owner_object_type_id": "product", "is_required": true},
        {"id": "internalNote", "name": "Internal note", "data_type": "string",
         "owner_object_type_id": "product", "allow_ai_update": false, "is_required": true},
        {"id": "createdBy", "name": "Created by", "description": "Who created it", "data_type": "string",
         "owner_object_type_id": null},
        {"id": "tags", "name": "Tags", "data_type": "string", "is_array": true, "owner_object_type_id": null}
    ]))
    .unwrap()
}

fn product_context() -> RequestContext {
    let object_types = object_types();
    let metadata_types = metadata_types();
    RequestContext::builder()
        .organisation("org-1", serde_json::Map::new())
        .function_properties(build_function_properties(&object_types, &metadata_types))
        .required_properties(build_required_properties(&object_types, &metadata_types))
        .object_types(object_types)
        .metadata_types(metadata_types)
        .selected_object_type("product")
        .build()
}

/// A `classify` function returning the type name it was given.
struct ClassifyGroup;

impl FunctionGroup for ClassifyGroup {
    fn name(&self) -> &str {
        "classify"
    }

    fn initialise(&self, context: &RequestContext) -> Vec<FunctionEntry> {
        let declaration = FunctionDeclaration {
            name: "classify".into(),
            description: "Classify the data".into(),
            parameters: json!({
                "type": "object",
                "properties": {"typeName": {"type": "string", "enum": context.object_type_ids()}},
                "required": ["typeName"]
            }),
        };
        vec![FunctionEntry::from_fn("classify", declaration, |args| async move {
            Ok(ResultEnvelope::ok_with_data("Classified", args["typeName"].clone()))
        })]
    }
}

fn registry(context: RequestContext) -> Arc<FunctionRegistry> {
    let mut catalog = builtin_catalog();
    catalog.register(Arc::new(ClassifyGroup));
    let mut registry = FunctionRegistry::new(catalog, context);
    registry.load_groups(None).unwrap();
    Arc::new(registry)
}

// --- Scripted providers ---

struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn with_calls(calls: Vec<MessageToolCall>) -> Arc<Self> {
        let mut message = Message::assistant("");
        message.tool_calls = calls;
        Arc::new(Self {
            responses: Mutex::new(vec![ProviderResponse {
                message,
                model: "openai/gpt-4o-mini".into(),
                usage: None,
            }]),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        Ok(self.responses.lock().unwrap().remove(0))
    }
}

/// A run that never leaves `requires_action`.
struct StuckThreads {
    submissions: Mutex<usize>,
    cancelled: Mutex<bool>,
}

fn stuck_run() -> Run {
    Run {
        id: "run_1".into(),
        status: RunStatus::RequiresAction,
        required_tool_calls: vec![MessageToolCall::function(
            "call_1",
            "classify",
            r#"{"typeName":"feedback"}"#,
        )],
        last_error: None,
    }
}

#[async_trait]
impl ThreadProvider for StuckThreads {
    fn name(&self) -> &str {
        "stuck"
    }

    async fn create_thread(&self, _messages: Vec<Message>) -> Result<String, ProviderError> {
        Ok("thread_1".into())
    }

    async fn create_run(&self, _thread: &str, _assistant: &str) -> Result<Run, ProviderError> {
        Ok(stuck_run())
    }

    async fn retrieve_run(&self, _thread: &str, _run: &str) -> Result<Run, ProviderError> {
        Ok(stuck_run())
    }

    async fn submit_tool_outputs(
        &self,
        _thread: &str,
        _run: &str,
        _outputs: Vec<ToolOutput>,
    ) -> Result<Run, ProviderError> {
        *self.submissions.lock().unwrap() += 1;
        Ok(stuck_run())
    }

    async fn list_messages(&self, _thread: &str) -> Result<Vec<ThreadMessage>, ProviderError> {
        Ok(Vec::new())
    }

    async fn cancel_run(&self, _thread: &str, _run: &str) -> Result<Run, ProviderError> {
        *self.cancelled.lock().unwrap() = true;
        Ok(stuck_run())
    }

    async fn create_assistant(&self, _spec: AssistantSpec) -> Result<String, ProviderError> {
        Ok("asst_1".into())
    }
}

// --- Tests ---

#[tokio::test]
async fn classify_returns_the_predicted_type() {
    let provider = ScriptedProvider::with_calls(vec![MessageToolCall::function(
        "call_1",
        "classify",
        r#"{"typeName":"feedback"}"#,
    )]);
    let dispatcher = ToolCallDispatcher::new(provider.clone(), registry(product_context()));

    let result = dispatcher
        .execute(
            ExecuteRequest::text("Classify the data", "The checkout page is slow")
                .with_tool_choice(ToolChoice::Required)
                .with_functions(vec!["classify".into()]),
        )
        .await;

    assert_eq!(result.status, 200);
    assert_eq!(result.data, Some(json!("feedback")));

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].tools.len(), 1);
    assert_eq!(requests[0].tool_choice, Some(ToolChoice::Required));
}

#[tokio::test]
async fn process_data_schema_comes_from_editable_metadata() {
    let provider = ScriptedProvider::with_calls(vec![MessageToolCall::function(
        "call_1",
        "processDataUsingGivenObjectsMetadataStructure",
        r#"{"url":"https://shop.example/p/1","createdBy":"ana","tags":["new"]}"#,
    )]);
    let dispatcher = ToolCallDispatcher::new(provider.clone(), registry(product_context()));

    let result = dispatcher
        .execute(ExecuteRequest::text("Structure the data", "Product page https://shop.example/p/1"))
        .await;

    assert_eq!(result.status, 200);
    let data = result.data.unwrap();
    assert_eq!(data["related_object_type_id"], "product");
    assert_eq!(data["owner_organisation_id"], "org-1");
    assert_eq!(data["metadata"]["url"], "https://shop.example/p/1");

    let requests = provider.requests.lock().unwrap();
    let declaration = requests[0]
        .tools
        .iter()
        .find(|t| t.name == "processDataUsingGivenObjectsMetadataStructure")
        .unwrap();
    let properties = declaration.parameters["properties"].as_object().unwrap();
    let keys: Vec<&str> = properties.keys().map(String::as_str).collect();
    assert_eq!(keys, ["url", "createdBy", "tags"]);
    assert_eq!(properties["tags"]["type"], "array");
    assert_eq!(declaration.parameters["required"], json!(["url"]));
}

#[tokio::test]
async fn two_requested_calls_execute_only_the_first() {
    let provider = ScriptedProvider::with_calls(vec![
        MessageToolCall::function("call_1", "classify", r#"{"typeName":"product"}"#),
        MessageToolCall::function("call_2", "missing", "{}"),
    ]);
    let dispatcher = ToolCallDispatcher::new(provider, registry(product_context()));

    let result = dispatcher
        .execute(ExecuteRequest::text("Classify", "A new blender"))
        .await;

    // The unknown second call is never resolved, so the first call's result comes back.
    assert_eq!(result.status, 200);
    assert_eq!(result.data, Some(json!("product")));
}

#[tokio::test(start_paused = true)]
async fn stuck_thread_run_gives_up_after_the_bound() {
    let threads = Arc::new(StuckThreads {
        submissions: Mutex::new(0),
        cancelled: Mutex::new(false),
    });
    let limits = ThreadsConfig {
        poll_interval_ms: 500,
        max_iterations: 120,
        max_wall_time_secs: 300,
    };
    let machine =
        ThreadRunStateMachine::with_limits(threads.clone(), registry(product_context()), &limits);

    let result = machine
        .execute_thread(ThreadRequest::new("asst_1", "Classify: the app crashes"))
        .await;

    assert_eq!(result.status, 500);
    assert!(result.message.contains("Run History:"));
    assert!(result.message.contains("Ran function: classify"));
    assert_eq!(*threads.submissions.lock().unwrap(), 120);
    assert!(*threads.cancelled.lock().unwrap());
}
