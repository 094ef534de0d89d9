//! Assistant provisioning for the thread surface.

use std::sync::Arc;

use signalforge_config::{AppConfig, ModelsConfig};
use signalforge_core::envelope::ResultEnvelope;
use signalforge_core::error::{Error, Result};
use signalforge_core::thread::{AssistantSpec, AssistantTool, ThreadProvider};
use signalforge_functions::FunctionRegistry;
use tracing::{error, info};

pub const GENERAL_ASSISTANT_NAME: &str = "General SignalForge Assistant";

pub const GENERAL_ASSISTANT_INSTRUCTIONS: &str = "You are an assistant that organises an organisation's data. \
Use the functions you are given to classify data and shape it into objects, and explain briefly what you did \
and whether it worked.";

/// What kind of assistant to create.
#[derive(Debug, Clone)]
pub struct AssistantRequest {
    pub name: String,
    pub instructions: String,
    /// Function groups to expose; `None` loads every registered group
    pub groups: Option<Vec<String>>,
    pub code_interpreter: bool,
}

impl AssistantRequest {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            groups: None,
            code_interpreter: true,
        }
    }

    /// The general-purpose assistant backed by the `data` group.
    pub fn general() -> Self {
        Self::new(GENERAL_ASSISTANT_NAME, GENERAL_ASSISTANT_INSTRUCTIONS)
            .with_groups(vec![signalforge_functions::groups::data::GROUP_NAME.into()])
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn with_code_interpreter(mut self, enabled: bool) -> Self {
        self.code_interpreter = enabled;
        self
    }
}

/// Creates assistants whose tools mirror a function registry.
pub struct AssistantProvisioner {
    threads: Arc<dyn ThreadProvider>,
    models: ModelsConfig,
}

impl AssistantProvisioner {
    pub fn new(threads: Arc<dyn ThreadProvider>) -> Self {
        Self {
            threads,
            models: ModelsConfig::default(),
        }
    }

    pub fn from_config(threads: Arc<dyn ThreadProvider>, config: &AppConfig) -> Self {
        Self {
            threads,
            models: config.models.clone(),
        }
    }

    /// Load the requested groups and create an assistant offering their
    /// functions. The envelope's data is the new assistant id.
    pub async fn create_assistant(
        &self,
        registry: &mut FunctionRegistry,
        request: AssistantRequest,
    ) -> ResultEnvelope {
        match self.provision(registry, request).await {
            Ok(id) => ResultEnvelope::ok_with_data("Created assistant successfully", id.into()),
            Err(e) => {
                error!(error = %e, "Error creating assistant");
                ResultEnvelope::internal(format!(
                    "Oops! I was unable to get a result ({e}). Please try again shortly."
                ))
            }
        }
    }

    async fn provision(
        &self,
        registry: &mut FunctionRegistry,
        request: AssistantRequest,
    ) -> Result<String> {
        registry.load_groups(request.groups.as_deref())?;
        let declarations = registry.declarations(None)?;

        let mut tools: Vec<AssistantTool> = declarations
            .iter()
            .cloned()
            .map(|function| AssistantTool::Function { function })
            .collect();
        if request.code_interpreter {
            tools.push(AssistantTool::CodeInterpreter);
        }

        let model = self
            .models
            .full
            .first()
            .cloned()
            .ok_or_else(|| Error::Validation("no full models configured".into()))?;

        let spec = AssistantSpec {
            name: request.name,
            instructions: request.instructions,
            model,
            temperature: 0.5,
            tools,
        };
        info!(name = %spec.name, model = %spec.model, tools = spec.tools.len(), "Creating assistant");

        let id = self.threads.create_assistant(spec).await?;
        if id.is_empty() {
            return Err(Error::Internal("Unable to create assistant".into()));
        }
        Ok(id)
    }
}
