//! `signalforge schema`: show what a context file compiles to.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use signalforge_core::context::RequestContext;
use signalforge_schema::build_object_type_descriptions;

use super::context::{build_registry, load_context};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SchemaView {
    /// Every object type with all of its metadata
    Descriptions,
    /// AI-editable properties per object type
    #[default]
    Properties,
    /// Required AI-editable properties per object type
    Required,
    /// Function declarations offered to the model
    Functions,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Request context file (JSON)
    pub context: PathBuf,

    #[arg(long, value_enum, default_value_t)]
    pub view: SchemaView,
}

fn render(context: RequestContext, view: SchemaView) -> anyhow::Result<serde_json::Value> {
    Ok(match view {
        SchemaView::Descriptions => serde_json::to_value(build_object_type_descriptions(
            &context.object_types,
            &context.metadata_types,
        ))?,
        SchemaView::Properties => serde_json::to_value(&context.function_properties)?,
        SchemaView::Required => serde_json::to_value(&context.required_properties)?,
        SchemaView::Functions => {
            let registry = build_registry(context, &[])?;
            serde_json::to_value(registry.declarations(None)?.as_ref())?
        }
    })
}

pub fn run(args: SchemaArgs) -> anyhow::Result<()> {
    let context = load_context(Some(&args.context))?;
    let rendered = render(context, args.view)?;
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}
