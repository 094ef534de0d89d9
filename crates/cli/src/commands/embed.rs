//! `signalforge embed`: embed text or a JSON record.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::Args;
use serde_json::{Map, Value};
use signalforge_embedding::{
    EmbeddingInput, EmbeddingPipeline, record_to_json_string, truncate, truncate_record,
};

#[derive(Debug, Args)]
pub struct EmbedArgs {
    /// Text to embed
    #[arg(long, conflicts_with = "record", required_unless_present = "record")]
    pub text: Option<String>,

    /// JSON object file to embed
    #[arg(long)]
    pub record: Option<PathBuf>,

    /// Print the record with an `embedding` field instead of the bare vector
    #[arg(long, requires = "record")]
    pub attach: bool,

    /// Print the text that would be embedded without calling the model
    #[arg(long)]
    pub dry_run: bool,
}

fn read_record(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_json::from_str::<Value>(&json).context("Invalid record file")? {
        Value::Object(record) => Ok(record),
        _ => anyhow::bail!("{} must hold a JSON object", path.display()),
    }
}

fn input(args: &EmbedArgs) -> anyhow::Result<EmbeddingInput> {
    match (&args.text, &args.record) {
        (Some(text), _) => Ok(EmbeddingInput::Text(text.clone())),
        (None, Some(path)) => Ok(EmbeddingInput::Record(read_record(path)?)),
        (None, None) => anyhow::bail!("Pass --text or --record"),
    }
}

/// The text sent to the model for `input` under a `max_chars` budget.
fn prepared_text(input: &EmbeddingInput, max_chars: usize) -> anyhow::Result<String> {
    Ok(match input {
        EmbeddingInput::Text(text) => truncate(text, max_chars),
        EmbeddingInput::Record(record) => record_to_json_string(&truncate_record(record, max_chars)),
    })
}

pub async fn run(args: EmbedArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let input = input(&args)?;

    if args.dry_run {
        println!("{}", prepared_text(&input, config.embedding.max_chars)?);
        return Ok(());
    }

    let provider = Arc::new(signalforge_providers::openai_from_config(&config)?);
    let pipeline = EmbeddingPipeline::from_config(provider, &config.embedding);

    match input {
        EmbeddingInput::Record(record) if args.attach => {
            super::print_envelope(&pipeline.attach_embedding(&record).await)
        }
        input => super::print_envelope(&pipeline.embed(&input).await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn dry_run_text_matches_the_record_budget() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let long = "x".repeat(1000);
        write!(file, r#"{{"a": "{long}", "b": "y"}}"#).unwrap();

        let args = EmbedArgs {
            text: None,
            record: Some(file.path().to_path_buf()),
            attach: false,
            dry_run: true,
        };
        let prepared = prepared_text(&input(&args).unwrap(), 512).unwrap();
        assert!(prepared.chars().count() <= 512);
        assert!(prepared.ends_with(r#"…","b":"y"}"#));
    }

    #[test]
    fn non_object_record_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2]").unwrap();
        assert!(read_record(file.path()).is_err());
    }

    #[test]
    fn short_text_is_unchanged() {
        let input = EmbeddingInput::Text("plain".into());
        assert_eq!(prepared_text(&input, 512).unwrap(), "plain");
    }
}
