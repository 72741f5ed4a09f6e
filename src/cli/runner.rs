//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OptionList, OutputFormat};
use crate::config::ConnectionConfig;
use crate::error::{Error, Result, ResultExt};
use crate::filter::{compile, FilterNode};
use crate::node::{EmailKind, MauticNode, OptionEntry};
use crate::operations::OperationRequest;
use crate::types::{JsonObject, JsonValue};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Check => self.check().await,
            Commands::Run {
                resource,
                operation,
                params,
                continue_on_fail,
            } => {
                let params = parse_params(params.as_deref())?;
                let request = OperationRequest::new(resource, operation).with_params(params);
                self.execute(vec![request], *continue_on_fail).await
            }
            Commands::Batch {
                input,
                continue_on_fail,
            } => {
                let requests = load_batch(input)?;
                self.execute(requests, *continue_on_fail).await
            }
            Commands::Options { list } => self.options(*list).await,
            Commands::CompileFilter { json, prefix } => self.compile_filter(json, prefix),
        }
    }

    /// Load and validate the connection configuration
    fn load_config(&self) -> Result<ConnectionConfig> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            let mut config = ConnectionConfig::from_json_str(json_str)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config.validate()?;
            return Ok(config);
        }
        ConnectionConfig::load(self.cli.config.as_deref())
    }

    fn build_node(&self, continue_on_fail: bool) -> Result<MauticNode> {
        let config = self.load_config()?;
        let client = config.client()?;
        Ok(MauticNode::new(Arc::new(client))
            .with_version(config.mautic_version)
            .with_continue_on_fail(continue_on_fail))
    }

    /// Check connection
    async fn check(&self) -> Result<()> {
        let node = self.build_node(false)?;
        match node.check().await {
            Ok(user) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "message": "Connection successful",
                        "user": user.get("username").cloned().unwrap_or(JsonValue::Null)
                    }
                }));
            }
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": format!("Connection failed: {e}")
                    }
                }));
            }
        }
        Ok(())
    }

    /// Run operation requests and print their records
    async fn execute(&self, requests: Vec<OperationRequest>, continue_on_fail: bool) -> Result<()> {
        let node = self.build_node(continue_on_fail)?;
        let started = Instant::now();
        let records = node.execute(&requests).await?;

        for record in &records {
            self.output_message(record);
        }
        if self.cli.verbose {
            self.output_log(&format!(
                "{} operation(s) produced {} record(s) in {:.2}s",
                requests.len(),
                records.len(),
                started.elapsed().as_secs_f64()
            ));
        }
        Ok(())
    }

    /// Load an option list
    async fn options(&self, list: OptionList) -> Result<()> {
        let node = self.build_node(false)?;
        let options: Vec<OptionEntry> = match list {
            OptionList::Tags => node.list_tags().await?,
            OptionList::Segments => node.list_segments().await?,
            OptionList::Campaigns => node.list_campaigns().await?,
            OptionList::SegmentEmails => node.list_emails(EmailKind::Segment).await?,
            OptionList::CampaignEmails => node.list_emails(EmailKind::Campaign).await?,
            OptionList::Stages => node.list_stages().await?,
            OptionList::ContactFields => node.list_contact_fields().await?,
            OptionList::CompanyFields => node.list_company_fields().await?,
            OptionList::Industries => node.list_industries().await?,
        };

        for option in options {
            self.output_message(&json!({ "name": option.name, "value": option.value }));
        }
        Ok(())
    }

    /// Compile conditions without contacting the instance
    fn compile_filter(&self, conditions: &str, prefix: &str) -> Result<()> {
        let value: JsonValue = serde_json::from_str(conditions)
            .map_err(|e| Error::filter(format!("conditions are not valid JSON: {e}")))?;
        let nodes = FilterNode::parse_list(&value)?;
        let query = compile(&nodes, prefix);

        let pairs: JsonObject = query
            .to_pairs()
            .into_iter()
            .map(|(k, v)| (k, JsonValue::String(v)))
            .collect();
        self.output_message(&JsonValue::Object(pairs));
        Ok(())
    }

    fn output_log(&self, message: &str) {
        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": message
            }
        }));
    }

    /// Output a message
    fn output_message(&self, msg: &JsonValue) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Parse `--params`, defaulting to an empty object
fn parse_params(raw: Option<&str>) -> Result<JsonObject> {
    let Some(raw) = raw else {
        return Ok(JsonObject::new());
    };
    match serde_json::from_str::<JsonValue>(raw)
        .map_err(|e| Error::invalid_param("params", format!("not valid JSON: {e}")))?
    {
        JsonValue::Object(map) => Ok(map),
        _ => Err(Error::invalid_param("params", "expected a JSON object")),
    }
}

/// Read a batch file of operation requests
fn load_batch(path: &Path) -> Result<Vec<OperationRequest>> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound {
            path: path.display().to_string(),
        },
        _ => Error::Io(e),
    })?;
    serde_json::from_str(&content).with_context(|| format!("Invalid batch file {}", path.display()))
}

#[cfg(test)]
mod runner_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_params() {
        assert!(parse_params(None).unwrap().is_empty());
        assert_eq!(parse_params(Some(r#"{"contactId": 4}"#)).unwrap()["contactId"], 4);
        assert!(parse_params(Some("[1]")).is_err());
        assert!(parse_params(Some("{")).is_err());
    }

    #[test]
    fn test_load_batch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"resource": "contact", "operation": "get", "params": {{"contactId": 1}}}},
                {{"resource": "stats", "operation": "getAvailableTables"}}]"#
        )
        .unwrap();

        let requests = load_batch(file.path()).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].params["contactId"], 1);
        assert!(requests[1].params.is_empty());
    }

    #[test]
    fn test_load_batch_missing_file() {
        let err = load_batch(Path::new("/nonexistent/batch.json")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
