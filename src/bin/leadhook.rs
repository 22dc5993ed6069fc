//! Command-line lead webhook normalizer.
//!
//! Reads a JSON payload from a file or stdin, normalizes it and prints the
//! result as pretty JSON. Without `--type` the provider is detected from the
//! headers and payload.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use leadhook::{LoggingConfig, PipelineConfig, RequestContext, WebhookPipeline};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "leadhook", version, about = "Normalize a lead webhook payload")]
struct Cli {
    /// Webhook type key (facebook, google-forms, linkedin, hubspot, zapier, swipepages, generic)
    #[arg(short = 't', long = "type", value_name = "KEY")]
    type_key: Option<String>,

    /// User agent of the original request
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Content type of the original request
    #[arg(long, value_name = "MIME")]
    content_type: Option<String>,

    /// Request header, repeatable
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// YAML pipeline configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Payload file; stdin when omitted or `-`
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

impl Cli {
    fn input_path(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|path| path.as_os_str() != "-")
    }

    fn request_context(&self) -> RequestContext {
        let mut ctx = RequestContext::from_headers(self.headers.iter().cloned());
        if let Some(agent) = &self.user_agent {
            ctx = ctx.with_user_agent(agent.clone());
        }
        if let Some(content_type) = &self.content_type {
            ctx = ctx.with_content_type(content_type.clone());
        }
        ctx
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("header must look like name:value, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in `{raw}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_payload(input: Option<&PathBuf>) -> anyhow::Result<Value> {
    let text = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("payload is not valid JSON")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    init_tracing(&config.logging);

    let pipeline = WebhookPipeline::with_config(config)?;
    let ctx = cli.request_context();

    let raw = read_payload(cli.input_path())?;
    let type_key = match cli.type_key.as_deref() {
        Some(key) => key,
        None => pipeline.detect_webhook_type(&ctx, &raw),
    };

    let data = pipeline.process_webhook(type_key, &raw, &ctx)?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}
