//! `ragctx assemble` — Retrieve for one query and print the assembled context.

use std::sync::Arc;

use ragctx_config::AppConfig;
use ragctx_context::ContextAssembler;
use ragctx_core::FAILED_MESSAGE_CONTENT;
use ragctx_core::tenant::{QueryOptions, Tenant};
use ragctx_retrieval::HttpRetrievalBackend;
use tracing::error;

pub struct AssembleArgs {
    pub query: String,
    pub tenant_id: String,
    pub tenant_name: String,
    pub slug: Option<String>,
    pub partition: Option<String>,
    pub system_prompt: Option<String>,
    pub breadth: bool,
    pub rerank: bool,
    pub recent: bool,
}

impl AssembleArgs {
    fn tenant(&self) -> Tenant {
        let mut tenant = Tenant::new(&self.tenant_id, &self.tenant_name);
        if let Some(slug) = &self.slug {
            tenant = tenant.with_slug(slug);
        }
        if let Some(partition) = &self.partition {
            tenant = tenant.with_partition(partition);
        }
        if let Some(template) = &self.system_prompt {
            tenant = tenant.with_system_prompt(template);
        }
        tenant
    }

    fn options(&self) -> QueryOptions {
        QueryOptions {
            breadth: self.breadth,
            rerank: self.rerank,
            prioritize_recent: self.recent,
        }
    }
}

pub async fn run(args: AssembleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No retrieval API key configured!");
        eprintln!();
        eprintln!("  Set the RAGCTX_API_KEY environment variable, or add it to:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let backend = HttpRetrievalBackend::from_config(&config.retrieval)?;
    let assembler = ContextAssembler::from_config(Arc::new(backend), &config);

    match assembler
        .assemble(&args.tenant(), &args.query, args.options())
        .await
    {
        Ok(context) => {
            println!("{}", serde_json::to_string_pretty(&context)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Context assembly failed");
            eprintln!("{FAILED_MESSAGE_CONTENT}");
            std::process::exit(1);
        }
    }
}
