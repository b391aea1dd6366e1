//! CLI argument parsing for the catalog flows.
use crate::config::{BackendKind, ConfigOverrides};
use crate::policy::TAG_TEMPLATE_USER_ROLE;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "dcflow",
    version,
    about = "Idempotent provisioning and IAM flows for a metadata catalog",
    after_help = "Examples:\n  dcflow --project demo --backend local --state /tmp/catalog.json custom-entry --entry-group onprem_group --entry onprem_asset --tag-template onprem_template\n  dcflow --project demo --access-token-file ~/.token tag-table --tag-template trips_template --dataset taxi --table trips\n  dcflow --project demo --access-token-file ~/.token grant-template-user --tag-template trips_template --member user:someone@example.com\n  dcflow --project demo --access-token-file ~/.token search --query 'type=entry' --scope-project demo",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection and output flags shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// JSON config file (schema_version 1)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Project that owns the created resources
    #[arg(long, value_name = "PROJECT", global = true)]
    pub project: Option<String>,

    /// Catalog location (defaults to us-central1)
    #[arg(long, value_name = "LOCATION", global = true)]
    pub location: Option<String>,

    /// Catalog backend
    #[arg(long, value_enum, global = true)]
    pub backend: Option<BackendKind>,

    /// REST endpoint base URL
    #[arg(long, value_name = "URL", global = true)]
    pub endpoint: Option<String>,

    /// File holding an OAuth bearer token for the REST backend
    #[arg(long, value_name = "FILE", global = true)]
    pub access_token_file: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout_secs: Option<u64>,

    /// State file for the local backend
    #[arg(long = "state", value_name = "FILE", global = true)]
    pub state_path: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug detail to stderr
    #[arg(long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            project: self.project.clone(),
            location: self.location.clone(),
            backend: self.backend,
            endpoint: self.endpoint.clone(),
            access_token_file: self.access_token_file.clone(),
            timeout_secs: self.timeout_secs,
            state_path: self.state_path.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    CustomEntry(CustomEntryArgs),
    TagTable(TagTableArgs),
    GrantTemplateUser(GrantArgs),
    Search(SearchArgs),
}

/// Inputs for registering an externally managed asset.
#[derive(Args, Debug, Clone)]
#[command(about = "Create an entry group, a custom entry, a tag template and a tag")]
pub struct CustomEntryArgs {
    #[arg(long, value_name = "ID")]
    pub entry_group: String,

    #[arg(long, value_name = "ID")]
    pub entry: String,

    #[arg(long, value_name = "ID")]
    pub tag_template: String,
}

#[derive(Args, Debug, Clone)]
#[command(about = "Create a tag template and tag an existing BigQuery table entry")]
pub struct TagTableArgs {
    #[arg(long, value_name = "ID")]
    pub tag_template: String,

    /// BigQuery dataset holding the table
    #[arg(long, value_name = "DATASET")]
    pub dataset: String,

    #[arg(long, value_name = "TABLE")]
    pub table: String,
}

#[derive(Args, Debug, Clone)]
#[command(about = "Grant a role on a tag template to one member")]
pub struct GrantArgs {
    #[arg(long, value_name = "ID")]
    pub tag_template: String,

    /// Member with type prefix, e.g. user:someone@example.com
    #[arg(long, value_name = "MEMBER")]
    pub member: String,

    #[arg(long, value_name = "ROLE", default_value = TAG_TEMPLATE_USER_ROLE)]
    pub role: String,
}

#[derive(Args, Debug, Clone)]
#[command(about = "Search the catalog within organization or project scopes")]
pub struct SearchArgs {
    #[arg(long, value_name = "QUERY")]
    pub query: String,

    /// Organization id to include (repeatable)
    #[arg(long = "org", value_name = "ID")]
    pub org_ids: Vec<String>,

    /// Project id to include (repeatable)
    #[arg(long = "scope-project", value_name = "ID")]
    pub project_ids: Vec<String>,

    /// Results requested per page
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,

    /// Stop after this many results
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}
