use crate::catalog::{CatalogService, ResourceRef, SearchScope};
use crate::cli::{CustomEntryArgs, GlobalArgs, GrantArgs, SearchArgs, TagTableArgs};
use crate::config::{resolve_config, CatalogConfig};
use crate::flows::{self, custom_entry, search, tag_table};
use crate::output;
use anyhow::{Context, Result};

struct FlowContext {
    config: CatalogConfig,
    service: Box<dyn CatalogService>,
    location: ResourceRef,
}

impl FlowContext {
    fn load(global: &GlobalArgs) -> Result<Self> {
        let config = resolve_config(global.config.as_deref(), &global.overrides())
            .context("load catalog configuration")?;
        let service = flows::open_catalog(&config).context("open catalog backend")?;
        let location = flows::location_of(&config)?;
        tracing::debug!(
            project = config.project_id(),
            location = %config.location,
            backend = ?config.backend,
            "catalog context ready"
        );
        Ok(Self {
            config,
            service,
            location,
        })
    }
}

pub fn run_custom_entry(global: &GlobalArgs, args: CustomEntryArgs) -> Result<()> {
    let ctx = FlowContext::load(global)?;
    let ids = custom_entry::CustomEntryIds {
        entry_group: &args.entry_group,
        entry: &args.entry,
        tag_template: &args.tag_template,
    };
    let report = custom_entry::run(ctx.service.as_ref(), &ctx.location, &ids)?;
    output::print_report("custom-entry", &report, global.json)
}

pub fn run_tag_table(global: &GlobalArgs, args: TagTableArgs) -> Result<()> {
    let ctx = FlowContext::load(global)?;
    let linked = tag_table::table_resource(ctx.config.project_id(), &args.dataset, &args.table);
    let report = tag_table::run(
        ctx.service.as_ref(),
        &ctx.location,
        &args.tag_template,
        &linked,
    )?;
    output::print_report("tag-table", &report, global.json)
}

pub fn run_grant(global: &GlobalArgs, args: GrantArgs) -> Result<()> {
    let ctx = FlowContext::load(global)?;
    let template = ResourceRef::tag_template(
        ctx.config.project_id(),
        &ctx.config.location,
        &args.tag_template,
    )
    .with_context(|| format!("invalid tag template id {:?}", args.tag_template))?;
    let policy =
        flows::grant_template_role(ctx.service.as_ref(), &template, &args.role, &args.member)?;
    output::print_policy(&policy, global.json)
}

pub fn run_search(global: &GlobalArgs, args: SearchArgs) -> Result<()> {
    let ctx = FlowContext::load(global)?;
    let scope = SearchScope {
        include_org_ids: args.org_ids,
        include_project_ids: args.project_ids,
    };
    let results = search::collect(
        ctx.service.as_ref(),
        scope,
        &args.query,
        args.page_size,
        args.limit,
    )?;
    output::print_search(&args.query, &results, global.json)
}
