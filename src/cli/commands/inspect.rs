//! Commands that work on documents without reaching the device.

use anyhow::Result;
use tracing::debug;

use super::{read_document, CommandContext};
use crate::cli::{DocumentArgs, OutputFormat, PlanArgs, TypeArgs};

/// List registered resource types
pub fn resources(ctx: &CommandContext) -> Result<i32> {
    let provider = ctx.offline_provider();
    let names = provider.registry().names();
    match ctx.output.format() {
        OutputFormat::Human => {
            for name in names {
                println!("{}", name);
            }
        }
        _ => ctx.output.document(&names)?,
    }
    Ok(0)
}

impl TypeArgs {
    /// Print the schema of a resource type
    pub fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let resource = ctx.offline_provider().resource(&self.resource_type)?;
        ctx.output.document(&resource.schema())?;
        Ok(0)
    }
}

impl DocumentArgs {
    /// Validate a document against its resource type
    pub fn validate(&self, ctx: &CommandContext) -> Result<i32> {
        let document = read_document(&self.file)?;
        let diags = ctx
            .offline_provider()
            .validate_resource_config(&self.resource_type, &document);
        if !diags.has_error() {
            ctx.output
                .info(&format!("{} is a valid {}", self.file.display(), self.resource_type));
        }
        Ok(ctx.finish(&diags))
    }
}

impl PlanArgs {
    /// Show the set lines of a document, diffed against a prior state when given
    pub fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let provider = ctx.offline_provider();
        let document = read_document(&self.file)?;
        let (planned, mut diags) = provider.plan_set_lines(&self.resource_type, &document);

        let current = match &self.state {
            Some(state) => {
                let state = read_document(state)?;
                let (current, state_diags) = provider.plan_set_lines(&self.resource_type, &state);
                diags.extend(state_diags);
                current
            }
            None => Vec::new(),
        };

        if !diags.has_error() {
            debug!(
                resource = %self.resource_type,
                current = current.len(),
                planned = planned.len(),
                "Planned set lines"
            );
            if self.state.is_some() {
                ctx.output.diff(&current, &planned)?;
            } else {
                ctx.output.lines(&planned)?;
            }
        }
        Ok(ctx.finish(&diags))
    }
}
