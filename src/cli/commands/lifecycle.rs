//! Commands running a resource lifecycle operation on the device.

use anyhow::Result;
use tracing::info;

use junos_provider::provider::LifecycleResponse;

use super::{read_document, CommandContext};
use crate::cli::{DocumentArgs, ImportArgs, UpdateArgs};

/// Operation applied to a single document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOp {
    Create,
    Read,
    Delete,
}

impl DocumentOp {
    fn name(&self) -> &'static str {
        match self {
            DocumentOp::Create => "create",
            DocumentOp::Read => "read",
            DocumentOp::Delete => "delete",
        }
    }
}

fn respond(ctx: &CommandContext, response: &LifecycleResponse) -> Result<i32> {
    if let Some(state) = &response.state {
        ctx.output.document(state)?;
    }
    Ok(ctx.finish(&response.diagnostics))
}

impl DocumentArgs {
    pub async fn run(&self, op: DocumentOp, ctx: &CommandContext) -> Result<i32> {
        let provider = ctx.provider()?;
        let document = read_document(&self.file)?;
        info!(resource = %self.resource_type, op = op.name(), "Running lifecycle operation");

        let response = match op {
            DocumentOp::Create => provider.create(&self.resource_type, document).await,
            DocumentOp::Read => provider.read(&self.resource_type, document).await,
            DocumentOp::Delete => provider.delete(&self.resource_type, document).await,
        };

        if op == DocumentOp::Read && response.state.is_none() && !response.diagnostics.has_error() {
            ctx.output.info(&format!(
                "{} no longer exists on the device",
                self.resource_type
            ));
        }
        respond(ctx, &response)
    }
}

impl UpdateArgs {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let provider = ctx.provider()?;
        let state = read_document(&self.state)?;
        let plan = read_document(&self.file)?;
        info!(resource = %self.resource_type, op = "update", "Running lifecycle operation");

        let response = provider.update(&self.resource_type, state, plan).await;
        respond(ctx, &response)
    }
}

impl ImportArgs {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let provider = ctx.provider()?;
        info!(resource = %self.resource_type, id = %self.id, "Importing resource");

        let response = provider.import(&self.resource_type, &self.id).await;
        respond(ctx, &response)
    }
}
