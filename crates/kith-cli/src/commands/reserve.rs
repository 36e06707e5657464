//! Reserved-slot commands.

use crate::cli::{GroupArgs, ReserveAddArgs, ReserveResizeArgs};
use crate::context::{parse_tier, GraphContext};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kith_domain::GroupId;

/// List reserved groups.
pub fn list(ctx: &GraphContext, formatter: &Formatter) -> Result<String> {
    formatter.format_groups(ctx.graph().groups())
}

/// Create a reserved group.
pub async fn add(
    ctx: &mut GraphContext,
    args: &ReserveAddArgs,
    formatter: &Formatter,
) -> Result<String> {
    let tier = parse_tier(&args.tier)?;

    let id = {
        let group = ctx
            .graph_mut()
            .create_group(tier, args.count, args.note.clone())?;
        group.id
    };
    ctx.commit().await?;

    Ok(formatter.success(&format!(
        "{} slot(s) reserved in {} ({})",
        args.count,
        tier.as_str(),
        id
    )))
}

/// Resize a reserved group; a count of zero deletes it.
pub async fn resize(
    ctx: &mut GraphContext,
    args: &ReserveResizeArgs,
    formatter: &Formatter,
) -> Result<String> {
    let id = parse_group_id(&args.id)?;
    ctx.graph_mut().resize_group(id, args.count)?;
    ctx.commit().await?;

    if args.count == 0 {
        Ok(formatter.success(&format!("reserved group {} released", id)))
    } else {
        Ok(formatter.success(&format!(
            "reserved group {} resized to {}",
            id, args.count
        )))
    }
}

/// Delete a reserved group.
pub async fn delete(
    ctx: &mut GraphContext,
    args: &GroupArgs,
    formatter: &Formatter,
) -> Result<String> {
    let id = parse_group_id(&args.id)?;
    ctx.graph_mut().delete_group(id)?;
    ctx.commit().await?;

    Ok(formatter.success(&format!("reserved group {} released", id)))
}

fn parse_group_id(s: &str) -> Result<GroupId> {
    GroupId::from_string(s).map_err(CliError::InvalidInput)
}
