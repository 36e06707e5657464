//! Commands operating on the owner's own circles.

use crate::cli::{AddArgs, ListArgs, MoveArgs, RecordArgs, ReorderArgs, SosArgs, UpdateArgs};
use crate::context::{parse_tier, GraphContext};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kith_domain::{ContactKind, ContactMethod, RecordId, Tier};
use kith_engine::{RecordDraft, RecordPatch};

/// List circle members, optionally scoped to one tier.
pub fn list(ctx: &GraphContext, args: &ListArgs, formatter: &Formatter) -> Result<String> {
    let graph = ctx.graph();

    let records: Vec<_> = match &args.tier {
        Some(name) => {
            let tier = parse_tier(name)?;
            graph.records_in_tier(tier).into_iter().cloned().collect()
        }
        None => Tier::ALL
            .iter()
            .flat_map(|&tier| graph.records_in_tier(tier))
            .cloned()
            .collect(),
    };

    formatter.format_records(&records)
}

/// Show the capacity ledger for every tier.
pub fn capacity(ctx: &GraphContext, formatter: &Formatter) -> Result<String> {
    let capacities: Vec<_> = Tier::ALL.iter().map(|&t| ctx.graph().capacity(t)).collect();
    formatter.format_capacities(&capacities)
}

/// Add a person to a circle.
pub async fn add(ctx: &mut GraphContext, args: &AddArgs, formatter: &Formatter) -> Result<String> {
    let tier = parse_tier(&args.tier)?;

    let mut contact_methods = Vec::new();
    if let Some(phone) = &args.phone {
        contact_methods.push(ContactMethod::new(ContactKind::Phone, phone));
    }
    if let Some(email) = &args.email {
        contact_methods.push(ContactMethod::new(ContactKind::Email, email));
    }
    if let Some(handle) = &args.handle {
        contact_methods.push(ContactMethod::new(ContactKind::Handle, handle));
    }

    let draft = RecordDraft {
        display_name: args.name.clone(),
        contact_methods,
        ranking_reason: args.reason.clone(),
    };

    let (id, position) = {
        let record = ctx.graph_mut().add_record(tier, draft)?;
        (record.id, record.position)
    };
    ctx.commit().await?;

    Ok(formatter.success(&format!(
        "{} added to {} at position {} ({})",
        args.name,
        tier.as_str(),
        position,
        id
    )))
}

/// Remove a person from their circle.
pub async fn remove(
    ctx: &mut GraphContext,
    args: &RecordArgs,
    formatter: &Formatter,
) -> Result<String> {
    let id = parse_record_id(&args.id)?;
    let removed = ctx.graph_mut().remove_record(id)?;
    ctx.commit().await?;

    Ok(formatter.success(&format!(
        "{} removed from {}",
        removed.display_name,
        removed.tier.as_str()
    )))
}

/// Move a person to another circle.
pub async fn move_record(
    ctx: &mut GraphContext,
    args: &MoveArgs,
    formatter: &Formatter,
) -> Result<String> {
    let id = parse_record_id(&args.id)?;
    let destination = parse_tier(&args.tier)?;

    let (name, position) = {
        let record = ctx.graph_mut().move_record(id, destination)?;
        (record.display_name.clone(), record.position)
    };
    ctx.commit().await?;

    Ok(formatter.success(&format!(
        "{} moved to {} at position {}",
        name,
        destination.as_str(),
        position
    )))
}

/// Show where a person can legally move.
pub fn moves(ctx: &GraphContext, args: &RecordArgs, formatter: &Formatter) -> Result<String> {
    let id = parse_record_id(&args.id)?;
    let options = ctx.graph().movement_options(id)?;
    formatter.format_options(&options)
}

/// Replace the manual order of one tier.
pub async fn reorder(
    ctx: &mut GraphContext,
    args: &ReorderArgs,
    formatter: &Formatter,
) -> Result<String> {
    let tier = parse_tier(&args.tier)?;
    let ids: Vec<RecordId> = args
        .ids
        .iter()
        .map(|s| parse_record_id(s))
        .collect::<Result<_>>()?;

    ctx.graph_mut().reorder(tier, &ids)?;
    ctx.commit().await?;

    Ok(formatter.success(&format!("{} reordered", tier.as_str())))
}

/// Update a person's fields.
pub async fn update(
    ctx: &mut GraphContext,
    args: &UpdateArgs,
    formatter: &Formatter,
) -> Result<String> {
    let id = parse_record_id(&args.id)?;

    // An empty --reason clears the ranking reason.
    let ranking_reason = args.reason.as_ref().map(|r| {
        if r.is_empty() {
            None
        } else {
            Some(r.clone())
        }
    });

    let patch = RecordPatch {
        display_name: args.name.clone(),
        contact_methods: None,
        ranking_reason,
    };

    let name = {
        let record = ctx.graph_mut().update_record(id, patch)?;
        record.display_name.clone()
    };
    ctx.commit().await?;

    Ok(formatter.success(&format!("{} updated", name)))
}

/// Emergency view: reachable people in the innermost circles.
pub fn sos(ctx: &GraphContext, args: &SosArgs, formatter: &Formatter) -> Result<String> {
    let tiers: Vec<Tier> = if args.tier.is_empty() {
        vec![Tier::Core, Tier::Sympathy]
    } else {
        args.tier
            .iter()
            .map(|s| parse_tier(s))
            .collect::<Result<_>>()?
    };

    let records: Vec<_> = ctx
        .graph()
        .contactable_records(&tiers)
        .into_iter()
        .cloned()
        .collect();
    formatter.format_records(&records)
}

pub(crate) fn parse_record_id(s: &str) -> Result<RecordId> {
    RecordId::from_string(s).map_err(CliError::InvalidInput)
}
