//! Mutual-connection link commands.
//!
//! Links live in the shared store rather than in one user's graph, so
//! these commands persist through [`GraphStore`] directly instead of the
//! graph session. Accepting a link also touches the requester's graph;
//! the link flip and the graph commit share one transaction so a version
//! conflict leaves neither behind.

use crate::cli::{LinkArgs, LinkProposeArgs};
use crate::context::{parse_tier, GraphContext};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kith_domain::{ContactKind, GraphStore, Identifier, LinkId};
use kith_engine::ConnectionLinker;

/// List links involving the owner, on either side.
pub fn list(ctx: &GraphContext, formatter: &Formatter) -> Result<String> {
    let store = ctx.store()?;
    let links = store.links_for_user(ctx.owner())?;
    let linker = ConnectionLinker::from_links(ctx.store()?, links.clone());

    let mut views = Vec::with_capacity(links.len());
    for link in &links {
        // Disclosure reads the live tier from the requester's graph.
        let view = if link.requester == ctx.owner() {
            linker.view_for(link.id, ctx.owner(), ctx.graph())?
        } else {
            let (requester_graph, _) = ctx.load_peer_graph(&store, link.requester)?;
            linker.view_for(link.id, ctx.owner(), &requester_graph)?
        };
        views.push(view);
    }

    formatter.format_links(&views)
}

/// Propose a link to another account.
pub fn propose(
    ctx: &GraphContext,
    args: &LinkProposeArgs,
    formatter: &Formatter,
) -> Result<String> {
    let identifier = identifier_from(args)?;
    let tier = parse_tier(&args.tier)?;

    let mut write_store = ctx.store()?;
    // The target needs a registered profile to see the proposal, and so
    // does the proposer to be named in it.
    if write_store.profile_handle(ctx.owner())?.is_none() {
        return Err(CliError::NoProfile);
    }
    let links = write_store.links_for_user(ctx.owner())?;
    let mut linker = ConnectionLinker::from_links(ctx.store()?, links);

    let link = linker
        .propose(ctx.graph(), &identifier, tier, !args.private)?
        .clone();
    write_store.put_link(&link)?;

    Ok(formatter.success(&format!(
        "link proposed to {} for {} ({})",
        link.target_display_name,
        tier.as_str(),
        link.id
    )))
}

/// Accept a pending link addressed to the owner.
pub fn accept(ctx: &GraphContext, args: &LinkArgs, formatter: &Formatter) -> Result<String> {
    let id = parse_link_id(&args.id)?;

    let mut write_store = ctx.store()?;
    let links = write_store.links_for_user(ctx.owner())?;
    let mut linker = ConnectionLinker::from_links(ctx.store()?, links);

    let requester = linker
        .get_link(id)
        .ok_or_else(|| CliError::InvalidInput(format!("no link {}", id)))?
        .requester;
    let (mut requester_graph, version) = ctx.load_peer_graph(&write_store, requester)?;

    let accepted = linker.accept(id, ctx.owner(), &mut requester_graph)?.clone();
    write_store.commit_graph_with_link(
        requester,
        version,
        requester_graph.records(),
        requester_graph.groups(),
        &accepted,
    )?;

    Ok(formatter.success(&format!(
        "link with {} accepted",
        accepted.target_display_name
    )))
}

/// Reject a pending link addressed to the owner.
pub fn reject(ctx: &GraphContext, args: &LinkArgs, formatter: &Formatter) -> Result<String> {
    let id = parse_link_id(&args.id)?;

    let mut write_store = ctx.store()?;
    let links = write_store.links_for_user(ctx.owner())?;
    let mut linker = ConnectionLinker::from_links(ctx.store()?, links);

    let rejected = linker.reject(id, ctx.owner())?;
    write_store.delete_link(id)?;

    Ok(formatter.success(&format!(
        "link from {} rejected",
        rejected.target_display_name
    )))
}

/// Revoke an accepted link from either side.
pub fn revoke(ctx: &GraphContext, args: &LinkArgs, formatter: &Formatter) -> Result<String> {
    let id = parse_link_id(&args.id)?;

    let mut write_store = ctx.store()?;
    let links = write_store.links_for_user(ctx.owner())?;
    let mut linker = ConnectionLinker::from_links(ctx.store()?, links);

    linker.revoke(id, ctx.owner())?;
    write_store.delete_link(id)?;

    Ok(formatter.success("link revoked"))
}

fn identifier_from(args: &LinkProposeArgs) -> Result<Identifier> {
    if let Some(handle) = &args.handle {
        Ok(Identifier::Handle(handle.clone()))
    } else if let Some(email) = &args.email {
        Ok(Identifier::ContactValue(ContactKind::Email, email.clone()))
    } else if let Some(phone) = &args.phone {
        Ok(Identifier::ContactValue(ContactKind::Phone, phone.clone()))
    } else {
        Err(CliError::InvalidInput(
            "supply a handle, --email, or --phone to identify the target".to_string(),
        ))
    }
}

fn parse_link_id(s: &str) -> Result<LinkId> {
    LinkId::from_string(s).map_err(CliError::InvalidInput)
}
