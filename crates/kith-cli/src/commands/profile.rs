//! Local identity-directory commands.
//!
//! The directory maps handles and verified contact values to accounts so
//! link proposals can resolve their targets. `register` exists so two
//! accounts sharing one local database can exercise the link flow.

use crate::cli::{ProfileInitArgs, ProfileRegisterArgs};
use crate::config::Config;
use crate::context::GraphContext;
use crate::error::Result;
use crate::output::Formatter;
use kith_domain::{ContactKind, UserId};

/// Register the owner's handle and persist the config.
pub fn init(
    ctx: &GraphContext,
    config: &Config,
    args: &ProfileInitArgs,
    formatter: &Formatter,
) -> Result<String> {
    let name = args.name.as_deref().unwrap_or(&args.handle);

    let mut store = ctx.store()?;
    store.register_profile(ctx.owner(), &args.handle, name)?;
    config.save()?;

    Ok(formatter.success(&format!(
        "profile '{}' registered for {}",
        args.handle,
        ctx.owner()
    )))
}

/// Register a peer account in the local directory.
pub fn register(
    ctx: &GraphContext,
    args: &ProfileRegisterArgs,
    formatter: &Formatter,
) -> Result<String> {
    let user_id = UserId::new();
    let name = args.name.as_deref().unwrap_or(&args.handle);

    let mut store = ctx.store()?;
    store.register_profile(user_id, &args.handle, name)?;
    if let Some(email) = &args.email {
        store.register_profile_contact(user_id, ContactKind::Email, email)?;
    }
    if let Some(phone) = &args.phone {
        store.register_profile_contact(user_id, ContactKind::Phone, phone)?;
    }

    Ok(formatter.success(&format!(
        "account '{}' registered as {}",
        args.handle, user_id
    )))
}
