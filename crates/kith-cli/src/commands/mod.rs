//! Command implementations.

pub mod circle;
pub mod import;
pub mod link;
pub mod profile;
pub mod reserve;

use crate::cli::{Cli, Command, LinkCommand, ProfileCommand, ReserveCommand};
use crate::config::Config;
use crate::context::GraphContext;
use crate::error::Result;
use crate::output::Formatter;

/// Dispatch a parsed command.
pub async fn dispatch(cli: &Cli, config: &Config, formatter: &Formatter) -> Result<String> {
    let mut ctx = GraphContext::open(config, cli.db.as_deref())?;

    match &cli.command {
        Command::List(args) => circle::list(&ctx, args, formatter),
        Command::Capacity => circle::capacity(&ctx, formatter),
        Command::Add(args) => circle::add(&mut ctx, args, formatter).await,
        Command::Remove(args) => circle::remove(&mut ctx, args, formatter).await,
        Command::Move(args) => circle::move_record(&mut ctx, args, formatter).await,
        Command::Moves(args) => circle::moves(&ctx, args, formatter),
        Command::Reorder(args) => circle::reorder(&mut ctx, args, formatter).await,
        Command::Update(args) => circle::update(&mut ctx, args, formatter).await,
        Command::Sos(args) => circle::sos(&ctx, args, formatter),

        Command::Reserve(cmd) => match cmd {
            ReserveCommand::List => reserve::list(&ctx, formatter),
            ReserveCommand::Add(args) => reserve::add(&mut ctx, args, formatter).await,
            ReserveCommand::Resize(args) => reserve::resize(&mut ctx, args, formatter).await,
            ReserveCommand::Delete(args) => reserve::delete(&mut ctx, args, formatter).await,
        },

        Command::Link(cmd) => match cmd {
            LinkCommand::List => link::list(&ctx, formatter),
            LinkCommand::Propose(args) => link::propose(&ctx, args, formatter),
            LinkCommand::Accept(args) => link::accept(&ctx, args, formatter),
            LinkCommand::Reject(args) => link::reject(&ctx, args, formatter),
            LinkCommand::Revoke(args) => link::revoke(&ctx, args, formatter),
        },

        Command::Import(args) => import::run(&mut ctx, args, formatter).await,

        Command::Profile(cmd) => match cmd {
            ProfileCommand::Init(args) => profile::init(&ctx, config, args, formatter),
            ProfileCommand::Register(args) => profile::register(&ctx, args, formatter),
        },
    }
}
