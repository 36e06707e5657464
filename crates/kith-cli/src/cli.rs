//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};

/// Kith CLI - Organize your relationships into capacity-bounded circles.
#[derive(Debug, Parser)]
#[command(name = "kith")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Database path (overrides the configured one)
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(f: CliFormat) -> Self {
        match f {
            CliFormat::Table => Self::Table,
            CliFormat::Json => Self::Json,
            CliFormat::Quiet => Self::Quiet,
        }
    }
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List circle members
    List(ListArgs),

    /// Show the capacity ledger for every tier
    Capacity,

    /// Add a person to a circle
    Add(AddArgs),

    /// Remove a person
    Remove(RecordArgs),

    /// Move a person to another circle
    Move(MoveArgs),

    /// Show where a person can legally move
    Moves(RecordArgs),

    /// Replace the manual order of a circle
    Reorder(ReorderArgs),

    /// Update a person's fields
    Update(UpdateArgs),

    /// Manage anonymous reserved slots
    #[command(subcommand)]
    Reserve(ReserveCommand),

    /// Manage mutual-connection links
    #[command(subcommand)]
    Link(LinkCommand),

    /// Bulk-import contacts into the acquainted circle
    Import(ImportArgs),

    /// Manage the local identity directory
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Emergency view: reachable people in the innermost circles
    Sos(SosArgs),
}

/// Arguments for the list command.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Limit the listing to one tier
    #[arg(short, long)]
    pub tier: Option<String>,
}

/// Arguments naming a single record.
#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Record id (UUID)
    pub id: String,
}

/// Arguments for the add command.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Display name
    pub name: String,

    /// Destination tier
    #[arg(short, long)]
    pub tier: String,

    /// Phone number contact method
    #[arg(long)]
    pub phone: Option<String>,

    /// Email contact method
    #[arg(long)]
    pub email: Option<String>,

    /// Handle contact method
    #[arg(long)]
    pub handle: Option<String>,

    /// Ranking reason (ranked tiers only)
    #[arg(long)]
    pub reason: Option<String>,
}

/// Arguments for the move command.
#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Record id (UUID)
    pub id: String,

    /// Destination tier
    pub tier: String,
}

/// Arguments for the reorder command.
#[derive(Debug, Args)]
pub struct ReorderArgs {
    /// Tier to reorder
    #[arg(short, long)]
    pub tier: String,

    /// Record ids in the desired order (must name the whole tier)
    #[arg(required = true)]
    pub ids: Vec<String>,
}

/// Arguments for the update command.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Record id (UUID)
    pub id: String,

    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New ranking reason; empty string clears it
    #[arg(long)]
    pub reason: Option<String>,
}

/// Reserved-slot subcommands.
#[derive(Debug, Subcommand)]
pub enum ReserveCommand {
    /// List reserved groups
    List,

    /// Create a reserved group
    Add(ReserveAddArgs),

    /// Resize a reserved group (0 deletes it)
    Resize(ReserveResizeArgs),

    /// Delete a reserved group
    Delete(GroupArgs),
}

/// Arguments for reserving slots.
#[derive(Debug, Args)]
pub struct ReserveAddArgs {
    /// Tier to hold capacity in
    #[arg(short, long)]
    pub tier: String,

    /// Number of slots to hold
    #[arg(short, long)]
    pub count: u32,

    /// Private note
    #[arg(long)]
    pub note: Option<String>,
}

/// Arguments for resizing a reserved group.
#[derive(Debug, Args)]
pub struct ReserveResizeArgs {
    /// Group id (UUID)
    pub id: String,

    /// New slot count
    pub count: u32,
}

/// Arguments naming a reserved group.
#[derive(Debug, Args)]
pub struct GroupArgs {
    /// Group id (UUID)
    pub id: String,
}

/// Link subcommands.
#[derive(Debug, Subcommand)]
pub enum LinkCommand {
    /// List links involving you
    List,

    /// Propose a link to another account
    Propose(LinkProposeArgs),

    /// Accept a pending link addressed to you
    Accept(LinkArgs),

    /// Reject a pending link addressed to you
    Reject(LinkArgs),

    /// Revoke an accepted link from either side
    Revoke(LinkArgs),
}

/// Arguments for proposing a link.
#[derive(Debug, Args)]
pub struct LinkProposeArgs {
    /// Target handle (mutually exclusive with --email/--phone)
    pub handle: Option<String>,

    /// Resolve the target by a verified email instead
    #[arg(long, conflicts_with = "handle")]
    pub email: Option<String>,

    /// Resolve the target by a verified phone number instead
    #[arg(long, conflicts_with_all = ["handle", "email"])]
    pub phone: Option<String>,

    /// The tier you propose placing them in
    #[arg(short, long)]
    pub tier: String,

    /// Hide your tier assignment from the target
    #[arg(long)]
    pub private: bool,
}

/// Arguments naming a link.
#[derive(Debug, Args)]
pub struct LinkArgs {
    /// Link id (UUID)
    pub id: String,
}

/// Arguments for the import command.
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// JSON file with candidate contacts
    pub file: String,
}

/// Profile subcommands.
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Register your own handle in the local directory
    Init(ProfileInitArgs),

    /// Register another account (for local testing of links)
    Register(ProfileRegisterArgs),
}

/// Arguments for profile init.
#[derive(Debug, Args)]
pub struct ProfileInitArgs {
    /// Your handle
    pub handle: String,

    /// Your display name (defaults to the handle)
    #[arg(long)]
    pub name: Option<String>,
}

/// Arguments for registering a peer account.
#[derive(Debug, Args)]
pub struct ProfileRegisterArgs {
    /// The account's handle
    pub handle: String,

    /// Display name (defaults to the handle)
    #[arg(long)]
    pub name: Option<String>,

    /// Verified email to attach
    #[arg(long)]
    pub email: Option<String>,

    /// Verified phone to attach
    #[arg(long)]
    pub phone: Option<String>,
}

/// Arguments for the sos command.
#[derive(Debug, Args)]
pub struct SosArgs {
    /// Widen the view to these tiers (defaults to core and sympathy)
    #[arg(short, long)]
    pub tier: Vec<String>,
}
