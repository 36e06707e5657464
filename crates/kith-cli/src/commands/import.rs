//! Bulk contact import from a JSON address-book export.

use crate::cli::ImportArgs;
use crate::context::GraphContext;
use crate::error::Result;
use crate::output::Formatter;
use kith_domain::{ContactKind, ContactMethod};
use kith_engine::{import_batch, ImportCandidate, ImportOutcome};
use serde::Deserialize;
use std::fs;

/// One entry in the import file.
#[derive(Debug, Deserialize)]
struct ImportEntry {
    /// Display name
    name: String,

    /// Phone number, if the source had one
    #[serde(default)]
    phone: Option<String>,

    /// Email address, if the source had one
    #[serde(default)]
    email: Option<String>,

    /// Platform handle, if the source had one
    #[serde(default)]
    handle: Option<String>,
}

impl ImportEntry {
    fn into_candidate(self) -> ImportCandidate {
        let mut contact_methods = Vec::new();
        if let Some(phone) = self.phone {
            contact_methods.push(ContactMethod::new(ContactKind::Phone, phone));
        }
        if let Some(email) = self.email {
            contact_methods.push(ContactMethod::new(ContactKind::Email, email));
        }
        if let Some(handle) = self.handle {
            contact_methods.push(ContactMethod::new(ContactKind::Handle, handle));
        }
        ImportCandidate {
            display_name: self.name,
            contact_methods,
        }
    }
}

/// Import candidates from a JSON array into the acquainted circle.
///
/// Partial success: a full tier or a duplicate skips that candidate only,
/// and whatever was added is committed.
pub async fn run(ctx: &mut GraphContext, args: &ImportArgs, formatter: &Formatter) -> Result<String> {
    let contents = fs::read_to_string(&args.file)?;
    let entries: Vec<ImportEntry> = serde_json::from_str(&contents)?;

    let candidates: Vec<ImportCandidate> = entries
        .into_iter()
        .map(ImportEntry::into_candidate)
        .collect();
    let outcomes = import_batch(ctx.graph_mut(), candidates);
    ctx.commit().await?;

    let added = outcomes
        .iter()
        .filter(|o| matches!(o, ImportOutcome::Added { .. }))
        .count();

    let mut out = formatter.format_import(&outcomes)?;
    out.push('\n');
    out.push_str(&formatter.info(&format!("{} of {} imported", added, outcomes.len())));
    Ok(out)
}
