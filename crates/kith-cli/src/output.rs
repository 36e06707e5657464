//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use kith_domain::{RelationshipRecord, ReservedGroup, TierCapacity};
use kith_engine::{ImportOutcome, LinkView, MoveCheck, MoveDirection, MovementOption};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format circle members.
    pub fn format_records(&self, records: &[RelationshipRecord]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<serde_json::Value> = records
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "id": r.id.to_string(),
                            "name": r.display_name,
                            "tier": r.tier.as_str(),
                            "position": r.position,
                            "contacts": r.contact_methods.iter().map(|m| {
                                serde_json::json!({
                                    "kind": m.kind.as_str(),
                                    "value": m.value,
                                    "preferred": m.preferred,
                                    "verified": m.verified,
                                })
                            }).collect::<Vec<_>>(),
                            "ranking_reason": r.ranking_reason,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
            OutputFormat::Quiet => Ok(records
                .iter()
                .map(|r| r.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if records.is_empty() {
                    return Ok(self.colorize("No one here yet.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Name", "Tier", "Pos", "Contacts"]);
                for r in records {
                    let contacts = r
                        .contact_methods
                        .iter()
                        .map(|m| format!("{}:{}", m.kind.as_str(), m.value))
                        .collect::<Vec<_>>()
                        .join(", ");
                    builder.push_record([
                        &r.id.to_string()[..8], // Truncate ID for readability
                        &r.display_name,
                        r.tier.as_str(),
                        &r.position.to_string(),
                        &contacts,
                    ]);
                }
                Ok(self.finish_table(builder))
            }
        }
    }

    /// Format the capacity ledger for every tier.
    pub fn format_capacities(&self, capacities: &[TierCapacity]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<serde_json::Value> = capacities
                    .iter()
                    .map(|c| {
                        serde_json::json!({
                            "tier": c.tier.as_str(),
                            "used": c.used,
                            "reserved": c.reserved,
                            "limit": c.limit,
                            "available": c.available,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
            OutputFormat::Quiet => Ok(capacities
                .iter()
                .map(|c| format!("{} {}", c.tier.as_str(), c.available))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Tier", "Used", "Reserved", "Limit", "Available"]);
                for c in capacities {
                    builder.push_record([
                        c.tier.as_str(),
                        &c.used.to_string(),
                        &c.reserved.to_string(),
                        &c.limit.to_string(),
                        &c.available.to_string(),
                    ]);
                }
                Ok(self.finish_table(builder))
            }
        }
    }

    /// Format reserved groups.
    pub fn format_groups(&self, groups: &[ReservedGroup]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<serde_json::Value> = groups
                    .iter()
                    .map(|g| {
                        serde_json::json!({
                            "id": g.id.to_string(),
                            "tier": g.tier.as_str(),
                            "count": g.count,
                            "note": g.note,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
            OutputFormat::Quiet => Ok(groups
                .iter()
                .map(|g| g.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if groups.is_empty() {
                    return Ok(self.colorize("No reserved slots.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["ID", "Tier", "Count", "Note"]);
                for g in groups {
                    builder.push_record([
                        &g.id.to_string()[..8],
                        g.tier.as_str(),
                        &g.count.to_string(),
                        g.note.as_deref().unwrap_or("-"),
                    ]);
                }
                Ok(self.finish_table(builder))
            }
        }
    }

    /// Format link views from the owner's perspective.
    pub fn format_links(&self, views: &[LinkView]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<serde_json::Value> = views
                    .iter()
                    .map(|v| {
                        serde_json::json!({
                            "id": v.link_id.to_string(),
                            "counterpart": v.counterpart.to_string(),
                            "name": v.target_display_name,
                            "tier": v.tier.map(|t| t.as_str()),
                            "status": v.status.as_str(),
                            "role": if v.is_requester { "requester" } else { "target" },
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
            OutputFormat::Quiet => Ok(views
                .iter()
                .map(|v| v.link_id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if views.is_empty() {
                    return Ok(self.colorize("No links.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["ID", "Name", "Tier", "Status", "Role"]);
                for v in views {
                    builder.push_record([
                        &v.link_id.to_string()[..8],
                        &v.target_display_name,
                        v.tier.map(|t| t.as_str()).unwrap_or("(hidden)"),
                        v.status.as_str(),
                        if v.is_requester { "requester" } else { "target" },
                    ]);
                }
                Ok(self.finish_table(builder))
            }
        }
    }

    /// Format the legal destinations for a record.
    pub fn format_options(&self, options: &[MovementOption]) -> Result<String> {
        if options.is_empty() {
            return Ok(self.colorize("This circle has no movement edges.", "yellow"));
        }

        let mut lines = Vec::new();
        for option in options {
            let direction = match option.direction {
                MoveDirection::Promote => "promote",
                MoveDirection::Demote => "demote",
            };
            let viability = match option.check {
                MoveCheck::Allowed => self.colorize("available", "green"),
                MoveCheck::DestinationFull => self.colorize("full", "yellow"),
                MoveCheck::NotAnAllowedEdge => self.colorize("not allowed", "red"),
            };
            lines.push(format!(
                "{} ({}) - {}",
                option.tier.as_str(),
                direction,
                viability
            ));
        }
        Ok(lines.join("\n"))
    }

    /// Format per-candidate import outcomes.
    pub fn format_import(&self, outcomes: &[ImportOutcome]) -> Result<String> {
        let mut lines = Vec::new();
        for outcome in outcomes {
            let line = match outcome {
                ImportOutcome::Added { display_name, .. } => {
                    self.success(&format!("{} imported", display_name))
                }
                ImportOutcome::Duplicate { display_name, .. } => {
                    self.colorize(&format!("~ {} skipped (duplicate contact)", display_name), "yellow")
                }
                ImportOutcome::TierFull { display_name } => {
                    self.error(&format!("{} skipped (acquainted circle full)", display_name))
                }
            };
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    fn finish_table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }
        match color {
            "green" => text.green().to_string(),
            "red" => text.red().to_string(),
            "yellow" => text.yellow().to_string(),
            "blue" => text.blue().to_string(),
            _ => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kith_domain::Tier;

    fn create_test_record() -> RelationshipRecord {
        RelationshipRecord::new("Alice", Tier::Close, 0, 12345678)
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let records = vec![create_test_record()];
        let output = formatter.format_records(&records).unwrap();
        assert!(output.contains("Alice"));
        assert!(output.contains("close"));
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let records = vec![create_test_record()];
        let output = formatter.format_records(&records).unwrap();
        // Should just be the ID
        assert!(!output.contains("Alice"));
        assert_eq!(output.len(), 36); // UUID length
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let records = vec![create_test_record()];
        let output = formatter.format_records(&records).unwrap();
        assert!(output.contains("Name"));
        assert!(output.contains("Alice"));
    }

    #[test]
    fn test_empty_records() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_records(&[]).unwrap();
        assert!(output.contains("No one here yet"));
    }

    #[test]
    fn test_capacity_table_lists_every_tier() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let capacities: Vec<TierCapacity> = Tier::ALL
            .iter()
            .map(|&t| TierCapacity::compute(t, &[], &[]))
            .collect();
        let output = formatter.format_capacities(&capacities).unwrap();
        for tier in Tier::ALL {
            assert!(output.contains(tier.as_str()));
        }
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let msg = formatter.success("test");
        assert_eq!(msg, "✓ test");
    }
}
