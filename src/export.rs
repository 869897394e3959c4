//! Report generation
//!
//! Two CSV tables (discovered contacts, manual-research queue) or one JSON
//! document with a run summary. Paths are returned so the caller can print
//! them; writing is all-or-nothing per file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::entity::{EntityResult, ManualResearchItem, ResolutionStatus};

const RESULTS_CSV: &str = "found_results.csv";
const MANUAL_CSV: &str = "manual_research.csv";
const JSON_REPORT: &str = "civicfinder_results.json";

/// Run summary embedded in the JSON report
#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub total_entities: usize,
    pub found: usize,
    pub partial: usize,
    pub unresolved: usize,
    pub total_emails: usize,
    pub total_contacts: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct JsonExport<'a> {
    summary: ExportSummary,
    results: Vec<&'a EntityResult>,
    manual_research: &'a [ManualResearchItem],
}

fn build_summary(results: &[&EntityResult]) -> ExportSummary {
    let count = |status: ResolutionStatus| results.iter().filter(|r| r.status == status).count();
    ExportSummary {
        total_entities: results.len(),
        found: count(ResolutionStatus::Found),
        partial: count(ResolutionStatus::Partial),
        unresolved: count(ResolutionStatus::Unresolved),
        total_emails: results.iter().map(|r| r.emails.len()).sum(),
        total_contacts: results.iter().map(|r| r.contacts.len()).sum(),
        generated_at: Utc::now(),
    }
}

/// Write the two-table CSV report. Returns (results path, manual path).
///
/// The results table carries entities whose site resolved (found or
/// partial); unresolved entities appear only in the manual table.
pub fn export_csv(
    results: &[&EntityResult],
    manual: &[ManualResearchItem],
    output_dir: &Path,
) -> Result<(PathBuf, PathBuf)> {
    let results_path = output_dir.join(RESULTS_CSV);
    let manual_path = output_dir.join(MANUAL_CSV);

    let mut writer = csv::Writer::from_path(&results_path)
        .context(format!("Failed to create {}", results_path.display()))?;

    writer.write_record([
        "Jurisdiction",
        "Category",
        "Entity",
        "Status",
        "Site",
        "Department Pages",
        "Emails",
        "Contacts",
    ])?;

    for result in results {
        if result.status == ResolutionStatus::Unresolved {
            continue;
        }
        let emails = result
            .emails
            .iter()
            .map(|e| e.email.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let contacts = result
            .contacts
            .iter()
            .map(|c| format!("{} - {}", c.name, c.title))
            .collect::<Vec<_>>()
            .join("; ");

        writer.write_record([
            result.entity.jurisdiction(),
            result.entity.category.label().to_string(),
            result.entity.name.clone(),
            result.status.to_string(),
            result.site_url.clone().unwrap_or_default(),
            result.department_pages.join("; "),
            emails,
            contacts,
        ])?;
    }
    writer.flush()?;

    let mut writer = csv::Writer::from_path(&manual_path)
        .context(format!("Failed to create {}", manual_path.display()))?;

    writer.write_record(["Entity", "State", "Category", "Suggested Search"])?;
    for item in manual {
        writer.write_record([
            item.entity_name.clone(),
            item.state.clone(),
            item.category.label().to_string(),
            item.search_query.clone(),
        ])?;
    }
    writer.flush()?;

    tracing::info!(
        results = %results_path.display(),
        manual = %manual_path.display(),
        "CSV report written"
    );
    Ok((results_path, manual_path))
}

/// Write the single-document JSON report. Returns its path.
pub fn export_json(
    results: &[&EntityResult],
    manual: &[ManualResearchItem],
    output_dir: &Path,
) -> Result<PathBuf> {
    let path = output_dir.join(JSON_REPORT);

    let export = JsonExport {
        summary: build_summary(results),
        results: results.to_vec(),
        manual_research: manual,
    };

    let json = serde_json::to_string_pretty(&export)?;
    fs::write(&path, json).context(format!("Failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), "JSON report written");
    Ok(path)
}
