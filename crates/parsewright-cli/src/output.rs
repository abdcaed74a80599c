//! Output formatting for the CLI.

use crate::cli::CliFormat;
use crate::error::Result;
use parsewright_agent::{RunOutcome, RunReport};
use parsewright_domain::{ProfileId, ValidationOutcome};
use parsewright_store::PersistedArtifact;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// One row of the `profiles` listing.
#[derive(Debug, Clone)]
pub struct ProfileStatus {
    /// Profile id
    pub id: ProfileId,
    /// Origin of the persisted parser, if there is one
    pub artifact: Option<String>,
}

/// Output formatter.
pub struct Formatter {
    format: CliFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: CliFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the result of a run.
    pub fn run_report(&self, report: &RunReport) -> Result<String> {
        match self.format {
            CliFormat::Json => self.run_report_json(report),
            CliFormat::Table => Ok(self.run_report_table(report)),
        }
    }

    fn run_report_json(&self, report: &RunReport) -> Result<String> {
        let attempts: Vec<serde_json::Value> = report
            .attempts
            .iter()
            .map(|a| {
                serde_json::json!({
                    "number": a.number(),
                    "category": a.outcome().failure_kind(),
                    "message": a.outcome().describe(),
                    "elapsed_ms": a.elapsed().as_millis() as u64,
                })
            })
            .collect();

        let (outcome, detail) = match &report.outcome {
            RunOutcome::Succeeded(artifact) => ("succeeded", artifact.origin.to_string()),
            RunOutcome::SucceededViaFallback(artifact) => ("succeeded_via_fallback", artifact.origin.to_string()),
            RunOutcome::Aborted(reason) => ("aborted", reason.to_string()),
        };

        let value = serde_json::json!({
            "run_id": report.run_id.to_string(),
            "profile": report.profile.as_str(),
            "outcome": outcome,
            "detail": detail,
            "fallback_invoked": report.fallback_invoked,
            "artifact_dir": report.artifact_dir.as_ref().map(|d| d.display().to_string()),
            "attempts": attempts,
        });
        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn run_report_table(&self, report: &RunReport) -> String {
        let mut builder = Builder::default();
        builder.push_record(["#", "Outcome", "Elapsed", "Detail"]);
        for attempt in &report.attempts {
            let outcome = attempt
                .outcome()
                .failure_kind()
                .map_or("passed", |k| k.as_str());
            builder.push_record([
                attempt.number().to_string(),
                outcome.to_string(),
                format!("{:.1}s", attempt.elapsed().as_secs_f64()),
                attempt.outcome().describe().map(|d| truncate(&d, 90)).unwrap_or_default(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let summary = match &report.outcome {
            RunOutcome::Succeeded(artifact) | RunOutcome::SucceededViaFallback(artifact) => self.success(&format!(
                "Parser for '{}' accepted ({}), {} rows verified{}",
                report.profile,
                artifact.origin,
                artifact.result.row_count(),
                report
                    .artifact_dir
                    .as_ref()
                    .map(|d| format!(", saved to {}", d.display()))
                    .unwrap_or_default()
            )),
            RunOutcome::Aborted(reason) => self.error(&format!("No parser for '{}': {}", report.profile, reason)),
        };

        format!("{}\n{}", table, summary)
    }

    /// Format a persisted artifact's manifest.
    pub fn artifact(&self, artifact: &PersistedArtifact) -> Result<String> {
        let manifest = &artifact.manifest;
        let source_path = artifact.source_path().display().to_string();
        if self.format == CliFormat::Json {
            let mut value = serde_json::to_value(manifest)?;
            value["source_path"] = serde_json::Value::String(source_path);
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        builder.push_record(["Profile".to_string(), manifest.profile.clone()]);
        builder.push_record(["Run".to_string(), manifest.run_id.clone()]);
        builder.push_record([
            "Origin".to_string(),
            match manifest.attempt {
                Some(attempt) => format!("{} (attempt {})", manifest.origin, attempt),
                None => manifest.origin.clone(),
            },
        ]);
        builder.push_record(["Model".to_string(), manifest.model.clone().unwrap_or_else(|| "-".to_string())]);
        builder.push_record(["Created".to_string(), manifest.created_at.to_string()]);
        builder.push_record(["Source".to_string(), source_path]);
        builder.push_record(["Output".to_string(), manifest.output_file.clone()]);
        builder.push_record([
            "Columns".to_string(),
            manifest
                .columns
                .iter()
                .map(|c| format!("{} ({})", c.name, c.column_type))
                .collect::<Vec<_>>()
                .join(", "),
        ]);
        builder.push_record(["Rows".to_string(), manifest.rows.to_string()]);
        builder.push_record(["Attempts".to_string(), manifest.attempts.len().to_string()]);

        let mut table = builder.build();
        table.with(Style::rounded());
        Ok(table.to_string())
    }

    /// Format the result of re-validating a persisted parser.
    pub fn check(&self, artifact: &PersistedArtifact, outcome: &ValidationOutcome) -> Result<String> {
        if self.format == CliFormat::Json {
            let value = serde_json::json!({
                "profile": artifact.manifest.profile,
                "origin": artifact.manifest.origin,
                "pass": outcome.is_pass(),
                "detail": outcome.to_string(),
            });
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        Ok(match outcome {
            ValidationOutcome::Pass => self.success(&format!(
                "{} parser for '{}' still matches the ground truth",
                artifact.manifest.origin, artifact.manifest.profile
            )),
            ValidationOutcome::Fail { .. } => self.error(&format!(
                "{} parser for '{}' no longer matches: {}",
                artifact.manifest.origin, artifact.manifest.profile, outcome
            )),
        })
    }

    /// Format the profile listing.
    pub fn profiles(&self, profiles: &[ProfileStatus]) -> Result<String> {
        if self.format == CliFormat::Json {
            let value: Vec<serde_json::Value> = profiles
                .iter()
                .map(|p| serde_json::json!({ "profile": p.id.as_str(), "artifact": p.artifact }))
                .collect();
            return Ok(serde_json::to_string_pretty(&value)?);
        }

        if profiles.is_empty() {
            return Ok(self.warning("No profiles found."));
        }

        let mut builder = Builder::default();
        builder.push_record(["Profile", "Parser"]);
        for profile in profiles {
            builder.push_record([
                profile.id.to_string(),
                profile.artifact.clone().unwrap_or_else(|| "-".to_string()),
            ]);
        }
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        Ok(table.to_string())
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsewright_domain::{
        ArtifactOrigin, Attempt, AttemptOutcome, Cell, Column, ExecutionFault, ParserArtifact, RunId,
        TabularResult,
    };
    use std::time::Duration;

    fn report() -> RunReport {
        let profile = ProfileId::parse("icici").unwrap();
        let result = TabularResult::new(vec![Column::text("Date")], vec![vec![Cell::text("01-08-2024")]]).unwrap();
        RunReport {
            run_id: RunId::new(),
            profile: profile.clone(),
            attempts: vec![
                Attempt::new(
                    1,
                    Some("exit 1".to_string()),
                    AttemptOutcome::ExecutionFault(ExecutionFault::Crashed {
                        exit_code: Some(1),
                        stderr_tail: "boom".to_string(),
                    }),
                    Duration::from_millis(40),
                ),
                Attempt::new(2, Some("ok".to_string()), AttemptOutcome::Passed, Duration::from_millis(50)),
            ],
            fallback_invoked: false,
            outcome: RunOutcome::Succeeded(ParserArtifact {
                run_id: RunId::new(),
                profile,
                origin: ArtifactOrigin::Generated { attempt: 2 },
                source: "ok".to_string(),
                result,
            }),
            artifact_dir: None,
        }
    }

    #[test]
    fn test_run_report_table() {
        let output = Formatter::new(CliFormat::Table, false).run_report(&report()).unwrap();
        assert!(output.contains("execution_fault"));
        assert!(output.contains("passed"));
        assert!(output.contains("✓ Parser for 'icici' accepted (generated (attempt 2)), 1 rows verified"));
    }

    #[test]
    fn test_run_report_json() {
        let output = Formatter::new(CliFormat::Json, false).run_report(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["outcome"], "succeeded");
        assert_eq!(value["attempts"][0]["category"], "execution_fault");
        assert!(value["attempts"][1]["category"].is_null());
    }

    fn persisted() -> PersistedArtifact {
        let output = TabularResult::new(vec![Column::text("Date")], vec![vec![Cell::text("01-08-2024")]]).unwrap();
        PersistedArtifact {
            dir: std::path::PathBuf::from("artifacts/icici"),
            manifest: parsewright_store::Manifest {
                run_id: RunId::new().to_string(),
                profile: "icici".to_string(),
                origin: "generated".to_string(),
                attempt: Some(2),
                model: None,
                created_at: 1_722_470_400,
                source_file: "parser.py".to_string(),
                output_file: "output.csv".to_string(),
                columns: output.columns().to_vec(),
                rows: 1,
                attempts: vec![],
            },
            source: "print(1)\n".to_string(),
            output,
        }
    }

    #[test]
    fn test_artifact_shows_source_path() {
        let artifact = persisted();
        let expected = artifact.source_path().display().to_string();

        let table = Formatter::new(CliFormat::Table, false).artifact(&artifact).unwrap();
        assert!(table.contains(&expected));
        assert!(table.contains("generated (attempt 2)"));

        let json = Formatter::new(CliFormat::Json, false).artifact(&artifact).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source_path"], expected);
        assert_eq!(value["source_file"], "parser.py");
    }

    #[test]
    fn test_empty_profiles() {
        let output = Formatter::new(CliFormat::Table, false).profiles(&[]).unwrap();
        assert_eq!(output, "⚠ No profiles found.");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
