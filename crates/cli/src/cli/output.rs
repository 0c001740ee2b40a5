//! Rendering of command results as JSON, YAML or plain text.

use anyhow::{Context, Result};
use imageprobe_core::variant::VariantSummary;
use imageprobe_core::{CheckOutcome, TestCase};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_matrix(&self, cases: &[TestCase]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(&cases, "test matrix"),
            OutputFormat::Yaml => to_yaml(&cases, "test matrix"),
            OutputFormat::Human => Ok(self.format_matrix_human(cases)),
        }
    }

    pub fn format_variant(&self, summary: &VariantSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(summary, "variant"),
            OutputFormat::Yaml => to_yaml(summary, "variant"),
            OutputFormat::Human => Ok(self.format_variant_human(summary)),
        }
    }

    pub fn format_outcomes(&self, outcomes: &[CheckOutcome]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(&outcomes, "check results"),
            OutputFormat::Yaml => to_yaml(&outcomes, "check results"),
            OutputFormat::Human => Ok(self.format_outcomes_human(outcomes)),
        }
    }

    fn format_matrix_human(&self, cases: &[TestCase]) -> String {
        let mut out = String::new();
        let width = cases.iter().map(|c| c.template.len()).max().unwrap_or(0);

        for case in cases {
            let config = case
                .config
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(" ");
            let _ = writeln!(out, "{:<width$}  {}", case.template, config, width = width);
        }
        let _ = writeln!(out, "\n{} test cases", cases.len());
        out
    }

    fn format_variant_human(&self, summary: &VariantSummary) -> String {
        let runtimes = summary
            .runtimes
            .iter()
            .map(|r| r.name())
            .collect::<Vec<_>>()
            .join(", ");

        let mut out = String::new();
        let _ = writeln!(out, "Variant:      {}", summary.variant);
        let _ = writeln!(out, "Base:         {}", summary.base);
        let _ = writeln!(out, "Kitchen sink: {}", yes_no(summary.kitchen_sink));
        let _ = writeln!(out, "Non-root:     {}", yes_no(summary.non_root));
        let _ = writeln!(out, "Runtimes:     {}", runtimes);
        let _ = writeln!(out, "User:         {}", summary.user);
        let _ = writeln!(out, "Home:         {}", summary.home);
        out
    }

    fn format_outcomes_human(&self, outcomes: &[CheckOutcome]) -> String {
        let mut out = String::new();
        for outcome in outcomes {
            let status = if outcome.passed { "ok" } else { "FAILED" };
            let _ = writeln!(out, "{:<6} {}", status, outcome.name);
            if let Some(message) = &outcome.message {
                for line in message.lines() {
                    let _ = writeln!(out, "       {}", line);
                }
            }
        }

        let failed = outcomes.iter().filter(|o| !o.passed).count();
        let _ = writeln!(
            out,
            "\n{} passed, {} failed",
            outcomes.len() - failed,
            failed
        );
        out
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {} to JSON", what))
}

fn to_yaml<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_yaml::to_string(value).with_context(|| format!("Failed to serialize {} to YAML", what))
}
