//! Table rendering of health reports

use colored::Colorize;
use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

use super::check::CheckStatus;
use super::runner::HealthCheckReport;

/// Renders the report as a table followed by a summary
pub fn format_report(report: &HealthCheckReport) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Check", "Status", "Duration", "Summary"]);

    for (name, result) in &report.results {
        builder.push_record([
            name.to_string(),
            result.status.colored_label(),
            format!("{:.2?}", result.duration),
            result.summary.clone(),
        ]);
    }

    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    let overall = match report.status() {
        CheckStatus::Pass => "Overall: HEALTHY".green().bold(),
        CheckStatus::Warn => "Overall: HEALTHY (with warnings)".yellow().bold(),
        CheckStatus::Fail => "Overall: UNHEALTHY".red().bold(),
    };

    format!(
        "{table}\n\n{}\n  Checks: {}  Passed: {}  Warned: {}  Failed: {}\n  {overall}\n",
        "Summary".bold().underline(),
        report.total(),
        report.count(CheckStatus::Pass),
        report.count(CheckStatus::Warn),
        report.count(CheckStatus::Fail),
    )
}

/// Prints the report and every check's details to stdout
pub fn print_report(report: &HealthCheckReport) {
    println!("{}", format_report(report));

    for (name, result) in &report.results {
        if result.details.is_empty() {
            continue;
        }
        println!("{}", format!("{name}:").bold());
        for line in &result.details {
            println!("  {line}");
        }
    }
}
