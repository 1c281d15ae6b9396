//! Console output for the test manager

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use halmock_common::{CapabilityGroup, TestStatus};
use halmock_runner::{Registry, RunOutcome};

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Print every known group and its cases in execution order
pub fn print_catalogue(registry: &Registry) {
    let mut table = table();
    table.set_header(vec!["Plugin", "#", "Test case", "Report id"]);

    for group in CapabilityGroup::ALL {
        let cases = registry.cases_for(group);
        if cases.is_empty() {
            table.add_row(vec![
                Cell::new(group.as_str()),
                Cell::new("-"),
                Cell::new("not implemented").fg(Color::DarkGrey),
                Cell::new(""),
            ]);
            continue;
        }
        for (i, case) in cases.iter().enumerate() {
            table.add_row(vec![
                Cell::new(if i == 0 { group.as_str() } else { "" }),
                Cell::new(i + 1),
                Cell::new(&case.name),
                Cell::new(&case.id),
            ]);
        }
    }

    println!("{table}");
}

/// Print the per-test table and the totals of a finished run
pub fn print_summary(outcome: &RunOutcome) {
    if outcome.results.is_empty() {
        print_warning("No test cases were executed.");
    } else {
        let mut table = table();
        table.set_header(vec!["Test case", "Status", "ms", "Message"]);
        for result in &outcome.results {
            let status = match result.status {
                TestStatus::Pass => Cell::new("Pass").fg(Color::Green),
                TestStatus::Fail => Cell::new("Fail").fg(Color::Red),
            };
            table.add_row(vec![
                Cell::new(&result.test_id),
                status,
                Cell::new(result.duration_ms),
                Cell::new(&result.message),
            ]);
        }
        println!("{table}");
    }

    println!(
        "{} {}  {} {}  {} {}  ({} ms)",
        "Total:".bold(),
        outcome.total(),
        "Passed:".bold(),
        outcome.passed.len().to_string().green(),
        "Failed:".bold(),
        outcome.failed.len().to_string().red(),
        outcome.duration_ms
    );
    println!("Report: {}", outcome.html_report.display());

    if outcome.success() {
        print_success(&format!("Build {} passed", outcome.build_name));
    } else {
        print_error(&format!(
            "Build {} has {} failing test case(s)",
            outcome.build_name,
            outcome.failed.len()
        ));
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("⚠️  {}", message);
}
