use std::{fs, process::ExitCode, time::Duration};

use console::style;
use indicatif::ProgressBar;

use crate::{
    args::BulkCommand, get_pricetag, write_failure, write_success, ERROR_STYLE, PREFIX_STYLE,
    SPINNER_STYLE, TERMINAL,
};

pub async fn bulk(command: &BulkCommand) -> anyhow::Result<ExitCode> {
    match command {
        BulkCommand::Import { path } => {
            let text = fs::read_to_string(path)?;

            let spinner = ProgressBar::new_spinner().with_style(SPINNER_STYLE.clone());
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner.set_prefix(PREFIX_STYLE.apply_to("Importing").to_string());
            spinner.set_message(path.display().to_string());

            let report = get_pricetag().await.import_lines(&text).await;

            spinner.finish_and_clear();

            for imported in &report.imported {
                for skipped in &imported.skipped {
                    TERMINAL.write_line(&format!(
                        "{} {} on {}: {}",
                        ERROR_STYLE.apply_to("Skipped"),
                        skipped.tag,
                        imported.customer_id,
                        skipped.reason
                    ))?;
                }
            }

            for failed in &report.failed {
                TERMINAL.write_line(&format!(
                    "{} line {}: {}",
                    ERROR_STYLE.apply_to("Failed"),
                    failed.line,
                    failed.error
                ))?;
            }

            let skipped: usize = report
                .imported
                .iter()
                .map(|imported| imported.skipped.len())
                .sum();

            if report.imported.is_empty() && !report.failed.is_empty() {
                write_failure("Failed to import any customers")?;

                return Ok(ExitCode::FAILURE);
            }

            write_success(&format!(
                "Imported {count} {}, {} tags skipped, {} lines failed",
                if report.imported.len() == 1 {
                    "customer"
                } else {
                    "customers"
                },
                style(skipped).bold(),
                style(report.failed.len()).bold(),
                count = style(report.imported.len()).bold(),
            ))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
