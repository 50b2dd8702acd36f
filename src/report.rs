//! Result reporting: the console summary and the result file.
//!
//! Two external contracts live here. The `TOKEN FOUND:` line goes to stdout
//! because callers (the dashboard's generate-token endpoint among them)
//! pattern-match it out of the process output. The result file is three
//! fixed lines and is only written when a token was actually extracted.

use crate::config::Config;
use crate::theme;
use crate::workflow::RunOutcome;
use anyhow::{Context, Result};
use chrono::Local;
use std::path::Path;
use tracing::{info, warn};

/// Print the run summary and persist the token when there is one.
pub fn report(config: &Config, outcome: &RunOutcome) -> Result<()> {
    println!();
    println!("{}", theme::muted(&"─".repeat(60)));
    println!("{}", theme::bold("RESULT"));
    println!("{}", theme::label_value("Token name", &outcome.token_name));

    match &outcome.token {
        Some(token) => {
            println!("{}", theme::label_value("Token", token));
            println!("{}", theme::muted(&"─".repeat(60)));
            // Machine-scrapable marker; callers grep stdout for it.
            println!("TOKEN FOUND: {token}");
            println!("{}", theme::icon_ok(&theme::success("token created")));
            write_result_file(&config.output_path, &outcome.token_name, token)?;
            info!(path = %config.output_path.display(), "saved token");
            println!(
                "{}",
                theme::muted(&format!("saved to {}", config.output_path.display()))
            );
        }
        None => {
            println!("{}", theme::label_value("Token", "not found"));
            println!("{}", theme::muted(&"─".repeat(60)));
            println!("{}", theme::icon_fail(&theme::error("no token extracted")));
            warn!("run finished without a token; nothing written");
        }
    }
    Ok(())
}

/// Write the three-line result file. Overwrites any previous run's file.
pub fn write_result_file(path: &Path, token_name: &str, token: &str) -> Result<()> {
    let created = Local::now().format("%Y-%m-%d %H:%M:%S");
    let contents = format!("Token Name: {token_name}\nToken: {token}\nCreated: {created}\n");
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_file_has_three_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated_token.txt");

        write_result_file(&path, "FullAccess_1700000000", "xYz123AbC456de").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Token Name: FullAccess_1700000000");
        assert_eq!(lines[1], "Token: xYz123AbC456de");
        assert!(lines[2].starts_with("Created: "));
        // Timestamp is the human-readable `YYYY-MM-DD HH:MM:SS` form.
        let stamp = lines[2].trim_start_matches("Created: ");
        assert!(
            chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").is_ok(),
            "unexpected timestamp format: {stamp}"
        );
    }

    #[test]
    fn result_file_is_overwritten_each_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated_token.txt");

        write_result_file(&path, "FullAccess_1", "first1234567890").unwrap();
        write_result_file(&path, "FullAccess_2", "second123456789").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("second123456789"));
        assert!(!contents.contains("first1234567890"));
    }
}
