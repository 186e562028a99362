use crate::i18n::I18n;
use crate::storage::{ErrorKind, ExecutionResult};
use colored::*;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const COMMAND_COLUMN_WIDTH: usize = 60;

/// Human-readable block for one attempt: status line, captured output, summary.
pub fn render_result(result: &ExecutionResult, i18n: &I18n) -> String {
    let mut output = String::new();
    let code = result
        .return_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "-".to_string());
    let ms = result.duration_ms.to_string();

    let status = match result.error_kind {
        Some(ErrorKind::Timeout) => i18n.t_format("result_timeout", &[&result.command, &ms]).yellow().bold(),
        Some(ErrorKind::LaunchFailure) => i18n.t_format("result_launch_failed", &[&result.command]).red().bold(),
        None if result.success => i18n.t_format("result_ok", &[&result.command, &code, &ms]).green().bold(),
        None => i18n.t_format("result_failed", &[&result.command, &code, &ms]).red().bold(),
    };
    output.push_str(&format!("{}\n", status));

    if !result.stdout.is_empty() {
        output.push_str(&format!("{}\n", i18n.t("stdout").cyan().bold()));
        output.push_str(&result.stdout);
        if !result.stdout.ends_with('\n') {
            output.push('\n');
        }
    }

    if !result.stderr.is_empty() {
        output.push_str(&format!("{}\n", i18n.t("stderr").red().bold()));
        output.push_str(&format!("{}", result.stderr.red()));
        if !result.stderr.ends_with('\n') {
            output.push('\n');
        }
    }

    if let Some(summary) = &result.summary {
        output.push_str(&format!("{}\n", i18n.t("summary").yellow().bold()));
        for (key, value) in summary {
            output.push_str(&format!("  {}: {}\n", key.dimmed(), value));
        }
    }

    output
}

/// Table of the newest `shown` entries. `total` is the full history length.
pub fn render_history(shown: &[ExecutionResult], total: usize, i18n: &I18n) -> String {
    if total == 0 {
        return format!("{}\n", i18n.t("history_empty").yellow());
    }

    let mut output = format!(
        "{}\n",
        i18n.t_format("history_header", &[&shown.len().to_string(), &total.to_string()])
            .cyan()
            .bold()
    );

    let first_index = total - shown.len() + 1;
    let statuses: Vec<String> = shown.iter().map(|r| status_label(r, i18n)).collect();
    let status_width = statuses.iter().map(|s| s.width()).max().unwrap_or(0);

    for (offset, (result, status)) in shown.iter().zip(&statuses).enumerate() {
        let code = result
            .return_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let padded = pad(status, status_width);
        let colored_status = if result.success { padded.green() } else { padded.red() };
        output.push_str(&format!(
            "{:>4}  {}  {}  {:>4}  {:>6}ms  {}\n",
            first_index + offset,
            result.timestamp_string().dimmed(),
            colored_status,
            code,
            result.duration_ms,
            truncate(&result.command, COMMAND_COLUMN_WIDTH)
        ));
    }

    output
}

fn status_label(result: &ExecutionResult, i18n: &I18n) -> String {
    match result.error_kind {
        Some(ErrorKind::Timeout) => i18n.t("history_status_timeout"),
        Some(ErrorKind::LaunchFailure) => i18n.t("history_status_launch"),
        None if result.success => i18n.t("history_status_ok"),
        None => i18n.t("history_status_failed"),
    }
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

/// Cut `text` to at most `max` display columns, marking the cut with `…`.
fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Outcome;
    use std::path::PathBuf;
    use std::time::Duration;

    fn result(outcome: Outcome) -> ExecutionResult {
        ExecutionResult::normalize("ls -- .".to_string(), outcome, PathBuf::from("/"), Duration::from_millis(3))
    }

    #[test]
    fn success_block_shows_output() {
        colored::control::set_override(false);
        let i18n = I18n::new("en");
        let text = render_result(
            &result(Outcome::Completed {
                code: 0,
                stdout: "a.txt".to_string(),
                stderr: String::new(),
            }),
            &i18n,
        );
        assert!(text.starts_with("ls -- . (exit code: 0, 3ms)\n"));
        assert!(text.contains("Standard output:\na.txt\n"));
        assert!(!text.contains("Error output:"));
    }

    #[test]
    fn failure_blocks_name_the_cause() {
        colored::control::set_override(false);
        let i18n = I18n::new("en");

        let timeout = render_result(
            &result(Outcome::TimedOut {
                stdout: String::new(),
                stderr: String::new(),
                limit: Duration::from_secs(1),
            }),
            &i18n,
        );
        assert!(timeout.contains("timed out"));

        let launch = render_result(
            &result(Outcome::LaunchFailed {
                reason: "ls: command not found".to_string(),
            }),
            &i18n,
        );
        assert!(launch.contains("could not be started"));
        assert!(launch.contains("ls: command not found"));
    }

    #[test]
    fn history_table_numbers_rows_from_the_full_log() {
        colored::control::set_override(false);
        let i18n = I18n::new("en");
        let shown = vec![result(Outcome::Completed {
            code: 2,
            stdout: String::new(),
            stderr: "nope".to_string(),
        })];
        let text = render_history(&shown, 5, &i18n);
        assert!(text.contains("History (showing 1 of 5):"));
        assert!(text.contains("   5  "));
        assert!(text.contains("failed"));
        assert!(text.contains("ls -- ."));

        assert!(render_history(&[], 0, &i18n).contains("No commands run yet"));
    }

    #[test]
    fn truncate_respects_display_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("日本語テキスト", 5), "日本…");
        assert_eq!(pad("成功", 6), "成功  ");
    }
}
