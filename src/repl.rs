use crate::args::{self, ArgKind, ArgSpec};
use crate::catalog::Toolkit;
use crate::commands::{self, ENTRIES};
use crate::display::{render_history, render_result};
use crate::i18n::I18n;
use anyhow::{Context, Result};
use colored::*;
use std::io::{self, BufRead, Write};
use tracing::debug;

const HISTORY_ARGS: &[ArgSpec] = &[
    ArgSpec::flag("json", Some('j'), "print raw records as JSON"),
    ArgSpec::option("limit", Some('n'), ArgKind::Int, "how many of the newest entries to show"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Line-oriented loop driving the catalog from text input.
pub struct Shell<'a> {
    toolkit: &'a Toolkit,
    i18n: &'a I18n,
    prompt: String,
    max_history_shown: usize,
}

impl<'a> Shell<'a> {
    pub fn new(toolkit: &'a Toolkit, i18n: &'a I18n, prompt: &str, max_history_shown: usize) -> Self {
        Self {
            toolkit,
            i18n,
            prompt: prompt.to_string(),
            max_history_shown,
        }
    }

    /// Read and run lines until `exit` or end of input.
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, out: &mut W) -> Result<()> {
        writeln!(out, "{}", self.i18n.t("shell_welcome").cyan()).context(self.i18n.t("error_write_output"))?;

        loop {
            write!(out, "{}", self.prompt.bold()).context(self.i18n.t("error_write_output"))?;
            out.flush().context(self.i18n.t("error_write_output"))?;

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => {
                    writeln!(out).context(self.i18n.t("error_write_output"))?;
                    break;
                }
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                    writeln!(out, "{}", self.i18n.t("shell_interrupted").yellow())
                        .context(self.i18n.t("error_write_output"))?;
                    continue;
                }
                Err(err) => return Err(err).context(self.i18n.t("error_read_input")),
            }

            if self.handle_line(line.trim(), out)? == Flow::Exit {
                break;
            }
        }

        writeln!(out, "{}", self.i18n.t("shell_bye")).context(self.i18n.t("error_write_output"))?;
        Ok(())
    }

    /// Run one line. Every failure is reported to `out`; only write errors propagate.
    pub fn handle_line<W: Write>(&self, line: &str, out: &mut W) -> Result<Flow> {
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        let tokens = match shell_words::split(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                writeln!(out, "{}", self.i18n.t_format("shell_parse_error", &[&err.to_string()]).red())
                    .context(self.i18n.t("error_write_output"))?;
                return Ok(Flow::Continue);
            }
        };
        let Some((name, rest)) = tokens.split_first() else {
            return Ok(Flow::Continue);
        };
        debug!(entry = %name, args = ?rest, "shell input");

        let text = match name.as_str() {
            "exit" | "quit" => return Ok(Flow::Exit),
            "help" => self.help(rest.first().map(String::as_str)),
            "history" => self.history(rest)?,
            _ => match commands::lookup(name) {
                Some(entry) => match entry.invoke(self.toolkit, rest) {
                    Ok(result) => render_result(&result, self.i18n),
                    Err(err) => format!("{}\n", err.to_string().red()),
                },
                None => format!("{}\n", self.i18n.t_format("shell_unknown", &[name.as_str()]).red()),
            },
        };

        write!(out, "{}", text).context(self.i18n.t("error_write_output"))?;
        Ok(Flow::Continue)
    }

    fn help(&self, topic: Option<&str>) -> String {
        let mut text = String::new();

        if let Some(name) = topic {
            let Some(entry) = commands::lookup(name) else {
                return format!("{}\n", self.i18n.t_format("shell_unknown", &[name]).red());
            };
            text.push_str(&format!("{}\n\n", self.i18n.t(&entry.about_key())));
            text.push_str(&format!("{} {}\n", self.i18n.t("help_label_usage"), entry.usage()));
            if !entry.args.is_empty() {
                text.push_str(&format!("\n{}\n", self.i18n.t("help_label_arguments")));
                for line in args::describe(entry.args) {
                    text.push_str(&line);
                    text.push('\n');
                }
            }
            return text;
        }

        text.push_str(&format!("{}\n", self.i18n.t("help_title").bold()));
        for entry in ENTRIES {
            text.push_str(&format!("  {:<8} {}\n", entry.name.green(), self.i18n.t(&entry.about_key())));
        }
        text.push('\n');
        for (name, key) in [
            ("help", "help_builtin_help"),
            ("history", "help_builtin_history"),
            ("exit", "help_builtin_exit"),
        ] {
            text.push_str(&format!("  {:<8} {}\n", name.green(), self.i18n.t(key)));
        }
        text
    }

    fn history(&self, tokens: &[String]) -> Result<String> {
        let parsed = match args::parse("history", HISTORY_ARGS, tokens) {
            Ok(parsed) => parsed,
            Err(err) => return Ok(format!("{}\n", err.to_string().red())),
        };
        let log = self.toolkit.history();

        if parsed.flag("json") {
            let mut json = log.to_json()?;
            json.push('\n');
            return Ok(json);
        }

        let limit = parsed
            .int("limit")
            .map(|n| n as usize)
            .unwrap_or(self.max_history_shown);
        Ok(render_history(&log.tail(limit), log.len(), self.i18n))
    }
}
