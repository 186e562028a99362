//! Per-entry declarative argument schemas for text input.
//!
//! Tokens are matched against a fixed list of [`ArgSpec`]s: switches
//! (`-l`, `--long`), valued options (`--sort time`, `--sort=time`, `-m755`)
//! and positionals. Short switches may be grouped (`-la`). Anything after
//! `--` is positional. Unknown options are rejected, never ignored.

use crate::error::ArgError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Flag,
    Text,
    Int,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub short: Option<char>,
    pub kind: ArgKind,
    pub positional: bool,
    pub required: bool,
    /// Positional that soaks up every remaining token.
    pub rest: bool,
    pub default: Option<&'static str>,
    pub help: &'static str,
}

impl ArgSpec {
    pub const fn flag(name: &'static str, short: Option<char>, help: &'static str) -> Self {
        Self {
            name,
            short,
            kind: ArgKind::Flag,
            positional: false,
            required: false,
            rest: false,
            default: None,
            help,
        }
    }

    pub const fn option(name: &'static str, short: Option<char>, kind: ArgKind, help: &'static str) -> Self {
        Self {
            name,
            short,
            kind,
            positional: false,
            required: false,
            rest: false,
            default: None,
            help,
        }
    }

    /// A required positional.
    pub const fn positional(name: &'static str, kind: ArgKind, help: &'static str) -> Self {
        Self {
            name,
            short: None,
            kind,
            positional: true,
            required: true,
            rest: false,
            default: None,
            help,
        }
    }

    pub const fn optional(self) -> Self {
        Self { required: false, ..self }
    }

    pub const fn default(self, value: &'static str) -> Self {
        Self {
            required: false,
            default: Some(value),
            ..self
        }
    }

    pub const fn rest(self) -> Self {
        Self {
            rest: true,
            required: false,
            ..self
        }
    }

    fn placeholder(&self) -> String {
        if self.rest {
            format!("[{}...]", self.name)
        } else if self.required {
            format!("<{}>", self.name)
        } else {
            format!("[{}]", self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Flag,
    Text(String),
    Int(u32),
    Number(f64),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    values: BTreeMap<&'static str, Vec<Value>>,
}

impl ParsedArgs {
    pub fn flag(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.values.get(name)?.iter().find_map(|v| match v {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn texts(&self, name: &str) -> Vec<String> {
        self.values
            .get(name)
            .map(|vs| {
                vs.iter()
                    .filter_map(|v| match v {
                        Value::Text(s) => Some(s.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn int(&self, name: &str) -> Option<u32> {
        self.values.get(name)?.iter().find_map(|v| match v {
            Value::Int(n) => Some(*n),
            _ => None,
        })
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.values.get(name)?.iter().find_map(|v| match v {
            Value::Number(n) => Some(*n),
            _ => None,
        })
    }

    fn set(&mut self, spec: &ArgSpec, value: Value) {
        let slot = self.values.entry(spec.name).or_default();
        if !spec.rest {
            slot.clear();
        }
        slot.push(value);
    }
}

/// Match `tokens` against `specs` for the entry called `entry`.
pub fn parse(entry: &str, specs: &[ArgSpec], tokens: &[String]) -> Result<ParsedArgs, ArgError> {
    let positionals: Vec<&ArgSpec> = specs.iter().filter(|s| s.positional).collect();
    let mut parsed = ParsedArgs::default();
    let mut next_positional = 0;
    let mut only_positional = false;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;

        if !only_positional && token == "--" {
            only_positional = true;
            continue;
        }

        if !only_positional && token.len() > 2 && token.starts_with("--") {
            let body = &token[2..];
            let (name, inline) = match body.split_once('=') {
                Some((n, v)) => (n, Some(v.to_string())),
                None => (body, None),
            };
            let spec = specs
                .iter()
                .find(|s| !s.positional && s.name == name)
                .ok_or_else(|| unknown(entry, token))?;

            if spec.kind == ArgKind::Flag {
                if let Some(value) = inline {
                    return Err(ArgError::invalid(entry, spec.name, value, "takes no value"));
                }
                parsed.set(spec, Value::Flag);
            } else {
                let raw = match inline {
                    Some(v) => v,
                    None => take_value(entry, token, tokens, &mut i)?,
                };
                parsed.set(spec, convert(entry, spec, &raw)?);
            }
            continue;
        }

        if !only_positional && token.len() > 1 && token.starts_with('-') {
            let shorts = &token[1..];
            for (offset, c) in shorts.char_indices() {
                let spec = specs
                    .iter()
                    .find(|s| !s.positional && s.short == Some(c))
                    .ok_or_else(|| unknown(entry, &format!("-{}", c)))?;

                if spec.kind == ArgKind::Flag {
                    parsed.set(spec, Value::Flag);
                    continue;
                }

                let attached = &shorts[offset + c.len_utf8()..];
                let raw = if attached.is_empty() {
                    take_value(entry, &format!("-{}", c), tokens, &mut i)?
                } else {
                    attached.to_string()
                };
                parsed.set(spec, convert(entry, spec, &raw)?);
                break;
            }
            continue;
        }

        let spec = positionals
            .get(next_positional)
            .copied()
            .ok_or_else(|| ArgError::Unexpected {
                entry: entry.to_string(),
                value: token.clone(),
            })?;
        parsed.set(spec, convert(entry, spec, token)?);
        if !spec.rest {
            next_positional += 1;
        }
    }

    for spec in specs {
        if parsed.values.contains_key(spec.name) {
            continue;
        }
        if spec.required {
            return Err(ArgError::missing(entry, spec.name));
        }
        if let Some(default) = spec.default {
            parsed.set(spec, convert(entry, spec, default)?);
        }
    }

    Ok(parsed)
}

/// One-line synopsis, e.g. `ls [-l|--long] [--sort <text>] [path]`.
pub fn usage(entry: &str, specs: &[ArgSpec]) -> String {
    let mut parts = vec![entry.to_string()];
    for spec in specs.iter().filter(|s| !s.positional) {
        let names = match spec.short {
            Some(c) => format!("-{}|--{}", c, spec.name),
            None => format!("--{}", spec.name),
        };
        let part = match spec.kind {
            ArgKind::Flag => format!("[{}]", names),
            ArgKind::Text => format!("[{} <text>]", names),
            ArgKind::Int => format!("[{} <n>]", names),
            ArgKind::Number => format!("[{} <x>]", names),
        };
        parts.push(part);
    }
    for spec in specs.iter().filter(|s| s.positional) {
        parts.push(spec.placeholder());
    }
    parts.join(" ")
}

/// Aligned per-argument help lines.
pub fn describe(specs: &[ArgSpec]) -> Vec<String> {
    specs
        .iter()
        .map(|spec| {
            let label = if spec.positional {
                spec.placeholder()
            } else {
                match spec.short {
                    Some(c) => format!("-{}, --{}", c, spec.name),
                    None => format!("    --{}", spec.name),
                }
            };
            match spec.default {
                Some(d) => format!("  {:<22} {} [default: {}]", label, spec.help, d),
                None => format!("  {:<22} {}", label, spec.help),
            }
        })
        .collect()
}

fn unknown(entry: &str, flag: &str) -> ArgError {
    ArgError::UnknownFlag {
        entry: entry.to_string(),
        flag: flag.to_string(),
    }
}

fn take_value(entry: &str, flag: &str, tokens: &[String], i: &mut usize) -> Result<String, ArgError> {
    let value = tokens.get(*i).cloned().ok_or_else(|| ArgError::MissingValue {
        entry: entry.to_string(),
        flag: flag.to_string(),
    })?;
    *i += 1;
    Ok(value)
}

fn convert(entry: &str, spec: &ArgSpec, raw: &str) -> Result<Value, ArgError> {
    match spec.kind {
        ArgKind::Flag => Ok(Value::Flag),
        ArgKind::Text => Ok(Value::Text(raw.to_string())),
        ArgKind::Int => raw
            .parse::<u32>()
            .map(Value::Int)
            .map_err(|_| ArgError::invalid(entry, spec.name, raw, "expected a non-negative integer")),
        ArgKind::Number => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Value::Number(n)),
            _ => Err(ArgError::invalid(entry, spec.name, raw, "expected a number")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPECS: &[ArgSpec] = &[
        ArgSpec::flag("long", Some('l'), "long listing"),
        ArgSpec::flag("all", Some('a'), "include hidden"),
        ArgSpec::option("sort", None, ArgKind::Text, "sort key"),
        ArgSpec::option("depth", Some('d'), ArgKind::Int, "max depth"),
        ArgSpec::positional("path", ArgKind::Text, "where").default("."),
    ];

    const GREP: &[ArgSpec] = &[
        ArgSpec::flag("ignore-case", Some('i'), "case-insensitive"),
        ArgSpec::positional("pattern", ArgKind::Text, "regex"),
        ArgSpec::positional("paths", ArgKind::Text, "files").rest(),
    ];

    fn toks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_apply_when_omitted() {
        let parsed = parse("ls", SPECS, &[]).unwrap();
        assert!(!parsed.flag("long"));
        assert_eq!(parsed.text("path"), Some("."));
        assert_eq!(parsed.text("sort"), None);
    }

    #[test]
    fn long_short_and_grouped_flags() {
        let parsed = parse("ls", SPECS, &toks(&["-la", "--sort=time", "docs"])).unwrap();
        assert!(parsed.flag("long"));
        assert!(parsed.flag("all"));
        assert_eq!(parsed.text("sort"), Some("time"));
        assert_eq!(parsed.text("path"), Some("docs"));

        let parsed = parse("ls", SPECS, &toks(&["--sort", "size", "--long"])).unwrap();
        assert_eq!(parsed.text("sort"), Some("size"));
        assert!(parsed.flag("long"));
    }

    #[test]
    fn short_option_value_attached_or_separate() {
        let parsed = parse("ls", SPECS, &toks(&["-d3"])).unwrap();
        assert_eq!(parsed.int("depth"), Some(3));
        let parsed = parse("ls", SPECS, &toks(&["-ld", "4"])).unwrap();
        assert!(parsed.flag("long"));
        assert_eq!(parsed.int("depth"), Some(4));
    }

    #[test]
    fn double_dash_ends_options() {
        let parsed = parse("ls", SPECS, &toks(&["--", "-weird"])).unwrap();
        assert_eq!(parsed.text("path"), Some("-weird"));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let err = parse("ls", SPECS, &toks(&["--bogus"])).unwrap_err();
        assert_eq!(
            err,
            ArgError::UnknownFlag {
                entry: "ls".into(),
                flag: "--bogus".into()
            }
        );
        let err = parse("ls", SPECS, &toks(&["-lz"])).unwrap_err();
        assert_eq!(
            err,
            ArgError::UnknownFlag {
                entry: "ls".into(),
                flag: "-z".into()
            }
        );
    }

    #[test]
    fn surplus_positionals_are_rejected() {
        let err = parse("ls", SPECS, &toks(&["a", "b"])).unwrap_err();
        assert!(matches!(err, ArgError::Unexpected { value, .. } if value == "b"));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            parse("ls", SPECS, &toks(&["--depth", "deep"])),
            Err(ArgError::Invalid { .. })
        ));
        assert!(matches!(
            parse("ls", SPECS, &toks(&["--depth"])),
            Err(ArgError::MissingValue { .. })
        ));
        assert!(matches!(
            parse("ls", SPECS, &toks(&["--long=yes"])),
            Err(ArgError::Invalid { .. })
        ));
    }

    #[test]
    fn required_and_rest_positionals() {
        let err = parse("grep", GREP, &[]).unwrap_err();
        assert_eq!(err, ArgError::missing("grep", "pattern"));

        let parsed = parse("grep", GREP, &toks(&["-i", "needle", "a.txt", "b.txt"])).unwrap();
        assert!(parsed.flag("ignore-case"));
        assert_eq!(parsed.text("pattern"), Some("needle"));
        assert_eq!(parsed.texts("paths"), vec!["a.txt", "b.txt"]);

        let parsed = parse("grep", GREP, &toks(&["needle"])).unwrap();
        assert!(parsed.texts("paths").is_empty());
    }

    #[test]
    fn usage_lists_options_then_positionals() {
        assert_eq!(
            usage("ls", SPECS),
            "ls [-l|--long] [-a|--all] [--sort <text>] [-d|--depth <n>] [path]"
        );
        assert_eq!(usage("grep", GREP), "grep [-i|--ignore-case] <pattern> [paths...]");
        assert_eq!(describe(SPECS).len(), SPECS.len());
    }
}
