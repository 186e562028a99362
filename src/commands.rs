use crate::args::{self, ArgKind, ArgSpec, ParsedArgs};
use crate::catalog::{
    ChmodOptions, ChownOptions, FindOptions, FreeOptions, GrepOptions, KillOptions, LsOptions, MemUnit,
    MkdirOptions, PsOptions, RmOptions, Toolkit, TopOptions, TouchOptions,
};
use crate::error::ArgError;
use crate::storage::ExecutionResult;
use std::str::FromStr;

type Runner = fn(&Toolkit, &ParsedArgs) -> Result<ExecutionResult, ArgError>;
type Rewrite = fn(&[String]) -> Vec<String>;

/// A catalog entry reachable by name from text input.
pub struct Entry {
    pub name: &'static str,
    pub args: &'static [ArgSpec],
    /// Maps customary spellings onto the schema before parsing.
    rewrite: Option<Rewrite>,
    run: Runner,
}

impl Entry {
    /// Parse `tokens` with this entry's schema and run it.
    pub fn invoke(&self, toolkit: &Toolkit, tokens: &[String]) -> Result<ExecutionResult, ArgError> {
        let parsed = match self.rewrite {
            Some(rewrite) => args::parse(self.name, self.args, &rewrite(tokens))?,
            None => args::parse(self.name, self.args, tokens)?,
        };
        (self.run)(toolkit, &parsed)
    }

    pub fn usage(&self) -> String {
        args::usage(self.name, self.args)
    }

    /// Message key for the one-line description.
    pub fn about_key(&self) -> String {
        format!("entry_{}", self.name)
    }
}

pub static ENTRIES: &[Entry] = &[
    Entry {
        name: "ls",
        rewrite: None,
        args: &[
            ArgSpec::flag("long", Some('l'), "use long listing format"),
            ArgSpec::flag("all", Some('a'), "include hidden entries"),
            ArgSpec::option("sort", None, ArgKind::Text, "name | ext | size | time"),
            ArgSpec::positional("path", ArgKind::Text, "directory or file to list").default("."),
        ],
        run: run_ls,
    },
    Entry {
        name: "pwd",
        rewrite: None,
        args: &[],
        run: |toolkit, _| Ok(toolkit.pwd()),
    },
    Entry {
        name: "cd",
        rewrite: None,
        args: &[ArgSpec::positional("path", ArgKind::Text, "new working directory").default("~")],
        run: |toolkit, parsed| toolkit.cd(parsed.text("path").unwrap_or("~")),
    },
    Entry {
        name: "mkdir",
        rewrite: None,
        args: &[
            ArgSpec::flag("parents", Some('p'), "create missing parents, no error if existing"),
            ArgSpec::flag("verbose", Some('v'), "print each created directory"),
            ArgSpec::option("mode", Some('m'), ArgKind::Text, "octal permission bits, e.g. 755"),
            ArgSpec::positional("path", ArgKind::Text, "directory to create"),
        ],
        run: run_mkdir,
    },
    Entry {
        name: "touch",
        rewrite: None,
        args: &[
            ArgSpec::flag("no-create", Some('c'), "do not create missing files"),
            ArgSpec::positional("path", ArgKind::Text, "file to create or update"),
        ],
        run: |toolkit, parsed| {
            toolkit.touch(&TouchOptions {
                path: required_text(parsed, "path"),
                no_create: parsed.flag("no-create"),
            })
        },
    },
    Entry {
        name: "rm",
        rewrite: None,
        args: &[
            ArgSpec::flag("recursive", Some('r'), "remove directories and their contents"),
            ArgSpec::flag("force", Some('f'), "ignore missing files, never prompt"),
            ArgSpec::flag("verbose", Some('v'), "print each removed path"),
            ArgSpec::positional("path", ArgKind::Text, "file or directory to remove"),
        ],
        run: |toolkit, parsed| {
            toolkit.rm(&RmOptions {
                path: required_text(parsed, "path"),
                recursive: parsed.flag("recursive"),
                force: parsed.flag("force"),
                verbose: parsed.flag("verbose"),
            })
        },
    },
    Entry {
        name: "chmod",
        rewrite: None,
        args: &[
            ArgSpec::flag("recursive", Some('R'), "apply to directory contents"),
            ArgSpec::positional("mode", ArgKind::Text, "octal (644) or symbolic (u+x) mode"),
            ArgSpec::positional("path", ArgKind::Text, "target path"),
        ],
        run: |toolkit, parsed| {
            toolkit.chmod(&ChmodOptions {
                mode: required_text(parsed, "mode"),
                path: required_text(parsed, "path"),
                recursive: parsed.flag("recursive"),
            })
        },
    },
    Entry {
        name: "chown",
        rewrite: None,
        args: &[
            ArgSpec::flag("recursive", Some('R'), "apply to directory contents"),
            ArgSpec::positional("owner", ArgKind::Text, "OWNER or OWNER:GROUP"),
            ArgSpec::positional("path", ArgKind::Text, "target path"),
        ],
        run: run_chown,
    },
    Entry {
        name: "ps",
        rewrite: None,
        args: &[
            ArgSpec::flag("all", Some('e'), "every process on the system"),
            ArgSpec::flag("full", Some('f'), "full-format listing"),
            ArgSpec::option("user", Some('u'), ArgKind::Text, "only processes of this user"),
        ],
        run: |toolkit, parsed| {
            toolkit.ps(&PsOptions {
                all: parsed.flag("all"),
                full: parsed.flag("full"),
                user: parsed.text("user").map(str::to_string),
            })
        },
    },
    Entry {
        name: "kill",
        rewrite: Some(kill_signal_shorthand),
        args: &[
            ArgSpec::option("signal", Some('s'), ArgKind::Text, "signal name or number, also -9 / -KILL [default: TERM]"),
            ArgSpec::positional("pid", ArgKind::Int, "process id"),
        ],
        run: |toolkit, parsed| {
            toolkit.kill(&KillOptions {
                pid: parsed.int("pid").unwrap_or(0),
                signal: parsed.text("signal").map(str::to_string),
            })
        },
    },
    Entry {
        name: "grep",
        rewrite: None,
        args: &[
            ArgSpec::flag("ignore-case", Some('i'), "case-insensitive match"),
            ArgSpec::flag("recursive", Some('r'), "search directories recursively"),
            ArgSpec::flag("line-number", Some('n'), "prefix matches with line numbers"),
            ArgSpec::flag("invert", Some('v'), "select non-matching lines"),
            ArgSpec::flag("count", Some('c'), "print only a count of matches"),
            ArgSpec::positional("pattern", ArgKind::Text, "regular expression"),
            ArgSpec::positional("paths", ArgKind::Text, "files to search").rest(),
        ],
        run: |toolkit, parsed| {
            toolkit.grep(&GrepOptions {
                pattern: required_text(parsed, "pattern"),
                paths: parsed.texts("paths"),
                ignore_case: parsed.flag("ignore-case"),
                recursive: parsed.flag("recursive"),
                line_number: parsed.flag("line-number"),
                invert: parsed.flag("invert"),
                count: parsed.flag("count"),
            })
        },
    },
    Entry {
        name: "find",
        rewrite: None,
        args: &[
            ArgSpec::option("name", Some('n'), ArgKind::Text, "name pattern, e.g. '*.py'"),
            ArgSpec::option("type", Some('t'), ArgKind::Text, "f | d | l"),
            ArgSpec::option("max-depth", Some('d'), ArgKind::Int, "descend at most this many levels"),
            ArgSpec::positional("path", ArgKind::Text, "where to start").default("."),
        ],
        run: run_find,
    },
    Entry {
        name: "top",
        rewrite: None,
        args: &[
            ArgSpec::option("iterations", Some('n'), ArgKind::Int, "number of snapshots"),
            ArgSpec::option("delay", Some('d'), ArgKind::Number, "seconds between snapshots"),
        ],
        run: |toolkit, parsed| {
            toolkit.top(&TopOptions {
                iterations: parsed.int("iterations").unwrap_or(1),
                delay_secs: parsed.number("delay"),
            })
        },
    },
    Entry {
        name: "free",
        rewrite: None,
        args: &[
            ArgSpec::flag("human", Some('h'), "human-readable sizes"),
            ArgSpec::option("unit", Some('u'), ArgKind::Text, "b | k | m | g | h"),
        ],
        run: run_free,
    },
    Entry {
        name: "whoami",
        rewrite: None,
        args: &[],
        run: |toolkit, _| Ok(toolkit.whoami()),
    },
];

/// `kill -9 PID` and `kill -KILL PID` become `kill -s 9 PID` and `kill -s KILL PID`.
fn kill_signal_shorthand(tokens: &[String]) -> Vec<String> {
    let Some((first, rest)) = tokens.split_first() else {
        return Vec::new();
    };
    let signal = first.strip_prefix('-').filter(|name| {
        name.chars().next().is_some_and(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-')
    });
    match signal {
        Some(name) => {
            let mut rewritten = vec!["-s".to_string(), name.to_string()];
            rewritten.extend(rest.iter().cloned());
            rewritten
        }
        None => tokens.to_vec(),
    }
}

pub fn lookup(name: &str) -> Option<&'static Entry> {
    ENTRIES.iter().find(|e| e.name == name)
}

// Required positionals are enforced by the schema; an empty string here
// still reaches the entry's own validation.
fn required_text(parsed: &ParsedArgs, name: &str) -> String {
    parsed.text(name).unwrap_or_default().to_string()
}

fn parse_choice<T: FromStr<Err = String>>(entry: &str, name: &str, raw: Option<&str>) -> Result<Option<T>, ArgError> {
    raw.map(|value| T::from_str(value).map_err(|reason| ArgError::invalid(entry, name, value, reason)))
        .transpose()
}

fn run_ls(toolkit: &Toolkit, parsed: &ParsedArgs) -> Result<ExecutionResult, ArgError> {
    toolkit.ls(&LsOptions {
        path: parsed.text("path").unwrap_or(".").to_string(),
        long: parsed.flag("long"),
        all: parsed.flag("all"),
        sort: parse_choice("ls", "sort", parsed.text("sort"))?,
    })
}

fn run_mkdir(toolkit: &Toolkit, parsed: &ParsedArgs) -> Result<ExecutionResult, ArgError> {
    let mode = parsed
        .text("mode")
        .map(|raw| {
            u32::from_str_radix(raw, 8).map_err(|_| ArgError::invalid("mkdir", "mode", raw, "expected octal digits"))
        })
        .transpose()?;
    toolkit.mkdir(&MkdirOptions {
        path: required_text(parsed, "path"),
        parents: parsed.flag("parents"),
        verbose: parsed.flag("verbose"),
        mode,
    })
}

fn run_chown(toolkit: &Toolkit, parsed: &ParsedArgs) -> Result<ExecutionResult, ArgError> {
    let spec = required_text(parsed, "owner");
    let (owner, group) = match spec.split_once(':') {
        Some((owner, group)) => (owner.to_string(), Some(group.to_string())),
        None => (spec, None),
    };
    toolkit.chown(&ChownOptions {
        owner,
        group,
        path: required_text(parsed, "path"),
        recursive: parsed.flag("recursive"),
    })
}

fn run_find(toolkit: &Toolkit, parsed: &ParsedArgs) -> Result<ExecutionResult, ArgError> {
    toolkit.find(&FindOptions {
        path: parsed.text("path").unwrap_or(".").to_string(),
        name: parsed.text("name").map(str::to_string),
        kind: parse_choice("find", "type", parsed.text("type"))?,
        max_depth: parsed.int("max-depth"),
    })
}

fn run_free(toolkit: &Toolkit, parsed: &ParsedArgs) -> Result<ExecutionResult, ArgError> {
    let unit = if parsed.flag("human") {
        Some(MemUnit::Human)
    } else {
        parse_choice("free", "unit", parsed.text("unit"))?
    };
    Ok(toolkit.free(&FreeOptions { unit }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use std::time::Duration;

    fn toks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn setup() -> (tempfile::TempDir, Toolkit) {
        let dir = tempfile::tempdir().unwrap();
        let toolkit = Toolkit::with_dir(dir.path().canonicalize().unwrap(), Duration::from_secs(20));
        (dir, toolkit)
    }

    fn invoke(toolkit: &Toolkit, name: &str, items: &[&str]) -> Result<ExecutionResult, ArgError> {
        lookup(name).unwrap().invoke(toolkit, &toks(items))
    }

    #[test]
    fn entry_names_are_unique() {
        let names: HashSet<&str> = ENTRIES.iter().map(|e| e.name).collect();
        assert_eq!(names.len(), ENTRIES.len());
        for expected in [
            "ls", "rm", "mkdir", "touch", "chmod", "chown", "ps", "kill", "grep", "find", "top", "free", "pwd",
            "cd", "whoami",
        ] {
            assert!(lookup(expected).is_some(), "missing {}", expected);
        }
        assert!(lookup("sudo").is_none());
    }

    #[test]
    fn text_invocation_builds_the_same_argv() {
        let (dir, toolkit) = setup();
        fs::write(dir.path().join("a.txt"), "").unwrap();

        let ls = invoke(&toolkit, "ls", &["-la", "--sort", "size"]).unwrap();
        assert_eq!(ls.command, "ls -l -a -S -- .");
        assert!(ls.success);

        let mkdir = invoke(&toolkit, "mkdir", &["-p", "-m", "750", "x/y"]).unwrap();
        assert_eq!(mkdir.command, "mkdir -p -m 750 -- x/y");
        assert!(mkdir.success, "{:?}", mkdir);

        let find = invoke(&toolkit, "find", &["--name", "*.txt", "-t", "f"]).unwrap();
        assert_eq!(find.command, "find . -type f -name '*.txt'");
        assert!(find.stdout.contains("a.txt"));
    }

    #[test]
    fn schema_errors_never_reach_the_history() {
        let (_dir, toolkit) = setup();
        assert!(matches!(invoke(&toolkit, "ls", &["--bogus"]), Err(ArgError::UnknownFlag { .. })));
        assert!(matches!(invoke(&toolkit, "mkdir", &[]), Err(ArgError::Missing { .. })));
        assert!(matches!(invoke(&toolkit, "mkdir", &["-m", "9z", "d"]), Err(ArgError::Invalid { .. })));
        assert!(matches!(invoke(&toolkit, "kill", &["abc"]), Err(ArgError::Invalid { .. })));
        assert!(matches!(invoke(&toolkit, "ls", &["--sort", "color"]), Err(ArgError::Invalid { .. })));
        assert!(matches!(invoke(&toolkit, "find", &["-t", "socket"]), Err(ArgError::Invalid { .. })));
        assert!(matches!(invoke(&toolkit, "pwd", &["extra"]), Err(ArgError::Unexpected { .. })));
        assert!(toolkit.history().is_empty());
    }

    #[test]
    fn chown_splits_owner_and_group() {
        let (_dir, toolkit) = setup();
        let result = invoke(&toolkit, "chown", &["-R", "lcat_nobody:lcat_none", "missing"]).unwrap();
        assert_eq!(result.command, "chown -R -- lcat_nobody:lcat_none missing");
        assert!(!result.success);
    }

    #[test]
    fn cd_without_argument_goes_home() {
        let (_dir, toolkit) = setup();
        let result = invoke(&toolkit, "cd", &[]).unwrap();
        if let Some(home) = dirs::home_dir().and_then(|h| h.canonicalize().ok()) {
            assert!(result.success, "{:?}", result);
            assert_eq!(toolkit.working_dir(), home);
        }
    }

    #[test]
    fn kill_accepts_dash_signal_shorthand() {
        let (_dir, toolkit) = setup();
        let numeric = invoke(&toolkit, "kill", &["-9", "2147483646"]).unwrap();
        assert_eq!(numeric.command, "kill -s 9 2147483646");
        assert!(!numeric.success);

        let named = invoke(&toolkit, "kill", &["-SIGKILL", "2147483646"]).unwrap();
        assert_eq!(named.command, "kill -s KILL 2147483646");

        let explicit = invoke(&toolkit, "kill", &["-s", "HUP", "2147483646"]).unwrap();
        assert_eq!(explicit.command, "kill -s HUP 2147483646");

        assert!(matches!(
            invoke(&toolkit, "kill", &["-x", "2147483646"]),
            Err(ArgError::UnknownFlag { .. })
        ));
        assert_eq!(toolkit.history().len(), 3);
    }

    #[test]
    fn free_human_flag_wins() {
        let (_dir, toolkit) = setup();
        let result = invoke(&toolkit, "free", &["-h"]).unwrap();
        assert_eq!(result.command, "free -h");
    }

    #[test]
    fn usage_mentions_every_option() {
        let grep = lookup("grep").unwrap();
        let usage = grep.usage();
        assert!(usage.starts_with("grep "));
        assert!(usage.contains("--ignore-case"));
        assert!(usage.contains("<pattern>"));
        assert!(usage.contains("[paths...]"));
        assert_eq!(grep.about_key(), "entry_grep");
    }
}
