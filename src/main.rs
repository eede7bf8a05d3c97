//! kvexpiry - command-line access to an expiring JSON file cache
//!
//! This is the entry point for the `kvexpiry` binary. It opens a JSON file
//! store, wraps it in an expiring namespace and runs a single command.

use anyhow::{bail, Context};
use kvexpiry::expiry::{ExpiringKv, Namespace, TimeSpec, Ttl, DEFAULT_SUFFIX};
use kvexpiry::storage::{Backend, JsonFileStore};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Tool configuration
struct Config {
    /// JSON file backing the store
    file: String,
    /// Namespace prefix
    prefix: String,
    /// Namespace bucket
    bucket: String,
    /// Expiration key suffix
    suffix: String,
    /// What to do
    command: Command,
}

/// A single operation on the namespace
enum Command {
    Set {
        key: String,
        value: Value,
        ttl: Option<TimeSpec>,
    },
    Get(String),
    Ttl(String),
    Remove(String),
    Flush,
    FlushExpired,
    Keys,
}

impl Command {
    /// Commands that may change the store and need to be persisted.
    fn mutates(&self) -> bool {
        !matches!(self, Command::Keys)
    }
}

/// What the command line asks for
enum Invocation {
    Run(Config),
    Help,
    Version,
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> anyhow::Result<Self> {
        let args: Vec<String> = std::env::args().skip(1).collect();

        match parse_args(&args)? {
            Invocation::Run(config) => Ok(config),
            Invocation::Help => {
                print_help();
                std::process::exit(0);
            }
            Invocation::Version => {
                println!("kvexpiry version {}", kvexpiry::VERSION);
                std::process::exit(0);
            }
        }
    }

    fn namespace(&self) -> Namespace {
        Namespace::new(self.prefix.clone())
            .with_bucket(self.bucket.clone())
            .with_suffix(self.suffix.clone())
    }
}

/// Scans the argument list.
///
/// Only the options listed in `--help` are options. Everything else is
/// positional, so values such as `-5` reach `set` untouched. A bare `--`
/// makes every following argument positional.
fn parse_args(args: &[String]) -> anyhow::Result<Invocation> {
    let mut file = "kvexpiry.json".to_string();
    let mut prefix = "kvexpiry:".to_string();
    let mut bucket = String::new();
    let mut suffix = DEFAULT_SUFFIX.to_string();
    let mut ttl = None;
    let mut positional = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            flag @ ("--file" | "-f" | "--prefix" | "-p" | "--bucket" | "-b" | "--suffix"
            | "--ttl" | "-t") => {
                let value = args
                    .get(i + 1)
                    .with_context(|| format!("{} requires a value", flag))?
                    .clone();
                match flag {
                    "--file" | "-f" => file = value,
                    "--prefix" | "-p" => prefix = value,
                    "--bucket" | "-b" => bucket = value,
                    "--suffix" => suffix = value,
                    _ => {
                        let spec = value
                            .parse::<TimeSpec>()
                            .with_context(|| format!("invalid TTL '{}'", value))?;
                        ttl = Some(spec);
                    }
                }
                i += 2;
            }
            "--help" | "-h" => return Ok(Invocation::Help),
            "--version" | "-v" => return Ok(Invocation::Version),
            "--" => {
                positional.extend(args[i + 1..].iter().cloned());
                break;
            }
            // Before the command name a dash can only be a mistyped option
            other if positional.is_empty() && other.starts_with('-') && other.len() > 1 => {
                bail!("unknown argument: {}", other);
            }
            _ => {
                positional.push(args[i].clone());
                i += 1;
            }
        }
    }

    let command = parse_command(&positional, ttl)?;

    Ok(Invocation::Run(Config {
        file,
        prefix,
        bucket,
        suffix,
        command,
    }))
}

fn parse_command(positional: &[String], ttl: Option<TimeSpec>) -> anyhow::Result<Command> {
    let (name, rest) = match positional.split_first() {
        Some((name, rest)) => (name.as_str(), rest),
        None => bail!("missing command (try --help)"),
    };

    let key = |usage: &str| -> anyhow::Result<String> {
        match rest {
            [key] => Ok(key.clone()),
            _ => bail!("usage: kvexpiry {}", usage),
        }
    };

    if ttl.is_some() && name != "set" {
        bail!("--ttl only applies to set");
    }

    let command = match name {
        "set" => match rest {
            [key, raw] => Command::Set {
                key: key.clone(),
                // Anything that is not valid JSON is stored as a plain string
                value: serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone())),
                ttl,
            },
            _ => bail!("usage: kvexpiry set <key> <json> [--ttl SPEC]"),
        },
        "get" => Command::Get(key("get <key>")?),
        "ttl" => Command::Ttl(key("ttl <key>")?),
        "remove" | "rm" => Command::Remove(key("remove <key>")?),
        "flush" => Command::Flush,
        "flush-expired" => Command::FlushExpired,
        "keys" => Command::Keys,
        other => bail!("unknown command: {}", other),
    };

    Ok(command)
}

fn print_help() {
    println!(
        r#"
kvexpiry - Expiring keys over a JSON file store

USAGE:
    kvexpiry [OPTIONS] <COMMAND>

COMMANDS:
    set <key> <json>     Store a value (non-JSON input is stored as a string)
    get <key>            Print a value, reclaiming it if expired
    ttl <key>            Print the remaining time to live
    remove <key>         Remove a value and its expiry
    flush                Remove every key in the namespace
    flush-expired        Reclaim every expired key in the namespace
    keys                 List logical keys in the namespace

OPTIONS:
    -f, --file <PATH>      Store file (default: kvexpiry.json)
    -p, --prefix <PREFIX>  Namespace prefix (default: kvexpiry:)
    -b, --bucket <BUCKET>  Namespace bucket (default: empty)
        --suffix <SUFFIX>  Expiration key suffix (default: -expiration)
    -t, --ttl <SPEC>       Time to live for set: days ("3") or units ("1h30m", "45s", "500ms")
    -v, --version          Print version information
    -h, --help             Print this help message

EXAMPLES:
    kvexpiry set session '{{"user": 7}}' --ttl 30m
    kvexpiry get session
    kvexpiry --bucket users: flush-expired

Set RUST_LOG=debug to see what the engine does.
"#
    );
}

fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args()?;

    // Set up logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let store = JsonFileStore::open(&config.file)
        .with_context(|| format!("failed to open store file {}", config.file))?;
    let kv = ExpiringKv::with_namespace(store, config.namespace());
    debug!(file = %config.file, scope = kv.namespace().scope(), "Store opened");

    run(&kv, &config.command)?;

    if config.command.mutates() {
        kv.backend()
            .persist()
            .with_context(|| format!("failed to write store file {}", config.file))?;
        info!(file = %config.file, "Store persisted");
    }

    Ok(())
}

/// Executes one command and prints its result.
fn run(kv: &ExpiringKv<JsonFileStore>, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::Set { key, value, ttl } => {
            match ttl {
                Some(ttl) => kv.set_with_ttl(key, value.clone(), *ttl)?,
                None => kv.set(key, value.clone())?,
            };
            println!("OK");
        }
        Command::Get(key) => match kv.get(key)? {
            Some(value) => println!("{}", value),
            None => println!("(nil)"),
        },
        Command::Ttl(key) => match kv.ttl(key)? {
            Ttl::Absent => println!("(nil)"),
            Ttl::Permanent => println!("permanent"),
            Ttl::Remaining(left) => println!("{} ms", left.as_millis()),
        },
        Command::Remove(key) => {
            kv.remove(key)?;
            println!("OK");
        }
        Command::Flush => {
            let removed = kv.flush()?;
            println!("{} keys removed", removed);
        }
        Command::FlushExpired => {
            let report = kv.flush_expired()?;
            println!(
                "{} of {} entries expired and removed",
                report.expired, report.scanned
            );
        }
        Command::Keys => {
            let namespace = kv.namespace();
            let mut keys: Vec<String> = kv
                .backend()
                .keys()?
                .iter()
                .filter_map(|key| namespace.logical_key(key))
                .map(str::to_string)
                .collect();
            keys.sort();
            for key in keys {
                println!("{}", key);
            }
        }
    }

    Ok(())
}
