//! Command-line front end for keyval storage.
//!
//! Run with: `keyval <command> [args]`
//!
//! This is a CLI tool, so `println!` and `eprintln!` are used for user-facing
//! output; diagnostics go through `tracing` on stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use keyval_common::storage::{KeySource, ENCRYPTION_KEY_ENV};
use keyval_core::StorageService;
use keyval_domain::{Backend, StoredValue};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Key used by `demo` regardless of configured key sources
const DEMO_SECRET: &str = "secret";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str);

    let result = match command {
        Some("help") | None => {
            print_help();
            Ok(())
        }
        Some(command) => run(command, &args[1..]).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Install the global subscriber (`RUST_LOG`, default `info`)
///
/// `KEYVAL_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("KEYVAL_LOG_JSON").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let _ = if json { builder.json().try_init() } else { builder.try_init() };
}

fn print_help() {
    println!("keyval - encrypted key-value storage");
    println!();
    println!("USAGE:");
    println!("    keyval <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    set <key> <json>  Store a value (non-JSON input is stored as a string)");
    println!("    get <key>         Print a value, or nothing if absent");
    println!("    remove <key>      Delete a key");
    println!("    clear             Delete every entry");
    println!("    length            Print the entry count");
    println!("    keys              Print every key, one per line");
    println!("    dump              Print every entry with its position");
    println!("    backend           Print the selected backend");
    println!("    demo              Run create/set/get against the configured store");
    println!("    help              Show this help message");
    println!();
    println!("The encryption key is read from {ENCRYPTION_KEY_ENV}, or the platform keychain.");
}

async fn run(command: &str, args: &[String]) -> anyhow::Result<()> {
    let config = keyval_infra::config::load().context("loading configuration")?;
    let storage = keyval_infra::open_storage(&config).context("building storage")?;
    debug!(command, backend = %storage.backend(), "Dispatching command");

    match command {
        "backend" => {
            println!("{}", storage.backend());
            return Ok(());
        }
        "demo" => return run_demo(&storage).await,
        _ => {}
    }

    let key = encryption_key(storage.backend())?;
    storage.create(&key).await?;

    match (command, args) {
        ("set", [key, raw]) => {
            storage.set(key, parse_value(raw)).await?;
            info!(key = %key, "Stored value");
        }
        ("get", [key]) => {
            if let Some(value) = storage.get(key).await? {
                println!("{}", value.to_json_string()?);
            }
        }
        ("remove", [key]) => storage.remove(key).await?,
        ("clear", []) => storage.clear().await?,
        ("length", []) => println!("{}", storage.length().await?),
        ("keys", []) => {
            for key in storage.keys().await? {
                println!("{key}");
            }
        }
        ("dump", []) => {
            storage
                .for_each(|key, value, index| {
                    println!("{index}\t{key}\t{value}");
                })
                .await?;
        }
        ("set" | "get" | "remove" | "clear" | "length" | "keys" | "dump", _) => {
            bail!("wrong number of arguments for '{command}' (see 'keyval help')");
        }
        (unknown, _) => return Err(anyhow!("Unknown command: {unknown}")),
    }

    Ok(())
}

/// create("secret"), set("blar", "test"), get("blar")
async fn run_demo(storage: &StorageService) -> anyhow::Result<()> {
    storage.create(DEMO_SECRET).await?;
    storage.set("blar", "test").await?;

    let value = storage.get("blar").await?.ok_or_else(|| anyhow!("demo value missing"))?;
    println!("{} backend: blar = {value}", storage.backend());
    Ok(())
}

/// Resolve the key for `backend`
///
/// The flat store ignores keys, so it never touches a key source.
fn encryption_key(backend: Backend) -> anyhow::Result<String> {
    if !backend.is_encrypted() {
        return Ok(String::new());
    }

    let key = KeySource::default().resolve().context("resolving encryption key")?;

    Ok(key.expose().to_string())
}

/// Parse `raw` as JSON, falling back to a plain string
fn parse_value(raw: &str) -> StoredValue {
    StoredValue::from_json_str(raw).unwrap_or_else(|_| StoredValue::from(raw))
}
