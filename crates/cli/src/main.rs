//! # CLI - Spillway Interactive Shell
//!
//! A REPL over one paged dictionary and one paged list of strings. Reads
//! commands from stdin, prints results to stdout, logs to stderr. Works
//! interactively or with commands piped in.
//!
//! ## Commands
//!
//! ```text
//! SET key value      Insert or replace a dictionary entry
//! GET key            Look up a key (prints value or "(nil)")
//! DEL key            Remove a key
//! HAS key            Prints true or false
//! LEN                Number of dictionary entries
//! KEYS               Every key, sorted
//! PUSH value         Append to the list
//! LGET index         Read a list element
//! LSET index value   Replace a list element
//! POP                Remove and print the last list element
//! LLEN               Number of list elements
//! FLUSH              Write every resident page to disk
//! STATS              Print container layout and residency
//! EXIT / QUIT        Close both containers and stop
//! ```
//!
//! ## Configuration
//!
//! ```text
//! SPILLWAY_DIR            storage location       (default: ~/.spillway)
//! SPILLWAY_PAGE_CAPACITY  entries per page       (default: 1024)
//! SPILLWAY_MAX_PAGES      pages resident in RAM  (default: 16)
//! SPILLWAY_SYNC           fsync every page write (default: false)
//! SPILLWAY_DICT           dictionary base name   (default: "kv")
//! SPILLWAY_LIST           list base name         (default: "items")
//! RUST_LOG                log filter             (default: "warn")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ SPILLWAY_DIR=/tmp/sw cargo run -p cli
//! Spillway started (dict=/tmp/sw/kv, list=/tmp/sw/items, 1024 per page, 16 in RAM)
//! > SET name Alice
//! OK
//! > GET name
//! Alice
//! > EXIT
//! bye
//! ```
mod shell;

use anyhow::{Context, Result};
use config::StoreConfig;
use engine::{Dict, List};
use shell::{Outcome, Shell};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let dict_cfg = StoreConfig::from_env(env_or("SPILLWAY_DICT", "kv"))?;
    let list_cfg = StoreConfig::from_env(env_or("SPILLWAY_LIST", "items"))?;

    println!(
        "Spillway started (dict={}, list={}, {} per page, {} in RAM)",
        dict_cfg.base_path().display(),
        list_cfg.base_path().display(),
        dict_cfg.page_capacity,
        dict_cfg.max_resident_pages
    );

    let dict = Dict::open(dict_cfg).context("opening dictionary")?;
    let list = List::open(list_cfg).context("opening list")?;
    let mut shell = Shell::new(dict, list);

    println!("Commands: SET key value | GET key | DEL key | HAS key | LEN | KEYS");
    println!("          PUSH value | LGET i | LSET i value | POP | LLEN");
    println!("          FLUSH | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match shell.execute(&line) {
            Ok(Outcome::Reply(text)) => {
                if !text.is_empty() {
                    println!("{text}");
                }
            }
            Ok(Outcome::Exit) => {
                println!("bye");
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, command = %line, "command failed");
                println!("ERR {e:#}");
            }
        }
        print!("> ");
        io::stdout().flush().ok();
    }

    shell.close()?;
    Ok(())
}
