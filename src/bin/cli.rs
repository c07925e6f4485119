//! binkv CLI
//!
//! Runs commands against an in-process multi-node store. Pass a command
//! after the options for a one-shot run, or none to read commands from
//! stdin, one per line.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use binkv::store::MemoryStore;
use binkv::{Adapter, Command, Config};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// Module body uploaded to the sandbox store
const MODULE_SOURCE: &[u8] = include_bytes!("../../udf/redis.lua");

/// binkv CLI
#[derive(Parser, Debug)]
#[command(name = "binkv-cli")]
#[command(about = "Redis-style commands over a bin/record store")]
#[command(version)]
struct Args {
    /// Namespace records live in
    #[arg(short, long, default_value = "test")]
    namespace: String,

    /// Set records live in
    #[arg(short, long, default_value = "redis")]
    set: String,

    /// Number of simulated store nodes
    #[arg(long, default_value = "3")]
    nodes: usize,

    /// Per-call timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "1000")]
    timeout_ms: u64,

    /// Simulated store latency in milliseconds
    #[arg(long, default_value = "0")]
    latency_ms: u64,

    /// Command to run, e.g. `SET greeting hello`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,binkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .namespace(&args.namespace)
        .set(&args.set)
        .module_source_inline(MODULE_SOURCE)
        .timeout_ms(args.timeout_ms)
        .build();

    let store = MemoryStore::builder()
        .nodes(args.nodes)
        .latency(Duration::from_millis(args.latency_ms))
        .build();

    let adapter = match Adapter::new(store, config) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Failed to start adapter: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("binkv v{} ({} nodes)", binkv::VERSION, args.nodes);

    if !args.command.is_empty() {
        if !run(&adapter, &args.command) {
            std::process::exit(1);
        }
        return;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("binkv> ");
        let _ = stdout.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        }

        let argv = match Command::tokenize(&line) {
            Ok(argv) => argv,
            Err(e) => {
                println!("(error) {}", e);
                continue;
            }
        };
        match argv.first().map(|s| s.to_lowercase()).as_deref() {
            None => continue,
            Some("quit") | Some("exit") => break,
            Some(_) => {
                run(&adapter, &argv);
            }
        }
    }
}

/// Parse and execute one command line, printing the reply
fn run(adapter: &Adapter<MemoryStore>, argv: &[String]) -> bool {
    match Command::parse(argv).and_then(|command| adapter.execute(command)) {
        Ok(reply) => {
            println!("{}", reply);
            true
        }
        Err(e) => {
            println!("(error) {}", e);
            false
        }
    }
}
