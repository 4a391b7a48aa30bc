use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use snmp_agent::{AgentConfig, InMemoryMib, Listener, Oid, Value};

/// A minimal SNMPv1 agent serving a small demo MIB.
#[derive(Parser, Debug)]
#[command(name = "agent", about = "SNMPv1 demo agent")]
struct Args {
    /// Address to bind the UDP listener to.
    #[arg(long, default_value = "0.0.0.0:16100")]
    listen: String,

    /// Accepted community string. May be repeated. No occurrences means
    /// "accept any community".
    #[arg(long = "community")]
    communities: Vec<String>,

    /// Number of worker threads handling decoded requests.
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Allow SetRequest to mutate the MIB instead of echoing a no-op.
    #[arg(long)]
    writable: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all logging below warnings.
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn demo_mib() -> InMemoryMib {
    let mib = InMemoryMib::new();
    mib.create(
        Oid::new(vec![1, 3, 6, 1, 2, 1, 1, 1, 0]),
        Value::OctetString(b"Rust SNMP Agent v1.0".to_vec()),
    );
    mib.create(Oid::new(vec![1, 3, 6, 1, 2, 1, 1, 3, 0]), Value::Integer(0));
    mib.create(
        Oid::new(vec![1, 3, 6, 1, 2, 1, 1, 4, 0]),
        Value::OctetString(b"admin@example.com".to_vec()),
    );
    mib
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let mib = Arc::new(demo_mib());
    log::info!("MIB seeded with {} objects", mib.len());

    let config = AgentConfig {
        communities: args.communities,
        workers: args.workers,
        read_only: !args.writable,
    };

    let mut listener = Listener::new(mib, config);
    listener
        .start(&args.listen)
        .context("failed to start SNMP listener")?;

    log::info!("agent running; send SIGINT/SIGTERM or ctrl-c to stop");
    loop {
        std::thread::sleep(std::time::Duration::from_secs(3600));
    }
}
