use std::path::PathBuf;

use chring::{
    ring::hash_ring::Distribution,
    telemetry::{initialize_fmt_subscriber, initialize_json_subscriber},
    utils::generate_random_ascii_string,
    HashRing, RingConfig,
};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "ring-demo")]
#[command(about = "populates a hash ring, assigns keys and shows how they move when servers join and leave", long_about = None)]
struct Cli {
    /// json ring config. Takes precedence over --virtual-nodes
    #[arg(long)]
    config_path: Option<PathBuf>,
    #[arg(long, default_value_t = 3)]
    virtual_nodes: usize,
    #[arg(long, value_delimiter = ',', default_value = "Server1,Server2,Server3")]
    servers: Vec<String>,
    #[arg(long, value_delimiter = ',', default_value = "Key1,Key2,Key3,Key4,Key5")]
    keys: Vec<String>,
    /// assign this many random keys instead of --keys
    #[arg(long)]
    random_keys: Option<usize>,
    /// server added after the initial distribution
    #[arg(long, default_value = "Server4")]
    add: String,
    /// server removed at the end
    #[arg(long, default_value = "Server2")]
    remove: String,
    /// only show the initial distribution
    #[arg(long, default_value = "false")]
    skip_changes: bool,
    /// print distributions as json
    #[arg(long, default_value = "false")]
    json: bool,
    #[arg(long, default_value = "false")]
    tracing_json: bool,
}

fn print_distribution(title: &str, distribution: &Distribution, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(distribution)?);
    } else {
        println!("\n{} ({} keys):", title, distribution.total_keys());
        print!("{}", distribution);
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    if args.tracing_json {
        initialize_json_subscriber();
    } else {
        initialize_fmt_subscriber();
    }

    let config = match args.config_path {
        Some(path) => RingConfig::from_path(&path)?,
        None => RingConfig::new(args.virtual_nodes),
    };
    let mut ring = HashRing::from_config(&config)?;

    for server in args.servers {
        ring.add_server(server)?;
    }

    let keys: Vec<String> = match args.random_keys {
        Some(n_keys) => (0..n_keys).map(|_| generate_random_ascii_string(12)).collect(),
        None => args.keys,
    };
    for key in keys {
        ring.assign_key(key)?;
    }
    print_distribution("Initial Key Distribution", &ring.distribution(), args.json)?;

    if args.skip_changes {
        return Ok(());
    }

    ring.add_server(args.add)?;
    print_distribution("Updated Key Distribution", &ring.distribution(), args.json)?;

    ring.remove_server(args.remove.as_bytes())?;
    print_distribution("Final Key Distribution", &ring.distribution(), args.json)?;

    Ok(())
}
