use std::process::exit;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use log::{debug, LevelFilter};

use kvline::{ClientConfig, KvClient, Result, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT};

#[derive(Parser)]
#[command(name = "kvline-cli", version, about = "A line-protocol key-value store client")]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ServerArgs {
    /// Server host name or IP address
    #[arg(long, global = true, default_value = DEFAULT_HOST, value_name = "HOST")]
    host: String,

    /// Server port
    #[arg(long, global = true, default_value_t = DEFAULT_PORT, value_name = "PORT")]
    port: u16,

    /// Connect/send/receive timeout in milliseconds, 0 disables it
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_TIMEOUT.as_millis() as u64,
        value_name = "MILLIS"
    )]
    timeout_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the value of a string key to a string
    Set {
        /// The key
        key: String,
        /// The value
        value: String,
    },
    /// Get the string value of a given string key
    Get {
        /// The key
        key: String,
    },
    /// Delete a given key
    Del {
        /// The key
        key: String,
    },
    /// Check that the server is reachable and answering
    Ping,
}

fn main() {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig::default()
        .host(cli.server.host)
        .port(cli.server.port)
        .timeout(Duration::from_millis(cli.server.timeout_ms));
    debug!("Using server {}:{}", config.host, config.port);
    let mut client = KvClient::with_config(config)?;

    match cli.command {
        Commands::Set { key, value } => client.set(&key, &value)?,
        Commands::Get { key } => match client.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("Key not found"),
        },
        Commands::Del { key } => {
            client.del(&key)?;
        }
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
    }
    Ok(())
}
