use clap::{Parser, Subcommand};
use netinv::NetinvConfig;
use tracing::Level;

mod commands;

use commands::config::ConfigArgs;
use commands::secret::SecretArgs;
use commands::serve::ServeArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.netinv/netinv.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve(ServeArgs),

    /// Show configuration and database status
    Config(ConfigArgs),

    /// Encrypt or decrypt a secret with the configured passphrase
    Secret(SecretArgs),
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = match NetinvConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::run(&config, args),
        Commands::Config(args) => {
            commands::config::run(&config, args);
            Ok(())
        }
        Commands::Secret(args) => commands::secret::run(&config, args),
    };

    if let Err(e) = result {
        eprintln!("ERROR: {:#}", e);
        std::process::exit(1);
    }
}
