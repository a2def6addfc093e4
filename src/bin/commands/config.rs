use clap::Args;
use netinv::{get_sqlite_info, NetinvConfig, SqliteDatabaseInfo};
use serde::Serialize;

/// Arguments for the Config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Print as JSON
    #[clap(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ConfigInfo {
    config_file: String,
    data_dir: String,
    listen_address: String,
    secret_passphrase_set: bool,
    database: SqliteDatabaseInfo,
}

pub fn run(config: &NetinvConfig, args: ConfigArgs) {
    let ConfigArgs { json } = args;

    let info = ConfigInfo {
        config_file: NetinvConfig::config_file_path(),
        data_dir: config.data_dir.clone(),
        listen_address: config.bind_address(),
        secret_passphrase_set: config.secret_passphrase.is_some(),
        database: get_sqlite_info(config),
    };

    if json {
        match serde_json::to_string_pretty(&info) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error serializing config info: {}", e),
        }
    } else {
        print_config_table(config, &info);
    }
}

fn print_config_table(config: &NetinvConfig, info: &ConfigInfo) {
    println!("netinv Configuration");
    println!("====================\n");

    println!("General:");
    println!("  Config file:    {}", info.config_file);
    for line in config.summary().lines() {
        println!("  {}", line);
    }
    println!();

    let db = &info.database;
    println!("SQLite Database:");
    println!("  Path:           {}", db.path);
    println!(
        "  Status:         {}",
        if db.exists { "exists" } else { "not created" }
    );
    if let Some(size) = db.size_bytes {
        println!("  Size:           {}", format_size(size));
    }
    println!(
        "  Schema:         {}",
        if db.schema_initialized {
            format!("initialized (v{})", db.schema_version.unwrap_or(0))
        } else {
            "not initialized".to_string()
        }
    );
    for table in &db.tables {
        println!("  {:<16}{} rows", format!("{}:", table.name), table.rows);
    }

    eprintln!();
    eprintln!("Tips:");
    eprintln!("  Use --json for machine-readable output");
    eprintln!("  Edit ~/.netinv/netinv.toml to customize settings");
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
