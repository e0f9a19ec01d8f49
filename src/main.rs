use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use zabbix_maintenance::config::{FileConfig, Overrides};
use zabbix_maintenance::{Job, Settings};

#[derive(Parser, Debug)]
#[command(version, about = "Put this host into a Zabbix maintenance window and prune expired ones")]
struct Cli {
    /// Zabbix API endpoint, e.g. https://zabbix.example.com/api_jsonrpc.php
    #[arg(long)]
    url: Option<String>,

    #[arg(short, long)]
    user: Option<String>,

    #[arg(short, long)]
    password: Option<String>,

    /// Config file (default: <config dir>/zabbix-maintenance/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// zabbix-cli auth token file (default: ~/.zabbix-cli_auth_token)
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Host name as known to Zabbix (default: this machine's host name)
    #[arg(long)]
    host: Option<String>,

    /// Length of the maintenance window
    #[arg(short, long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
    minutes: u32,

    /// IANA timezone for the time shown in the window name
    #[arg(long)]
    timezone: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,

    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!("zabbix_maintenance={level},reqwest=warn"))
    })?;

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let host_name = match cli.host.clone() {
        Some(h) => h,
        None => hostname::get()
            .context("cannot determine local host name")?
            .into_string()
            .map_err(|_| anyhow::anyhow!("local host name is not valid UTF-8"))?,
    };

    let file = FileConfig::load(cli.config.as_deref())?;
    let overrides = Overrides {
        url: cli.url,
        user: cli.user,
        password: cli.password,
        token_file: cli.token_file,
        timezone: cli.timezone,
        timeout_secs: cli.timeout,
        insecure: cli.insecure,
    };
    let settings = Settings::resolve(overrides, file)?;

    let job = Job {
        host_name,
        duration_minutes: cli.minutes,
    };
    let summary = zabbix_maintenance::run(&settings, &job)?;

    info!(
        host = %job.host_name,
        created = %summary.created,
        deleted = summary.deleted.len(),
        "done"
    );
    Ok(())
}
