use std::path::{Path, PathBuf};
use std::process::exit;
use std::time::{SystemTime, UNIX_EPOCH};

use certificate_exporter::config::DEFAULT_CONFIG_FILE;
use certificate_exporter::metrics::{build_registry, MetricsServer};
use certificate_exporter::{
    report, CertificateCollector, Config, ConfigError, ExporterError, OutputFormat, Settings,
};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exposes the validity window of TLS certificates found on disk as Prometheus metrics
#[derive(Parser, Debug)]
#[command(name = "certificate-exporter", version, author, about, long_about = None)]
struct Cli {
    /// Path in which to look for certificates. Directories are listed (not
    /// recursively); files are always checked, ignoring suffix matching and
    /// exclusion. Can be repeated.
    #[arg(long = "path", value_name = "PATH")]
    paths: Vec<String>,

    /// Suffix to match against when looking for certificates in directories.
    /// Can be repeated. Defaults to no suffix, so every file is matched.
    #[arg(long = "certificate-suffix", value_name = "SUFFIX")]
    certificate_suffixes: Vec<String>,

    /// Regex matched against file names found in directories. Matching files are ignored.
    #[arg(long, value_name = "REGEX")]
    certificate_exclude_regex: Option<String>,

    /// Logging level (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Port the exporter listens on [default: 8080]
    #[arg(long)]
    port: Option<u16>,

    /// Address the exporter binds to [default: 0.0.0.0]
    #[arg(long, value_name = "ADDR")]
    address: Option<String>,

    /// Configuration file (defaults to ./certificate-exporter.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run a single collection pass, print a report and exit
    #[arg(long)]
    once: bool,

    /// Report format used with --once: text or json
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    /// Print an example configuration file and exit
    #[arg(long)]
    generate_config: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.generate_config {
        println!("{}", Config::example_toml());
        exit(0);
    }

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            exit(2);
        }
    };

    init_tracing(&settings.log_level);
    info!(
        paths = ?settings.search.paths,
        suffixes = ?settings.search.suffixes,
        exclude = ?settings.search.exclude.as_ref().map(|r| r.as_str()),
        listen = %settings.listen_addr,
        "Starting certificate exporter"
    );

    let result = if cli.once {
        run_once(&settings, cli.output)
    } else {
        serve(settings)
    };

    match result {
        Ok(code) => exit(code),
        Err(e) => {
            error!(error = %e, "Certificate exporter failed");
            exit(1);
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings, ConfigError> {
    let file_config = match &cli.config {
        Some(path) => Some(Config::from_file(path)?),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Some(Config::from_file(DEFAULT_CONFIG_FILE)?)
        }
        None => None,
    };

    let mut config = Config::default();
    if let Some(file_config) = file_config {
        config = config.merge_with(file_config);
    }
    config
        .merge_with(Config::from_cli_args(
            cli.paths.clone(),
            cli.certificate_suffixes.clone(),
            cli.certificate_exclude_regex.clone(),
            cli.log_level.clone(),
            cli.address.clone(),
            cli.port,
        ))
        .validate()
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();
}

fn run_once(settings: &Settings, output: OutputFormat) -> Result<i32, ExporterError> {
    let collector = CertificateCollector::new(settings.search.clone())?;
    let scan = collector.scan();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();

    println!("{}", report::render(&scan, output, now)?);
    Ok(if scan.failures.is_empty() { 0 } else { 1 })
}

fn serve(settings: Settings) -> Result<i32, ExporterError> {
    let collector = CertificateCollector::new(settings.search)?;
    let registry = build_registry(collector)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(MetricsServer::new(settings.listen_addr, registry).run())?;
    Ok(0)
}
