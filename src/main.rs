mod config;
mod db;
mod models;
mod money;
mod proration;
mod recurring;
mod reports;
mod run;

use anyhow::Result;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = config::Config::from_env()?.with_db_override(run::flag_value(&args, "--db"));
    init_tracing(&config.log_filter);

    let args = run::strip_flag(&args, "--db");

    if args.len() < 2 {
        run::print_usage();
        return Ok(());
    }
    run::as_cli(&args, &config)
}

fn init_tracing(filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_new(filter)
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
