use clap::Parser;
use mscript_run::{Cli, Config, config};

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    let config = cli.apply(Config::from_env());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config::DEFAULT_LOG_LEVEL)),
        )
        .with_writer(std::io::stderr)
        .init();

    cli.run(&config)
}
