use clap::Parser;
use fti_hook::{logging, Args, Relay};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref())?;

    let config = args.relay_config();
    tracing::info!(
        base_url = %config.base_url,
        route = ?config.route,
        timeout_secs = config.timeout.map(|t| t.as_secs()),
        "couchdb-fti-hook v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let mut relay = Relay::from_config(&config)?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    relay.run(stdin.lock(), stdout.lock())?;
    Ok(())
}
