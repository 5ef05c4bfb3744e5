//! Command line driver for the ticket market simulation

mod settings;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use eyre::{eyre, Result, WrapErr};
use settings::Settings;
use ticket_market_core::{Config, EventLog, MarketControl, RawConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Configuration used for every value neither the settings file nor the
/// command line provides
const DEFAULT_CONFIG: Config = Config {
    total_tickets: 20,
    ticket_release_rate: 5,
    customer_retrieval_rate: 2,
    max_ticket_capacity: 5,
    number_of_vendors: 1,
    number_of_customers: 2,
};

const DEFAULT_RUN_SECS: u64 = 10;

/// Command line options
#[derive(Debug, Default)]
struct Opts {
    /// Explicit settings file, otherwise `market.toml` is searched for
    settings_file: Option<PathBuf>,
    /// Values given on the command line
    overrides: Settings,
}

fn parse<T: FromStr>(opt: &str, arg: &str) -> Result<T> {
    arg.parse()
        .map_err(|_| eyre!("{opt} takes a decimal number, got {arg:?}"))
}

impl Opts {
    fn from_args() -> Result<Self> {
        let mut opts = Opts::default();
        let overrides = &mut opts.overrides;

        let mut option: Option<String> = None;
        for arg in std::env::args().skip(1) {
            if let Some(opt) = option.take() {
                match opt.as_str() {
                    "-config" => opts.settings_file = Some(PathBuf::from(arg)),
                    "-tickets" => overrides.config.total_tickets = Some(parse(&opt, &arg)?),
                    "-release-rate" => {
                        overrides.config.ticket_release_rate = Some(parse(&opt, &arg)?)
                    }
                    "-retrieval-rate" => {
                        overrides.config.customer_retrieval_rate = Some(parse(&opt, &arg)?)
                    }
                    "-capacity" => {
                        overrides.config.max_ticket_capacity = Some(parse(&opt, &arg)?)
                    }
                    "-vendors" => overrides.config.number_of_vendors = Some(parse(&opt, &arg)?),
                    "-customers" => {
                        overrides.config.number_of_customers = Some(parse(&opt, &arg)?)
                    }
                    "-run-secs" => overrides.run_secs = Some(parse(&opt, &arg)?),
                    "-release-delay-ms" => overrides.release_delay_ms = Some(parse(&opt, &arg)?),
                    "-retrieval-delay-ms" => {
                        overrides.retrieval_delay_ms = Some(parse(&opt, &arg)?)
                    }
                    "-monitor-interval-ms" => {
                        overrides.monitor_interval_ms = Some(parse(&opt, &arg)?)
                    }
                    _ => return Err(eyre!("unknown option {opt}")),
                }
            } else {
                option = Some(arg);
            }
        }
        if let Some(opt) = option {
            return Err(eyre!("option {opt} is missing a value"));
        }

        Ok(opts)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let opts = Opts::from_args()?;
    let file = match &opts.settings_file {
        Some(path) => Settings::load(path)?,
        None => Settings::discover()?,
    };
    let settings = file.merge(opts.overrides);

    let config = match RawConfig::from(DEFAULT_CONFIG)
        .merge(settings.config)
        .into_config()
    {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    let log = Arc::new(EventLog::new());
    let supervisor = ticket_market_engine::launch(config, settings.timing()?, log.clone())
        .wrap_err("could not start the simulation")?;

    thread::sleep(Duration::from_secs(
        settings.run_secs.unwrap_or(DEFAULT_RUN_SECS),
    ));
    supervisor.stop()?;

    for line in log.entries() {
        println!("{line}");
    }
    println!(
        "Tickets left in the pool: {}",
        supervisor.current_ticket_count()
    );
    Ok(())
}
