use std::process;

use clap::{App, Arg};
use log::error;

use frisbee::{run, BenchConfig, ConfigError, LogObserver};

mod logging;

fn config() -> Result<BenchConfig, ConfigError> {
    let matches = App::new("frisbee")
        .about("Passes a token round-robin between threads guarded by a spin, queue or seq lock")
        .arg(Arg::with_name("threads").required(true).index(1).help("number of worker threads"))
        .arg(Arg::with_name("passes").required(true).index(2).help("number of token passes"))
        .arg(
            Arg::with_name("strategy")
                .required(true)
                .index(3)
                .help("lock strategy: 1|spin, 2|queue|anderson, 3|seq|seqlock"),
        )
        .arg(
            Arg::with_name("capacity")
                .long("capacity")
                .takes_value(true)
                .help("slots in the queue lock (default 50)"),
        )
        .get_matches();

    // clap has already rejected missing positionals
    let config = BenchConfig::parse(
        matches.value_of("threads").unwrap_or_default(),
        matches.value_of("passes").unwrap_or_default(),
        matches.value_of("strategy").unwrap_or_default(),
    )?;
    match matches.value_of("capacity") {
        Some(capacity) => {
            let capacity = capacity
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber(capacity.to_owned()))?;
            config.with_capacity(capacity)
        }
        None => Ok(config),
    }
}

fn main() {
    if let Err(e) = logging::init() {
        eprintln!("cannot install logger: {}", e);
    }
    let result = config().and_then(|config| run(&config, &LogObserver));
    if let Err(e) = result {
        error!("{}", e);
        process::exit(2);
    }
}
