// Site Performance Engine - Main executable
// Author: Gabriel Demetrios Lafis

use std::env;
use std::io;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{App, Arg, ArgMatches};
use log::{info, warn};

use site_performance_engine::{
    api::{AppState, Server},
    data::{CsvSource, DimensionName, MetricName},
    fetch::FallbackChain,
    processing,
    query,
    session::{Credentials, HttpSearchAnalytics, SessionContext},
    storage::FileFormat,
    utils::{init_logging, Config},
};

/// Base64 encoded credential blob, checked before the stored credential file
const CREDENTIALS_ENV: &str = "GSC_CREDENTIALS_B64";

fn cli() -> App<'static> {
    App::new("site-performance")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Gabriel Demetrios Lafis")
        .about("Search analytics acquisition and ranking for site performance dashboards")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Sets a custom config file (JSON or YAML)")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .help("Use synthetic data only; never contact the analytics API")
                .global(true),
        )
        .subcommand(
            App::new("server")
                .about("Run the API server")
                .arg(Arg::new("host").long("host").value_name("HOST").takes_value(true))
                .arg(Arg::new("port").short('p').long("port").value_name("PORT").takes_value(true)),
        )
        .subcommand(App::new("sites").about("List sites the credential can read"))
        .subcommand(
            App::new("fetch")
                .about("Load redacted records and write them as CSV or JSON")
                .arg(range_arg())
                .arg(
                    Arg::new("dimensions")
                        .short('d')
                        .long("dimensions")
                        .value_name("LIST")
                        .help("Comma separated dimensions, e.g. date,query,page")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Write to a .csv or .json file instead of stdout")
                        .takes_value(true),
                ),
        )
        .subcommand(
            App::new("top")
                .about("Rank the values of one dimension")
                .arg(
                    Arg::new("dimension")
                        .long("dimension")
                        .value_name("DIMENSION")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::new("metric")
                        .short('m')
                        .long("metric")
                        .value_name("METRIC")
                        .default_value("clicks")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("top-n")
                        .short('n')
                        .long("top-n")
                        .value_name("N")
                        .default_value("10")
                        .takes_value(true),
                )
                .arg(range_arg()),
        )
}

fn range_arg() -> Arg<'static> {
    Arg::new("range")
        .short('r')
        .long("range")
        .value_name("NAME")
        .help("Named range such as \"Last 28 days\" or \"Semua Waktu\"")
        .takes_value(true)
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let mut config = match matches.value_of("config") {
        Some(path) => Config::from_file(path).with_context(|| format!("loading config {}", path))?,
        None => Config::default(),
    };

    if matches.is_present("mock") {
        config.data.mock_mode = true;
    }

    Ok(config)
}

/// Live session unless mock mode is on
fn build_session(config: &Config) -> Option<Arc<SessionContext>> {
    if config.data.mock_mode {
        info!("Mock mode: using synthetic data");
        return None;
    }

    let api = match HttpSearchAnalytics::new(&config.api) {
        Ok(api) => api,
        Err(err) => {
            warn!("Analytics API client unavailable: {}", err);
            return None;
        }
    };

    let mut session = SessionContext::new(api, &config.api.credentials_path);
    if let Ok(encoded) = env::var(CREDENTIALS_ENV) {
        match Credentials::from_base64(&encoded) {
            Ok(credentials) => session = session.with_credentials(credentials),
            Err(err) => warn!("Ignoring {}: {}", CREDENTIALS_ENV, err),
        }
    }

    Some(Arc::new(session))
}

fn run_server(config: Config, matches: &ArgMatches) -> anyhow::Result<()> {
    let mut server_config = config.server.clone();
    if let Some(host) = matches.value_of("host") {
        server_config.host = host.to_string();
    }
    if let Some(port) = matches.value_of("port") {
        server_config.port = port.parse().with_context(|| format!("invalid port '{}'", port))?;
    }

    let session = build_session(&config);
    let server = Server::new(AppState::new(config, session), server_config);

    actix_web::rt::System::new()
        .block_on(server.run())
        .context("running API server")
}

fn run_sites(config: &Config) -> anyhow::Result<()> {
    let session = match build_session(config) {
        Some(session) => session,
        None => bail!("listing sites needs live access; run without --mock"),
    };

    let handle = session.try_authenticate(true)?;
    for site in session.list_sites(&handle)? {
        println!("{}", site);
    }

    Ok(())
}

fn run_fetch(mut config: Config, matches: &ArgMatches) -> anyhow::Result<()> {
    if let Some(list) = matches.value_of("dimensions") {
        DimensionName::parse_list(list)?;
        config.data.dimensions = list.split(',').map(|d| d.trim().to_string()).collect();
    }

    let range = query::resolve_or_default(matches.value_of("range").unwrap_or(&config.data.date_range));
    let session = build_session(&config);
    let outcome = FallbackChain::from_config(&config, session, range)?.load()?;

    info!(
        "Loaded {} rows from {} ({} redacted)",
        outcome.records.len(),
        outcome.source_name,
        outcome.redacted_count
    );

    match matches.value_of("output") {
        Some(path) => {
            FileFormat::from_path(path)?.write(path, &outcome.records)?;
            info!("Wrote {}", path);
        }
        None => CsvSource::write_to(io::stdout(), &outcome.records, ',')?,
    }

    Ok(())
}

fn run_top(config: &Config, matches: &ArgMatches) -> anyhow::Result<()> {
    let dimension: DimensionName = matches.value_of("dimension").unwrap_or_default().parse()?;
    let metric: MetricName = matches.value_of("metric").unwrap_or("clicks").parse()?;
    let top_n: usize = matches
        .value_of("top-n")
        .unwrap_or("10")
        .parse()
        .context("top-n must be a number")?;

    let range = query::resolve_or_default(matches.value_of("range").unwrap_or(&config.data.date_range));
    let session = build_session(config);
    let outcome = FallbackChain::from_config(config, session, range)?.load()?;
    let rows = processing::aggregate(&outcome.records.records, dimension, metric, top_n)?;

    println!(
        "{:<4} {:<48} {:>8} {:>12} {:>8} {:>9}",
        "#", dimension.as_str(), "clicks", "impressions", "ctr %", "position"
    );
    for (i, row) in rows.iter().enumerate() {
        println!(
            "{:<4} {:<48} {:>8} {:>12} {:>8.2} {:>9.2}",
            i + 1,
            row.key,
            row.clicks,
            row.impressions,
            row.ctr,
            row.position
        );
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let config = load_config(&matches)?;

    if let Err(err) = init_logging(config.log_level_filter()) {
        eprintln!("Error initializing logger: {}", err);
    }

    match matches.subcommand() {
        Some(("server", sub)) => run_server(config, sub),
        Some(("sites", _)) => run_sites(&config),
        Some(("fetch", sub)) => run_fetch(config, sub),
        Some(("top", sub)) => run_top(&config, sub),
        _ => {
            cli().print_help()?;
            println!();
            Ok(())
        }
    }
}
