use blogroll::build::{build_site, Error};
use blogroll::config::Config;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let matches = App::new("blogroll")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site")
                .arg(
                    Arg::with_name("project")
                        .short("p")
                        .long("project")
                        .value_name("DIR")
                        .default_value(".")
                        .help("Directory containing blogroll.yaml (or a subdirectory of it)"),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .value_name("DIR")
                        .default_value("_build")
                        .help("Directory the site is written to"),
                )
                .arg(
                    Arg::with_name("threads")
                        .short("t")
                        .long("threads")
                        .value_name("N")
                        .validator(|n| n.parse::<usize>().map(|_| ()).map_err(|e| e.to_string()))
                        .help("Number of parsing threads (defaults to the CPU count)"),
                ),
        )
        .get_matches();

    if let ("build", Some(matches)) = matches.subcommand() {
        if let Err(err) = build(matches) {
            tracing::error!("{}", err);
            std::process::exit(1);
        }
    }
}

fn build(matches: &ArgMatches) -> Result<(), Error> {
    let threads = matches
        .value_of("threads")
        .and_then(|threads| threads.parse::<usize>().ok());
    let config = Config::from_directory(
        Path::new(matches.value_of("project").unwrap_or(".")),
        Path::new(matches.value_of("output").unwrap_or("_build")),
        threads,
    )?;
    build_site(&config)
}
