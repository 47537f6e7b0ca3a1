use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use crawl_logging::{crawl_error, crawl_info};
use sitemap_app::cli::{Cli, DEFAULT_LOG_FILE};
use sitemap_app::{build_options, load_file_config, run_session, FileConfig, SessionError};

fn main() -> ExitCode {
    let cli = Cli::parse();
    crawl_logging::initialize(
        cli.log_to.into(),
        cli.log_level.into(),
        Path::new(DEFAULT_LOG_FILE),
    );

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            crawl_error!("{}", err);
            eprintln!("sitemap-gen: {err}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<(), SessionError> {
    let file = match cli.config.as_deref() {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };
    let options = build_options(cli, file)?;

    let outcome = run_session(options, |status| {
        crawl_info!(
            "Crawl finished: {} pages in sitemap, {} errors",
            status.success,
            status.error
        );
    })?;

    match &outcome.sitemap_path {
        Some(path) => println!("{}", path.display()),
        None => println!("No pages found under {}", outcome.status.url),
    }
    if let Some(path) = &outcome.report_path {
        println!("{}", path.display());
    }
    Ok(())
}
