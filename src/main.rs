use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use clap::{ArgAction, Parser};
use log::{debug, info, warn};
use wayback_saver::{
    browser_controller::{BrowserController, BrowserKind},
    credentials::Credentials,
    session,
    submitter::{Submitter, SubmitterOptions},
    utils::collect_urls,
};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Wayback Machine Save Page Now CLI", long_about = None)]
struct Args {
    /// URLs to submit to the archive
    urls: Vec<String>,
    /// File with one URL per line
    #[arg(short = 'f', long)]
    urls_file: Option<PathBuf>,
    /// Path to the login credentials file (JSON or two-line email/password)
    #[arg(short = 'c', long, default_value = ".secret/credentials.json")]
    credentials: PathBuf,
    /// Browser to drive: chrome, chromium, firefox or edge
    #[arg(short = 'b', long, default_value = "chrome")]
    browser: String,
    /// Seconds to wait before each submission
    #[arg(short = 'd', long, default_value_t = 5)]
    delay: u64,
    /// Maximum time the browser will wait for an event before timing out
    #[arg(long, default_value_t = 45)]
    browser_timeout: u64,
    /// Ask the archive to also capture outgoing links
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    outlinks: bool,
    /// Ask the archive to also store a screenshot
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    screenshot: bool,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(env) => {
            if env == "debug" {
                println!("{number:/>width$}", number = "", width = 20);
                println!("{}", "Debug mode enabled");
                println!("{number:/>width$}", number = "", width = 20);
                println!();
            }
        }
        _ => {}
    }

    // validation failures come back as typed errors, the exit code is decided
    // here and nowhere else
    if let Err(e) = run(args).await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let credentials = Credentials::from_file(&args.credentials)?;
    let browser: BrowserKind = args.browser.parse()?;
    let urls = collect_urls(&args.urls, args.urls_file.as_deref())?;

    if urls.is_empty() {
        warn!("no valid urls to submit, nothing to do");
        return Ok(());
    }

    debug!("starting {} with {} urls", browser, urls.len());

    let driver = BrowserController::new(browser, args.browser_timeout)
        .context("could not launch the browser")?;

    session::login(&driver, &credentials).await?;
    info!("logged in as {}", credentials.email());

    let options = SubmitterOptions::default_builder()
        .request_delay(Duration::from_secs(args.delay))
        .capture_outlinks(args.outlinks)
        .capture_screenshot(args.screenshot)
        .build()?;

    let submitter = Submitter::new(driver, options);
    let report = submitter.run(&urls).await;

    if !report.failed.is_empty() {
        warn!(
            "{} of {} submissions could not be completed",
            report.failed.len(),
            report.attempted()
        );
    }

    Ok(())
}
