use std::{path::PathBuf, time::Duration};

use headless_chrome::{browser::default_executable, Browser, LaunchOptions};
use url::Url;
use wayback_saver::{
    browser_controller::{BrowserController, BrowserKind},
    credentials::Credentials,
    session,
    submitter::{Submitter, SubmitterOptions},
};

macro_rules! aw {
    ($e:expr) => {
        tokio_test::block_on($e)
    };
}

/*
ARCHIVE_CREDENTIALS=.secret/credentials.json RUST_LOG=debug \
    cargo test --test submit -- submit_one_url --exact --ignored
*/
#[test]
#[ignore = "drives a real browser against archive.org"]
fn submit_one_url() -> anyhow::Result<()> {
    env_logger::init();

    let credentials_path = std::env::var("ARCHIVE_CREDENTIALS")
        .unwrap_or_else(|_| ".secret/credentials.json".into());
    let credentials = Credentials::from_file(&PathBuf::from(credentials_path))?;

    let driver = BrowserController::new(BrowserKind::Chrome, 45)?;
    aw!(session::login(&driver, &credentials))?;

    let options = SubmitterOptions::default_builder()
        .request_delay(Duration::from_secs(5))
        .build()?;
    let submitter = Submitter::new(driver, options);

    let urls = vec![Url::parse("https://example.com/")?];
    let report = aw!(submitter.run(&urls));
    println!("{report:#?}");
    assert_eq!(report.attempted(), 1);
    Ok(())
}

#[test]
#[ignore = "needs a local chrome"]
fn headless_chrome() -> anyhow::Result<()> {
    env_logger::init();
    let options = LaunchOptions::default_builder()
        .path(Some(default_executable().unwrap()))
        .window_size(Some((1920, 1080)))
        .idle_browser_timeout(Duration::from_secs(45))
        .sandbox(true)
        .build()
        .expect("Couldn't find appropriate Chrome binary.");
    let browser = Browser::new(options)?;
    let tab = browser.new_tab()?;
    let nv = tab.navigate_to("https://web.archive.org/save")?;
    nv.wait_until_navigated()?;
    let elems = nv.find_elements("input")?;
    println!("{elems:?}");

    Ok(())
}
