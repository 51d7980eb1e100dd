use std::time::{Duration, Instant};

use tokio::time::sleep;
use url::Url;

use crate::{
    browser_controller::{DriverError, Locator, PageDriver},
    types::{Outcome, RunReport},
    utils::SAVE_URL,
};

// Save Page Now form controls and the result-page elements we scrape. All of
// this tracks the live archive markup and breaks when the site changes.
const URL_INPUT: Locator = Locator::Css("#web-save-url-input");
const OUTLINKS_TOGGLE: Locator = Locator::Css("#capture_outlinks");
const SCREENSHOT_TOGGLE: Locator = Locator::Css("#capture_screenshot");
const SAVE_BUTTON: Locator = Locator::Css("input.web-save-button");

const SAVING_INDICATOR: Locator = Locator::Css("#spn-loading");
const SUCCESS_LABEL: Locator =
    Locator::XPath(r#"//div[@id="spn-result"]//a[contains(@href, "/web/")]"#);
const TOO_MANY_CAPTURES: Locator =
    Locator::XPath(r#"//p[contains(text(), "already captured 10 times")]"#);
const CAPTURE_IN_PROGRESS: Locator =
    Locator::XPath(r#"//p[contains(text(), "is currently being captured")]"#);
const DUPLICATE_SNAPSHOT: Locator =
    Locator::XPath(r#"//p[contains(text(), "same snapshot had been made")]"#);

#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct SubmitterOptions {
    // courtesy delay before every attempt
    #[builder(default = "Duration::from_secs(5)")]
    request_delay: Duration,
    // time for the result page to render after the form is submitted
    #[builder(default = "Duration::from_secs(2)")]
    settle_delay: Duration,
    // upper bound on waiting for the saving indicator to clear
    #[builder(default = "Duration::from_secs(60)")]
    saving_timeout: Duration,
    #[builder(default = "Duration::from_millis(500)")]
    poll_interval: Duration,
    #[builder(default = "true")]
    capture_outlinks: bool,
    #[builder(default = "true")]
    capture_screenshot: bool,
}

impl SubmitterOptions {
    pub fn default_builder() -> SubmitterOptionsBuilder {
        SubmitterOptionsBuilder::default()
    }
}

pub struct Submitter<D: PageDriver> {
    driver: D,
    options: SubmitterOptions,
}

impl<D: PageDriver> Submitter<D> {
    pub fn new(driver: D, options: SubmitterOptions) -> Self {
        Submitter { driver, options }
    }

    /// Submits every URL in order, one status line each. No outcome is fatal
    /// to the loop; a page that cannot even be filled in only fails its own
    /// URL.
    pub async fn run(&self, urls: &[Url]) -> RunReport {
        let mut report = RunReport::default();

        for url in urls {
            sleep(self.options.request_delay).await;

            match self.submit_one(url.as_str()).await {
                Ok(outcome) => {
                    println!("{} -> {}", url, outcome);
                    report.outcomes.push((url.to_string(), outcome));
                }
                Err(e) => {
                    error!("submission of {} failed: {}", url, e);
                    report.failed.push(url.to_string());
                }
            }
        }

        info!(
            "{} submissions done, {} failed",
            report.attempted(),
            report.failed.len()
        );
        report
    }

    async fn submit_one(&self, url: &str) -> Result<Outcome, DriverError> {
        debug!("submitting {}", url);

        if let Err(e) = self.driver.navigate(SAVE_URL) {
            warn!("save page did not load for {}: {}", url, e);
            // the page may still be usable, so we go straight to reading the
            // outcome off whatever rendered
            return self.classify(true, None);
        }

        self.driver.type_into(&URL_INPUT, url)?;
        if self.options.capture_outlinks {
            self.driver.click(&OUTLINKS_TOGGLE)?;
        }
        if self.options.capture_screenshot {
            self.driver.click(&SCREENSHOT_TOGGLE)?;
        }
        self.driver.click(&SAVE_BUTTON)?;

        sleep(self.options.settle_delay).await;

        let elapsed = self.wait_for_capture(url).await;
        self.classify(false, elapsed)
    }

    /// If the saving indicator is displayed, polls until it clears, bounded by
    /// the configured timeout. Returns the time the indicator was observed
    /// for, or None if it never appeared.
    async fn wait_for_capture(&self, url: &str) -> Option<Duration> {
        if !self.probe(&SAVING_INDICATOR) {
            return None;
        }

        println!("{} -> saving...", url);
        let start = Instant::now();
        while start.elapsed() < self.options.saving_timeout {
            if !self.probe(&SAVING_INDICATOR) {
                return Some(start.elapsed());
            }
            sleep(self.options.poll_interval).await;
        }
        warn!("saving indicator for {} did not clear, giving up on it", url);
        Some(start.elapsed())
    }

    /// Reads the outcome off the result page, first match wins.
    fn classify(&self, timed_out: bool, elapsed: Option<Duration>) -> Result<Outcome, DriverError> {
        if self.probe(&SUCCESS_LABEL) {
            return Ok(Outcome::Saved { elapsed });
        }
        if self.probe(&TOO_MANY_CAPTURES) {
            return Ok(Outcome::AlreadyCapturedTenTimes);
        }
        if self.probe(&CAPTURE_IN_PROGRESS) {
            return Ok(Outcome::BeingCaptured);
        }
        // unlike the probes above, a backend failure here is not read as
        // absence, it fails the whole attempt
        if self.driver.count(&DUPLICATE_SNAPSHOT)? > 0 {
            return Ok(Outcome::DuplicateSnapshot);
        }
        Ok(if timed_out {
            Outcome::TimedOut
        } else {
            Outcome::Unknown
        })
    }

    /// The one lookup helper every probe goes through: absence and backend
    /// trouble both read as "not on the page".
    fn probe(&self, locator: &Locator) -> bool {
        match self.driver.exists(locator) {
            Ok(found) => found,
            Err(e) => {
                debug!("probe for {} failed: {}", locator, e);
                false
            }
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}
