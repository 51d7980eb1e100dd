use std::{fmt, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use headless_chrome::Tab;
use headless_chrome::{browser::default_executable, Browser, LaunchOptions};
use sysinfo::{Pid, PidExt, ProcessExt, System, SystemExt};
use thiserror::Error;

use crate::{types::SaverError, utils::create_random_tmp_folder};

/// Browsers the tool knows how to launch. All of them are driven over the
/// devtools protocol; the selection only changes which executable we look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    Chrome,
    Chromium,
    Firefox,
    Edge,
}

impl BrowserKind {
    fn executable_names(&self) -> &'static [&'static str] {
        match self {
            BrowserKind::Chrome => &["google-chrome", "google-chrome-stable", "chrome"],
            BrowserKind::Chromium => &["chromium", "chromium-browser"],
            BrowserKind::Firefox => &["firefox"],
            BrowserKind::Edge => &["microsoft-edge", "microsoft-edge-stable", "msedge"],
        }
    }

    /// Resolves the browser binary, first through headless_chrome's own lookup
    /// for chrome, then by searching PATH for the well-known names.
    pub fn executable(&self) -> Result<PathBuf, SaverError> {
        if let BrowserKind::Chrome = self {
            if let Ok(path) = default_executable() {
                return Ok(path);
            }
        }
        self.executable_names()
            .iter()
            .find_map(|name| search_path(name))
            .ok_or(SaverError::BrowserNotFound(*self))
    }

    /// Everything here is driven over the devtools protocol, which current
    /// firefox releases no longer speak. Worth a warning up front, the
    /// alternative is a silent hang at launch.
    pub fn cdp_caveat(&self) -> Option<&'static str> {
        match self {
            BrowserKind::Firefox => Some(
                "current firefox releases have dropped devtools-protocol support, \
                 the session may hang; prefer chrome, chromium or edge",
            ),
            _ => None,
        }
    }
}

impl FromStr for BrowserKind {
    type Err = SaverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" => Ok(BrowserKind::Chrome),
            "chromium" => Ok(BrowserKind::Chromium),
            "firefox" => Ok(BrowserKind::Firefox),
            "edge" => Ok(BrowserKind::Edge),
            other => Err(SaverError::UnknownBrowser(other.into())),
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Edge => "edge",
        };
        write!(f, "{}", name)
    }
}

fn search_path(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// A fixed element locator on one of the archive's pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    Css(&'static str),
    XPath(&'static str),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css {}", s),
            Locator::XPath(s) => write!(f, "xpath {}", s),
        }
    }
}

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("element not found: {0}")]
    NotFound(String),
    #[error("browser backend error: {0}")]
    Backend(String),
}

/// The slice of browser automation this tool needs. Element absence is an
/// ordinary answer (`exists` returns `Ok(false)`, `count` returns `Ok(0)`);
/// `Err` is reserved for the automation layer itself misbehaving.
pub trait PageDriver {
    fn navigate(&self, url: &str) -> Result<(), DriverError>;
    fn exists(&self, locator: &Locator) -> Result<bool, DriverError>;
    fn count(&self, locator: &Locator) -> Result<usize, DriverError>;
    fn type_into(&self, locator: &Locator, text: &str) -> Result<(), DriverError>;
    fn click(&self, locator: &Locator) -> Result<(), DriverError>;
}

pub struct BrowserController {
    browser: Browser,
    tab: Arc<Tab>,
    element_timeout: Duration,
}

impl BrowserController {
    pub fn new(kind: BrowserKind, timeout_secs: u64) -> anyhow::Result<Self> {
        if let Some(caveat) = kind.cdp_caveat() {
            warn!("{}", caveat);
        }
        let executable = kind.executable()?;
        debug!("launching {} from {:?}", kind, executable);

        let is_docker = std::env::var("IN_DOCKER").is_ok();
        // throwaway profile, the login session only has to live for this run
        let profile_dir = create_random_tmp_folder()?;
        let options = LaunchOptions::default_builder()
            .path(Some(executable))
            .window_size(Some((1920, 1080)))
            .idle_browser_timeout(Duration::from_secs(timeout_secs))
            .user_data_dir(Some(profile_dir))
            // warning only do this if in docker env
            .sandbox(!is_docker)
            .build()
            .expect("invalid browser launch options");
        let browser = Browser::new(options).context("browser launching error")?;

        // one tab in the default context for the whole run, so the login
        // cookies stay with us across navigations
        let tab = browser.new_tab().context("could not create a tab")?;

        Ok(BrowserController {
            browser,
            tab,
            element_timeout: Duration::from_secs(timeout_secs.min(15)),
        })
    }

    pub fn kill(&self) -> bool {
        let pid = match self.browser.get_process_id() {
            Some(pid) => pid,
            None => return false,
        };
        let s = System::new();
        if let Some(process) = s.process(Pid::from_u32(pid)) {
            debug!("killing browser process with id {}", pid);
            process.kill();
            return true;
        }
        false
    }
}

// headless_chrome reports both a missing node and an expired wait as plain
// string errors, there is no variant to match on
fn is_absence(err: &anyhow::Error) -> bool {
    let msg = err.to_string();
    msg.contains("No element found") || msg.contains("never came")
}

impl PageDriver for BrowserController {
    fn navigate(&self, url: &str) -> Result<(), DriverError> {
        let nv = match self.tab.navigate_to(url) {
            Ok(t) => t,
            Err(e) => {
                warn!("could not navigate to {}, retrying: {}", url, e);
                self.tab
                    .navigate_to(url)
                    .map_err(|e| DriverError::Navigation(e.to_string()))?
            }
        };
        if let Err(e) = nv.wait_until_navigated() {
            // we wait one more timeout
            warn!("error waiting for navigation, retrying: {}", e);
            nv.wait_until_navigated()
                .map_err(|e| DriverError::Navigation(e.to_string()))?;
        }
        Ok(())
    }

    fn exists(&self, locator: &Locator) -> Result<bool, DriverError> {
        let found = match locator {
            Locator::Css(s) => self.tab.find_element(s).map(|_| ()),
            Locator::XPath(s) => self.tab.find_element_by_xpath(s).map(|_| ()),
        };
        match found {
            Ok(()) => Ok(true),
            Err(e) if is_absence(&e) => Ok(false),
            Err(e) => Err(DriverError::Backend(e.to_string())),
        }
    }

    fn count(&self, locator: &Locator) -> Result<usize, DriverError> {
        let found = match locator {
            Locator::Css(s) => self.tab.find_elements(s),
            Locator::XPath(s) => self.tab.find_elements_by_xpath(s),
        };
        match found {
            Ok(elements) => Ok(elements.len()),
            Err(e) if is_absence(&e) => Ok(0),
            Err(e) => Err(DriverError::Backend(e.to_string())),
        }
    }

    fn type_into(&self, locator: &Locator, text: &str) -> Result<(), DriverError> {
        let element = match locator {
            Locator::Css(s) => self
                .tab
                .wait_for_element_with_custom_timeout(s, self.element_timeout),
            Locator::XPath(s) => self
                .tab
                .wait_for_xpath_with_custom_timeout(s, self.element_timeout),
        };
        match element {
            Ok(element) => element
                .type_into(text)
                .map(|_| ())
                .map_err(|e| DriverError::Backend(e.to_string())),
            Err(e) if is_absence(&e) => Err(DriverError::NotFound(locator.to_string())),
            Err(e) => Err(DriverError::Backend(e.to_string())),
        }
    }

    fn click(&self, locator: &Locator) -> Result<(), DriverError> {
        let element = match locator {
            Locator::Css(s) => self
                .tab
                .wait_for_element_with_custom_timeout(s, self.element_timeout),
            Locator::XPath(s) => self
                .tab
                .wait_for_xpath_with_custom_timeout(s, self.element_timeout),
        };
        match element {
            Ok(element) => element
                .click()
                .map(|_| ())
                .map_err(|e| DriverError::Backend(e.to_string())),
            Err(e) if is_absence(&e) => Err(DriverError::NotFound(locator.to_string())),
            Err(e) => Err(DriverError::Backend(e.to_string())),
        }
    }
}

impl Drop for BrowserController {
    fn drop(&mut self) {
        debug!("killing browser process...");
        self.kill();
    }
}
