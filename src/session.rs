use std::time::Duration;

use anyhow::Context;
use tokio::time::sleep;

use crate::{
    browser_controller::{Locator, PageDriver},
    credentials::Credentials,
    types::SaverError,
    utils::LOGIN_URL,
};

const USERNAME_FIELD: Locator = Locator::Css(r#"input[name="username"]"#);
const PASSWORD_FIELD: Locator = Locator::Css(r#"input[name="password"]"#);
const LOGIN_BUTTON: Locator = Locator::Css(r#"input[name="submit-to-login"]"#);
const LOGIN_ERROR: Locator = Locator::Css(".js-login-error");

const LOGIN_SETTLE: Duration = Duration::from_secs(3);

/// Logs into the archive with the supplied credentials. A visible login-error
/// indicator after submission aborts the run; not being able to probe for the
/// indicator does not, the check is best effort.
pub async fn login<D: PageDriver>(driver: &D, credentials: &Credentials) -> anyhow::Result<()> {
    login_with_settle(driver, credentials, LOGIN_SETTLE).await
}

async fn login_with_settle<D: PageDriver>(
    driver: &D,
    credentials: &Credentials,
    settle: Duration,
) -> anyhow::Result<()> {
    info!("logging in as {}", credentials.email());

    driver
        .navigate(LOGIN_URL)
        .context("could not load the login page")?;
    driver
        .type_into(&USERNAME_FIELD, credentials.email())
        .context("could not fill the username field")?;
    driver
        .type_into(&PASSWORD_FIELD, credentials.password())
        .context("could not fill the password field")?;
    driver
        .click(&LOGIN_BUTTON)
        .context("could not submit the login form")?;

    sleep(settle).await;

    match driver.exists(&LOGIN_ERROR) {
        Ok(true) => Err(SaverError::LoginRejected.into()),
        Ok(false) => Ok(()),
        Err(e) => {
            debug!("could not probe for the login error indicator: {}", e);
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::browser_controller::fake::FakeDriver;
    use crate::credentials::Credentials;

    macro_rules! aw {
        ($e:expr) => {
            tokio_test::block_on($e)
        };
    }

    fn creds() -> Credentials {
        serde_json::from_str(r#"{ "email": "user@example.com", "password": "hunter2" }"#).unwrap()
    }

    #[test]
    fn fills_the_form_and_accepts_a_clean_page() {
        let driver = FakeDriver::default();
        aw!(login_with_settle(&driver, &creds(), Duration::ZERO)).unwrap();

        assert_eq!(driver.navigated.borrow().as_slice(), [LOGIN_URL]);
        let typed = driver.typed.borrow();
        assert_eq!(
            typed.as_slice(),
            [
                (USERNAME_FIELD.to_string(), "user@example.com".to_string()),
                (PASSWORD_FIELD.to_string(), "hunter2".to_string()),
            ]
        );
        assert_eq!(driver.clicked.borrow().as_slice(), [LOGIN_BUTTON.to_string()]);
    }

    #[test]
    fn visible_error_indicator_rejects_the_login() {
        let driver = FakeDriver::with_present(&[&LOGIN_ERROR]);
        let err = aw!(login_with_settle(&driver, &creds(), Duration::ZERO)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SaverError>(),
            Some(SaverError::LoginRejected)
        ));
    }

    #[test]
    fn unprobeable_error_indicator_is_not_fatal() {
        let driver = FakeDriver {
            broken_locator: Some(LOGIN_ERROR.to_string()),
            ..FakeDriver::default()
        };
        aw!(login_with_settle(&driver, &creds(), Duration::ZERO)).unwrap();
    }
}
