use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{types::SaverError, utils::is_valid_email};

/// Archive.org login pair. Lives for the duration of the run only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Reads credentials from `path`. The file is either a JSON object
    /// `{"email": ..., "password": ...}` or the legacy two-line form with the
    /// email on line 1 and the password on line 2.
    pub fn from_file(path: &Path) -> Result<Self, SaverError> {
        let raw = fs::read_to_string(path).map_err(|source| SaverError::CredentialsFile {
            path: path.into(),
            source,
        })?;

        let creds = match serde_json::from_str::<Credentials>(&raw) {
            Ok(creds) => creds,
            Err(_) => Self::from_two_lines(&raw)?,
        };
        creds.validate()?;
        Ok(creds)
    }

    fn from_two_lines(raw: &str) -> Result<Self, SaverError> {
        let mut lines = raw.lines().map(str::trim).filter(|l| !l.is_empty());
        let email = lines.next().ok_or(SaverError::CredentialsFormat)?;
        let password = lines.next().ok_or(SaverError::CredentialsFormat)?;
        Ok(Credentials {
            email: email.into(),
            password: password.into(),
        })
    }

    fn validate(&self) -> Result<(), SaverError> {
        if self.email.is_empty() {
            return Err(SaverError::CredentialsIncomplete("email is empty"));
        }
        if self.password.is_empty() {
            return Err(SaverError::CredentialsIncomplete("password is empty"));
        }
        if !is_valid_email(&self.email) {
            return Err(SaverError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}
