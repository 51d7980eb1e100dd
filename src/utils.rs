use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use regex::Regex;
use url::Url;

pub const LOGIN_URL: &str = "https://archive.org/account/login";
pub const SAVE_URL: &str = "https://web.archive.org/save";

lazy_static! {
    // good enough for a sanity check before we hand the address to the login form
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// A candidate is submittable only if it parses as an absolute http(s) URL.
pub fn parse_candidate_url(raw: &str) -> Option<Url> {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        _ => None,
    }
}

/// Gathers the URLs to submit. Command-line candidates that do not parse are
/// dropped with a warning; the urls-file is the legacy path and stays strict,
/// any invalid line in it aborts the run.
pub fn collect_urls(candidates: &[String], urls_file: Option<&Path>) -> anyhow::Result<Vec<Url>> {
    let mut urls = vec![];

    for candidate in candidates {
        match parse_candidate_url(candidate) {
            Some(url) => urls.push(url),
            None => {
                warn!("skipping {:?}, not an absolute http(s) url", candidate);
            }
        }
    }

    if let Some(path) = urls_file {
        urls.extend(load_urls_file(path)?);
    }

    Ok(urls)
}

pub fn load_urls_file(path: &Path) -> anyhow::Result<Vec<Url>> {
    let content = fs::read_to_string(path)
        .context(format!("could not read urls file at {:?}", path))?;

    let mut urls = vec![];
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_candidate_url(line) {
            Some(url) => urls.push(url),
            None => {
                return Err(anyhow!(
                    "invalid url {:?} on line {} of {:?}",
                    line,
                    idx + 1,
                    path
                ))
            }
        }
    }
    Ok(urls)
}

pub fn get_random_string(len: i32) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len as usize)
        .map(char::from)
        .collect()
}

pub fn create_random_tmp_folder() -> anyhow::Result<PathBuf> {
    let rand_folder_name: String = get_random_string(11);

    let path = std::env::temp_dir().join(format!("wayback-saver-{}", rand_folder_name));
    fs::create_dir(&path)?;
    Ok(path)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accepts_absolute_http_urls_only() {
        assert!(parse_candidate_url("https://example.com/page").is_some());
        assert!(parse_candidate_url("http://example.com").is_some());
        assert!(parse_candidate_url("ftp://example.com").is_none());
        assert!(parse_candidate_url("example.com/page").is_none());
        assert!(parse_candidate_url("/relative/path").is_none());
        assert!(parse_candidate_url("not a url").is_none());
    }

    #[test]
    fn cli_candidates_are_filtered_not_fatal() {
        let candidates = vec![
            "https://example.com".to_string(),
            "nonsense".to_string(),
            "http://example.org/a".to_string(),
        ];
        let urls = collect_urls(&candidates, None).unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].as_str(), "https://example.com/");
        assert_eq!(urls[1].as_str(), "http://example.org/a");
    }

    #[test]
    fn urls_file_is_strict() {
        let dir = create_random_tmp_folder().unwrap();
        let path = dir.join("urls.txt");

        fs::write(&path, "https://example.com\n\nhttp://example.org\n").unwrap();
        let urls = load_urls_file(&path).unwrap();
        assert_eq!(urls.len(), 2);

        fs::write(&path, "https://example.com\nnot-a-url\n").unwrap();
        let err = load_urls_file(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("us er@example.com"));
    }

    #[test]
    fn creates_a_random_folder() {
        let p = create_random_tmp_folder().unwrap();
        assert!(p.exists());
        fs::remove_dir(p).unwrap();
    }
}
