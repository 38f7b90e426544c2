//! Site-specific collaborators: login, index acquisition and selectors.

pub mod index;
pub mod login;
pub mod selectors;

use url::Url;

use crate::error::HarvestResult;

/// Build an absolute URL from the site root and a relative path.
///
/// The root is treated as a directory even without a trailing slash, so
/// `https://host/app` + `user/login` gives `https://host/app/user/login`.
pub fn site_url(root: &Url, path: &str) -> HarvestResult<String> {
    let mut base = root.clone();
    if !base.path().ends_with('/') {
        let directory = format!("{}/", base.path());
        base.set_path(&directory);
    }
    Ok(base.join(path.trim_start_matches('/'))?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_url_joins_under_root() {
        let root = Url::parse("https://example.com").unwrap();
        assert_eq!(
            site_url(&root, "user/login").unwrap(),
            "https://example.com/user/login"
        );
    }

    #[test]
    fn test_site_url_keeps_root_path() {
        let root = Url::parse("https://example.com/app").unwrap();
        assert_eq!(
            site_url(&root, "/zone/events/past_all").unwrap(),
            "https://example.com/app/zone/events/past_all"
        );
    }
}
