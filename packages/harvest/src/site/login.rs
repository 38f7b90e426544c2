//! Session login and cookie-banner dismissal.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;
use tracing::info;
use url::Url;

use crate::error::HarvestResult;
use crate::pipeline::navigator::Navigator;
use crate::site::selectors::{BUTTONS, LOGIN_EMAIL, LOGIN_PASSWORD, LOGIN_SUBMIT};
use crate::site::site_url;
use crate::traits::page::{query_required, PageClient};
use crate::traits::progress::ProgressSink;

const LOGIN_PATH: &str = "user/login";
const CONSENT_TEXT: &str = "i agree";
const LOGIN_STEPS: usize = 5;

/// Account used to sign in.
///
/// The password stays in a `SecretBox` and is only exposed when typed into
/// the login form.
pub struct Credentials {
    pub email: String,
    password: SecretBox<str>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretBox::new(Box::from(password.into().as_str())),
        }
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self::new(self.email.clone(), self.password.expose_secret())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Sign in on `page` and accept the cookie banner.
///
/// The banner intercepts clicks, so every button reading "I agree" is
/// clicked before any extraction starts.
pub async fn login<P: PageClient + ?Sized>(
    page: &P,
    navigator: &Navigator,
    root: &Url,
    credentials: &Credentials,
    progress: &dyn ProgressSink,
) -> HarvestResult<()> {
    let step = |done: usize, status: &str| progress.update(0, done, LOGIN_STEPS, status);

    step(0, "Acquiring login");
    navigator.goto(page, &site_url(root, LOGIN_PATH)?).await;
    step(1, "Login page loaded");

    let email = query_required(page, None, LOGIN_EMAIL, "login form").await?;
    page.type_text(email, &credentials.email).await?;
    step(2, "Email entered");

    let password = query_required(page, None, LOGIN_PASSWORD, "login form").await?;
    page.type_text(password, credentials.password.expose_secret())
        .await?;
    step(3, "Password entered");

    let submit = query_required(page, None, LOGIN_SUBMIT, "login form").await?;
    page.click(submit).await?;
    step(4, "Signing in");
    page.wait_for_navigation().await?;
    step(5, "Signed in");

    for button in page.query_all(None, BUTTONS).await? {
        let text = page.text(button).await?.unwrap_or_default();
        if text.to_lowercase().contains(CONSENT_TEXT) {
            page.click(button).await?;
            progress.message("Cookies accepted!");
        }
    }

    info!(user = %credentials.email, "logged in");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvestError;
    use crate::testing::{FakeCall, FakeNode, FakeSite};
    use crate::traits::page::ElementHandle;
    use crate::traits::progress::NullProgress;

    const LOGIN_URL: &str = "https://example.com/user/login";

    fn login_form(site: &FakeSite) -> [ElementHandle; 3] {
        let email = site.add(FakeNode::new("input"));
        let password = site.add(FakeNode::new("input"));
        let submit = site.add(FakeNode::new("button").with_text("Sign in"));
        site.document(LOGIN_URL, LOGIN_EMAIL, [email]);
        site.document(LOGIN_URL, LOGIN_PASSWORD, [password]);
        site.document(LOGIN_URL, LOGIN_SUBMIT, [submit]);
        [email, password, submit]
    }

    #[tokio::test]
    async fn test_login_types_credentials_and_accepts_cookies() {
        let site = FakeSite::new();
        let [email, password, submit] = login_form(&site);
        let agree = site.add(FakeNode::new("button").with_text("I AGREE to cookies"));
        let other = site.add(FakeNode::new("button").with_text("Settings"));
        site.document(LOGIN_URL, BUTTONS, [submit, agree, other]);
        let page = site.session();

        let root = Url::parse("https://example.com/").unwrap();
        let credentials = Credentials::new("me@example.com", "hunter2");
        login(&page, &Navigator::default(), &root, &credentials, &NullProgress)
            .await
            .unwrap();

        let calls = page.calls();
        assert!(calls.contains(&FakeCall::Type {
            element: email,
            text: "me@example.com".to_string()
        }));
        assert!(calls.contains(&FakeCall::Type {
            element: password,
            text: "hunter2".to_string()
        }));
        assert!(calls.contains(&FakeCall::WaitForNavigation));
        assert_eq!(page.clicked(), vec![submit, agree]);
    }

    #[tokio::test]
    async fn test_missing_form_field_is_fatal() {
        let site = FakeSite::new();
        let page = site.session();

        let root = Url::parse("https://example.com/").unwrap();
        let err = login(
            &page,
            &Navigator::default(),
            &root,
            &Credentials::new("me@example.com", "pw"),
            &NullProgress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, HarvestError::SelectorMiss { ref selector, .. } if selector == LOGIN_EMAIL));
    }

    #[test]
    fn test_password_is_not_debug_printed() {
        let credentials = Credentials::new("me@example.com", "hunter2");
        let debug = format!("{:?}", credentials.clone());
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("me@example.com"));
    }
}
