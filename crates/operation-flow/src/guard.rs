use async_trait::async_trait;
use tracing::{debug, info, warn};
use waymark_core_types::PageSession;

/// Puts the page into a state the workflow knows how to start from.
#[async_trait]
pub trait PageGuard: Send + Sync {
    async fn ensure_on_known_entry_state(&self, session: &dyn PageSession) -> bool;
}

/// Accepts pages whose URL starts with a known prefix; otherwise navigates
/// to the entry URL once and checks again.
#[derive(Clone, Debug)]
pub struct UrlPageGuard {
    entry_url: String,
    known_prefixes: Vec<String>,
}

impl UrlPageGuard {
    pub fn new(entry_url: impl Into<String>) -> Self {
        let entry_url = entry_url.into();
        Self {
            known_prefixes: vec![entry_url.clone()],
            entry_url,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.known_prefixes.push(prefix.into());
        self
    }

    pub fn entry_url(&self) -> &str {
        &self.entry_url
    }

    fn is_known(&self, url: &str) -> bool {
        self.known_prefixes
            .iter()
            .any(|prefix| url.starts_with(prefix.as_str()))
    }
}

#[async_trait]
impl PageGuard for UrlPageGuard {
    async fn ensure_on_known_entry_state(&self, session: &dyn PageSession) -> bool {
        match session.current_url().await {
            Ok(url) if self.is_known(&url) => return true,
            Ok(_) => debug!("page outside known entry state"),
            Err(err) => {
                warn!(%err, "current url unavailable");
                return false;
            }
        }

        if let Err(err) = session.navigate(&self.entry_url).await {
            warn!(%err, "navigation to entry url failed");
            return false;
        }
        match session.current_url().await {
            Ok(url) if self.is_known(&url) => {
                info!("navigated to entry state");
                true
            }
            Ok(_) => {
                warn!("entry navigation landed on an unknown page");
                false
            }
            Err(err) => {
                warn!(%err, "current url unavailable after navigation");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waymark_core_types::testing::{FakeSession, SessionCall};

    #[tokio::test]
    async fn known_page_needs_no_navigation() {
        let session = FakeSession::new();
        session.configure(|s| s.url = "https://site.test/explore?tab=1".into());
        let guard = UrlPageGuard::new("https://site.test/explore");
        assert!(guard.ensure_on_known_entry_state(&session).await);
        assert!(session.calls().is_empty());
    }

    #[tokio::test]
    async fn navigates_once_then_rechecks() {
        let session = FakeSession::new();
        let guard = UrlPageGuard::new("https://site.test/explore");
        assert!(guard.ensure_on_known_entry_state(&session).await);
        assert_eq!(
            session.calls(),
            vec![SessionCall::Navigate("https://site.test/explore".into())]
        );
    }

    #[tokio::test]
    async fn redirect_to_login_is_not_ready() {
        let session = FakeSession::new();
        session.configure(|s| s.navigate_lands_on = Some("https://site.test/login".into()));
        let guard = UrlPageGuard::new("https://site.test/explore");
        assert!(!guard.ensure_on_known_entry_state(&session).await);
    }
}
