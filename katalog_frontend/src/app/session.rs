use crate::config::FrontendConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub username: String,
}

/// The signed-in viewer, if any. Sign-in itself belongs to the auth
/// provider; the client only needs to know who is looking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    viewer: Option<Viewer>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(username: impl Into<String>) -> Self {
        Self {
            viewer: Some(Viewer {
                username: username.into(),
            }),
        }
    }

    pub fn from_config(config: &FrontendConfig) -> Self {
        match &config.username {
            Some(username) => Self::signed_in(username.clone()),
            None => Self::anonymous(),
        }
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.viewer.is_some()
    }

    pub fn is_viewer(&self, username: &str) -> bool {
        self.viewer
            .as_ref()
            .map(|v| v.username.eq_ignore_ascii_case(username))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_match_ignores_case() {
        let session = Session::signed_in("Mert");
        assert!(session.is_authenticated());
        assert!(session.is_viewer("mert"));
        assert!(!session.is_viewer("ayse"));
        assert!(!Session::anonymous().is_viewer("mert"));
    }
}
