/// Connection settings for the OnlyCNCs APIs.
///
/// ```rust,ignore
/// let config = AdminConfig::from_env();
/// if let Err(e) = config.validate() {
///     eprintln!("Configuration error: {}", e);
///     return;
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminConfig {
    /// Base URL of the admin API (`/admin/...`, `/api/...`).
    pub admin_base_url: Option<String>,
    /// Base URL of the public site API (`/newsletter`, `/report`, `/cnc/...`).
    pub public_base_url: Option<String>,
    /// Token forwarded in the `Authorization` header.
    pub auth_token: Option<String>,
}

pub const ADMIN_BASE_URL_VAR: &str = "ONLYCNCS_BASE_URL_ADMIN";
pub const PUBLIC_BASE_URL_VAR: &str = "ONLYCNCS_BASE_URL";
pub const AUTHORIZATION_VAR: &str = "ONLYCNCS_AUTHORIZATION";

impl AdminConfig {
    pub fn new(admin_base_url: impl Into<String>) -> Self {
        Self {
            admin_base_url: normalize_url(Some(admin_base_url.into())),
            ..Default::default()
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            admin_base_url: normalize_url(lookup(ADMIN_BASE_URL_VAR)),
            public_base_url: normalize_url(lookup(PUBLIC_BASE_URL_VAR)),
            auth_token: lookup(AUTHORIZATION_VAR).filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn with_admin_base_url(mut self, url: impl Into<String>) -> Self {
        self.admin_base_url = normalize_url(Some(url.into()));
        self
    }

    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = normalize_url(Some(url.into()));
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = if token.trim().is_empty() { None } else { Some(token) };
        self
    }

    /// Both base URLs must be present.
    pub fn validate(&self) -> Result<(), String> {
        if self.admin_base_url.is_none() {
            return Err("Missing admin base URL in configuration".to_string());
        }
        if self.public_base_url.is_none() {
            return Err("Missing base URL in configuration".to_string());
        }
        Ok(())
    }
}

fn normalize_url(url: Option<String>) -> Option<String> {
    url.map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
}
