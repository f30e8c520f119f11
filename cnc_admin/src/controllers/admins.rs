//! Admin accounts: list, grant by email, revoke by email.

use cnc_common::{sort_newest_first, AdminUser, EntityId, RemoveAdminRequest, SetAdminRequest};
use tracing::info;

use super::{refuse, settle};
use crate::{AdminApi, AdminConfig, AdminError, AdminResult, HttpAdminApi, ValidationError, ViewScope};

pub const PROMOTED_MESSAGE: &str = "Success! User is now an admin.";

pub struct AdminsController<A: AdminApi> {
    api: A,
    scope: ViewScope,
    rows: Vec<AdminUser>,
    detail: Option<AdminUser>,
    email_input: String,
    /// Outcome of the last grant, success or failure.
    promote_message: Option<String>,
    promoting: bool,
    revoke_target: Option<AdminUser>,
    revoke_message: Option<String>,
    error: Option<String>,
}

impl AdminsController<HttpAdminApi> {
    /// Build from configuration. A missing admin base URL is terminal for
    /// this screen: the error is returned and nothing is fetched.
    pub fn from_config(config: &AdminConfig) -> AdminResult<Self> {
        HttpAdminApi::new(config).map(Self::new)
    }
}

impl<A: AdminApi> AdminsController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            scope: ViewScope::new(),
            rows: Vec::new(),
            detail: None,
            email_input: String::new(),
            promote_message: None,
            promoting: false,
            revoke_target: None,
            revoke_message: None,
            error: None,
        }
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub fn rows(&self) -> &[AdminUser] {
        &self.rows
    }

    pub fn detail(&self) -> Option<&AdminUser> {
        self.detail.as_ref()
    }

    pub fn email_input(&self) -> &str {
        &self.email_input
    }

    pub fn set_email_input(&mut self, email: impl Into<String>) {
        self.email_input = email.into();
    }

    pub fn promote_message(&self) -> Option<&str> {
        self.promote_message.as_deref()
    }

    pub fn revoke_target(&self) -> Option<&AdminUser> {
        self.revoke_target.as_ref()
    }

    pub fn revoke_message(&self) -> Option<&str> {
        self.revoke_message.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn load(&mut self) -> AdminResult<()> {
        let result = self.scope.run(self.api.list_admins()).await;
        let mut rows = settle(&mut self.error, result, |e| e.with_status("load admins"))?;
        sort_newest_first(&mut rows);
        self.rows = rows;
        self.error = None;
        Ok(())
    }

    /// Admin rows carry everything the detail view shows; no fetch.
    pub fn view(&mut self, id: EntityId) -> AdminResult<()> {
        match self.rows.iter().find(|a| a.id == id) {
            Some(admin) => {
                self.detail = Some(admin.clone());
                Ok(())
            }
            None => Err(refuse(&mut self.error, ValidationError::AdminNotFound)),
        }
    }

    pub fn close_view(&mut self) {
        self.detail = None;
    }

    /// Grant the admin role to the email in the input box.
    pub async fn promote(&mut self) -> AdminResult<()> {
        let email = self.email_input.trim().to_string();
        if email.is_empty() {
            return Err(refuse(&mut self.promote_message, ValidationError::EmptyEmail));
        }
        if self.promoting {
            return Err(ValidationError::Busy.into());
        }

        self.promoting = true;
        self.promote_message = None;
        let request = SetAdminRequest { email, is_admin: true };
        let result = self.scope.run(self.api.set_admin(&request)).await;
        if !matches!(result, Err(AdminError::Cancelled)) {
            self.promoting = false;
        }
        settle(&mut self.promote_message, result, |e| {
            e.server_message_or("Failed to update admin status")
        })?;

        info!("Granted admin role to {}", request.email);
        self.promote_message = Some(PROMOTED_MESSAGE.to_string());
        self.email_input.clear();
        self.load().await
    }

    pub fn request_revoke(&mut self, id: EntityId) -> AdminResult<()> {
        match self.rows.iter().find(|a| a.id == id) {
            Some(admin) => {
                self.revoke_target = Some(admin.clone());
                self.revoke_message = None;
                Ok(())
            }
            None => Err(refuse(&mut self.error, ValidationError::AdminNotFound)),
        }
    }

    pub fn cancel_revoke(&mut self) {
        self.revoke_target = None;
    }

    /// Revoke by email, so a stale row id cannot hit the wrong account.
    pub async fn confirm_revoke(&mut self) -> AdminResult<()> {
        let email = self
            .revoke_target
            .as_ref()
            .map(|a| a.email.clone())
            .ok_or(ValidationError::DialogClosed)?;
        let request = RemoveAdminRequest { email };
        let result = self.scope.run(self.api.remove_admin(&request)).await;
        settle(&mut self.revoke_message, result, |e| {
            e.server_message_or("Failed to remove admin access")
        })?;

        info!("Revoked admin role from {}", request.email);
        self.revoke_target = None;
        self.load().await
    }
}
