//! Registered users: read-only list, detail and CSV export.

use chrono::NaiveDate;
use cnc_common::{sort_newest_first, users_export, CsvDownload, EntityId, User};

use super::settle;
use crate::{AdminApi, AdminResult, ValidationError, ViewScope};

pub struct UsersController<A: AdminApi> {
    api: A,
    scope: ViewScope,
    rows: Vec<User>,
    detail: Option<User>,
    error: Option<String>,
}

impl<A: AdminApi> UsersController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            scope: ViewScope::new(),
            rows: Vec::new(),
            detail: None,
            error: None,
        }
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub fn rows(&self) -> &[User] {
        &self.rows
    }

    pub fn detail(&self) -> Option<&User> {
        self.detail.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn load(&mut self) -> AdminResult<()> {
        let result = self.scope.run(self.api.list_users()).await;
        let mut rows = settle(&mut self.error, result, |e| e.with_status("load users"))?;
        sort_newest_first(&mut rows);
        self.rows = rows;
        self.error = None;
        Ok(())
    }

    pub fn view(&mut self, id: EntityId) -> AdminResult<()> {
        let user = self
            .rows
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(ValidationError::NothingSelected("user"))?;
        self.detail = Some(user);
        Ok(())
    }

    pub fn close_view(&mut self) {
        self.detail = None;
    }

    /// `users_<date>.csv` of the loaded rows.
    pub fn export(&self, date: NaiveDate) -> AdminResult<CsvDownload> {
        Ok(users_export(&self.rows, date)?)
    }
}
