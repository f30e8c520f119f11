//! Settings of one spindle: CSV upload and export, single-row edit and
//! delete, and the cascading delete of the spindle itself.
//!
//! The spindle comes in as an explicit `SpindleScope`. Without one the
//! screen shows an error and never falls back to unscoped data.

use chrono::NaiveDate;
use cnc_common::{settings_export, sort_newest_first, CsvDownload, EntityId, Setting};
use tracing::{info, warn};

use super::{refuse, settle, ConfirmDialog, FormDialog, FormMode, NameConfirmation, SettingFields};
use crate::upload;
use crate::{AdminApi, AdminError, AdminResult, CsvFile, Navigator, SpindleScope, ValidationError, ViewScope};

/// The one form dialog this screen can have open.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsDialog {
    /// Pending CSV file, if one was accepted.
    Upload(FormDialog<Option<CsvFile>>),
    Edit(FormDialog<SettingFields>),
}

pub struct SpindleSettingsController<A: AdminApi> {
    api: A,
    scope: ViewScope,
    spindle: Option<SpindleScope>,
    rows: Vec<Setting>,
    detail: Option<Setting>,
    dialog: Option<SettingsDialog>,
    confirm: Option<ConfirmDialog>,
    spindle_delete: Option<NameConfirmation>,
    error: Option<String>,
}

impl<A: AdminApi> SpindleSettingsController<A> {
    pub fn new(api: A, spindle: Option<SpindleScope>) -> Self {
        Self {
            api,
            scope: ViewScope::new(),
            spindle,
            rows: Vec::new(),
            detail: None,
            dialog: None,
            confirm: None,
            spindle_delete: None,
            error: None,
        }
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub fn spindle(&self) -> Option<&SpindleScope> {
        self.spindle.as_ref()
    }

    /// Settings of the scoped spindle, newest first.
    pub fn rows(&self) -> &[Setting] {
        &self.rows
    }

    pub fn detail(&self) -> Option<&Setting> {
        self.detail.as_ref()
    }

    pub fn dialog(&self) -> Option<&SettingsDialog> {
        self.dialog.as_ref()
    }

    pub fn confirmation(&self) -> Option<&ConfirmDialog> {
        self.confirm.as_ref()
    }

    pub fn spindle_delete(&self) -> Option<&NameConfirmation> {
        self.spindle_delete.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn refuse(&mut self, err: ValidationError) -> AdminError {
        refuse(&mut self.error, err)
    }

    fn spindle_id(&mut self) -> AdminResult<EntityId> {
        match self.spindle.as_ref() {
            Some(scope) => Ok(scope.id),
            None => Err(self.refuse(ValidationError::NoSpindleSelected)),
        }
    }

    pub async fn load(&mut self) -> AdminResult<()> {
        let spindle_id = self.spindle_id()?;
        let result = self.scope.run(self.api.settings_for_spindle(spindle_id)).await;
        let rows = settle(&mut self.error, result, |e| e.with_status("load settings"))?;

        let mut rows: Vec<Setting> = rows.into_iter().filter(|s| s.spindle_id == spindle_id).collect();
        sort_newest_first(&mut rows);
        self.rows = rows;
        self.error = None;
        Ok(())
    }

    pub async fn view(&mut self, id: EntityId) -> AdminResult<()> {
        let result = self.scope.run(self.api.get::<Setting>(id)).await;
        self.detail = Some(settle(&mut self.error, result, |e| e.with_status("load setting"))?);
        Ok(())
    }

    pub fn close_view(&mut self) {
        self.detail = None;
    }

    // ========== Upload ==========

    pub fn open_upload(&mut self) {
        self.dialog = Some(SettingsDialog::Upload(FormDialog::new(FormMode::Create, None)));
    }

    fn upload_dialog(&mut self) -> AdminResult<&mut FormDialog<Option<CsvFile>>> {
        match self.dialog.as_mut() {
            Some(SettingsDialog::Upload(dialog)) => Ok(dialog),
            _ => Err(ValidationError::DialogClosed.into()),
        }
    }

    fn accept_file(&mut self, picked: Result<CsvFile, ValidationError>) -> AdminResult<()> {
        self.upload_dialog()?;
        match picked {
            Ok(file) => {
                self.upload_dialog()?.fields = Some(file);
                Ok(())
            }
            Err(e) => Err(self.refuse(e)),
        }
    }

    /// File picker input.
    pub fn choose_file(&mut self, file: Option<CsvFile>) -> AdminResult<()> {
        self.accept_file(upload::pick(file))
    }

    /// Drag and drop onto the upload area.
    pub fn drop_files(&mut self, files: Vec<CsvFile>) -> AdminResult<()> {
        self.accept_file(upload::first_acceptable(files))
    }

    pub fn remove_file(&mut self) -> AdminResult<()> {
        self.upload_dialog()?.fields = None;
        Ok(())
    }

    pub fn pending_file(&self) -> Option<&CsvFile> {
        match &self.dialog {
            Some(SettingsDialog::Upload(dialog)) => dialog.fields.as_ref(),
            _ => None,
        }
    }

    /// Send the pending file for the scoped spindle, then re-fetch.
    pub async fn submit_upload(&mut self) -> AdminResult<()> {
        let file = match self.upload_dialog()?.fields.clone() {
            Some(file) => file,
            None => return Err(self.refuse(ValidationError::NoFileSelected)),
        };
        let spindle_id = self.spindle_id()?;
        self.upload_dialog()?.begin_submit()?;

        let result = self
            .scope
            .run(self.api.upload_settings_csv(spindle_id, &file))
            .await;
        if let Err(e) = settle(&mut self.error, result, |e| e.inline("upload CSV")) {
            if !e.is_cancelled() {
                let message = self.error.clone().unwrap_or_default();
                self.upload_dialog()?.fail(message);
            }
            return Err(e);
        }

        info!("Uploaded {} for spindle {}", file.name, spindle_id);
        self.dialog = None;
        self.load().await
    }

    // ========== Edit ==========

    pub fn open_edit(&mut self, id: EntityId) -> AdminResult<()> {
        let fields = match self.rows.iter().find(|s| s.setting_id == id) {
            Some(row) => SettingFields::from_setting(row),
            None => return Err(self.refuse(ValidationError::NothingSelected("setting"))),
        };
        self.dialog = Some(SettingsDialog::Edit(FormDialog::new(FormMode::Edit(id), fields)));
        Ok(())
    }

    pub fn edit_fields_mut(&mut self) -> Option<&mut SettingFields> {
        match self.dialog.as_mut() {
            Some(SettingsDialog::Edit(dialog)) => Some(&mut dialog.fields),
            _ => None,
        }
    }

    /// PUT the full record. Spindle, bit and material come from the original row.
    pub async fn submit_edit(&mut self) -> AdminResult<()> {
        let (id, fields) = match self.dialog.as_ref() {
            Some(SettingsDialog::Edit(FormDialog { mode: FormMode::Edit(id), fields, .. })) => {
                (*id, fields.clone())
            }
            _ => return Err(ValidationError::DialogClosed.into()),
        };
        let original = match self.rows.iter().find(|s| s.setting_id == id) {
            Some(row) => (row.spindle_id, row.bit_id, row.material_id),
            None => return Err(self.refuse(ValidationError::NothingSelected("setting"))),
        };
        let payload = match fields.to_payload(original.0, original.1, original.2) {
            Ok(payload) => payload,
            Err(e) => return Err(self.refuse(e)),
        };
        if let Some(SettingsDialog::Edit(dialog)) = self.dialog.as_mut() {
            dialog.begin_submit()?;
        }

        let result = self.scope.run(self.api.update::<Setting>(id, &payload)).await;
        if let Err(e) = settle(&mut self.error, result, |e| e.brief("update setting")) {
            if !e.is_cancelled() {
                if let Some(SettingsDialog::Edit(dialog)) = self.dialog.as_mut() {
                    dialog.fail(self.error.clone().unwrap_or_default());
                }
            }
            return Err(e);
        }

        info!("Updated setting {}", id);
        self.dialog = None;
        self.load().await
    }

    pub fn cancel_dialog(&mut self) {
        self.dialog = None;
    }

    // ========== Delete one ==========

    pub fn request_delete(&mut self, id: EntityId) -> AdminResult<()> {
        let dialog = match self.rows.iter().find(|s| s.setting_id == id) {
            Some(row) => ConfirmDialog::new("setting", row),
            None => return Err(self.refuse(ValidationError::NothingSelected("setting"))),
        };
        self.confirm = Some(dialog);
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        self.confirm = None;
    }

    pub async fn confirm_delete(&mut self) -> AdminResult<()> {
        let target = self
            .confirm
            .as_ref()
            .map(|c| c.target)
            .ok_or(ValidationError::DialogClosed)?;
        let result = self.scope.run(self.api.delete::<Setting>(target)).await;
        settle(&mut self.error, result, |e| e.brief("delete setting"))?;

        info!("Deleted setting {}", target);
        self.confirm = None;
        self.load().await
    }

    // ========== Delete spindle (cascade) ==========

    pub fn open_spindle_delete(&mut self) -> AdminResult<()> {
        let name = match self.spindle.as_ref() {
            Some(scope) => scope.name.clone(),
            None => return Err(self.refuse(ValidationError::NoSpindleSelected)),
        };
        self.spindle_delete = Some(NameConfirmation::new(name));
        Ok(())
    }

    pub fn type_confirmation(&mut self, text: impl Into<String>) {
        if let Some(confirm) = self.spindle_delete.as_mut() {
            confirm.type_text(text);
        }
    }

    /// Enabled only when the typed text equals the spindle name exactly.
    pub fn can_delete_spindle(&self) -> bool {
        self.spindle_delete
            .as_ref()
            .map(|c| c.matches() && !c.submitting)
            .unwrap_or(false)
    }

    pub fn cancel_spindle_delete(&mut self) {
        self.spindle_delete = None;
    }

    /// Delete the spindle and all its settings. On success the spindle is
    /// forgotten and `nav` returns to the spindle list.
    pub async fn confirm_spindle_delete(&mut self, nav: &mut Navigator) -> AdminResult<()> {
        let matches = match self.spindle_delete.as_ref() {
            Some(confirm) => confirm.matches(),
            None => return Err(ValidationError::DialogClosed.into()),
        };
        if !matches {
            return Err(self.refuse(ValidationError::ConfirmationMismatch));
        }
        let spindle_id = self.spindle_id()?;
        if let Some(confirm) = self.spindle_delete.as_mut() {
            if confirm.submitting {
                return Err(ValidationError::Busy.into());
            }
            confirm.submitting = true;
        }

        let result = self.scope.run(self.api.delete_spindle_settings(spindle_id)).await;
        let outcome = settle(&mut self.error, result, |e| e.inline("delete spindle"));
        if let Some(confirm) = self.spindle_delete.as_mut() {
            confirm.submitting = false;
        }
        outcome?;

        info!("Deleted spindle {} with all its settings", spindle_id);
        self.spindle_delete = None;
        self.spindle = None;
        self.rows.clear();
        nav.spindle_deleted();
        Ok(())
    }

    // ========== Export ==========

    /// CSV of the rows currently loaded; nothing is re-fetched.
    pub fn export(&mut self, date: NaiveDate) -> AdminResult<CsvDownload> {
        let name = self.spindle.as_ref().map(|s| s.name.as_str());
        match settings_export(&self.rows, name, date) {
            Ok(file) => Ok(file),
            Err(e) => {
                warn!("{}", e);
                self.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }
}
