//! Command handlers. Each one drives a screen controller and prints what the
//! screen would show; failures come back as the controller's inline message.

use std::io::Write;
use std::path::Path;

use chrono::Local;
use cnc_admin::controllers::{
    AdminsController, BitForm, EditableResource, EntityController, MachineForm, NameForm,
    SettingFields, SettingsController, SpindleSettingsController, UsersController,
};
use cnc_admin::{
    AdminApi, AdminConfig, AdminError, CsvFile, HttpAdminApi, Multiplier, Navigator, PublicClient,
};
use cnc_common::{
    CsvDownload, EntityId, IssueReport, NewsletterSignup, Record, ShareSettingsRequest, Spindle,
};
use serde::Serialize;
use tracing::info;

use crate::{
    AdminsAction, EntityAction, EntityFields, PublicAction, SettingValues, SettingsAction,
    SpindleSettingsAction, UsersAction,
};

/// `Err` carries the message printed to the operator.
pub type CliResult = Result<(), String>;

/// The controller's inline message when it recorded one, else the error itself.
fn shown(error: AdminError, inline: Option<&str>) -> String {
    match inline {
        Some(message) if !error.is_cancelled() => message.to_string(),
        _ => error.to_string(),
    }
}

fn print_rows<R: Record>(rows: &[R]) {
    if rows.is_empty() {
        println!("(none)");
    }
    for row in rows {
        println!("{}\t{}", row.record_id(), row.display_name());
    }
}

fn print_json<T: Serialize>(value: &T) -> CliResult {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).map_err(|e| e.to_string())?;
    writeln!(out).map_err(|e| e.to_string())
}

/// Deletes need `--yes`; without it the prompt is shown and nothing is sent.
fn confirmed(prompt: Option<&str>, yes: bool) -> bool {
    if let Some(prompt) = prompt {
        println!("{}", prompt);
    }
    if !yes {
        println!("Nothing deleted. Re-run with --yes to confirm.");
    }
    yes
}

fn save(download: &CsvDownload, dir: &Path) -> CliResult {
    let path = download.write_to(dir).map_err(|e| e.to_string())?;
    info!("Saved {}", path.display());
    println!("{}", path.display());
    Ok(())
}

// ========== Reference collections ==========

/// Copies the flags that were given onto a form.
pub trait ApplyFields {
    fn apply(&mut self, fields: &EntityFields);
}

fn overwrite(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

impl ApplyFields for NameForm {
    fn apply(&mut self, fields: &EntityFields) {
        overwrite(&mut self.name, &fields.name);
    }
}

impl ApplyFields for MachineForm {
    fn apply(&mut self, fields: &EntityFields) {
        overwrite(&mut self.name, &fields.name);
        overwrite(&mut self.multiplier, &fields.multiplier);
    }
}

impl ApplyFields for BitForm {
    fn apply(&mut self, fields: &EntityFields) {
        overwrite(&mut self.name, &fields.name);
        overwrite(&mut self.bit_dia_for_calc, &fields.diameter);
        overwrite(&mut self.stepover_ratio, &fields.stepover_ratio);
    }
}

pub async fn entity<R>(api: HttpAdminApi, action: EntityAction) -> CliResult
where
    R: EditableResource + Serialize,
    R::Form: ApplyFields,
{
    let mut ctl = EntityController::<R, _>::new(api);
    match action {
        EntityAction::List => {
            ctl.load().await.map_err(|e| shown(e, ctl.error()))?;
            print_rows(ctl.rows());
        }
        EntityAction::View { id } => {
            ctl.view(id).await.map_err(|e| shown(e, ctl.error()))?;
            if let Some(record) = ctl.detail() {
                print_json(record)?;
            }
        }
        EntityAction::Create(fields) => {
            ctl.open_create();
            if let Some(form) = ctl.fields_mut() {
                form.apply(&fields);
            }
            ctl.submit_form().await.map_err(|e| shown(e, ctl.error()))?;
            println!("Created {}", R::LABEL);
        }
        EntityAction::Edit { id, fields } => {
            ctl.load().await.map_err(|e| shown(e, ctl.error()))?;
            ctl.open_edit(id).map_err(|e| e.to_string())?;
            if let Some(form) = ctl.fields_mut() {
                form.apply(&fields);
            }
            ctl.submit_form().await.map_err(|e| shown(e, ctl.error()))?;
            println!("Updated {} {}", R::LABEL, id);
        }
        EntityAction::Delete { id, yes } => {
            ctl.load().await.map_err(|e| shown(e, ctl.error()))?;
            ctl.request_delete(id).map_err(|e| e.to_string())?;
            if !confirmed(ctl.confirmation().map(|c| c.message.as_str()), yes) {
                ctl.cancel_delete();
                return Ok(());
            }
            ctl.confirm_delete().await.map_err(|e| shown(e, ctl.error()))?;
            println!("Deleted {} {}", R::LABEL, id);
        }
    }
    Ok(())
}

// ========== Settings ==========

impl SettingValues {
    fn apply(&self, fields: &mut SettingFields) {
        overwrite(&mut fields.rpm, &self.rpm);
        overwrite(&mut fields.feed, &self.feed);
        overwrite(&mut fields.doc, &self.doc);
        overwrite(&mut fields.stepover, &self.stepover);
        overwrite(&mut fields.plunge, &self.plunge);
        overwrite(&mut fields.warning, &self.warning);
    }
}

pub async fn settings(api: HttpAdminApi, action: SettingsAction) -> CliResult {
    let mut ctl = SettingsController::new(api);
    ctl.load().await.map_err(|e| shown(e, ctl.error()))?;

    match action {
        SettingsAction::List => print_rows(ctl.rows()),
        SettingsAction::View { id } => {
            ctl.view(id).await.map_err(|e| shown(e, ctl.error()))?;
            if let Some(setting) = ctl.detail() {
                print_json(setting)?;
            }
        }
        SettingsAction::Create { spindle, bit, material, values } => {
            ctl.open_create();
            if let Some(form) = ctl.form_mut() {
                form.selection.spindle_id = spindle;
                form.selection.bit_id = bit;
                form.selection.material_id = material;
                values.apply(&mut form.fields);
            }
            ctl.submit().await.map_err(|e| shown(e, ctl.error()))?;
            println!("Created setting");
        }
        SettingsAction::Edit { id, values } => {
            ctl.open_edit(id).map_err(|e| e.to_string())?;
            if let Some(form) = ctl.form_mut() {
                values.apply(&mut form.fields);
            }
            ctl.submit().await.map_err(|e| shown(e, ctl.error()))?;
            println!("Updated setting {}", id);
        }
        SettingsAction::Delete { id, yes } => {
            ctl.request_delete(id).map_err(|e| e.to_string())?;
            if !confirmed(ctl.confirmation().map(|c| c.message.as_str()), yes) {
                ctl.cancel_delete();
                return Ok(());
            }
            ctl.confirm_delete().await.map_err(|e| shown(e, ctl.error()))?;
            println!("Deleted setting {}", id);
        }
    }
    Ok(())
}

pub async fn spindle_settings(
    api: HttpAdminApi,
    spindle_id: EntityId,
    action: SpindleSettingsAction,
) -> CliResult {
    let spindle = api
        .get::<Spindle>(spindle_id)
        .await
        .map_err(|e| e.with_status("load spindle"))?;
    let mut nav = Navigator::new();
    let scope = nav.select_spindle(&spindle);
    let mut ctl = SpindleSettingsController::new(api, Some(scope));

    match action {
        SpindleSettingsAction::List => {
            ctl.load().await.map_err(|e| shown(e, ctl.error()))?;
            print_rows(ctl.rows());
        }
        SpindleSettingsAction::View { id } => {
            ctl.view(id).await.map_err(|e| shown(e, ctl.error()))?;
            if let Some(setting) = ctl.detail() {
                print_json(setting)?;
            }
        }
        SpindleSettingsAction::Upload { file } => {
            let file = CsvFile::from_path(&file).map_err(|e| AdminError::from(e).to_string())?;
            ctl.open_upload();
            ctl.choose_file(Some(file)).map_err(|e| e.to_string())?;
            ctl.submit_upload().await.map_err(|e| shown(e, ctl.error()))?;
            println!("Uploaded; {} settings for {}", ctl.rows().len(), spindle.name);
        }
        SpindleSettingsAction::Edit { id, values } => {
            ctl.load().await.map_err(|e| shown(e, ctl.error()))?;
            ctl.open_edit(id).map_err(|e| e.to_string())?;
            if let Some(fields) = ctl.edit_fields_mut() {
                values.apply(fields);
            }
            ctl.submit_edit().await.map_err(|e| shown(e, ctl.error()))?;
            println!("Updated setting {}", id);
        }
        SpindleSettingsAction::Delete { id, yes } => {
            ctl.load().await.map_err(|e| shown(e, ctl.error()))?;
            ctl.request_delete(id).map_err(|e| e.to_string())?;
            if !confirmed(ctl.confirmation().map(|c| c.message.as_str()), yes) {
                ctl.cancel_delete();
                return Ok(());
            }
            ctl.confirm_delete().await.map_err(|e| shown(e, ctl.error()))?;
            println!("Deleted setting {}", id);
        }
        SpindleSettingsAction::Export { out } => {
            ctl.load().await.map_err(|e| shown(e, ctl.error()))?;
            let download = ctl
                .export(Local::now().date_naive())
                .map_err(|e| shown(e, ctl.error()))?;
            save(&download, &out)?;
        }
        SpindleSettingsAction::DeleteSpindle { confirm } => {
            ctl.open_spindle_delete().map_err(|e| e.to_string())?;
            ctl.type_confirmation(confirm);
            ctl.confirm_spindle_delete(&mut nav)
                .await
                .map_err(|e| shown(e, ctl.error()))?;
            println!("Deleted spindle \"{}\" and its settings", spindle.name);
        }
    }
    Ok(())
}

// ========== Accounts ==========

pub async fn admins(config: &AdminConfig, action: AdminsAction) -> CliResult {
    let mut ctl = AdminsController::from_config(config).map_err(|e| e.to_string())?;
    ctl.load().await.map_err(|e| shown(e, ctl.error()))?;

    match action {
        AdminsAction::List => {
            for admin in ctl.rows() {
                println!("{}\t{}\t{}", admin.id, admin.name, admin.email);
            }
        }
        AdminsAction::View { id } => {
            ctl.view(id).map_err(|e| e.to_string())?;
            if let Some(admin) = ctl.detail() {
                print_json(admin)?;
            }
        }
        AdminsAction::Grant { email } => {
            ctl.set_email_input(email);
            let result = ctl.promote().await;
            let message = ctl.promote_message().unwrap_or_default().to_string();
            result.map_err(|e| shown(e, Some(&message)))?;
            println!("{}", message);
        }
        AdminsAction::Revoke { id, yes } => {
            ctl.request_revoke(id).map_err(|e| e.to_string())?;
            let prompt = ctl
                .revoke_target()
                .map(|a| format!("Remove admin access for {}?", a.email));
            if !confirmed(prompt.as_deref(), yes) {
                ctl.cancel_revoke();
                return Ok(());
            }
            ctl.confirm_revoke()
                .await
                .map_err(|e| shown(e, ctl.revoke_message()))?;
            println!("Admin access removed");
        }
    }
    Ok(())
}

pub async fn users(api: HttpAdminApi, action: UsersAction) -> CliResult {
    let mut ctl = UsersController::new(api);
    ctl.load().await.map_err(|e| shown(e, ctl.error()))?;

    match action {
        UsersAction::List => {
            for user in ctl.rows() {
                println!("{}\t{}\t{}\t{}", user.id, user.name, user.email, user.role_label());
            }
        }
        UsersAction::View { id } => {
            ctl.view(id).map_err(|e| e.to_string())?;
            if let Some(user) = ctl.detail() {
                print_json(user)?;
            }
        }
        UsersAction::Export { out } => {
            let download = ctl
                .export(Local::now().date_naive())
                .map_err(|e| e.to_string())?;
            save(&download, &out)?;
        }
    }
    Ok(())
}

// ========== Public site ==========

pub async fn public(config: &AdminConfig, action: PublicAction) -> CliResult {
    let client = PublicClient::new(config).map_err(|e| e.to_string())?;
    match action {
        PublicAction::FaqVideo => {
            let video = client
                .faq_video()
                .await
                .map_err(|e| e.with_status("fetch video data"))?;
            println!("{}", video.embed_url());
        }
        PublicAction::Subscribe { name, email } => {
            client
                .subscribe(&NewsletterSignup { name, email })
                .await
                .map_err(|e| e.inline("subscribe"))?;
            println!("Subscribed");
        }
        PublicAction::Report { email, subject, message } => {
            client
                .report_issue(&IssueReport { email, subject, message })
                .await
                .map_err(|e| e.inline("send report"))?;
            println!("Report sent");
        }
        PublicAction::Share { machine, spindle, bit, material, multiplier } => {
            let mut typed = Multiplier::default();
            typed.set_from_input(&multiplier);
            let share = ShareSettingsRequest {
                machine,
                spindle,
                bit,
                material,
                multiplier: typed.value(),
            };
            client
                .share_settings(&share)
                .await
                .map_err(|e| e.inline("share settings"))?;
            println!("Settings shared");
        }
        PublicAction::ResetPreference => {
            client
                .reset_preference()
                .await
                .map_err(|e| e.inline("reset preference"))?;
            println!("Preference reset");
        }
    }
    Ok(())
}
