/// Integration tests for the per-spindle settings screen, driven against the
/// in-process admin API simulator.
///
/// The tests verify:
/// 1. Scoped loading, ordering and defensive decoding
/// 2. CSV upload validation, success and failure
/// 3. Single-row edit and delete
/// 4. The typed-name guard on the spindle cascade delete
/// 5. Client-side export and per-view cancellation

use chrono::NaiveDate;
use cnc_admin::controllers::{FormPhase, SettingsDialog, SpindleSettingsController};
use cnc_admin::{AdminConfig, AdminError, CsvFile, HttpAdminApi, Navigator, Route, SpindleScope};
use cnc_common::{Bit, Material, Spindle};
use cnc_sim::{spawn, Sim, SimState};
use std::time::Duration;

const SPINDLE_PATH: &str = "/admin/cnc/settings/spindle/7";

struct Catalogue {
    spindle: Spindle,
    bit: Bit,
    material: Material,
}

/// Spindle 7 ("Router A") with settings 3 and 5, plus one setting on another spindle.
fn catalogue() -> (SimState, Catalogue) {
    let mut state = SimState::new();
    let spindle = Spindle { id: 7, name: "Router A".to_string() };
    state.spindles.push(spindle.clone());
    let other = state.seed_spindle("Router B");
    let bit = state.seed_bit("1/4 Downcut", 0.25, 0.4);
    let material = state.seed_material("Oak");
    state.seed_setting(3, &spindle, &bit, &material);
    state.seed_setting(5, &spindle, &bit, &material);
    state.seed_setting(9, &other, &bit, &material);
    (state, Catalogue { spindle, bit, material })
}

async fn start(state: SimState, token: Option<&str>) -> (HttpAdminApi, Sim) {
    let (url, sim) = spawn(state).await.expect("simulator should start");
    let mut config = AdminConfig::new(url);
    if let Some(token) = token {
        config = config.with_token(token);
    }
    let api = HttpAdminApi::new(&config).expect("admin url is configured");
    (api, sim)
}

fn router_a() -> Option<SpindleScope> {
    Some(SpindleScope { id: 7, name: "Router A".to_string() })
}

#[tokio::test]
async fn loads_scoped_settings_newest_first() {
    let (state, _) = catalogue();
    let (api, sim) = start(state, Some("secret-token")).await;
    sim.with(|s| s.require_token(Some("secret-token"))).await;

    let mut ctl = SpindleSettingsController::new(api, router_a());
    ctl.load().await.unwrap();

    let ids: Vec<_> = ctl.rows().iter().map(|s| s.setting_id).collect();
    assert_eq!(ids, vec![5, 3]);
    assert_eq!(ctl.error(), None);

    let requests = sim.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, SPINDLE_PATH);
    // raw token, no Bearer prefix on admin routes
    assert_eq!(requests[0].authorization.as_deref(), Some("secret-token"));
}

#[tokio::test]
async fn rows_of_other_spindles_are_dropped() {
    let (state, _) = catalogue();
    let (api, sim) = start(state, None).await;
    let canned = r#"{"settings":[
        {"setting_id":3,"spindle_id":7,"bit_id":1,"material_id":2,"rpm":1,"feed":1,"doc":1,"stepover":1,"plunge":1,"warning":null},
        {"setting_id":8,"spindle_id":4,"bit_id":1,"material_id":2,"rpm":1,"feed":1,"doc":1,"stepover":1,"plunge":1,"warning":null},
        {"setting_id":5,"spindle_id":7,"bit_id":1,"material_id":2,"rpm":1,"feed":1,"doc":1,"stepover":1,"plunge":1,"warning":null}
    ]}"#;
    sim.with(|s| s.fail_next("GET", SPINDLE_PATH, 200, canned)).await;

    let mut ctl = SpindleSettingsController::new(api, router_a());
    ctl.load().await.unwrap();
    let ids: Vec<_> = ctl.rows().iter().map(|s| s.setting_id).collect();
    assert_eq!(ids, vec![5, 3]);
}

#[tokio::test]
async fn non_array_settings_show_an_empty_table() {
    let (state, _) = catalogue();
    let (api, sim) = start(state, None).await;
    sim.with(|s| s.fail_next("GET", SPINDLE_PATH, 200, r#"{"settings":{"oops":true}}"#))
        .await;

    let mut ctl = SpindleSettingsController::new(api, router_a());
    ctl.load().await.unwrap();
    assert!(ctl.rows().is_empty());
    assert_eq!(ctl.error(), None);
}

#[tokio::test]
async fn bare_array_body_shows_an_empty_table() {
    let (state, _) = catalogue();
    let (api, sim) = start(state, None).await;
    let canned = r#"[
        {"setting_id":3,"spindle_id":7,"bit_id":1,"material_id":2,"rpm":1,"feed":1,"doc":1,"stepover":1,"plunge":1,"warning":null},
        {"setting_id":5,"spindle_id":7,"bit_id":1,"material_id":2,"rpm":1,"feed":1,"doc":1,"stepover":1,"plunge":1,"warning":null}
    ]"#;
    sim.with(|s| s.fail_next("GET", SPINDLE_PATH, 200, canned)).await;

    let mut ctl = SpindleSettingsController::new(api, router_a());
    ctl.load().await.unwrap();
    assert!(ctl.rows().is_empty());
    assert_eq!(ctl.error(), None);
}

#[tokio::test]
async fn missing_spindle_is_an_error_and_sends_nothing() {
    let (state, _) = catalogue();
    let (api, sim) = start(state, None).await;

    let mut ctl = SpindleSettingsController::new(api, None);
    let err = ctl.load().await.unwrap_err();
    assert!(matches!(err, AdminError::Validation(_)));
    assert_eq!(
        ctl.error(),
        Some("No spindle selected. Please go back to spindles and select a spindle first.")
    );
    assert!(ctl.rows().is_empty());
    assert!(sim.requests().await.is_empty());
}

#[tokio::test]
async fn load_failure_reports_status() {
    let (state, _) = catalogue();
    let (api, sim) = start(state, None).await;
    sim.with(|s| s.fail_next("GET", SPINDLE_PATH, 500, "database unavailable")).await;

    let mut ctl = SpindleSettingsController::new(api, router_a());
    assert!(ctl.load().await.is_err());
    assert_eq!(ctl.error(), Some("Failed to load settings (500)"));
}

#[tokio::test]
async fn view_of_missing_setting_is_inline() {
    let (state, _) = catalogue();
    let (api, _sim) = start(state, None).await;

    let mut ctl = SpindleSettingsController::new(api, router_a());
    ctl.view(5).await.unwrap();
    assert_eq!(ctl.detail().map(|s| s.setting_id), Some(5));

    assert!(ctl.view(404).await.is_err());
    assert_eq!(ctl.error(), Some("Failed to load setting (404)"));
}

#[tokio::test]
async fn non_csv_file_is_rejected_without_a_request() {
    let (state, _) = catalogue();
    let (api, sim) = start(state, None).await;

    let mut ctl = SpindleSettingsController::new(api, router_a());
    ctl.open_upload();
    let err = ctl
        .choose_file(Some(CsvFile::new("settings.xlsx", "application/vnd.ms-excel", "x")))
        .unwrap_err();
    assert!(matches!(err, AdminError::Validation(_)));
    assert_eq!(ctl.error(), Some("Please select a valid CSV file"));
    assert!(ctl.pending_file().is_none());

    assert!(ctl.submit_upload().await.is_err());
    assert_eq!(ctl.error(), Some("Please select a CSV file to upload"));
    assert_eq!(sim.count_requests("POST", "/admin/cnc/settings/upload").await, 0);
}

#[tokio::test]
async fn upload_imports_rows_and_refetches() {
    let (state, cat) = catalogue();
    let (api, sim) = start(state, None).await;
    let vbit = sim.with(|s| s.seed_bit("60deg V-bit", 0.5, 0.1)).await;

    let mut ctl = SpindleSettingsController::new(api, router_a());
    ctl.load().await.unwrap();
    ctl.open_upload();
    let csv = format!(
        "Bit Id,Bit Name,Material Id,Material,RPM,Feed,DOC,Stepover,Plunge,Warning\n\
         {},\"60deg V-bit\",{},\"Oak\",16000,80,0.1,0.05,20,\n",
        vbit.id, cat.material.id
    );
    ctl.drop_files(vec![
        CsvFile::new("readme.txt", "text/plain", "ignored"),
        CsvFile::new("import.csv", "", csv),
    ])
    .unwrap();
    assert_eq!(ctl.pending_file().map(|f| f.name.as_str()), Some("import.csv"));

    ctl.submit_upload().await.unwrap();
    assert!(ctl.dialog().is_none());
    assert_eq!(ctl.rows().len(), 3);
    assert_eq!(ctl.rows()[0].bit_name, "60deg V-bit");
    assert_eq!(sim.count_requests("GET", SPINDLE_PATH).await, 2);
}

#[tokio::test]
async fn upload_failure_keeps_dialog_open_with_body_text() {
    let (state, cat) = catalogue();
    let (api, _sim) = start(state, None).await;

    let mut ctl = SpindleSettingsController::new(api, router_a());
    ctl.open_upload();
    let csv = format!("Bit Id,Material Id,RPM,Feed,DOC,Stepover,Plunge\n999,{},1,1,1,1,1\n", cat.material.id);
    ctl.choose_file(Some(CsvFile::new("bad.csv", "text/csv", csv))).unwrap();

    assert!(ctl.submit_upload().await.is_err());
    assert_eq!(
        ctl.error(),
        Some("Failed to upload CSV: Line 2: Unknown bit 999")
    );
    match ctl.dialog() {
        Some(SettingsDialog::Upload(dialog)) => {
            assert!(matches!(dialog.phase, FormPhase::Failed(_)));
            assert!(dialog.fields.is_some());
        }
        other => panic!("upload dialog should stay open, got {:?}", other),
    }
}

#[tokio::test]
async fn edit_carries_original_ids_and_nulls_empty_warning() {
    let (state, cat) = catalogue();
    let (api, sim) = start(state, None).await;
    sim.with(|s| {
        if let Some(row) = s.settings.iter_mut().find(|r| r.setting_id == 5) {
            row.warning = Some("Use dust collection".to_string());
        }
    })
    .await;

    let mut ctl = SpindleSettingsController::new(api, router_a());
    ctl.load().await.unwrap();
    ctl.open_edit(5).unwrap();
    {
        let fields = ctl.edit_fields_mut().expect("edit dialog is open");
        assert_eq!(fields.warning, "Use dust collection");
        fields.rpm = "12000".to_string();
        fields.warning.clear();
    }
    ctl.submit_edit().await.unwrap();
    assert!(ctl.dialog().is_none());

    let updated = ctl.rows().iter().find(|s| s.setting_id == 5).unwrap();
    assert_eq!(updated.rpm, 12000.0);
    assert_eq!(updated.warning, None);
    assert_eq!(updated.spindle_id, cat.spindle.id);
    assert_eq!(updated.bit_id, cat.bit.id);
    assert_eq!(updated.material_id, cat.material.id);
}

#[tokio::test]
async fn edit_with_bad_number_sends_nothing() {
    let (state, _) = catalogue();
    let (api, sim) = start(state, None).await;

    let mut ctl = SpindleSettingsController::new(api, router_a());
    ctl.load().await.unwrap();
    ctl.open_edit(3).unwrap();
    ctl.edit_fields_mut().unwrap().feed = "fast".to_string();
    assert!(ctl.submit_edit().await.is_err());
    assert_eq!(ctl.error(), Some("Feed must be a number"));
    assert_eq!(sim.count_requests("PUT", "/admin/cnc/settings/").await, 0);
}

#[tokio::test]
async fn delete_one_confirms_with_bit_and_material() {
    let (state, _) = catalogue();
    let (api, _sim) = start(state, None).await;

    let mut ctl = SpindleSettingsController::new(api, router_a());
    ctl.load().await.unwrap();
    ctl.request_delete(3).unwrap();
    assert_eq!(
        ctl.confirmation().map(|c| c.message.as_str()),
        Some("Are you sure you want to delete this setting: \"1/4 Downcut / Oak\"?")
    );

    ctl.confirm_delete().await.unwrap();
    assert!(ctl.confirmation().is_none());
    let ids: Vec<_> = ctl.rows().iter().map(|s| s.setting_id).collect();
    assert_eq!(ids, vec![5]);
}

#[tokio::test]
async fn cascade_delete_requires_exact_name() {
    let (mut state, _) = catalogue();
    state.spindles[0].name = "Router A ".to_string();
    let (api, sim) = start(state, None).await;
    let mut nav = Navigator::new();
    let scope = nav.select_spindle(&Spindle { id: 7, name: "Router A ".to_string() });

    let mut ctl = SpindleSettingsController::new(api, Some(scope));
    ctl.open_spindle_delete().unwrap();
    ctl.type_confirmation("Router A");
    assert!(!ctl.can_delete_spindle());

    assert!(ctl.confirm_spindle_delete(&mut nav).await.is_err());
    assert_eq!(
        ctl.error(),
        Some("Spindle name does not match. Please enter the exact spindle name to confirm deletion.")
    );
    assert!(ctl.spindle_delete().is_some());
    assert_eq!(sim.count_requests("DELETE", "/admin/cnc/settings/delete/spindle").await, 0);

    ctl.type_confirmation("Router A ");
    assert!(ctl.can_delete_spindle());
    ctl.confirm_spindle_delete(&mut nav).await.unwrap();

    assert_eq!(nav.route(), &Route::Spindles);
    assert_eq!(nav.spindle_scope(), None);
    assert!(ctl.spindle().is_none());
    let (spindles, settings) = sim.with(|s| (s.spindles.len(), s.settings.len())).await;
    assert_eq!(spindles, 1);
    assert_eq!(settings, 1);
}

#[tokio::test]
async fn cascade_failure_keeps_dialog_and_context() {
    let (state, _) = catalogue();
    let (api, sim) = start(state, None).await;
    sim.with(|s| s.fail_next("DELETE", "/admin/cnc/settings/delete/spindle/7", 409, "Spindle is in use"))
        .await;
    let mut nav = Navigator::new();
    let scope = nav.select_spindle(&Spindle { id: 7, name: "Router A".to_string() });

    let mut ctl = SpindleSettingsController::new(api, Some(scope.clone()));
    ctl.open_spindle_delete().unwrap();
    ctl.type_confirmation("Router A");
    assert!(ctl.confirm_spindle_delete(&mut nav).await.is_err());

    assert_eq!(ctl.error(), Some("Failed to delete spindle: Spindle is in use"));
    assert!(ctl.spindle_delete().is_some());
    assert!(ctl.can_delete_spindle());
    assert_eq!(nav.route(), &Route::SpindleSettings(scope));
}

#[tokio::test]
async fn export_uses_loaded_rows_only() {
    let (state, _) = catalogue();
    let (api, sim) = start(state, None).await;
    let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

    let mut ctl = SpindleSettingsController::new(api, router_a());
    assert!(ctl.export(date).is_err());
    assert_eq!(ctl.error(), Some("No settings available to download"));

    ctl.load().await.unwrap();
    let file = ctl.export(date).unwrap();
    assert_eq!(file.file_name, "settings_Router A_2026-10-19.csv");
    assert_eq!(file.contents.lines().count(), 3);
    assert_eq!(sim.requests().await.len(), 1);
}

#[tokio::test]
async fn closing_the_view_discards_a_slow_load() {
    let (state, _) = catalogue();
    let (api, sim) = start(state, None).await;
    sim.with(|s| s.set_latency(Some(Duration::from_millis(500)))).await;

    let mut ctl = SpindleSettingsController::new(api, router_a());
    let scope = ctl.scope().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        scope.close();
    });

    let err = ctl.load().await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(ctl.rows().is_empty());
    assert_eq!(ctl.error(), None);

    // closed views refuse new work
    assert!(ctl.load().await.unwrap_err().is_cancelled());
}
