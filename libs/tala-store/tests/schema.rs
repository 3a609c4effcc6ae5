//! Schema lifecycle across app launches.

mod common;

use common::{date, TestContext};
use pretty_assertions::assert_eq;
use tala_core::NewEvent;
use tala_store::SCHEMA_VERSION;

fn seed(ctx: &TestContext) {
    let ana = ctx.sign_up("ana@example.com", "Ana", "pw");
    assert!(ctx
        .store
        .create_event(ana, &NewEvent::on_day("Gym", date("2024-03-01"), "07:00", "08:00")));
}

#[test]
fn test_new_file_is_created_at_current_version() {
    let ctx = TestContext::new();
    assert!(!ctx.db_path().exists());

    assert_eq!(ctx.store.schema_version(), Some(SCHEMA_VERSION));
    assert!(ctx.db_path().exists());
}

#[test]
fn test_initialize_is_idempotent() {
    let ctx = TestContext::new();
    seed(&ctx);

    assert!(ctx.store.initialize());

    assert!(ctx.store.email_exists("ana@example.com"));
}

#[test]
fn test_version_bump_on_open_wipes_both_tables() {
    let ctx = TestContext::with_schema_version(1);
    seed(&ctx);
    ctx.store.close();

    let upgraded = ctx.reopen(2);
    assert_eq!(upgraded.schema_version(), Some(2));
    assert!(!upgraded.email_exists("ana@example.com"));

    let (users, events, user_columns, event_columns) = upgraded
        .with_repository(|repo| {
            Ok((
                repo.count_rows("users")?,
                repo.count_rows("events")?,
                repo.table_columns("users")?,
                repo.table_columns("events")?,
            ))
        })
        .unwrap();
    assert_eq!(users, 0);
    assert_eq!(events, 0);
    assert_eq!(user_columns, vec!["user_id", "email", "username", "password"]);
    assert_eq!(
        event_columns,
        vec!["event_id", "user_id", "title", "start_date", "end_date", "start_time", "end_time"]
    );
}

#[test]
fn test_explicit_upgrade_wipes_rows() {
    let ctx = TestContext::with_schema_version(2);
    seed(&ctx);

    assert!(ctx.store.upgrade(1, 2));

    assert_eq!(ctx.store.schema_version(), Some(2));
    assert!(!ctx.store.email_exists("ana@example.com"));
    // Tables remain usable after the reset.
    assert!(ctx.store.create_user("ana@example.com", "Ana", "pw"));
}

#[test]
fn test_explicit_upgrade_survives_relaunch() {
    let ctx = TestContext::with_schema_version(2);
    seed(&ctx);
    assert!(ctx.store.upgrade(1, 2));
    ctx.store.close();

    let relaunched = ctx.reopen(2);
    assert_eq!(relaunched.schema_version(), Some(2));
    assert!(!relaunched.email_exists("ana@example.com"));
    assert!(relaunched.create_user("bo@example.com", "Bo", "pw"));
    assert!(relaunched.email_exists("bo@example.com"));
}

#[test]
fn test_upgrade_past_configured_version_is_refused() {
    let ctx = TestContext::new();
    seed(&ctx);

    assert!(!ctx.store.upgrade(SCHEMA_VERSION, SCHEMA_VERSION + 1));
    assert_eq!(ctx.store.schema_version(), Some(SCHEMA_VERSION));
    assert!(ctx.store.email_exists("ana@example.com"));
    ctx.store.close();

    // The file stays readable at the configured version.
    let relaunched = ctx.reopen(SCHEMA_VERSION);
    assert_eq!(relaunched.schema_version(), Some(SCHEMA_VERSION));
    assert!(relaunched.email_exists("ana@example.com"));
    assert!(relaunched.create_user("bo@example.com", "Bo", "pw"));
}

#[test]
fn test_newer_file_is_refused() {
    let ctx = TestContext::with_schema_version(2);
    seed(&ctx);
    ctx.store.close();

    let older_app = ctx.reopen(1);
    assert_eq!(older_app.schema_version(), None);
    assert!(!older_app.email_exists("ana@example.com"));
    assert!(!older_app.is_open());

    // The data is still there for the newer version.
    let newer_app = ctx.reopen(2);
    assert!(newer_app.email_exists("ana@example.com"));
}
