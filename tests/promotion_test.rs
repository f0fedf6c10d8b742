// ABOUTME: End-to-end promotion runs against in-memory source and target orgs
// ABOUTME: Covers the happy path, per-object failures and run-aborting failures

mod common;

use common::{fast_settings, package_bytes, Call, Journal, MockPlatform};
use ic_promoter::tasks::MigrationTask;
use ic_promoter::{ObjectState, Orchestrator, PromoterError, RunContext};
use serde_json::json;
use tempfile::TempDir;

const SESSION: &str = "1718000000123456";

fn context(dir: &TempDir) -> RunContext {
    RunContext::with_session_id(SESSION, "dev_to_qa", dir.path())
}

fn tasks(names: &[&str]) -> Vec<MigrationTask> {
    names.iter().map(|name| MigrationTask::new("Orders", name)).collect()
}

#[tokio::test]
async fn test_round_trip_promotes_object() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let source = MockPlatform::new()
        .with_objects("MTT", &[("Orders/mt_load", "obj-1")])
        .with_export_ids(&["E1"])
        .with_export_states("E1", &["IN_PROGRESS", "SUCCESSFUL"]);
    let target = MockPlatform::new().with_import_states("I1", &["QUEUED", "IN_PROGRESS", "SUCCESSFUL"]);

    let report = Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["mt_load"]))
        .await
        .unwrap();

    assert_eq!(report.session_id, SESSION);
    assert_eq!(report.promoted(), 1);
    let outcome = &report.outcomes[0];
    assert_eq!(
        outcome.trace,
        vec![
            ObjectState::Resolved,
            ObjectState::ExportSubmitted,
            ObjectState::ExportPolling,
            ObjectState::ExportDone,
            ObjectState::PackageSaved,
            ObjectState::ImportUploaded,
            ObjectState::ImportSubmitted,
            ObjectState::ImportPolling,
            ObjectState::ImportDone,
            ObjectState::LogSaved,
        ]
    );

    assert_eq!(source.count(|c| *c == Call::ExportStatus("E1".into())), 2);
    assert_eq!(source.count(|c| matches!(c, Call::ExportPackage(_))), 1);
    assert_eq!(source.count(|c| *c == Call::ExportPackage("E1".into())), 1);
    assert!(source.calls().contains(&Call::SubmitExport {
        name: format!("mt_load-{}", SESSION),
        object_id: "obj-1".into(),
        include_dependencies: false,
    }));

    let package = ctx.package_path("mt_load");
    assert_eq!(std::fs::read(&package).unwrap(), package_bytes("E1"));
    assert!(ctx
        .export_log_folder()
        .join(ctx.export_log_file_name("mt_load"))
        .exists());
    assert_eq!(
        std::fs::read_to_string(ctx.import_log_folder().join(ctx.import_log_file_name("mt_load")))
            .unwrap(),
        "import log I1"
    );

    assert!(target.calls().contains(&Call::UploadPackage {
        file_name: format!("mt_load-{}.zip", SESSION),
        bytes: package_bytes("E1"),
    }));
}

#[tokio::test]
async fn test_import_status_is_polled_with_import_job_id() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let source = MockPlatform::new()
        .with_objects("Mapping", &[("Orders/m_a", "obj-a")])
        .with_export_ids(&["E1"]);
    let target = MockPlatform::new();

    Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["m_a"]))
        .await
        .unwrap();

    let target_calls = target.calls();
    assert!(target_calls.contains(&Call::ImportStatus("I1".into())));
    assert!(!target_calls.iter().any(|c| matches!(c, Call::ExportStatus(_))));
    assert!(!target_calls.contains(&Call::ImportStatus("E1".into())));
    assert!(target_calls.contains(&Call::ImportLog("I1".into())));
}

#[tokio::test]
async fn test_conflict_resolution_is_sent_verbatim() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let source = MockPlatform::new().with_objects("TASKFLOW", &[("Orders/tf_nightly", "tf-9")]);
    let target = MockPlatform::new();

    Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["tf_nightly"]))
        .await
        .unwrap();

    let body = target
        .calls()
        .into_iter()
        .find_map(|call| match call {
            Call::SubmitImport { job_id, body } => {
                assert_eq!(job_id, "I1");
                Some(body)
            }
            _ => None,
        })
        .expect("import was submitted");
    assert_eq!(
        body,
        json!({
            "name": format!("tf_nightly-{}", SESSION),
            "importSpecification": {
                "defaultConflictResolution": "OVERWRITE",
                "includeObjects": ["tf-9"]
            }
        })
    );
}

#[tokio::test]
async fn test_unresolved_task_aborts_before_any_export() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let source = MockPlatform::new().with_objects("MTT", &[("Orders/mt_a", "a"), ("Orders/mt_c", "c")]);
    let target = MockPlatform::new();

    let err = Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["mt_a", "mt_b", "mt_c"]))
        .await
        .unwrap_err();

    match err.downcast_ref::<PromoterError>() {
        Some(PromoterError::Unresolved(paths)) => assert_eq!(paths, &["Orders/mt_b"]),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(source.calls().iter().all(|c| matches!(c, Call::ListObjects(_))));
    assert!(target.calls().is_empty());
    assert!(!dir.path().join("export_to_import").exists());
}

#[tokio::test]
async fn test_failed_listing_surfaces_as_unresolved() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let source = MockPlatform::new()
        .with_objects("Mapping", &[("Orders/m_a", "a")])
        .with_objects("MTT", &[("Orders/mt_b", "b")])
        .failing_listing("MTT");
    let target = MockPlatform::new();

    let err = Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["m_a", "mt_b"]))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PromoterError>(),
        Some(PromoterError::Unresolved(paths)) if paths == &["Orders/mt_b"]
    ));
    // every configured type was still listed
    assert_eq!(source.count(|c| matches!(c, Call::ListObjects(_))), 6);
}

#[tokio::test]
async fn test_later_object_type_wins_path_collision() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let source = MockPlatform::new()
        .with_objects("Mapping", &[("Orders/shared", "mapping-id")])
        .with_objects("MTT", &[("Orders/shared", "task-id")]);
    let target = MockPlatform::new();

    let report = Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["shared"]))
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].object.id, "task-id");
    assert!(source.calls().iter().any(|c| matches!(
        c,
        Call::SubmitExport { object_id, .. } if object_id == "task-id"
    )));
}

#[tokio::test]
async fn test_export_timeout_skips_package_and_continues() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let source = MockPlatform::new()
        .with_objects("MTT", &[("Orders/slow", "s"), ("Orders/fast", "f")])
        .with_export_ids(&["E1", "E2"])
        .with_export_states("E1", &["IN_PROGRESS"]);
    let target = MockPlatform::new();

    let report = Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["slow", "fast"]))
        .await
        .unwrap();

    let slow = &report.outcomes[0];
    assert_eq!(slow.final_state(), ObjectState::ExportTimeout);
    assert!(!slow.reached(ObjectState::PackageSaved));
    assert!(slow.export_log_path.is_some());
    assert_eq!(source.count(|c| *c == Call::ExportStatus("E1".into())), 10);
    assert_eq!(source.count(|c| *c == Call::ExportPackage("E1".into())), 0);
    assert_eq!(source.count(|c| *c == Call::ExportLog("E1".into())), 1);
    assert!(!ctx.package_path("slow").exists());

    let fast = &report.outcomes[1];
    assert!(fast.is_promoted());
    assert_eq!(report.promoted(), 1);
    assert_eq!(target.count(|c| matches!(c, Call::UploadPackage { .. })), 1);
    assert_eq!(report.incomplete().count(), 1);
}

#[tokio::test]
async fn test_failed_job_state_keeps_polling_until_budget() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let source = MockPlatform::new()
        .with_objects("MTT", &[("Orders/broken", "b")])
        .with_export_states("E1", &["FAILED"]);
    let target = MockPlatform::new();

    let report = Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["broken"]))
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].final_state(), ObjectState::ExportTimeout);
    assert_eq!(source.count(|c| matches!(c, Call::ExportStatus(_))), 10);
    assert!(target.calls().is_empty());
}

#[tokio::test]
async fn test_package_save_failure_skips_import() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let source = MockPlatform::new()
        .with_objects("MTT", &[("Orders/mt_a", "a")])
        .failing_package();
    let target = MockPlatform::new();

    let report = Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["mt_a"]))
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.final_state(), ObjectState::PackageSaveFailed);
    assert!(outcome.export_log_path.is_some());
    assert!(target.calls().is_empty());
}

#[tokio::test]
async fn test_export_submission_failure_moves_to_next_object() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let source = MockPlatform::new()
        .with_objects("MTT", &[("Orders/bad", "bad-id"), ("Orders/good", "good-id")])
        .failing_export_for("bad-id");
    let target = MockPlatform::new();

    let report = Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["bad", "good"]))
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].final_state(), ObjectState::ExportSubmitFailed);
    assert_eq!(report.outcomes[0].export_job_id, None);
    assert!(report.outcomes[1].is_promoted());
    assert_eq!(report.outcomes[1].export_job_id.as_deref(), Some("E1"));
}

#[tokio::test]
async fn test_upload_failure_aborts_run_without_import() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let source = MockPlatform::new().with_objects("MTT", &[("Orders/first", "1"), ("Orders/second", "2")]);
    let target = MockPlatform::new().failing_upload();

    let err = Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["first", "second"]))
        .await
        .unwrap_err();

    match err.downcast_ref::<PromoterError>() {
        Some(PromoterError::Upload { object, .. }) => assert_eq!(object, "Orders/first"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(target.count(|c| matches!(c, Call::SubmitImport { .. })), 0);
    assert_eq!(source.count(|c| matches!(c, Call::SubmitExport { .. })), 1);
}

#[tokio::test]
async fn test_import_submission_failure_is_contained() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let source = MockPlatform::new().with_objects("MTT", &[("Orders/a", "1"), ("Orders/b", "2")]);
    let target = MockPlatform::new().failing_import_submit();

    let report = Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["a", "b"]))
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 2);
    for outcome in &report.outcomes {
        assert_eq!(outcome.final_state(), ObjectState::ImportSubmitFailed);
    }
    assert_eq!(target.count(|c| matches!(c, Call::ImportStatus(_))), 0);
}

#[tokio::test]
async fn test_import_timeout_uses_import_budget() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let source = MockPlatform::new().with_objects("PROCESS", &[("Orders/p_notify", "p")]);
    let target = MockPlatform::new().with_import_states("I1", &["IN_PROGRESS"]);

    let report = Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["p_notify"]))
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert!(outcome.reached(ObjectState::ImportTimeout));
    assert!(!outcome.is_promoted());
    assert_eq!(target.count(|c| matches!(c, Call::ImportStatus(_))), 14);
    assert_eq!(outcome.final_state(), ObjectState::LogSaved);
}

#[tokio::test]
async fn test_status_error_aborts_run() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let source = MockPlatform::new()
        .with_objects("MTT", &[("Orders/a", "1"), ("Orders/b", "2")])
        .failing_status();
    let target = MockPlatform::new();

    let err = Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["a", "b"]))
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("status 401"));
    assert_eq!(source.count(|c| matches!(c, Call::ExportStatus(_))), 1);
    assert_eq!(source.count(|c| matches!(c, Call::ExportPackage(_))), 0);
    assert_eq!(source.count(|c| matches!(c, Call::SubmitExport { .. })), 1);
    assert!(target.calls().is_empty());
}

#[tokio::test]
async fn test_objects_are_processed_one_after_another() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let journal = Journal::default();
    let source = MockPlatform::new()
        .with_objects("MTT", &[("Orders/a", "1"), ("Orders/b", "2")])
        .with_journal("source", &journal);
    let target = MockPlatform::new().with_journal("target", &journal);

    let report = Orchestrator::new(&source, &target, &ctx, fast_settings())
        .run(&tasks(&["a", "b"]))
        .await
        .unwrap();
    assert_eq!(report.promoted(), 2);

    let calls = journal.lock().unwrap().clone();
    let position = |org: &str, wanted: &dyn Fn(&Call) -> bool| {
        calls
            .iter()
            .position(|(o, call)| o == org && wanted(call))
            .unwrap()
    };

    // object 1 finishes in the target org before object 2 starts in the source org
    let first_import_log = position("target", &|c: &Call| *c == Call::ImportLog("I1".into()));
    let first_import_status = position("target", &|c: &Call| *c == Call::ImportStatus("I1".into()));
    let second_submit = position("source", &|c: &Call| {
        matches!(c, Call::SubmitExport { object_id, .. } if object_id == "2")
    });
    assert!(first_import_status < first_import_log);
    assert!(first_import_log < second_submit);

    let second_upload = position("target", &|c: &Call| {
        matches!(c, Call::UploadPackage { bytes, .. } if *bytes == package_bytes("E2"))
    });
    assert!(second_submit < second_upload);
    assert_eq!(
        calls.last().map(|(org, call)| (org.as_str(), call.clone())),
        Some(("target", Call::ImportLog("I2".into())))
    );
}
