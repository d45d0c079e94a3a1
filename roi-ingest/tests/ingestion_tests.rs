//! Ingestion service tests
//!
//! Drives IngestionService against a scripted predictor and checks the
//! session, the dashboard store and the published events.

mod helpers;

use helpers::*;
use roi_common::events::RoiEvent;
use roi_common::{FileInfo, UploadState};
use roi_ingest::models::SessionError;
use roi_ingest::services::PredictorError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

fn csv_info() -> FileInfo {
    FileInfo::new("campaigns.csv", SAMPLE_CSV.len() as u64, "text/csv")
}

/// TC-ING-001: Successful upload populates the dashboard
///
/// **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn test_successful_upload_completes() {
    // Given: a predictor that scores two Google campaigns
    let predictor = Arc::new(StubPredictor::succeeding(google_pair()));
    let (service, _bus) = test_service(Arc::clone(&predictor));

    // When: a CSV is uploaded and the attempt runs to completion
    let ticket = service.start_upload(csv_info(), SAMPLE_CSV.to_vec()).await.unwrap();
    assert_eq!(ticket.session.state, UploadState::Transferring);
    ticket.wait().await;

    // Then: the session is complete at 100% and the summary is stored
    let session = service.status().await;
    assert_eq!(session.state, UploadState::Complete);
    assert_eq!(session.progress_percent, 100);
    assert!(session.error_message.is_none());

    let states: Vec<_> = session.transitions.iter().map(|t| t.new_state).collect();
    assert_eq!(
        states,
        vec![
            UploadState::Validating,
            UploadState::Transferring,
            UploadState::AwaitingResult,
            UploadState::Complete
        ]
    );

    let source = service.data_source().await;
    let summary = source.summary().expect("summary after completion");
    assert_eq!(summary.total_campaigns, 2);
    assert_eq!(summary.predicted_successful, 1);
    assert_eq!(summary.success_rate_percent, 50.0);

    assert_eq!(predictor.calls(), 1);
    assert_eq!(
        predictor.uploads(),
        vec![("campaigns.csv".to_string(), "text/csv".to_string(), SAMPLE_CSV.len())]
    );
}

/// TC-ING-002: Predictor error fails the attempt with the server's message
///
/// **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn test_predictor_error_fails_session() {
    // Given: a predictor answering 500 {"error":"bad header row"}
    let predictor = Arc::new(StubPredictor::failing(PredictorError::Server {
        status: 500,
        message: "bad header row".to_string(),
    }));
    let (service, _bus) = test_service(predictor);

    // When: a file is uploaded
    let ticket = service.start_upload(csv_info(), SAMPLE_CSV.to_vec()).await.unwrap();
    ticket.wait().await;

    // Then: FAILED with that message, progress back to 0, no summary
    let session = service.status().await;
    assert_eq!(session.state, UploadState::Failed);
    assert_eq!(session.error_message.as_deref(), Some("bad header row"));
    assert_eq!(session.progress_percent, 0);
    assert!(!service.data_source().await.is_scored());
}

/// TC-ING-003: A second upload is refused while the first is in flight
///
/// **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn test_upload_refused_while_busy() {
    // Given: an attempt held in AWAITING_RESULT
    let gate = Arc::new(Notify::new());
    let predictor = Arc::new(StubPredictor::succeeding(google_pair()).gated(Arc::clone(&gate)));
    let (service, _bus) = test_service(Arc::clone(&predictor));
    let ticket = service.start_upload(csv_info(), SAMPLE_CSV.to_vec()).await.unwrap();
    wait_for_state(&service, UploadState::AwaitingResult).await;

    // When: another file is selected
    let err = service
        .start_upload(csv_info(), SAMPLE_CSV.to_vec())
        .await
        .err()
        .expect("busy session must refuse");

    // Then: Busy, and the predictor was called only once
    assert_eq!(err, SessionError::Busy(UploadState::AwaitingResult));
    assert_eq!(predictor.calls(), 1);

    gate.notify_one();
    ticket.wait().await;
    assert_eq!(service.status().await.state, UploadState::Complete);
}

/// TC-ING-004: Rejected extension never reaches the predictor
///
/// **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn test_rejected_file_not_sent() {
    // Given: an idle service
    let predictor = Arc::new(StubPredictor::succeeding(google_pair()));
    let (service, bus) = test_service(Arc::clone(&predictor));
    let mut rx = bus.subscribe();

    // When: report.pdf is selected
    let err = service
        .start_upload(FileInfo::new("report.pdf", 10, "application/pdf"), vec![0; 10])
        .await
        .err()
        .expect("pdf must be rejected");

    // Then: validation error, still IDLE with the reason, no call made
    assert!(matches!(err, SessionError::Validation(_)));
    let session = service.status().await;
    assert_eq!(session.state, UploadState::Idle);
    assert_eq!(session.error_message.as_deref(), Some("unsupported format: .pdf"));
    assert!(session.transitions.is_empty());
    assert_eq!(predictor.calls(), 0);

    match rx.try_recv().unwrap() {
        RoiEvent::UploadRejected { file_name, reason, .. } => {
            assert_eq!(file_name, "report.pdf");
            assert_eq!(reason, "unsupported format: .pdf");
        }
        other => panic!("Expected UploadRejected, got {:?}", other),
    }
}

/// TC-ING-009: Rejected file after a failed upload publishes the return to IDLE
///
/// **Type:** Integration | **Priority:** P1
#[tokio::test]
async fn test_rejected_file_after_failure_publishes_reset() {
    // Given: a session left FAILED by the predictor
    let predictor = Arc::new(StubPredictor::failing(PredictorError::Server {
        status: 500,
        message: "bad header row".to_string(),
    }));
    let (service, bus) = test_service(Arc::clone(&predictor));
    service
        .start_upload(csv_info(), SAMPLE_CSV.to_vec())
        .await
        .unwrap()
        .wait()
        .await;
    assert_eq!(service.status().await.state, UploadState::Failed);
    let mut rx = bus.subscribe();

    // When: report.pdf is selected
    let err = service
        .start_upload(FileInfo::new("report.pdf", 10, "application/pdf"), vec![0; 10])
        .await
        .err()
        .expect("pdf must be rejected");
    assert!(matches!(err, SessionError::Validation(_)));

    // Then: FAILED -> IDLE is published before the rejection
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(events.len(), 2, "events: {:?}", events);
    match &events[0] {
        RoiEvent::UploadStateChanged {
            old_state,
            new_state,
            ..
        } => {
            assert_eq!(*old_state, UploadState::Failed);
            assert_eq!(*new_state, UploadState::Idle);
        }
        other => panic!("Expected UploadStateChanged, got {:?}", other),
    }
    assert!(matches!(events[1], RoiEvent::UploadRejected { .. }));

    let session = service.status().await;
    assert_eq!(session.state, UploadState::Idle);
    assert_eq!(session.error_message.as_deref(), Some("unsupported format: .pdf"));
    assert_eq!(predictor.calls(), 1);
}

/// TC-ING-005: Reset during a transfer cancels it and discards its result
///
/// **Type:** Integration | **Priority:** P0
#[tokio::test]
async fn test_reset_cancels_in_flight_upload() {
    // Given: an attempt held in AWAITING_RESULT
    let gate = Arc::new(Notify::new());
    let predictor = Arc::new(StubPredictor::succeeding(google_pair()).gated(Arc::clone(&gate)));
    let (service, bus) = test_service(predictor);
    let mut rx = bus.subscribe();
    let ticket = service.start_upload(csv_info(), SAMPLE_CSV.to_vec()).await.unwrap();
    wait_for_state(&service, UploadState::AwaitingResult).await;

    // When: the session is reset and the predictor then answers
    let after_reset = service.reset().await;
    gate.notify_one();
    tokio::time::timeout(Duration::from_secs(2), ticket.wait())
        .await
        .expect("cancelled task must finish");

    // Then: IDLE with everything cleared, nothing stored
    assert_eq!(after_reset.state, UploadState::Idle);
    let session = service.status().await;
    assert_eq!(session.state, UploadState::Idle);
    assert!(session.file.is_none());
    assert_eq!(session.progress_percent, 0);
    assert!(session.error_message.is_none());
    assert!(!service.data_source().await.is_scored());

    let mut saw_reset = false;
    while let Ok(event) = rx.try_recv() {
        assert!(!matches!(event, RoiEvent::UploadCompleted { .. }));
        if let RoiEvent::UploadReset { cancelled_transfer, .. } = event {
            assert!(cancelled_transfer);
            saw_reset = true;
        }
    }
    assert!(saw_reset);
}

/// TC-ING-006: New upload clears the previous summary before its result arrives
///
/// **Type:** Integration | **Priority:** P1
#[tokio::test]
async fn test_new_upload_clears_previous_summary() {
    // Given: a completed attempt whose summary is on the dashboard
    let gate = Arc::new(Notify::new());
    let predictor = Arc::new(StubPredictor::succeeding(google_pair()).gated(Arc::clone(&gate)));
    let (service, _bus) = test_service(predictor);

    gate.notify_one();
    service
        .start_upload(csv_info(), SAMPLE_CSV.to_vec())
        .await
        .unwrap()
        .wait()
        .await;
    assert!(service.data_source().await.is_scored());

    // When: a second file is selected from COMPLETE
    let ticket = service.start_upload(csv_info(), SAMPLE_CSV.to_vec()).await.unwrap();

    // Then: the old summary is gone while the new attempt is pending
    assert_eq!(ticket.session.attempt, 3);
    assert!(!service.data_source().await.is_scored());

    gate.notify_one();
    ticket.wait().await;
    assert!(service.data_source().await.is_scored());
}

/// TC-ING-007: Failure is recorded as the last error
///
/// **Type:** Unit | **Priority:** P2
#[tokio::test]
async fn test_failure_sets_last_error() {
    let predictor = Arc::new(StubPredictor::failing(PredictorError::Transport(
        "connection refused".to_string(),
    )));
    let state = test_app_state(predictor);

    state
        .ingestion
        .start_upload(csv_info(), SAMPLE_CSV.to_vec())
        .await
        .unwrap()
        .wait()
        .await;

    let last_error = state.last_error.read().await.clone();
    assert_eq!(
        last_error.as_deref(),
        Some("Could not reach the prediction service: connection refused")
    );
}

/// TC-ING-008: Progress events stay within 0-90 until completion
///
/// **Type:** Integration | **Priority:** P1
#[tokio::test]
async fn test_progress_events_capped_until_complete() {
    let predictor = Arc::new(StubPredictor::succeeding(google_pair()));
    let (service, bus) = test_service(predictor);
    let mut rx = bus.subscribe();

    service
        .start_upload(csv_info(), SAMPLE_CSV.to_vec())
        .await
        .unwrap()
        .wait()
        .await;

    let mut percents = Vec::new();
    let mut completed = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            RoiEvent::UploadProgress { progress_percent, .. } => {
                assert!(!completed, "progress after completion");
                percents.push(progress_percent);
            }
            RoiEvent::UploadCompleted { total_campaigns, .. } => {
                assert_eq!(total_campaigns, 2);
                completed = true;
            }
            _ => {}
        }
    }

    assert!(completed);
    assert_eq!(percents.last(), Some(&100));
    assert!(percents.windows(2).all(|w| w[0] < w[1]));
    assert!(percents[..percents.len() - 1].iter().all(|p| *p <= 90));
}
