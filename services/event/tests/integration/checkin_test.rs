use chrono::{DateTime, Utc};

use hackreg_event::error::EventServiceError;

use crate::helpers::{Harness, committed_team};

fn scan_payload(team_code: &str, participant_id: &str) -> String {
    serde_json::json!({
        "team_code": team_code,
        "participant_id": participant_id,
        "participant_name": "Seed Leader",
        "is_team_leader": true,
        "timestamp": Utc::now().to_rfc3339(),
    })
    .to_string()
}

#[tokio::test]
async fn scan_marks_team_present_and_returns_participant() {
    let h = Harness::new();
    h.repo
        .seed(committed_team("HACK-001", "TEAM-AB12CD", "a@x.io"));
    let mut rx = h.events.subscribe();

    let context = h
        .checkin_usecase()
        .scan(&scan_payload("TEAM-AB12CD", "TEAM-AB12CD-000"))
        .await
        .unwrap();

    assert_eq!(context.team.team.team_id, "HACK-001");
    assert!(context.team.team.attendance_status);
    assert_eq!(context.team.team.check_in_time, Some(context.checked_in_at));
    assert_eq!(context.participant.participant_id, "TEAM-AB12CD-000");
    assert!(context.participant.is_team_leader);

    // The win is published for dashboards.
    let event = rx.recv().await.unwrap();
    assert_eq!(event.team_code, "TEAM-AB12CD");
    assert_eq!(event.checked_in_at, context.checked_in_at);
}

#[tokio::test]
async fn manual_check_in_returns_the_leader() {
    let h = Harness::new();
    h.repo
        .seed(committed_team("HACK-001", "TEAM-AB12CD", "a@x.io"));

    let context = h.checkin_usecase().manual("HACK-001").await.unwrap();
    assert!(context.participant.is_team_leader);
    assert_eq!(context.team.team.team_code, "TEAM-AB12CD");
}

#[tokio::test]
async fn malformed_json_payload_is_rejected() {
    let h = Harness::new();
    let result = h.checkin_usecase().scan("{not json").await;
    assert!(matches!(result, Err(EventServiceError::InvalidPayload(_))));
}

#[tokio::test]
async fn payload_missing_required_keys_is_rejected() {
    let h = Harness::new();
    let result = h
        .checkin_usecase()
        .scan(r#"{"team_code":"TEAM-AB12CD"}"#)
        .await;
    assert!(matches!(result, Err(EventServiceError::InvalidPayload(_))));
}

#[tokio::test]
async fn unknown_team_code_is_a_miss() {
    let h = Harness::new();
    let result = h
        .checkin_usecase()
        .scan(&scan_payload("TEAM-NOSUCH", "TEAM-NOSUCH-000"))
        .await;
    assert!(matches!(result, Err(EventServiceError::TeamNotFound)));
}

#[tokio::test]
async fn foreign_participant_id_does_not_mark_the_team() {
    let h = Harness::new();
    h.repo
        .seed(committed_team("HACK-001", "TEAM-AB12CD", "a@x.io"));

    let result = h
        .checkin_usecase()
        .scan(&scan_payload("TEAM-AB12CD", "TEAM-ZZ99ZZ-000"))
        .await;
    assert!(matches!(result, Err(EventServiceError::InvalidPayload(_))));
    // The mismatch is detected before the attendance transition.
    let team = &h.repo.committed()[0];
    assert!(!team.team.attendance_status);
}

#[tokio::test]
async fn malformed_manual_team_id_is_rejected() {
    let h = Harness::new();
    for bad in ["hack-001", "HACK", "HACK-01", "HACK-1a3"] {
        let result = h.checkin_usecase().manual(bad).await;
        assert!(
            matches!(result, Err(EventServiceError::BadRequest(_))),
            "expected shape rejection for {bad}"
        );
    }
}

#[tokio::test]
async fn unknown_manual_team_id_is_a_miss() {
    let h = Harness::new();
    let result = h.checkin_usecase().manual("HACK-999").await;
    assert!(matches!(result, Err(EventServiceError::TeamNotFound)));
}

#[tokio::test]
async fn second_scan_reports_already_checked_in_with_original_time() {
    let h = Harness::new();
    h.repo
        .seed(committed_team("HACK-001", "TEAM-AB12CD", "a@x.io"));

    let first = h
        .checkin_usecase()
        .scan(&scan_payload("TEAM-AB12CD", "TEAM-AB12CD-000"))
        .await
        .unwrap();

    h.clock.advance(chrono::Duration::seconds(60));
    let second = h
        .checkin_usecase()
        .scan(&scan_payload("TEAM-AB12CD", "TEAM-AB12CD-000"))
        .await;
    match second {
        Err(EventServiceError::AlreadyCheckedIn { checked_in_at }) => {
            assert_eq!(checked_in_at, Some(first.checked_in_at));
        }
        Err(other) => panic!("expected AlreadyCheckedIn, got {other:?}"),
        Ok(_) => panic!("expected AlreadyCheckedIn, got success"),
    }
}

#[tokio::test]
async fn ten_concurrent_scans_produce_exactly_one_winner() {
    let h = Harness::new();
    h.repo
        .seed(committed_team("HACK-001", "TEAM-AB12CD", "a@x.io"));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let usecase = h.checkin_usecase();
        let payload = scan_payload("TEAM-AB12CD", "TEAM-AB12CD-000");
        handles.push(tokio::spawn(async move { usecase.scan(&payload).await }));
    }

    let mut winners: Vec<DateTime<Utc>> = Vec::new();
    let mut losers: Vec<Option<DateTime<Utc>>> = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(context) => winners.push(context.checked_in_at),
            Err(EventServiceError::AlreadyCheckedIn { checked_in_at }) => {
                losers.push(checked_in_at);
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(winners.len(), 1, "exactly one scan wins");
    assert_eq!(losers.len(), 9);
    let winning_time = winners[0];
    assert!(
        losers.iter().all(|at| *at == Some(winning_time)),
        "every loser observes the winner's check-in time"
    );
}
