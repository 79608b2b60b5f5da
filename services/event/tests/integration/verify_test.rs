use chrono::Duration;

use hackreg_event::error::EventServiceError;
use hackreg_event::usecase::verify::VerifyOtpInput;

use crate::helpers::{Harness, MockArtifacts, MockMailer, SentMail, committed_team, solo_payload, wrong_code};

fn input(email: &str, otp: &str) -> VerifyOtpInput {
    VerifyOtpInput {
        leader_email: email.to_owned(),
        otp: otp.to_owned(),
    }
}

#[tokio::test]
async fn happy_path_commits_team_and_delivers_artifacts() {
    let h = Harness::new();
    h.register_usecase()
        .execute(solo_payload("a@x.io"))
        .await
        .unwrap();
    let code = h.mailer.last_otp().unwrap();

    let output = h
        .verify_usecase()
        .execute(input("a@x.io", &code))
        .await
        .unwrap();

    // Identifier formats.
    let team = &output.team.team;
    assert_eq!(team.team_id, "HACK-001");
    assert!(team.team_code.starts_with("TEAM-"));
    assert_eq!(team.team_code.len(), 11);
    assert_eq!(team.access_key.len(), 10);
    assert_eq!(team.leader_email, "a@x.io");
    assert!(!team.attendance_status);

    // Leader invariant.
    let members = &output.team.members;
    assert_eq!(members.len(), 1);
    assert!(members[0].is_team_leader);
    assert_eq!(members[0].email, team.leader_email);
    assert_eq!(
        members[0].participant_id,
        format!("{}-000", team.team_code)
    );

    // One document generated, confirmation mailed with a live attachment,
    // intermediate file cleaned up afterwards.
    assert!(!output.artifacts_deferred);
    assert_eq!(h.artifacts.call_count(), 1);
    let confirmation = h
        .mailer
        .sent_mail()
        .into_iter()
        .find_map(|mail| match mail {
            SentMail::Confirmation {
                team_id,
                attachment,
                attachment_existed,
                ..
            } => Some((team_id, attachment, attachment_existed)),
            _ => None,
        })
        .expect("confirmation mail recorded");
    assert_eq!(confirmation.0, "HACK-001");
    assert!(confirmation.2, "attachment existed at send time");
    assert!(!confirmation.1.exists(), "temp document deleted after send");

    // Cleanup: neither store holds the email any more.
    assert!(!h.otp.has_entry("a@x.io"));
    assert!(!h.pending.has_entry("a@x.io"));
}

#[tokio::test]
async fn committed_team_round_trips_through_lookups() {
    let h = Harness::new();
    h.register_usecase()
        .execute(solo_payload("a@x.io"))
        .await
        .unwrap();
    let code = h.mailer.last_otp().unwrap();
    let output = h
        .verify_usecase()
        .execute(input("a@x.io", &code))
        .await
        .unwrap();

    use hackreg_event::domain::repository::TeamRepository;
    let by_code = h
        .repo
        .find_by_team_code(&output.team.team.team_code)
        .await
        .unwrap()
        .unwrap();
    let by_id = h
        .repo
        .find_by_team_id(&output.team.team.team_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_code, by_id);
    assert_eq!(by_code, output.team);
}

#[tokio::test]
async fn expired_otp_is_gone_even_with_the_right_code() {
    let h = Harness::new();
    h.register_usecase()
        .execute(solo_payload("a@x.io"))
        .await
        .unwrap();
    let code = h.mailer.last_otp().unwrap();

    h.clock.advance(Duration::seconds(301));

    let result = h.verify_usecase().execute(input("a@x.io", &code)).await;
    assert!(matches!(result, Err(EventServiceError::OtpExpired)));
    // The pending payload outlives the OTP; a later verify still refuses.
    assert!(h.pending.has_entry("a@x.io"));
    let again = h.verify_usecase().execute(input("a@x.io", &code)).await;
    assert!(matches!(again, Err(EventServiceError::OtpExpired)));
    assert!(h.repo.committed().is_empty());
}

#[tokio::test]
async fn three_wrong_codes_then_everything_is_throttled() {
    let h = Harness::new();
    h.register_usecase()
        .execute(solo_payload("a@x.io"))
        .await
        .unwrap();
    let code = h.mailer.last_otp().unwrap();
    let wrong = wrong_code(&code);

    for expected_left in [2u32, 1, 0] {
        let result = h.verify_usecase().execute(input("a@x.io", &wrong)).await;
        match result {
            Err(EventServiceError::OtpInvalid { attempts_left }) => {
                assert_eq!(attempts_left, expected_left);
            }
            Err(other) => panic!("expected OtpInvalid, got {other:?}"),
            Ok(_) => panic!("expected OtpInvalid, got success"),
        }
    }

    // Fourth attempt is throttled; so is the correct code inside the window.
    let fourth = h.verify_usecase().execute(input("a@x.io", &wrong)).await;
    assert!(matches!(fourth, Err(EventServiceError::RateLimited { .. })));
    let correct = h.verify_usecase().execute(input("a@x.io", &code)).await;
    assert!(matches!(correct, Err(EventServiceError::RateLimited { .. })));
    assert!(h.repo.committed().is_empty());
}

#[tokio::test]
async fn consumed_otp_cannot_be_replayed() {
    let h = Harness::new();
    h.register_usecase()
        .execute(solo_payload("a@x.io"))
        .await
        .unwrap();
    let code = h.mailer.last_otp().unwrap();

    h.verify_usecase()
        .execute(input("a@x.io", &code))
        .await
        .unwrap();
    let replay = h.verify_usecase().execute(input("a@x.io", &code)).await;
    assert!(matches!(replay, Err(EventServiceError::OtpExpired)));
}

#[tokio::test]
async fn verify_without_pending_payload_is_registration_expired() {
    let h = Harness::new();
    h.register_usecase()
        .execute(solo_payload("a@x.io"))
        .await
        .unwrap();
    let code = h.mailer.last_otp().unwrap();
    h.pending.remove("a@x.io");

    let result = h.verify_usecase().execute(input("a@x.io", &code)).await;
    assert!(matches!(
        result,
        Err(EventServiceError::RegistrationExpired)
    ));
}

#[tokio::test]
async fn email_committed_between_phases_conflicts_at_insert() {
    let h = Harness::new();
    h.register_usecase()
        .execute(solo_payload("a@x.io"))
        .await
        .unwrap();
    let code = h.mailer.last_otp().unwrap();
    // Same leader email lands durably before the OTP comes back.
    h.repo
        .seed(committed_team("HACK-001", "TEAM-ZZ99ZZ", "a@x.io"));

    let result = h.verify_usecase().execute(input("a@x.io", &code)).await;
    assert!(matches!(
        result,
        Err(EventServiceError::EmailAlreadyRegistered)
    ));
}

#[tokio::test]
async fn team_code_collision_re_mints_once() {
    let h = Harness::new();
    h.repo
        .seed(committed_team("HACK-900", "TEAM-TAKEN1", "seed@x.io"));
    h.register_usecase()
        .execute(solo_payload("a@x.io"))
        .await
        .unwrap();
    let code = h.mailer.last_otp().unwrap();

    let mut usecase = h.verify_usecase();
    usecase.mint = crate::helpers::ScriptedMint::with_codes(&["TEAM-TAKEN1", "TEAM-FRESH1"]);
    let mint = usecase.mint.clone();

    let output = usecase.execute(input("a@x.io", &code)).await.unwrap();
    assert_eq!(output.team.team.team_code, "TEAM-FRESH1");
    assert_eq!(mint.call_count(), 2, "exactly one extra mint call");
}

#[tokio::test]
async fn exhausted_code_budget_is_an_internal_error() {
    let h = Harness::new();
    h.repo
        .seed(committed_team("HACK-900", "TEAM-TAKEN1", "seed@x.io"));
    h.register_usecase()
        .execute(solo_payload("a@x.io"))
        .await
        .unwrap();
    let code = h.mailer.last_otp().unwrap();

    let mut usecase = h.verify_usecase();
    usecase.mint = crate::helpers::ScriptedMint::with_codes(&["TEAM-TAKEN1"; 8]);

    let result = usecase.execute(input("a@x.io", &code)).await;
    assert!(matches!(result, Err(EventServiceError::Internal(_))));
}

#[tokio::test]
async fn render_failure_defers_artifacts_but_keeps_the_commit() {
    let h = Harness::new();
    h.register_usecase()
        .execute(solo_payload("a@x.io"))
        .await
        .unwrap();
    let code = h.mailer.last_otp().unwrap();

    let mut usecase = h.verify_usecase();
    usecase.artifacts = MockArtifacts::broken();

    let output = usecase.execute(input("a@x.io", &code)).await.unwrap();
    assert!(output.artifacts_deferred);
    assert_eq!(h.repo.committed().len(), 1, "team stays committed");
    // No confirmation mail without a document.
    assert!(
        !h.mailer
            .sent_mail()
            .iter()
            .any(|mail| matches!(mail, SentMail::Confirmation { .. }))
    );
}

#[tokio::test]
async fn mail_failure_defers_artifacts_but_keeps_the_commit() {
    let h = Harness::new();
    h.register_usecase()
        .execute(solo_payload("a@x.io"))
        .await
        .unwrap();
    let code = h.mailer.last_otp().unwrap();

    let mut usecase = h.verify_usecase();
    usecase.mailer = MockMailer::unconfigured();

    let output = usecase.execute(input("a@x.io", &code)).await.unwrap();
    assert!(output.artifacts_deferred);
    assert_eq!(h.repo.committed().len(), 1);
    assert_eq!(h.artifacts.call_count(), 1);
}
