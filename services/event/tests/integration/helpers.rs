use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use hackreg_event::clock::{Clock, ManualClock};
use hackreg_event::domain::repository::{
    ArtifactPort, CodeMint, InsertTeamError, MailDelivery, MailPort, TeamRepository,
};
use hackreg_event::domain::types::{
    CheckInOutcome, EventStats, MemberPayload, MemberRecord, RegistrationPayload, TeamRecord,
    TeamWithMembers,
};
use hackreg_event::error::EventServiceError;
use hackreg_event::events::EventBus;
use hackreg_event::mint;
use hackreg_event::otp::OtpStore;
use hackreg_event::pending::PendingStore;
use hackreg_event::usecase::checkin::CheckInUseCase;
use hackreg_event::usecase::register::RegisterUseCase;
use hackreg_event::usecase::verify::VerifyOtpUseCase;

// ── MockTeamRepo ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockTeamRepo {
    pub teams: Arc<Mutex<Vec<TeamWithMembers>>>,
}

impl MockTeamRepo {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn seed(&self, found: TeamWithMembers) {
        self.teams.lock().unwrap().push(found);
    }

    pub fn committed(&self) -> Vec<TeamWithMembers> {
        self.teams.lock().unwrap().clone()
    }
}

impl TeamRepository for MockTeamRepo {
    async fn next_sequence(&self) -> Result<u64, EventServiceError> {
        Ok(self.teams.lock().unwrap().len() as u64 + 1)
    }

    async fn find_by_leader_email(
        &self,
        email: &str,
    ) -> Result<Option<TeamWithMembers>, EventServiceError> {
        Ok(self
            .teams
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.team.leader_email == email)
            .cloned())
    }

    async fn find_by_team_code(
        &self,
        team_code: &str,
    ) -> Result<Option<TeamWithMembers>, EventServiceError> {
        Ok(self
            .teams
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.team.team_code == team_code)
            .cloned())
    }

    async fn find_by_team_id(
        &self,
        team_id: &str,
    ) -> Result<Option<TeamWithMembers>, EventServiceError> {
        Ok(self
            .teams
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.team.team_id == team_id)
            .cloned())
    }

    async fn insert_team(
        &self,
        team: &TeamRecord,
        members: &[MemberRecord],
    ) -> Result<(), InsertTeamError> {
        let mut teams = self.teams.lock().unwrap();
        if teams
            .iter()
            .any(|t| t.team.leader_email == team.leader_email)
        {
            return Err(InsertTeamError::DuplicateEmail);
        }
        if teams.iter().any(|t| t.team.team_code == team.team_code) {
            return Err(InsertTeamError::DuplicateCode);
        }
        if teams.iter().any(|t| t.team.team_id == team.team_id) {
            return Err(InsertTeamError::DuplicateTeamId);
        }
        teams.push(TeamWithMembers {
            team: team.clone(),
            members: members.to_vec(),
        });
        Ok(())
    }

    async fn mark_checked_in(
        &self,
        team_code: &str,
        when: DateTime<Utc>,
    ) -> Result<CheckInOutcome, EventServiceError> {
        let mut teams = self.teams.lock().unwrap();
        match teams.iter_mut().find(|t| t.team.team_code == team_code) {
            None => Ok(CheckInOutcome::NotFound),
            Some(found) if found.team.attendance_status => Ok(CheckInOutcome::AlreadyCheckedIn {
                at: found.team.check_in_time,
            }),
            Some(found) => {
                found.team.attendance_status = true;
                found.team.check_in_time = Some(when);
                Ok(CheckInOutcome::CheckedIn { at: when })
            }
        }
    }

    async fn stats(&self) -> Result<EventStats, EventServiceError> {
        let teams = self.teams.lock().unwrap();
        let mut stats = EventStats {
            total_teams: teams.len() as u64,
            ..EventStats::default()
        };
        for found in teams.iter() {
            stats.total_members += found.members.len() as u64;
            if found.team.attendance_status {
                stats.checked_in_teams += 1;
            }
            *stats
                .domain_distribution
                .entry(found.team.domain.clone())
                .or_default() += 1;
        }
        Ok(stats)
    }
}

// ── MockMailer ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum SentMail {
    Otp {
        to: String,
        code: String,
    },
    Confirmation {
        to: String,
        team_id: String,
        attachment: PathBuf,
        attachment_existed: bool,
    },
}

#[derive(Clone)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<SentMail>>>,
    pub outcome: MailDelivery,
}

impl MockMailer {
    pub fn delivering() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            outcome: MailDelivery::Sent,
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            outcome: MailDelivery::Unconfigured,
        }
    }

    pub fn sent_mail(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    /// The code carried by the most recent OTP mail.
    pub fn last_otp(&self) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|mail| match mail {
                SentMail::Otp { code, .. } => Some(code.clone()),
                _ => None,
            })
    }
}

impl MailPort for MockMailer {
    async fn send_otp(&self, to: &str, code: &str, _expires_in_secs: u64) -> MailDelivery {
        if self.outcome == MailDelivery::Unconfigured {
            return MailDelivery::Unconfigured;
        }
        self.sent.lock().unwrap().push(SentMail::Otp {
            to: to.to_owned(),
            code: code.to_owned(),
        });
        self.outcome
    }

    async fn send_confirmation(
        &self,
        team: &TeamRecord,
        _members: &[MemberRecord],
        document: &std::path::Path,
    ) -> MailDelivery {
        if self.outcome == MailDelivery::Unconfigured {
            return MailDelivery::Unconfigured;
        }
        self.sent.lock().unwrap().push(SentMail::Confirmation {
            to: team.leader_email.clone(),
            team_id: team.team_id.clone(),
            attachment: document.to_path_buf(),
            attachment_existed: document.exists(),
        });
        self.outcome
    }
}

// ── MockArtifacts ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockArtifacts {
    pub calls: Arc<Mutex<u32>>,
    pub fail: bool,
}

impl MockArtifacts {
    pub fn working() -> Self {
        Self {
            calls: Arc::new(Mutex::new(0)),
            fail: false,
        }
    }

    pub fn broken() -> Self {
        Self {
            calls: Arc::new(Mutex::new(0)),
            fail: true,
        }
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl ArtifactPort for MockArtifacts {
    async fn generate_id_cards(
        &self,
        team: &TeamRecord,
        _members: &[MemberRecord],
    ) -> anyhow::Result<PathBuf> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            anyhow::bail!("card font unavailable");
        }
        let path = std::env::temp_dir().join(format!(
            "hackreg-test-{}-{}.pdf",
            team.team_id,
            Uuid::new_v4()
        ));
        std::fs::write(&path, b"%PDF-1.4 test document")?;
        Ok(path)
    }
}

// ── ScriptedMint ─────────────────────────────────────────────────────────────

/// Mint that hands out queued team codes first, then falls back to random
/// ones, counting every call.
#[derive(Clone, Default)]
pub struct ScriptedMint {
    pub queued: Arc<Mutex<VecDeque<String>>>,
    pub calls: Arc<Mutex<u32>>,
}

impl ScriptedMint {
    pub fn random() -> Self {
        Self::default()
    }

    pub fn with_codes(codes: &[&str]) -> Self {
        Self {
            queued: Arc::new(Mutex::new(
                codes.iter().map(|c| (*c).to_owned()).collect(),
            )),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl CodeMint for ScriptedMint {
    fn team_code(&self) -> String {
        *self.calls.lock().unwrap() += 1;
        self.queued
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(mint::team_code)
    }

    fn access_key(&self) -> String {
        mint::access_key()
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

/// Everything both registration phases share, wired to mocks and a manual
/// clock.
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub otp: Arc<OtpStore>,
    pub pending: Arc<PendingStore>,
    pub repo: MockTeamRepo,
    pub mailer: MockMailer,
    pub artifacts: MockArtifacts,
    pub mint: ScriptedMint,
    pub events: EventBus,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let otp = Arc::new(OtpStore::new(clock.clone() as Arc<dyn Clock>));
        let pending = Arc::new(PendingStore::new(clock.clone() as Arc<dyn Clock>));
        Self {
            clock,
            otp,
            pending,
            repo: MockTeamRepo::empty(),
            mailer: MockMailer::delivering(),
            artifacts: MockArtifacts::working(),
            mint: ScriptedMint::random(),
            events: EventBus::new(16),
        }
    }

    pub fn register_usecase(&self) -> RegisterUseCase<MockTeamRepo, MockMailer> {
        RegisterUseCase {
            teams: self.repo.clone(),
            mailer: self.mailer.clone(),
            otp: self.otp.clone(),
            pending: self.pending.clone(),
            dev_mode: false,
            max_team_size: 50,
        }
    }

    pub fn verify_usecase(
        &self,
    ) -> VerifyOtpUseCase<MockTeamRepo, MockMailer, MockArtifacts, ScriptedMint> {
        VerifyOtpUseCase {
            teams: self.repo.clone(),
            mailer: self.mailer.clone(),
            artifacts: self.artifacts.clone(),
            mint: self.mint.clone(),
            otp: self.otp.clone(),
            pending: self.pending.clone(),
            clock: self.clock.clone() as Arc<dyn Clock>,
            team_id_prefix: "HACK".to_owned(),
        }
    }

    pub fn checkin_usecase(&self) -> CheckInUseCase<MockTeamRepo> {
        CheckInUseCase {
            teams: self.repo.clone(),
            events: self.events.clone(),
            clock: self.clock.clone() as Arc<dyn Clock>,
        }
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn member_payload(name: &str, email: &str, leader: bool) -> MemberPayload {
    MemberPayload {
        name: name.to_owned(),
        email: email.to_owned(),
        phone: "9876543210".to_owned(),
        is_team_leader: leader,
    }
}

pub fn solo_payload(email: &str) -> RegistrationPayload {
    RegistrationPayload {
        team_name: "Solo".to_owned(),
        leader_name: "A Tester".to_owned(),
        leader_email: email.to_owned(),
        leader_phone: "9876543210".to_owned(),
        college_name: "Analytical Engine Institute".to_owned(),
        year: "3rd Year".to_owned(),
        domain: "AI".to_owned(),
        team_members: vec![member_payload("A Tester", email, true)],
        terms_accepted: true,
    }
}

pub fn committed_team(team_id: &str, team_code: &str, email: &str) -> TeamWithMembers {
    let team = TeamRecord {
        id: Uuid::new_v4(),
        team_id: team_id.to_owned(),
        team_code: team_code.to_owned(),
        team_name: "Seeded".to_owned(),
        leader_name: "Seed Leader".to_owned(),
        leader_email: email.to_owned(),
        leader_phone: "9876543210".to_owned(),
        college_name: "Analytical Engine Institute".to_owned(),
        year: "2nd Year".to_owned(),
        domain: "IoT".to_owned(),
        access_key: mint::access_key(),
        attendance_status: false,
        check_in_time: None,
        created_at: Utc::now(),
    };
    let members = vec![MemberRecord {
        id: Uuid::new_v4(),
        member_index: 0,
        name: "Seed Leader".to_owned(),
        email: email.to_owned(),
        phone: "9876543210".to_owned(),
        participant_id: format!("{team_code}-000"),
        is_team_leader: true,
    }];
    TeamWithMembers { team, members }
}

/// A 6-digit code guaranteed to differ from `code`.
pub fn wrong_code(code: &str) -> String {
    if code == "000000" {
        "000001".to_owned()
    } else {
        "000000".to_owned()
    }
}
