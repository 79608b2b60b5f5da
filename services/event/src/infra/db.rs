use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};

use hackreg_event_schema::{team_members, teams};

use crate::domain::repository::{InsertTeamError, TeamRepository};
use crate::domain::types::{
    CheckInOutcome, EventStats, MemberRecord, TeamRecord, TeamWithMembers,
};
use crate::error::EventServiceError;

/// `TeamRepository` backed by PostgreSQL. Uniqueness of `team_id`,
/// `team_code` and `leader_email` is enforced by named unique indexes, not
/// application locks; conflicts are classified from the violation message.
#[derive(Clone)]
pub struct DbTeamRepository {
    pub db: DatabaseConnection,
}

impl TeamRepository for DbTeamRepository {
    async fn next_sequence(&self) -> Result<u64, EventServiceError> {
        let count = teams::Entity::find()
            .count(&self.db)
            .await
            .context("count committed teams")?;
        Ok(count + 1)
    }

    async fn find_by_leader_email(
        &self,
        email: &str,
    ) -> Result<Option<TeamWithMembers>, EventServiceError> {
        let team = teams::Entity::find()
            .filter(teams::Column::LeaderEmail.eq(email))
            .one(&self.db)
            .await
            .context("find team by leader email")?;
        self.with_members(team).await
    }

    async fn find_by_team_code(
        &self,
        team_code: &str,
    ) -> Result<Option<TeamWithMembers>, EventServiceError> {
        let team = teams::Entity::find()
            .filter(teams::Column::TeamCode.eq(team_code))
            .one(&self.db)
            .await
            .context("find team by team code")?;
        self.with_members(team).await
    }

    async fn find_by_team_id(
        &self,
        team_id: &str,
    ) -> Result<Option<TeamWithMembers>, EventServiceError> {
        let team = teams::Entity::find()
            .filter(teams::Column::TeamId.eq(team_id))
            .one(&self.db)
            .await
            .context("find team by team id")?;
        self.with_members(team).await
    }

    async fn insert_team(
        &self,
        team: &TeamRecord,
        members: &[MemberRecord],
    ) -> Result<(), InsertTeamError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| InsertTeamError::Db(anyhow::Error::new(e).context("begin transaction")))?;

        if let Err(e) = team_active_model(team).insert(&txn).await {
            txn.rollback().await.ok();
            return Err(classify_insert_error(e));
        }
        for member in members {
            if let Err(e) = member_active_model(team.id, member).insert(&txn).await {
                txn.rollback().await.ok();
                return Err(classify_insert_error(e));
            }
        }

        txn.commit()
            .await
            .map_err(|e| InsertTeamError::Db(anyhow::Error::new(e).context("commit team insert")))
    }

    async fn mark_checked_in(
        &self,
        team_code: &str,
        when: DateTime<Utc>,
    ) -> Result<CheckInOutcome, EventServiceError> {
        // Conditional update: only the caller that observes
        // attendance_status = false flips it. Everyone else re-reads.
        let result = teams::Entity::update_many()
            .col_expr(teams::Column::AttendanceStatus, Expr::value(true))
            .col_expr(teams::Column::CheckInTime, Expr::value(when))
            .filter(teams::Column::TeamCode.eq(team_code))
            .filter(teams::Column::AttendanceStatus.eq(false))
            .exec(&self.db)
            .await
            .context("mark team checked in")?;

        if result.rows_affected == 1 {
            return Ok(CheckInOutcome::CheckedIn { at: when });
        }

        let existing = teams::Entity::find()
            .filter(teams::Column::TeamCode.eq(team_code))
            .one(&self.db)
            .await
            .context("re-read team after contended check-in")?;
        match existing {
            Some(team) => Ok(CheckInOutcome::AlreadyCheckedIn {
                at: team.check_in_time,
            }),
            None => Ok(CheckInOutcome::NotFound),
        }
    }

    async fn stats(&self) -> Result<EventStats, EventServiceError> {
        let total_teams = teams::Entity::find()
            .count(&self.db)
            .await
            .context("count teams")?;
        let total_members = team_members::Entity::find()
            .count(&self.db)
            .await
            .context("count members")?;
        let checked_in_teams = teams::Entity::find()
            .filter(teams::Column::AttendanceStatus.eq(true))
            .count(&self.db)
            .await
            .context("count checked-in teams")?;
        let rows: Vec<(String, i64)> = teams::Entity::find()
            .select_only()
            .column(teams::Column::Domain)
            .column_as(teams::Column::Id.count(), "count")
            .group_by(teams::Column::Domain)
            .into_tuple()
            .all(&self.db)
            .await
            .context("count teams per domain")?;

        Ok(EventStats {
            total_teams,
            total_members,
            checked_in_teams,
            domain_distribution: rows
                .into_iter()
                .map(|(domain, count)| (domain, count.max(0) as u64))
                .collect(),
        })
    }
}

impl DbTeamRepository {
    async fn with_members(
        &self,
        team: Option<teams::Model>,
    ) -> Result<Option<TeamWithMembers>, EventServiceError> {
        let Some(team) = team else {
            return Ok(None);
        };
        let members = team_members::Entity::find()
            .filter(team_members::Column::TeamId.eq(team.id))
            .order_by_asc(team_members::Column::MemberIndex)
            .all(&self.db)
            .await
            .context("load team members")?;
        Ok(Some(TeamWithMembers {
            team: team_from_model(team),
            members: members.into_iter().map(member_from_model).collect(),
        }))
    }
}

fn classify_insert_error(err: DbErr) -> InsertTeamError {
    if let Some(SqlErr::UniqueConstraintViolation(message)) = err.sql_err() {
        if message.contains("idx_teams_leader_email") {
            return InsertTeamError::DuplicateEmail;
        }
        if message.contains("idx_teams_team_code")
            || message.contains("idx_team_members_participant_id")
        {
            return InsertTeamError::DuplicateCode;
        }
        if message.contains("idx_teams_team_id") {
            return InsertTeamError::DuplicateTeamId;
        }
    }
    InsertTeamError::Db(anyhow::Error::new(err).context("insert team"))
}

fn team_active_model(team: &TeamRecord) -> teams::ActiveModel {
    teams::ActiveModel {
        id: Set(team.id),
        team_id: Set(team.team_id.clone()),
        team_code: Set(team.team_code.clone()),
        team_name: Set(team.team_name.clone()),
        leader_name: Set(team.leader_name.clone()),
        leader_email: Set(team.leader_email.clone()),
        leader_phone: Set(team.leader_phone.clone()),
        college_name: Set(team.college_name.clone()),
        year: Set(team.year.clone()),
        domain: Set(team.domain.clone()),
        access_key: Set(team.access_key.clone()),
        attendance_status: Set(team.attendance_status),
        check_in_time: Set(team.check_in_time),
        created_at: Set(team.created_at),
    }
}

fn member_active_model(team_id: uuid::Uuid, member: &MemberRecord) -> team_members::ActiveModel {
    team_members::ActiveModel {
        id: Set(member.id),
        team_id: Set(team_id),
        member_index: Set(member.member_index),
        name: Set(member.name.clone()),
        email: Set(member.email.clone()),
        phone: Set(member.phone.clone()),
        participant_id: Set(member.participant_id.clone()),
        is_team_leader: Set(member.is_team_leader),
    }
}

fn team_from_model(model: teams::Model) -> TeamRecord {
    TeamRecord {
        id: model.id,
        team_id: model.team_id,
        team_code: model.team_code,
        team_name: model.team_name,
        leader_name: model.leader_name,
        leader_email: model.leader_email,
        leader_phone: model.leader_phone,
        college_name: model.college_name,
        year: model.year,
        domain: model.domain,
        access_key: model.access_key,
        attendance_status: model.attendance_status,
        check_in_time: model.check_in_time,
        created_at: model.created_at,
    }
}

fn member_from_model(model: team_members::Model) -> MemberRecord {
    MemberRecord {
        id: model.id,
        member_index: model.member_index,
        name: model.name,
        email: model.email,
        phone: model.phone,
        participant_id: model.participant_id,
        is_team_leader: model.is_team_leader,
    }
}
