use sea_orm::entity::prelude::*;

/// A committed team registration. Created once OTP verification succeeds;
/// only the check-in flow mutates it afterwards (attendance columns).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Sequential public id, e.g. `HACK-001`.
    pub team_id: String,
    /// Opaque QR/check-in key, e.g. `TEAM-K9X2V5`.
    pub team_code: String,
    pub team_name: String,
    pub leader_name: String,
    pub leader_email: String,
    pub leader_phone: String,
    pub college_name: String,
    pub year: String,
    pub domain: String,
    /// Secret paired with `team_id` for card re-download.
    pub access_key: String,
    pub attendance_status: bool,
    pub check_in_time: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::team_members::Entity")]
    TeamMembers,
}

impl Related<super::team_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeamMembers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
