use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Teams::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Teams::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Teams::TeamId).string().not_null())
                    .col(ColumnDef::new(Teams::TeamCode).string().not_null())
                    .col(ColumnDef::new(Teams::TeamName).string().not_null())
                    .col(ColumnDef::new(Teams::LeaderName).string().not_null())
                    .col(ColumnDef::new(Teams::LeaderEmail).string().not_null())
                    .col(ColumnDef::new(Teams::LeaderPhone).string().not_null())
                    .col(ColumnDef::new(Teams::CollegeName).string().not_null())
                    .col(ColumnDef::new(Teams::Year).string().not_null())
                    .col(ColumnDef::new(Teams::Domain).string().not_null())
                    .col(ColumnDef::new(Teams::AccessKey).string().not_null())
                    .col(
                        ColumnDef::new(Teams::AttendanceStatus)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Teams::CheckInTime).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Teams::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Named unique indexes: the repository classifies insert conflicts by
        // matching these names in the constraint-violation message.
        manager
            .create_index(
                Index::create()
                    .table(Teams::Table)
                    .col(Teams::TeamId)
                    .name("idx_teams_team_id")
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Teams::Table)
                    .col(Teams::TeamCode)
                    .name("idx_teams_team_code")
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Teams::Table)
                    .col(Teams::LeaderEmail)
                    .name("idx_teams_leader_email")
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Teams::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Teams {
    Table,
    Id,
    TeamId,
    TeamCode,
    TeamName,
    LeaderName,
    LeaderEmail,
    LeaderPhone,
    CollegeName,
    Year,
    Domain,
    AccessKey,
    AttendanceStatus,
    CheckInTime,
    CreatedAt,
}
