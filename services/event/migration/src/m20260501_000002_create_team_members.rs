use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TeamMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeamMembers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TeamMembers::TeamId).uuid().not_null())
                    .col(
                        ColumnDef::new(TeamMembers::MemberIndex)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TeamMembers::Name).string().not_null())
                    .col(ColumnDef::new(TeamMembers::Email).string().not_null())
                    .col(ColumnDef::new(TeamMembers::Phone).string().not_null())
                    .col(
                        ColumnDef::new(TeamMembers::ParticipantId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeamMembers::IsTeamLeader)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TeamMembers::Table, TeamMembers::TeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(TeamMembers::Table)
                    .col(TeamMembers::TeamId)
                    .name("idx_team_members_team_id")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(TeamMembers::Table)
                    .col(TeamMembers::ParticipantId)
                    .name("idx_team_members_participant_id")
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TeamMembers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TeamMembers {
    Table,
    Id,
    TeamId,
    MemberIndex,
    Name,
    Email,
    Phone,
    ParticipantId,
    IsTeamLeader,
}

#[derive(Iden)]
enum Teams {
    Table,
    Id,
}
