// ABOUTME: Initial migration creating reference types, principals, targets and link tables
// ABOUTME: Link tables carry composite unique keys but no SQL foreign keys, so deletes never cascade

use sea_orm_migration::prelude::*;

/// The four reference tables share one shape.
pub const TYPE_TABLES: [&str; 4] = [
    "database_type",
    "connection_type",
    "server_type",
    "function_type",
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in TYPE_TABLES {
            manager
                .create_table(
                    Table::create()
                        .table(Alias::new(name))
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TypeRecord::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(TypeRecord::Description).string_len(255).not_null().unique_key())
                        .col(ColumnDef::new(TypeRecord::CreationDate).big_integer().not_null())
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Groups::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Groups::Description).string_len(255).not_null().unique_key())
                    .col(ColumnDef::new(Groups::CreationDate).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Users::Name).string_len(255).not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::CreationDate).big_integer().not_null())
                    .col(ColumnDef::new(Users::UpdateDate).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserGroup::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserGroup::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(UserGroup::GroupId).integer().not_null())
                    .col(ColumnDef::new(UserGroup::UserId).integer().not_null())
                    .index(
                        Index::create()
                            .name("idx_user_group_pair")
                            .table(UserGroup::Table)
                            .col(UserGroup::GroupId)
                            .col(UserGroup::UserId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FunctionPermission::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FunctionPermission::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FunctionPermission::GroupId).integer().not_null())
                    .col(ColumnDef::new(FunctionPermission::FunctionId).integer().not_null())
                    .index(
                        Index::create()
                            .name("idx_function_permission_pair")
                            .table(FunctionPermission::Table)
                            .col(FunctionPermission::GroupId)
                            .col(FunctionPermission::FunctionId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Server::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Server::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Server::Description).string_len(50).not_null())
                    .col(ColumnDef::new(Server::Host).string_len(50).not_null())
                    .col(ColumnDef::new(Server::Port).integer().not_null())
                    .col(ColumnDef::new(Server::ServerTypeId).integer().not_null())
                    .col(ColumnDef::new(Server::ConnectionTypeId).integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ServerPermission::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServerPermission::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServerPermission::GroupId).integer().not_null())
                    .col(ColumnDef::new(ServerPermission::ServerId).integer().not_null())
                    .index(
                        Index::create()
                            .name("idx_server_permission_pair")
                            .table(ServerPermission::Table)
                            .col(ServerPermission::GroupId)
                            .col(ServerPermission::ServerId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Database::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Database::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Database::Description).string_len(50).not_null())
                    .col(ColumnDef::new(Database::Host).string_len(50).not_null())
                    .col(ColumnDef::new(Database::Port).integer().not_null())
                    .col(ColumnDef::new(Database::Sid).string_len(50).not_null())
                    .col(ColumnDef::new(Database::DatabaseTypeId).integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Login::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Login::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Login::User).string_len(255).not_null())
                    .col(ColumnDef::new(Login::Password).text().not_null())
                    .col(ColumnDef::new(Login::ConnectionTypeId).integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ConnectionLogin::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConnectionLogin::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ConnectionLogin::LoginId).integer().not_null())
                    .col(ColumnDef::new(ConnectionLogin::ConnectionId).integer().not_null())
                    .index(
                        Index::create()
                            .name("idx_connection_login_pair")
                            .table(ConnectionLogin::Table)
                            .col(ConnectionLogin::LoginId)
                            .col(ConnectionLogin::ConnectionId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConnectionLogin::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Login::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Database::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ServerPermission::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Server::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FunctionPermission::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserGroup::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;

        for name in TYPE_TABLES {
            manager
                .drop_table(Table::drop().table(Alias::new(name)).to_owned())
                .await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
enum TypeRecord {
    Id,
    Description,
    CreationDate,
}

#[derive(DeriveIden)]
enum Groups {
    Table,
    Id,
    Description,
    CreationDate,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    PasswordHash,
    CreationDate,
    UpdateDate,
}

#[derive(DeriveIden)]
enum UserGroup {
    Table,
    Id,
    GroupId,
    UserId,
}

#[derive(DeriveIden)]
enum FunctionPermission {
    Table,
    Id,
    GroupId,
    FunctionId,
}

#[derive(DeriveIden)]
enum Server {
    Table,
    Id,
    Description,
    Host,
    Port,
    ServerTypeId,
    ConnectionTypeId,
}

#[derive(DeriveIden)]
enum ServerPermission {
    Table,
    Id,
    GroupId,
    ServerId,
}

#[derive(DeriveIden)]
enum Database {
    Table,
    Id,
    Description,
    Host,
    Port,
    Sid,
    DatabaseTypeId,
}

#[derive(DeriveIden)]
enum Login {
    Table,
    Id,
    User,
    Password,
    ConnectionTypeId,
}

#[derive(DeriveIden)]
enum ConnectionLogin {
    Table,
    Id,
    LoginId,
    ConnectionId,
}
