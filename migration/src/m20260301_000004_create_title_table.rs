use sea_orm_migration::prelude::*;

/// Creates the `title` table for reviewable works.
///
/// The category reference is weak: removing a category leaves its titles in
/// place with a null category (`ON DELETE SET NULL`).
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Title {
    Table,
    Id,
    Name,
    Year,
    Description,
    CategoryId,
}

#[derive(DeriveIden)]
enum Category {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Title::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Title::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Title::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Title::Year).integer().not_null())
                    .col(ColumnDef::new(Title::Description).text().null())
                    .col(ColumnDef::new(Title::CategoryId).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_title_category_id")
                            .from(Title::Table, Title::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Title::Table).to_owned())
            .await
    }
}
