use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Phenotypes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Phenotypes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Phenotypes::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Phenotypes::Name).string().not_null())
                    .col(
                        ColumnDef::new(Phenotypes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Phenotypes::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phenotypes_project_id")
                            .from(Phenotypes::Table, Phenotypes::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PhenotypeWells::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PhenotypeWells::PhenotypeId).uuid().not_null())
                    .col(ColumnDef::new(PhenotypeWells::WellId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(PhenotypeWells::PhenotypeId)
                            .col(PhenotypeWells::WellId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phenotype_wells_phenotype_id")
                            .from(PhenotypeWells::Table, PhenotypeWells::PhenotypeId)
                            .to(Phenotypes::Table, Phenotypes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phenotype_wells_well_id")
                            .from(PhenotypeWells::Table, PhenotypeWells::WellId)
                            .to(Wells::Table, Wells::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PhenotypeDesigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PhenotypeDesigns::PhenotypeId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PhenotypeDesigns::DesignId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(PhenotypeDesigns::PhenotypeId)
                            .col(PhenotypeDesigns::DesignId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phenotype_designs_phenotype_id")
                            .from(PhenotypeDesigns::Table, PhenotypeDesigns::PhenotypeId)
                            .to(Phenotypes::Table, Phenotypes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phenotype_designs_design_id")
                            .from(PhenotypeDesigns::Table, PhenotypeDesigns::DesignId)
                            .to(Designs::Table, Designs::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PhenotypeDesigns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PhenotypeWells::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Phenotypes::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Wells {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Designs {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Phenotypes {
    Table,
    Id,
    ProjectId,
    Name,
    CreatedAt,
    LastUpdated,
}

#[derive(DeriveIden)]
enum PhenotypeWells {
    Table,
    PhenotypeId,
    WellId,
}

#[derive(DeriveIden)]
enum PhenotypeDesigns {
    Table,
    PhenotypeId,
    DesignId,
}
