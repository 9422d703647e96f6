use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn timestamps(table: &mut TableCreateStatement) {
    table
        .col(
            ColumnDef::new(Alias::new("created_at"))
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(Alias::new("last_updated"))
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        );
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Projects
        let mut projects = Table::create()
            .table(Projects::Table)
            .if_not_exists()
            .col(ColumnDef::new(Projects::Id).uuid().not_null().primary_key())
            .col(
                ColumnDef::new(Projects::Name)
                    .string()
                    .not_null()
                    .unique_key(),
            )
            .col(ColumnDef::new(Projects::Description).text())
            .to_owned();
        timestamps(&mut projects);
        manager.create_table(projects).await?;

        // Plates: no two plates in the same project can share a name
        let mut plates = Table::create()
            .table(Plates::Table)
            .if_not_exists()
            .col(ColumnDef::new(Plates::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Plates::ProjectId).uuid().not_null())
            .col(ColumnDef::new(Plates::Name).string().not_null())
            .col(ColumnDef::new(Plates::DataTable).string())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_plates_project_id")
                    .from(Plates::Table, Plates::ProjectId)
                    .to(Projects::Table, Projects::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .index(
                Index::create()
                    .name("plates_name_project_unique")
                    .col(Plates::Name)
                    .col(Plates::ProjectId)
                    .unique(),
            )
            .to_owned();
        timestamps(&mut plates);
        manager.create_table(plates).await?;

        let mut wells = Table::create()
            .table(Wells::Table)
            .if_not_exists()
            .col(ColumnDef::new(Wells::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Wells::PlateId).uuid().not_null())
            .col(ColumnDef::new(Wells::PlateNumber).integer().not_null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_wells_plate_id")
                    .from(Wells::Table, Wells::PlateId)
                    .to(Plates::Table, Plates::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .to_owned();
        timestamps(&mut wells);
        manager.create_table(wells).await?;

        let mut designs = Table::create()
            .table(Designs::Table)
            .if_not_exists()
            .col(ColumnDef::new(Designs::Id).uuid().not_null().primary_key())
            .col(
                ColumnDef::new(Designs::Name)
                    .string()
                    .not_null()
                    .unique_key(),
            )
            .col(
                ColumnDef::new(Designs::DesignType)
                    .string()
                    .not_null()
                    .default("str"),
            )
            .col(ColumnDef::new(Designs::Description).text())
            .col(ColumnDef::new(Designs::Protocol).text())
            .to_owned();
        timestamps(&mut designs);
        manager.create_table(designs).await?;

        // Each well holds at most one value of any single design
        let mut design_values = Table::create()
            .table(DesignValues::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(DesignValues::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(DesignValues::DesignId).uuid().not_null())
            .col(ColumnDef::new(DesignValues::WellId).uuid().not_null())
            .col(ColumnDef::new(DesignValues::Value).text().not_null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_design_values_design_id")
                    .from(DesignValues::Table, DesignValues::DesignId)
                    .to(Designs::Table, Designs::Id)
                    .on_delete(ForeignKeyAction::Restrict)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_design_values_well_id")
                    .from(DesignValues::Table, DesignValues::WellId)
                    .to(Wells::Table, Wells::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .index(
                Index::create()
                    .name("design_values_well_design_unique")
                    .col(DesignValues::WellId)
                    .col(DesignValues::DesignId)
                    .unique(),
            )
            .to_owned();
        timestamps(&mut design_values);
        manager.create_table(design_values).await?;

        let mut chemicals = Table::create()
            .table(Chemicals::Table)
            .if_not_exists()
            .col(ColumnDef::new(Chemicals::Id).uuid().not_null().primary_key())
            .col(
                ColumnDef::new(Chemicals::Name)
                    .string()
                    .not_null()
                    .unique_key(),
            )
            .col(ColumnDef::new(Chemicals::Abbreviation).string().unique_key())
            .to_owned();
        timestamps(&mut chemicals);
        manager.create_table(chemicals).await?;

        // Each well holds at most one quantity of any single chemical
        let mut quantities = Table::create()
            .table(ChemicalQuantities::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(ChemicalQuantities::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(
                ColumnDef::new(ChemicalQuantities::ChemicalId)
                    .uuid()
                    .not_null(),
            )
            .col(ColumnDef::new(ChemicalQuantities::WellId).uuid().not_null())
            .col(
                ColumnDef::new(ChemicalQuantities::QuantityType)
                    .string()
                    .not_null(),
            )
            .col(ColumnDef::new(ChemicalQuantities::Value).double().not_null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_chemical_quantities_chemical_id")
                    .from(ChemicalQuantities::Table, ChemicalQuantities::ChemicalId)
                    .to(Chemicals::Table, Chemicals::Id)
                    .on_delete(ForeignKeyAction::Restrict)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_chemical_quantities_well_id")
                    .from(ChemicalQuantities::Table, ChemicalQuantities::WellId)
                    .to(Wells::Table, Wells::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .index(
                Index::create()
                    .name("chemical_quantities_well_chemical_unique")
                    .col(ChemicalQuantities::WellId)
                    .col(ChemicalQuantities::ChemicalId)
                    .unique(),
            )
            .to_owned();
        timestamps(&mut quantities);
        manager.create_table(quantities).await?;

        let mut measurements = Table::create()
            .table(Measurements::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(Measurements::Id)
                    .uuid()
                    .not_null()
                    .primary_key(),
            )
            .col(ColumnDef::new(Measurements::WellId).uuid().not_null())
            .col(ColumnDef::new(Measurements::Time).double().not_null())
            .col(ColumnDef::new(Measurements::Value).double().not_null())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_measurements_well_id")
                    .from(Measurements::Table, Measurements::WellId)
                    .to(Wells::Table, Wells::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .to_owned();
        timestamps(&mut measurements);
        manager.create_table(measurements).await?;

        // Parent links are validated by the writer, the schema only keeps them referential
        let mut strains = Table::create()
            .table(Strains::Table)
            .if_not_exists()
            .col(ColumnDef::new(Strains::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Strains::Name).string().not_null())
            .col(ColumnDef::new(Strains::PubmedId).integer())
            .col(ColumnDef::new(Strains::ParentId).uuid())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_strains_parent_id")
                    .from(Strains::Table, Strains::ParentId)
                    .to(Strains::Table, Strains::Id)
                    .on_delete(ForeignKeyAction::SetNull)
                    .on_update(ForeignKeyAction::NoAction),
            )
            .to_owned();
        timestamps(&mut strains);
        manager.create_table(strains).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_wells_plate_id")
                    .table(Wells::Table)
                    .col(Wells::PlateId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_design_values_design_id")
                    .table(DesignValues::Table)
                    .col(DesignValues::DesignId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chemical_quantities_chemical_id")
                    .table(ChemicalQuantities::Table)
                    .col(ChemicalQuantities::ChemicalId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_measurements_well_id")
                    .table(Measurements::Table)
                    .col(Measurements::WellId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Strains::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Measurements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChemicalQuantities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Chemicals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DesignValues::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Designs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Wells::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Plates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum Plates {
    Table,
    Id,
    ProjectId,
    Name,
    DataTable,
}

#[derive(DeriveIden)]
enum Wells {
    Table,
    Id,
    PlateId,
    PlateNumber,
}

#[derive(DeriveIden)]
enum Designs {
    Table,
    Id,
    Name,
    DesignType,
    Description,
    Protocol,
}

#[derive(DeriveIden)]
enum DesignValues {
    Table,
    Id,
    DesignId,
    WellId,
    Value,
}

#[derive(DeriveIden)]
enum Chemicals {
    Table,
    Id,
    Name,
    Abbreviation,
}

#[derive(DeriveIden)]
enum ChemicalQuantities {
    Table,
    Id,
    ChemicalId,
    WellId,
    QuantityType,
    Value,
}

#[derive(DeriveIden)]
enum Measurements {
    Table,
    Id,
    WellId,
    Time,
    Value,
}

#[derive(DeriveIden)]
enum Strains {
    Table,
    Id,
    Name,
    PubmedId,
    ParentId,
}
