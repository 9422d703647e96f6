use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "phenotype_wells")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub phenotype_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub well_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::phenotypes::models::Entity",
        from = "Column::PhenotypeId",
        to = "crate::phenotypes::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Phenotypes,
    #[sea_orm(
        belongs_to = "crate::plates::wells::models::Entity",
        from = "Column::WellId",
        to = "crate::plates::wells::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Wells,
}

impl Related<crate::phenotypes::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Phenotypes.def()
    }
}

impl Related<crate::plates::wells::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wells.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
