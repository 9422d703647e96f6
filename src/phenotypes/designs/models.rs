use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "phenotype_designs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub phenotype_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub design_id: Uuid,
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
        belongs_to = "crate::designs::models::Entity",
        from = "Column::DesignId",
        to = "crate::designs::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Designs,
}

impl Related<crate::phenotypes::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Phenotypes.def()
    }
}

impl Related<crate::designs::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Designs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
