use crate::common::errors::{Constraint, MachineResult};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, IntoActiveModel, QueryOrder, TransactionTrait,
    entity::prelude::*,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A biological strain; `parent_id` links it into a lineage tree
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "strains")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub pubmed_id: Option<i32>,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Parent,
}

impl ActiveModelBehavior for ActiveModel {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub async fn get_strain<C: ConnectionTrait>(db: &C, id: Uuid) -> MachineResult<Model> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| crate::not_found!("strain", id))
}

pub async fn create_strain<C: ConnectionTrait>(
    db: &C,
    name: &str,
    pubmed_id: Option<i32>,
    parent_id: Option<Uuid>,
) -> MachineResult<Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(crate::invalid_input!("name", "strain name must not be empty"));
    }
    // A new strain has no descendants, so any existing parent is safe
    if let Some(parent) = parent_id {
        get_strain(db, parent).await?;
    }

    let now = Utc::now();
    let strain = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        pubmed_id: Set(pubmed_id),
        parent_id: Set(parent_id),
        created_at: Set(now),
        last_updated: Set(now),
    }
    .insert(db)
    .await?;
    Ok(strain)
}

/// Re-parent a strain, refusing any link that would close a loop.
pub async fn set_parent<C>(db: &C, id: Uuid, parent_id: Option<Uuid>) -> MachineResult<Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let strain = get_strain(&txn, id).await?;

    if let Some(parent) = parent_id {
        let ancestry = lineage(&txn, parent).await?;
        if parent == id || ancestry.iter().any(|s| s.id == id) {
            return Err(crate::constraint_violation!(Constraint::StrainCycle));
        }
    }

    let mut active = strain.into_active_model();
    active.parent_id = Set(parent_id);
    active.last_updated = Set(Utc::now());
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

pub async fn children<C: ConnectionTrait>(db: &C, id: Uuid) -> MachineResult<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::ParentId.eq(id))
        .order_by_asc(Column::Name)
        .all(db)
        .await?)
}

/// The strain followed by its ancestors, root last.
pub async fn lineage<C: ConnectionTrait>(db: &C, id: Uuid) -> MachineResult<Vec<Model>> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut next = Some(id);

    while let Some(current) = next {
        if !seen.insert(current) {
            // Only reachable if rows were written around set_parent
            tracing::warn!("strain {current} appears twice in its own lineage");
            return Err(crate::constraint_violation!(Constraint::StrainCycle));
        }
        let strain = get_strain(db, current).await?;
        next = strain.parent_id;
        chain.push(strain);
    }

    Ok(chain)
}
