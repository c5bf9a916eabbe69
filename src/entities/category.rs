use sea_orm::entity::prelude::*;
use serde::Serialize;

/// One node of the category forest. `lft`/`rgt`/`depth`/`tree_id` are the
/// nested-interval bookkeeping, written only by `tree::CategoryTree`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(indexed)]
    pub parent_id: Option<i32>,
    #[sea_orm(default = true)]
    pub is_active: bool,
    #[sea_orm(indexed)]
    pub lft: i32,
    #[sea_orm(indexed)]
    pub rgt: i32,
    pub depth: i32,
    #[sea_orm(indexed)]
    pub tree_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Parent,
    #[sea_orm(has_many = "crate::entities::product::Entity")]
    Product,
}

impl Related<crate::entities::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
