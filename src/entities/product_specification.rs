use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A named specification slot (e.g. "Metal", "Carat") declared per product type.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "product_specification")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub product_type_id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::entities::product_type::Entity",
        from = "Column::ProductTypeId",
        to = "crate::entities::product_type::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    ProductType,
    #[sea_orm(has_many = "crate::entities::product_specification_value::Entity")]
    Value,
}

impl Related<crate::entities::product_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
