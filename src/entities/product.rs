use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Prices are stored as `Decimal(5, 2)`, so 999.99 is the hard ceiling.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub product_type_id: i32,
    #[sea_orm(indexed)]
    pub category_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub regular_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub discount_price: Decimal,
    #[sea_orm(default = true)]
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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
    #[sea_orm(
        belongs_to = "crate::entities::category::Entity",
        from = "Column::CategoryId",
        to = "crate::entities::category::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Category,
    #[sea_orm(has_many = "crate::entities::product_specification_value::Entity")]
    SpecificationValue,
    #[sea_orm(has_many = "crate::entities::product_image::Entity")]
    Image,
    #[sea_orm(has_many = "crate::entities::wishlist_entry::Entity")]
    WishlistEntry,
}

impl Related<crate::entities::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<crate::entities::product_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductType.def()
    }
}

impl Related<crate::entities::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Image.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
