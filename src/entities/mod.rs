pub mod category;
pub mod product;
pub mod product_image;
pub mod product_specification;
pub mod product_specification_value;
pub mod product_type;
pub mod wishlist_entry;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Schema};

use crate::entities::{
    category::Entity as Category, product::Entity as Product,
    product_image::Entity as ProductImage, product_specification::Entity as ProductSpecification,
    product_specification_value::Entity as ProductSpecificationValue,
    product_type::Entity as ProductType, wishlist_entry::Entity as WishlistEntry,
};

/// Creates all tables from the entity definitions. Referenced tables go first
/// so the FK declarations resolve.
pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    let create_category = schema.create_table_from_entity(Category);
    let create_product_type = schema.create_table_from_entity(ProductType);
    let create_specification = schema.create_table_from_entity(ProductSpecification);
    let create_product = schema.create_table_from_entity(Product);
    let create_specification_value = schema.create_table_from_entity(ProductSpecificationValue);
    let create_image = schema.create_table_from_entity(ProductImage);
    let create_wishlist = schema.create_table_from_entity(WishlistEntry);

    for statement in [
        create_category,
        create_product_type,
        create_specification,
        create_product,
        create_specification_value,
        create_image,
        create_wishlist,
    ] {
        db.execute(db.get_database_backend().build(&statement))
            .await?;
    }

    Ok(())
}
