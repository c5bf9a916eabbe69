//! Reads and guarded deletes over the product tables.
//!
//! The restrict / cascade rules are enforced here with explicit reference
//! counts inside the delete transaction rather than with FK actions, so the
//! behavior is the same on every backend sea-orm can sit on.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::Serialize;

use crate::entities::{
    product, product::Entity as ProductEntity, product_image,
    product_image::Entity as ProductImageEntity, product_specification,
    product_specification::Entity as SpecificationEntity, product_specification_value,
    product_specification_value::Entity as SpecificationValueEntity,
    product_type::Entity as ProductTypeEntity, wishlist_entry,
    wishlist_entry::Entity as WishlistEntity,
};
use crate::error::ApiError;

/// Price columns are `Decimal(5, 2)`.
pub fn max_price() -> Decimal {
    Decimal::new(99_999, 2)
}

#[derive(Debug, Serialize)]
pub struct SpecificationValueView {
    pub specification: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: product::Model,
    pub specifications: Vec<SpecificationValueView>,
    pub images: Vec<product_image::Model>,
}

pub struct Catalog {
    db: Arc<DatabaseConnection>,
}

impl Catalog {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Catalog { db }
    }

    /// Active products, newest first.
    pub async fn list_active_products(&self) -> Result<Vec<product::Model>, ApiError> {
        Ok(ProductEntity::find()
            .filter(product::Column::IsActive.eq(true))
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Exact slug lookup; inactive products are treated as absent.
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<product::Model, ApiError> {
        ProductEntity::find()
            .filter(product::Column::Slug.eq(slug))
            .filter(product::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("product \"{slug}\"")))
    }

    /// The product page: the row plus its named specifications and images.
    pub async fn product_detail(&self, slug: &str) -> Result<ProductDetail, ApiError> {
        let product = self.get_product_by_slug(slug).await?;

        let values = SpecificationValueEntity::find()
            .filter(product_specification_value::Column::ProductId.eq(product.id))
            .all(&*self.db)
            .await?;
        let spec_ids: Vec<i32> = values.iter().map(|v| v.specification_id).collect();
        let names: HashMap<i32, String> = SpecificationEntity::find()
            .filter(product_specification::Column::Id.is_in(spec_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|spec| (spec.id, spec.name))
            .collect();
        let specifications = values
            .into_iter()
            .map(|v| SpecificationValueView {
                specification: names
                    .get(&v.specification_id)
                    .cloned()
                    .unwrap_or_default(),
                value: v.value,
            })
            .collect();

        let images = ProductImageEntity::find()
            .filter(product_image::Column::ProductId.eq(product.id))
            .order_by_desc(product_image::Column::IsFeature)
            .order_by_asc(product_image::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(ProductDetail {
            product,
            specifications,
            images,
        })
    }

    /// Active products whose category is any of `category_ids`, newest first.
    pub async fn list_products_in_categories(
        &self,
        category_ids: Vec<i32>,
    ) -> Result<Vec<product::Model>, ApiError> {
        Ok(ProductEntity::find()
            .filter(product::Column::CategoryId.is_in(category_ids))
            .filter(product::Column::IsActive.eq(true))
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Restrict-on-delete: refused while products or specifications still
    /// point at the type.
    pub async fn delete_product_type(&self, id: i32) -> Result<(), ApiError> {
        let txn = self.db.begin().await?;

        let type_row = ProductTypeEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("product type {id}")))?;

        let products = ProductEntity::find()
            .filter(product::Column::ProductTypeId.eq(id))
            .count(&txn)
            .await?;
        let specifications = SpecificationEntity::find()
            .filter(product_specification::Column::ProductTypeId.eq(id))
            .count(&txn)
            .await?;
        if products > 0 || specifications > 0 {
            return Err(ApiError::HasActiveReferences(format!(
                "product type \"{}\" is referenced by {} product(s) and {} specification(s)",
                type_row.name, products, specifications
            )));
        }

        ProductTypeEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Restrict-on-delete: refused while any product still has a value for
    /// the specification.
    pub async fn delete_specification(&self, id: i32) -> Result<(), ApiError> {
        let txn = self.db.begin().await?;

        let spec = SpecificationEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("specification {id}")))?;

        let values = SpecificationValueEntity::find()
            .filter(product_specification_value::Column::SpecificationId.eq(id))
            .count(&txn)
            .await?;
        if values > 0 {
            return Err(ApiError::HasActiveReferences(format!(
                "specification \"{}\" is referenced by {} value(s)",
                spec.name, values
            )));
        }

        SpecificationEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Deletes a product together with its specification values, images and
    /// wishlist entries, in one transaction.
    pub async fn delete_product(&self, id: i32) -> Result<(), ApiError> {
        let txn = self.db.begin().await?;

        if ProductEntity::find_by_id(id).one(&txn).await?.is_none() {
            return Err(ApiError::NotFound(format!("product {id}")));
        }

        SpecificationValueEntity::delete_many()
            .filter(product_specification_value::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        ProductImageEntity::delete_many()
            .filter(product_image::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        WishlistEntity::delete_many()
            .filter(wishlist_entry::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        ProductEntity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        tracing::info!(product_id = id, "product deleted with dependents");
        Ok(())
    }
}
