//! Category forest stored as flat rows with nested-interval bookkeeping
//! (`lft`/`rgt`/`depth`/`tree_id`): a node's subtree is the rows of the same
//! tree whose bounds fall inside its own, one contiguous range scan. Every
//! structural mutation re-derives the bounds in a renumbering pass inside the
//! mutation's transaction, serialized behind one async mutex.

use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tokio::sync::Mutex;

use crate::entities::{
    category, category::Entity as CategoryEntity, product, product::Entity as ProductEntity,
};
use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i32>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub is_active: Option<bool>,
}

pub struct CategoryTree {
    db: Arc<DatabaseConnection>,
    write_lock: Mutex<()>,
}

impl CategoryTree {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        CategoryTree {
            db,
            write_lock: Mutex::new(()),
        }
    }

    /// Inserts a category under `parent_id`, or as a new root. Siblings
    /// always sort by `(name, id)`, never by insertion order.
    pub async fn insert(&self, new: NewCategory) -> Result<category::Model, ApiError> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        if CategoryEntity::find()
            .filter(category::Column::Name.eq(new.name.as_str()))
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(ApiError::DuplicateName(new.name));
        }
        if CategoryEntity::find()
            .filter(category::Column::Slug.eq(new.slug.as_str()))
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(ApiError::DuplicateSlug(new.slug));
        }
        if let Some(parent_id) = new.parent_id {
            if CategoryEntity::find_by_id(parent_id).one(&txn).await?.is_none() {
                return Err(ApiError::NotFound(format!("parent category {parent_id}")));
            }
        }

        let pending = category::ActiveModel {
            name: Set(new.name),
            slug: Set(new.slug),
            parent_id: Set(new.parent_id),
            is_active: Set(new.is_active),
            lft: Set(0),
            rgt: Set(0),
            depth: Set(0),
            tree_id: Set(0),
            ..Default::default()
        };
        let id = CategoryEntity::insert(pending).exec(&txn).await?.last_insert_id;

        renumber(&txn).await?;
        txn.commit().await?;
        tracing::info!(category_id = id, "category inserted");

        self.get(id).await
    }

    /// A rename can change the node's slot among its siblings, so it
    /// renumbers like a structural change.
    pub async fn update(&self, id: i32, patch: CategoryPatch) -> Result<category::Model, ApiError> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let node = CategoryEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("category {id}")))?;

        if let Some(name) = &patch.name {
            let taken = CategoryEntity::find()
                .filter(category::Column::Name.eq(name.as_str()))
                .filter(category::Column::Id.ne(id))
                .one(&txn)
                .await?
                .is_some();
            if taken {
                return Err(ApiError::DuplicateName(name.clone()));
            }
        }
        if let Some(slug) = &patch.slug {
            let taken = CategoryEntity::find()
                .filter(category::Column::Slug.eq(slug.as_str()))
                .filter(category::Column::Id.ne(id))
                .one(&txn)
                .await?
                .is_some();
            if taken {
                return Err(ApiError::DuplicateSlug(slug.clone()));
            }
        }

        let renamed = patch.name.is_some();
        let mut node: category::ActiveModel = node.into();
        if let Some(name) = patch.name {
            node.name = Set(name);
        }
        if let Some(slug) = patch.slug {
            node.slug = Set(slug);
        }
        if let Some(is_active) = patch.is_active {
            node.is_active = Set(is_active);
        }
        node.update(&txn).await?;

        if renamed {
            renumber(&txn).await?;
        }
        txn.commit().await?;

        self.get(id).await
    }

    /// Moves the node and its subtree under `new_parent`, `None` for the
    /// root level. Refused when the target sits inside the subtree.
    pub async fn move_node(&self, id: i32, new_parent: Option<i32>) -> Result<(), ApiError> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let node = CategoryEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("category {id}")))?;

        if let Some(parent_id) = new_parent {
            let parent = CategoryEntity::find_by_id(parent_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("parent category {parent_id}")))?;
            // descendant-or-self test straight off the current intervals
            if parent.id == node.id
                || (parent.tree_id == node.tree_id
                    && parent.lft >= node.lft
                    && parent.rgt <= node.rgt)
            {
                return Err(ApiError::Cycle);
            }
        }

        let mut node: category::ActiveModel = node.into();
        node.parent_id = Set(new_parent);
        node.update(&txn).await?;

        renumber(&txn).await?;
        txn.commit().await?;
        tracing::info!(category_id = id, new_parent = ?new_parent, "category moved");
        Ok(())
    }

    /// Refused while any product references the subtree; otherwise direct
    /// children are reattached to the deleted node's former parent.
    pub async fn delete(&self, id: i32) -> Result<(), ApiError> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let node = CategoryEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("category {id}")))?;

        let subtree_ids: Vec<i32> = subtree(&txn, &node, true)
            .await?
            .into_iter()
            .map(|row| row.id)
            .collect();
        let referencing = ProductEntity::find()
            .filter(product::Column::CategoryId.is_in(subtree_ids))
            .count(&txn)
            .await?;
        if referencing > 0 {
            return Err(ApiError::HasActiveReferences(format!(
                "category \"{}\" still has {} product(s) in its subtree",
                node.name, referencing
            )));
        }

        CategoryEntity::update_many()
            .col_expr(category::Column::ParentId, Expr::value(node.parent_id))
            .filter(category::Column::ParentId.eq(id))
            .exec(&txn)
            .await?;
        CategoryEntity::delete_by_id(id).exec(&txn).await?;

        renumber(&txn).await?;
        txn.commit().await?;
        tracing::info!(category_id = id, "category deleted");
        Ok(())
    }

    pub async fn get(&self, id: i32) -> Result<category::Model, ApiError> {
        CategoryEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("category {id}")))
    }

    pub async fn resolve_by_slug(&self, slug: &str) -> Result<category::Model, ApiError> {
        CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("category \"{slug}\"")))
    }

    /// Subtree of `id` in depth-first, name-sorted order.
    pub async fn descendants(
        &self,
        id: i32,
        include_self: bool,
    ) -> Result<Vec<category::Model>, ApiError> {
        let node = self.get(id).await?;
        Ok(subtree(&*self.db, &node, include_self).await?)
    }

    /// The whole forest in `(tree_id, lft)` order.
    pub async fn forest(&self) -> Result<Vec<category::Model>, ApiError> {
        Ok(CategoryEntity::find()
            .order_by_asc(category::Column::TreeId)
            .order_by_asc(category::Column::Lft)
            .all(&*self.db)
            .await?)
    }
}

async fn subtree<C: ConnectionTrait>(
    conn: &C,
    node: &category::Model,
    include_self: bool,
) -> Result<Vec<category::Model>, DbErr> {
    let query = CategoryEntity::find().filter(category::Column::TreeId.eq(node.tree_id));
    let query = if include_self {
        query
            .filter(category::Column::Lft.gte(node.lft))
            .filter(category::Column::Rgt.lte(node.rgt))
    } else {
        query
            .filter(category::Column::Lft.gt(node.lft))
            .filter(category::Column::Rgt.lt(node.rgt))
    };
    query.order_by_asc(category::Column::Lft).all(conn).await
}

/// Re-derives the bounds for the whole forest in one depth-first pass and
/// rewrites only the rows that changed. Roots get consecutive `tree_id`s in
/// `(name, id)` order; within each tree the counter restarts at 1.
async fn renumber(txn: &DatabaseTransaction) -> Result<(), DbErr> {
    let rows = CategoryEntity::find().all(txn).await?;

    let mut children: HashMap<Option<i32>, Vec<usize>> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        children.entry(row.parent_id).or_default().push(idx);
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|&a, &b| {
            rows[a]
                .name
                .cmp(&rows[b].name)
                .then(rows[a].id.cmp(&rows[b].id))
        });
    }

    enum Visit {
        Enter(usize, i32),
        Exit(usize),
    }

    // id -> (lft, rgt, depth, tree_id)
    let mut assigned: HashMap<i32, (i32, i32, i32, i32)> = HashMap::new();
    let roots = children.get(&None).cloned().unwrap_or_default();
    for (tree_index, &root) in roots.iter().enumerate() {
        let tree_id = tree_index as i32 + 1;
        let mut counter = 1i32;
        let mut stack = vec![Visit::Enter(root, 0)];
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(idx, depth) => {
                    assigned.insert(rows[idx].id, (counter, 0, depth, tree_id));
                    counter += 1;
                    stack.push(Visit::Exit(idx));
                    if let Some(kids) = children.get(&Some(rows[idx].id)) {
                        for &kid in kids.iter().rev() {
                            stack.push(Visit::Enter(kid, depth + 1));
                        }
                    }
                }
                Visit::Exit(idx) => {
                    if let Some(bounds) = assigned.get_mut(&rows[idx].id) {
                        bounds.1 = counter;
                        counter += 1;
                    }
                }
            }
        }
    }

    for row in &rows {
        let Some(&(lft, rgt, depth, tree_id)) = assigned.get(&row.id) else {
            // unreachable from any root: the forest invariant is broken
            return Err(DbErr::Custom(format!(
                "category {} is detached from the forest",
                row.id
            )));
        };
        if row.lft != lft || row.rgt != rgt || row.depth != depth || row.tree_id != tree_id {
            let update = category::ActiveModel {
                id: Set(row.id),
                lft: Set(lft),
                rgt: Set(rgt),
                depth: Set(depth),
                tree_id: Set(tree_id),
                ..Default::default()
            };
            update.update(txn).await?;
        }
    }

    Ok(())
}
