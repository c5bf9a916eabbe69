mod common;

use std::collections::HashSet;
use std::sync::Arc;

use rust_tezaur::entities::category;
use rust_tezaur::error::ApiError;
use rust_tezaur::tree::{CategoryPatch, NewCategory};
use rust_tezaur::AppState;

async fn insert(
    state: &AppState,
    name: &str,
    slug: &str,
    parent_id: Option<i32>,
) -> category::Model {
    state
        .tree
        .insert(NewCategory {
            name: name.to_owned(),
            slug: slug.to_owned(),
            parent_id,
            is_active: true,
        })
        .await
        .expect("insert failed")
}

/// Root "Jewelry" with children "Rings" and "Necklaces".
async fn jewelry_tree(state: &AppState) -> (category::Model, category::Model, category::Model) {
    let jewelry = insert(state, "Jewelry", "jewelry", None).await;
    let rings = insert(state, "Rings", "rings", Some(jewelry.id)).await;
    let necklaces = insert(state, "Necklaces", "necklaces", Some(jewelry.id)).await;
    (jewelry, rings, necklaces)
}

async fn names(state: &AppState, id: i32, include_self: bool) -> Vec<String> {
    state
        .tree
        .descendants(id, include_self)
        .await
        .expect("descendants failed")
        .into_iter()
        .map(|n| n.name)
        .collect()
}

/// Checks the nested-interval invariants against the explicit parent chain:
/// every node's interval lies strictly inside its parent's, intervals have
/// odd width matching the descendant count, and `descendants` agrees with
/// parent-chain reachability for every pair.
async fn assert_consistent(state: &Arc<AppState>) {
    let forest = state.tree.forest().await.expect("forest failed");

    for node in &forest {
        assert!(node.lft < node.rgt, "degenerate interval on {}", node.name);

        if let Some(parent_id) = node.parent_id {
            let parent = forest
                .iter()
                .find(|n| n.id == parent_id)
                .expect("parent row missing");
            assert_eq!(parent.tree_id, node.tree_id);
            assert_eq!(parent.depth + 1, node.depth);
            assert!(
                parent.lft < node.lft && node.rgt < parent.rgt,
                "interval of {} not inside its parent {}",
                node.name,
                parent.name
            );
        } else {
            assert_eq!(node.depth, 0);
            assert_eq!(node.lft, 1);
        }

        let inside = forest
            .iter()
            .filter(|n| n.tree_id == node.tree_id && n.lft > node.lft && n.rgt < node.rgt)
            .count() as i32;
        assert_eq!(
            node.rgt - node.lft,
            inside * 2 + 1,
            "interval width of {} does not match its subtree",
            node.name
        );
    }

    // descendants(A) contains B iff B's parent chain reaches A
    for a in &forest {
        let via_bounds: HashSet<i32> = state
            .tree
            .descendants(a.id, false)
            .await
            .expect("descendants failed")
            .into_iter()
            .map(|n| n.id)
            .collect();
        for b in &forest {
            let mut reachable = false;
            let mut cursor = b.parent_id;
            while let Some(id) = cursor {
                if id == a.id {
                    reachable = true;
                    break;
                }
                cursor = forest.iter().find(|n| n.id == id).and_then(|n| n.parent_id);
            }
            assert_eq!(
                via_bounds.contains(&b.id),
                reachable,
                "bounds and parent chain disagree for ({}, {})",
                a.name,
                b.name
            );
        }
    }
}

#[tokio::test]
async fn descendants_come_back_in_name_sorted_depth_first_order() {
    let state = common::test_state().await;
    let (jewelry, rings, _) = jewelry_tree(&state).await;
    insert(&state, "Gold Rings", "gold-rings", Some(rings.id)).await;

    // siblings sort by name, so "Necklaces" precedes "Rings"; "Gold Rings"
    // follows its parent depth-first
    assert_eq!(
        names(&state, jewelry.id, false).await,
        ["Necklaces", "Rings", "Gold Rings"]
    );
    assert_eq!(
        names(&state, jewelry.id, true).await,
        ["Jewelry", "Necklaces", "Rings", "Gold Rings"]
    );
    assert_consistent(&state).await;
}

#[tokio::test]
async fn every_mutation_keeps_the_bounds_consistent() {
    let state = common::test_state().await;
    let (jewelry, rings, necklaces) = jewelry_tree(&state).await;
    assert_consistent(&state).await;

    let gold = insert(&state, "Gold Rings", "gold-rings", Some(rings.id)).await;
    assert_consistent(&state).await;

    state
        .tree
        .move_node(gold.id, Some(necklaces.id))
        .await
        .expect("move failed");
    assert_consistent(&state).await;

    state.tree.delete(rings.id).await.expect("delete failed");
    assert_consistent(&state).await;

    // full set of live nodes, each exactly once
    let all = names(&state, jewelry.id, true).await;
    assert_eq!(all, ["Jewelry", "Necklaces", "Gold Rings"]);
}

#[tokio::test]
async fn duplicate_name_or_slug_is_refused_and_leaves_the_tree_unchanged() {
    let state = common::test_state().await;
    let (jewelry, _, _) = jewelry_tree(&state).await;
    let before = state.tree.forest().await.expect("forest failed");

    let err = state
        .tree
        .insert(NewCategory {
            name: "Rings".to_owned(),
            slug: "other-rings".to_owned(),
            parent_id: Some(jewelry.id),
            is_active: true,
        })
        .await
        .expect_err("duplicate name must be refused");
    assert!(matches!(err, ApiError::DuplicateName(name) if name == "Rings"));

    let err = state
        .tree
        .insert(NewCategory {
            name: "Other Rings".to_owned(),
            slug: "rings".to_owned(),
            parent_id: None,
            is_active: true,
        })
        .await
        .expect_err("duplicate slug must be refused");
    assert!(matches!(err, ApiError::DuplicateSlug(slug) if slug == "rings"));

    assert_eq!(before, state.tree.forest().await.expect("forest failed"));
}

#[tokio::test]
async fn moving_under_own_subtree_is_a_cycle() {
    let state = common::test_state().await;
    let (jewelry, rings, _) = jewelry_tree(&state).await;
    let gold = insert(&state, "Gold Rings", "gold-rings", Some(rings.id)).await;

    for target in [jewelry.id, rings.id, gold.id] {
        let err = state
            .tree
            .move_node(jewelry.id, Some(target))
            .await
            .expect_err("cycle must be refused");
        assert!(matches!(err, ApiError::Cycle));
    }
    assert_consistent(&state).await;
}

#[tokio::test]
async fn moving_to_a_sibling_renests_the_subtree() {
    let state = common::test_state().await;
    let (jewelry, rings, necklaces) = jewelry_tree(&state).await;
    insert(&state, "Gold Rings", "gold-rings", Some(rings.id)).await;

    state
        .tree
        .move_node(rings.id, Some(necklaces.id))
        .await
        .expect("legal move failed");

    assert_eq!(
        names(&state, jewelry.id, false).await,
        ["Necklaces", "Rings", "Gold Rings"]
    );
    assert_eq!(
        names(&state, necklaces.id, false).await,
        ["Rings", "Gold Rings"]
    );
    let moved = state.tree.get(rings.id).await.expect("get failed");
    assert_eq!(moved.parent_id, Some(necklaces.id));
    assert_eq!(moved.depth, 2);
    assert_consistent(&state).await;
}

#[tokio::test]
async fn move_to_root_detaches_a_new_tree() {
    let state = common::test_state().await;
    let (jewelry, rings, _) = jewelry_tree(&state).await;
    insert(&state, "Gold Rings", "gold-rings", Some(rings.id)).await;

    state
        .tree
        .move_node(rings.id, None)
        .await
        .expect("move to root failed");

    let moved = state.tree.get(rings.id).await.expect("get failed");
    assert_eq!(moved.parent_id, None);
    assert_eq!(moved.depth, 0);
    assert_ne!(
        moved.tree_id,
        state.tree.get(jewelry.id).await.expect("get failed").tree_id
    );
    assert_eq!(names(&state, jewelry.id, false).await, ["Necklaces"]);
    assert_eq!(names(&state, rings.id, false).await, ["Gold Rings"]);
    assert_consistent(&state).await;
}

#[tokio::test]
async fn delete_reattaches_children_to_the_grandparent() {
    let state = common::test_state().await;
    let (jewelry, rings, _) = jewelry_tree(&state).await;
    let gold = insert(&state, "Gold Rings", "gold-rings", Some(rings.id)).await;

    state.tree.delete(rings.id).await.expect("delete failed");

    let orphan = state.tree.get(gold.id).await.expect("get failed");
    assert_eq!(orphan.parent_id, Some(jewelry.id));
    assert_eq!(
        names(&state, jewelry.id, false).await,
        ["Gold Rings", "Necklaces"]
    );
    assert_consistent(&state).await;
}

#[tokio::test]
async fn delete_is_refused_while_products_reference_the_subtree() {
    let state = common::test_state().await;
    let (_, rings, _) = jewelry_tree(&state).await;
    let gold = insert(&state, "Gold Rings", "gold-rings", Some(rings.id)).await;

    let ring_type = common::seed_type(&state, "Ring").await;
    common::seed_product(&state, ring_type.id, gold.id, "Signet", "signet", 0).await;

    let before = state.tree.forest().await.expect("forest failed");
    // the product sits on a descendant, not on "Rings" itself
    let err = state
        .tree
        .delete(rings.id)
        .await
        .expect_err("delete must be refused");
    assert!(matches!(err, ApiError::HasActiveReferences(_)));
    assert_eq!(before, state.tree.forest().await.expect("forest failed"));

    let still_there = state
        .catalog
        .get_product_by_slug("signet")
        .await
        .expect("product must survive the refused delete");
    assert_eq!(still_there.title, "Signet");
}

#[tokio::test]
async fn rename_resorts_the_node_among_its_siblings() {
    let state = common::test_state().await;
    let (jewelry, _, necklaces) = jewelry_tree(&state).await;

    state
        .tree
        .update(
            necklaces.id,
            CategoryPatch {
                name: Some("Zircons".to_owned()),
                ..Default::default()
            },
        )
        .await
        .expect("rename failed");

    assert_eq!(
        names(&state, jewelry.id, false).await,
        ["Rings", "Zircons"]
    );
    assert_consistent(&state).await;
}

#[tokio::test]
async fn roots_form_separate_trees_sorted_by_name() {
    let state = common::test_state().await;
    let watches = insert(&state, "Watches", "watches", None).await;
    let (jewelry, _, _) = jewelry_tree(&state).await;

    let jewelry = state.tree.get(jewelry.id).await.expect("get failed");
    let watches = state.tree.get(watches.id).await.expect("get failed");
    // "Jewelry" < "Watches", so it owns the first tree id
    assert_eq!(jewelry.tree_id, 1);
    assert_eq!(watches.tree_id, 2);

    assert_eq!(names(&state, watches.id, false).await, Vec::<String>::new());
    assert_consistent(&state).await;
}

#[tokio::test]
async fn resolve_by_slug_is_exact() {
    let state = common::test_state().await;
    let (_, rings, _) = jewelry_tree(&state).await;

    let found = state
        .tree
        .resolve_by_slug("rings")
        .await
        .expect("resolve failed");
    assert_eq!(found.id, rings.id);

    let err = state
        .tree
        .resolve_by_slug("bracelets")
        .await
        .expect_err("missing slug must not resolve");
    assert!(matches!(err, ApiError::NotFound(_)));
}
