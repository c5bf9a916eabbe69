use uuid::Uuid;

use rust_tezaur::basket::{BasketLine, BasketStore};

#[test]
fn adding_merges_quantities_but_keeps_line_order() {
    let store = BasketStore::new();
    let visitor = Uuid::new_v4();

    store.add(visitor, 7, 1);
    store.add(visitor, 3, 2);
    store.add(visitor, 7, 2);

    assert_eq!(
        store.lines(visitor),
        [
            BasketLine {
                product_id: 7,
                quantity: 3
            },
            BasketLine {
                product_id: 3,
                quantity: 2
            },
        ]
    );
}

#[test]
fn update_sets_and_zero_removes() {
    let store = BasketStore::new();
    let visitor = Uuid::new_v4();
    store.add(visitor, 7, 1);
    store.add(visitor, 3, 1);

    assert!(store.update(visitor, 7, 5));
    assert_eq!(store.lines(visitor)[0].quantity, 5);

    assert!(store.update(visitor, 7, 0));
    assert_eq!(store.lines(visitor).len(), 1);
    assert_eq!(store.lines(visitor)[0].product_id, 3);

    // no line, nothing to update
    assert!(!store.update(visitor, 7, 1));
}

#[test]
fn remove_reports_whether_a_line_existed() {
    let store = BasketStore::new();
    let visitor = Uuid::new_v4();
    store.add(visitor, 7, 1);

    assert!(store.remove(visitor, 7));
    assert!(!store.remove(visitor, 7));
    assert!(store.lines(visitor).is_empty());
}

#[test]
fn sessions_do_not_see_each_other() {
    let store = BasketStore::new();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    store.add(first, 7, 1);
    store.add(second, 7, 4);
    assert!(store.update(first, 7, 2));

    assert_eq!(store.lines(first)[0].quantity, 2);
    assert_eq!(store.lines(second)[0].quantity, 4);

    assert!(store.remove(first, 7));
    assert_eq!(store.lines(second).len(), 1);
}

#[test]
fn prune_drops_lines_for_dead_products() {
    let store = BasketStore::new();
    let visitor = Uuid::new_v4();
    store.add(visitor, 7, 1);
    store.add(visitor, 3, 1);
    store.add(visitor, 9, 1);

    store.prune(visitor, &[3, 9]);

    let ids: Vec<i32> = store.lines(visitor).iter().map(|l| l.product_id).collect();
    assert_eq!(ids, [3, 9]);
}
