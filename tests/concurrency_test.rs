mod common;

use common::TestApp;
use depot_api::services::{
    inventory::{CreateInventoryItem, InventoryMutator},
    suppliers::CreateSupplier,
};
use rust_decimal_macros::dec;
use tokio::task::JoinSet;

const WRITERS: usize = 12;

async fn pooled_app() -> TestApp {
    TestApp::with_config(|cfg| cfg.db_max_connections = 4).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_get_distinct_contiguous_ids() {
    let app = pooled_app().await;

    let mut tasks = JoinSet::new();
    for n in 0..WRITERS {
        let suppliers = app.state.services.suppliers.clone();
        tasks.spawn(async move {
            suppliers
                .create_supplier(CreateSupplier {
                    supplier_name: format!("Supplier {}", n),
                    contact_no: "09171234567".into(),
                    email: format!("supplier{}@suppliers.test", n),
                    address: "Pier 4".into(),
                })
                .await
        });
    }

    let mut ids = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        ids.push(joined.unwrap().unwrap().supplier_id);
    }
    ids.sort();

    let expected: Vec<String> = (1..=WRITERS).map(|n| format!("SUI-{:04}", n)).collect();
    assert_eq!(ids, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_are_not_lost() {
    let app = pooled_app().await;
    let item = app
        .state
        .services
        .inventory
        .create_item(CreateInventoryItem {
            item_name: "Cement".into(),
            brand: None,
            category: "Building".into(),
            size: None,
            quantity: 7,
            uom: "bag".into(),
            cost_price: dec!(200.00),
            selling_price: dec!(250.00),
            supplier_id: None,
        })
        .await
        .unwrap();

    let mut tasks = JoinSet::new();
    for amount in 1..=WRITERS as i32 {
        let db = app.state.db.clone();
        let item_id = item.item_id.clone();
        tasks.spawn(async move { InventoryMutator::increase(&*db, &item_id, amount).await });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().unwrap();
    }

    let added: i32 = (1..=WRITERS as i32).sum();
    let stored = app
        .state
        .services
        .inventory
        .get_item(&item.item_id)
        .await
        .unwrap();
    assert_eq!(stored.item.quantity, 7 + added);
}
