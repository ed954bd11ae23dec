// ==========================================
// Aggregation integration tests
// ==========================================
// Read-side behavior: the generic page ceiling, the uncapped sales
// path, and agreement between rollups and client-side reduction.
// ==========================================


use apparel_recon::aggregation::AggregationService;
use apparel_recon::domain::types::Table;
use apparel_recon::repository::table_store::{TableRow, TableStore};
use apparel_recon::repository::{SqliteTableStore, PAGE_CEILING};
use serde_json::json;
use std::sync::Arc;
use test_helpers::create_test_db;

async fn seed_sales(store: &SqliteTableStore, count: usize) {
    let rows: Vec<TableRow> = (0..count)
        .map(|i| {
            TableRow::new(
                None,
                Some("26FA".to_string()),
                json!({
                    "style_number": format!("ST{}", i % 40),
                    "season": "26FA",
                    "customer": format!("Cust{}", i % 7),
                    "channel": if i % 3 == 0 { "Ecomm" } else { "Wholesale" },
                    "category": if i % 2 == 0 { "Tops" } else { "Bottoms" },
                    "gender": "Womens",
                    "units_booked": 3.0,
                    "revenue": 25.0,
                }),
            )
        })
        .collect();
    // Insert in slices to keep each transaction reasonable.
    for chunk in rows.chunks(1000) {
        store.insert_rows(Table::Sales, chunk, false).await.unwrap();
    }
}

#[tokio::test]
async fn test_generic_read_is_capped_at_ceiling() {
    let (_file, db_path) = create_test_db();
    let store = Arc::new(SqliteTableStore::new(&db_path).unwrap());

    let rows: Vec<TableRow> = (0..1500)
        .map(|i| TableRow::new(Some(format!("K{i}")), None, json!({"n": i})))
        .collect();
    store.insert_rows(Table::Products, &rows, true).await.unwrap();

    // Asking for more than the ceiling still returns one ceiling's worth.
    let page = store.read_page(Table::Products, 0, 5000).await.unwrap();
    assert_eq!(page.len(), PAGE_CEILING);
}

#[tokio::test]
async fn test_sales_page_is_not_capped() {
    let (_file, db_path) = create_test_db();
    let store = Arc::new(SqliteTableStore::new(&db_path).unwrap());
    seed_sales(&store, 2500).await;

    let page = store.sales_page(0, 5000).await.unwrap();
    assert_eq!(page.len(), 2500);
}

#[tokio::test]
async fn test_fetch_sales_returns_every_line() {
    let (_file, db_path) = create_test_db();
    let store = Arc::new(SqliteTableStore::new(&db_path).unwrap());
    seed_sales(&store, 2500).await;

    let service = AggregationService::new(Arc::clone(&store));
    let lines = service.fetch_sales().await.unwrap();
    assert_eq!(lines.len(), 2500);
}

#[tokio::test]
async fn test_sales_rollup_agrees_with_full_fetch() {
    let (_file, db_path) = create_test_db();
    let store = Arc::new(SqliteTableStore::new(&db_path).unwrap());
    seed_sales(&store, 2100).await;

    let service = AggregationService::new(Arc::clone(&store));
    let rollup = service.sales_summary().await.unwrap();
    let lines = service.fetch_sales().await.unwrap();

    let fetched_revenue: f64 = lines
        .iter()
        .map(|r| r.payload["revenue"].as_f64().unwrap_or(0.0))
        .sum();
    let channel_revenue: f64 = rollup.by_channel.iter().map(|g| g.revenue).sum();
    let category_revenue: f64 = rollup.by_category.iter().map(|g| g.revenue).sum();

    // Every grouping partitions the same line set.
    assert!((fetched_revenue - channel_revenue).abs() < 1e-6);
    assert!((fetched_revenue - category_revenue).abs() < 1e-6);
    assert_eq!(rollup.by_channel.len(), 2);
    assert_eq!(rollup.by_customer.len(), 7);
}

#[tokio::test]
async fn test_inventory_summary() {
    let (_file, db_path) = create_test_db();
    let store = Arc::new(SqliteTableStore::new(&db_path).unwrap());

    let rows: Vec<TableRow> = (0..60)
        .map(|i| {
            TableRow::new(
                Some(format!("ST{}_W{}_P1", i, i % 2)),
                None,
                json!({
                    "item_type": if i % 3 == 0 { "FG" } else { "RM" },
                    "warehouse": format!("W{}", i % 2),
                    "period": "2026-Q1",
                    "qty": 10.0,
                    "extension": 50.0,
                }),
            )
        })
        .collect();
    store
        .insert_rows(Table::Inventory, &rows, true)
        .await
        .unwrap();

    let service = AggregationService::new(Arc::clone(&store));
    let rollup = service.inventory_summary().await.unwrap();

    assert_eq!(rollup.total_count, 60);
    assert!((rollup.total_qty - 600.0).abs() < 1e-9);
    assert!((rollup.total_extension - 3000.0).abs() < 1e-9);
    assert_eq!(rollup.by_type.len(), 2);
    assert_eq!(rollup.by_warehouse.len(), 2);
    assert_eq!(rollup.by_period.len(), 1);
}
