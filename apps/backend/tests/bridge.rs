//! End-to-end requests through the JSON-lines bridge.

use std::sync::Arc;

use serde_json::{json, Value};

use freedom_backend::bridge::serve;
use freedom_backend::config::AppConfig;
use freedom_backend::printer::{PrintError, ReceiptPrinter, SpoolPrinter};
use freedom_backend::state::AppState;
use freedom_db::{Database, DbConfig};

struct OfflinePrinter;

impl ReceiptPrinter for OfflinePrinter {
    fn print(&self, _sale_id: i64, _receipt: &str) -> Result<(), PrintError> {
        Err(PrintError::Unavailable("paper out".to_string()))
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

async fn state() -> AppState {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let mut config = AppConfig::default();
    config.business.name = "Corner Cafe".to_string();
    AppState::new(db, config)
}

async fn exchange(state: &AppState, requests: &[Value]) -> Vec<Value> {
    let input = requests
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("\n");

    let mut out = Vec::new();
    serve(state, input.as_bytes(), &mut out).await.unwrap();

    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

async fn one(state: &AppState, request: Value) -> Value {
    exchange(state, &[request]).await.remove(0)
}

fn create_product(name: &str, price_cents: i64, stock: i64) -> Value {
    json!({
        "command": "createProduct",
        "name": name,
        "priceCents": price_cents,
        "stock": stock,
        "category": "Drinks"
    })
}

#[tokio::test]
async fn sale_and_refund_round_trip() {
    let state = state().await;

    let product = one(&state, create_product("Latte", 1000, 10)).await;
    assert_eq!(product["success"], true);
    let product_id = product["data"]["id"].as_i64().unwrap();

    let sale = one(
        &state,
        json!({
            "command": "checkout",
            "paymentMethod": "cash",
            "lines": [{"productId": product_id, "quantity": 2}]
        }),
    )
    .await;
    assert_eq!(sale["success"], true, "{}", sale);
    assert_eq!(sale["data"]["subtotalCents"], 2000);
    assert_eq!(sale["data"]["taxCents"], 360);
    assert_eq!(sale["data"]["totalCents"], 2360);
    assert_eq!(sale["data"]["receiptPrinted"], true);
    let sale_id = sale["data"]["saleId"].as_i64().unwrap();

    let responses = exchange(
        &state,
        &[
            json!({"command": "getSaleById", "id": sale_id}),
            json!({"command": "createRefund", "saleId": sale_id, "amountCents": 500, "reason": "damaged"}),
            json!({"command": "getProduct", "id": product_id}),
        ],
    )
    .await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["data"]["items"][0]["name"], "Latte");
    assert_eq!(responses[0]["data"]["paymentMethod"], "cash");
    assert_eq!(responses[1]["data"]["saleTotalCents"], 1860);
    // 10 - 2 sold + 2 restocked
    assert_eq!(responses[2]["data"]["stock"], 10);
}

#[tokio::test]
async fn create_sale_with_client_totals() {
    let state = state().await;
    let product = one(&state, create_product("Tea", 100, 5)).await;
    let product_id = product["data"]["id"].as_i64().unwrap();

    let response = one(
        &state,
        json!({
            "command": "createSale",
            "subtotalCents": 100,
            "taxCents": 18,
            "totalCents": 118,
            "paymentMethod": "cash",
            "items": [{
                "productId": product_id,
                "quantity": 1,
                "priceCents": 100,
                "taxCents": 18,
                "subtotalCents": 100,
                "totalCents": 118
            }]
        }),
    )
    .await;

    assert_eq!(response["success"], true, "{}", response);
    assert!(response["data"]["saleId"].as_i64().unwrap() > 0);
    assert_eq!(response["data"]["totalCents"], 118);
}

#[tokio::test]
async fn failures_use_error_codes() {
    let state = state().await;
    let product = one(&state, create_product("Scone", 300, 1)).await;
    let product_id = product["data"]["id"].as_i64().unwrap();

    let responses = exchange(
        &state,
        &[
            json!({"command": "checkout", "paymentMethod": "card", "lines": [{"productId": product_id, "quantity": 5}]}),
            json!({"command": "createRefund", "saleId": 999, "amountCents": 10, "reason": "x"}),
            json!({"command": "createRefund", "saleId": 1, "amountCents": 0, "reason": "x"}),
            json!({"command": "getSaleById", "id": 5}),
            json!({"command": "teleport"}),
        ],
    )
    .await;

    let codes: Vec<&str> = responses
        .iter()
        .map(|r| {
            assert_eq!(r["success"], false);
            r["code"].as_str().unwrap()
        })
        .collect();
    assert_eq!(
        codes,
        vec![
            "INSUFFICIENT_STOCK",
            "NOT_FOUND",
            "VALIDATION_ERROR",
            "NOT_FOUND",
            "INVALID_REQUEST"
        ]
    );
    assert!(responses[0].get("data").is_none());
}

#[tokio::test]
async fn malformed_lines_get_a_response_and_blank_lines_are_skipped() {
    let state = state().await;

    let mut out = Vec::new();
    serve(&state, "not json\n\n{\"command\":\"health\"}\n".as_bytes(), &mut out)
        .await
        .unwrap();

    let lines: Vec<Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["code"], "INVALID_REQUEST");
    assert_eq!(lines[1]["data"]["database"], true);
}

#[tokio::test]
async fn print_failure_keeps_the_sale() {
    let state = state().await.with_printer(Arc::new(OfflinePrinter));
    let product = one(&state, create_product("Bagel", 250, 3)).await;
    let product_id = product["data"]["id"].as_i64().unwrap();

    let sale = one(
        &state,
        json!({"command": "checkout", "paymentMethod": "card", "lines": [{"productId": product_id, "quantity": 1}]}),
    )
    .await;
    assert_eq!(sale["success"], true);
    assert_eq!(sale["data"]["receiptPrinted"], false);

    let sale_id = sale["data"]["saleId"].as_i64().unwrap();
    let reprint = one(&state, json!({"command": "printReceipt", "saleId": sale_id})).await;
    assert_eq!(reprint["success"], false);
    assert_eq!(reprint["code"], "PRINTER_ERROR");

    let stored = one(&state, json!({"command": "getSaleById", "id": sale_id})).await;
    assert_eq!(stored["success"], true);
}

#[tokio::test]
async fn receipts_are_spooled() {
    let dir = tempfile::tempdir().unwrap();
    let spool = SpoolPrinter::new(dir.path());
    let state = state().await.with_printer(Arc::new(spool.clone()));

    let product = one(&state, create_product("Muffin", 350, 4)).await;
    let product_id = product["data"]["id"].as_i64().unwrap();
    let sale = one(
        &state,
        json!({"command": "checkout", "paymentMethod": "cash", "lines": [{"productId": product_id, "quantity": 1}]}),
    )
    .await;
    let sale_id = sale["data"]["saleId"].as_i64().unwrap();

    let receipt = std::fs::read_to_string(spool.path_for(sale_id)).unwrap();
    assert!(receipt.contains("Corner Cafe"));
    assert!(receipt.contains("Muffin"));
    assert!(receipt.contains(&format!("Sale #{}", sale_id)));
}

#[tokio::test]
async fn reports_over_the_bridge() {
    let state = state().await;
    let product = one(&state, create_product("Juice", 400, 20)).await;
    let product_id = product["data"]["id"].as_i64().unwrap();

    for method in ["cash", "card", "cash"] {
        one(
            &state,
            json!({"command": "checkout", "paymentMethod": method, "lines": [{"productId": product_id, "quantity": 1}]}),
        )
        .await;
    }

    let responses = exchange(
        &state,
        &[
            json!({"command": "periodSummary", "period": {"range": "today"}}),
            json!({"command": "dailyCashReport", "period": {"range": "today"}}),
            json!({"command": "topSelling", "limit": 3}),
            json!({"command": "lowStock", "threshold": 17}),
            json!({"command": "performanceReport", "period": {"range": "today"}}),
            json!({"command": "inventoryReport"}),
        ],
    )
    .await;

    // 400 + 18% tax = 472 per sale
    assert_eq!(responses[0]["data"]["count"], 3);
    assert_eq!(responses[0]["data"]["totalCents"], 1416);
    assert_eq!(responses[1]["data"]["cashSalesCents"], 944);
    assert_eq!(responses[1]["data"]["cardSalesCents"], 472);
    assert_eq!(responses[2]["data"][0]["totalQuantity"], 3);
    assert_eq!(responses[3]["data"][0]["id"], product_id);

    let performance = &responses[4]["data"];
    assert_eq!(performance["salesCents"], 1416);
    assert_eq!(performance["previousSalesCents"], 0);
    assert_eq!(performance["averageOrderCents"], 472);

    let inventory = &responses[5]["data"];
    assert_eq!(inventory["totalUnits"], 17);
    assert_eq!(inventory["stockValueCents"], 17 * 400);
    assert_eq!(inventory["outOfStock"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn backup_writes_into_configured_dir() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(DbConfig::new(dir.path().join("till.sqlite")))
        .await
        .unwrap();
    let mut config = AppConfig::default();
    config.backup_dir = dir.path().join("backups");
    let state = AppState::new(db, config);

    let response = one(&state, json!({"command": "backup"})).await;
    assert_eq!(response["success"], true, "{}", response);

    let path = response["data"]["path"].as_str().unwrap();
    assert!(std::path::Path::new(path).exists());
}

#[tokio::test]
async fn backup_of_in_memory_database_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let mut config = AppConfig::default();
    config.backup_dir = dir.path().to_path_buf();
    let state = AppState::new(db, config);

    let response = one(&state, json!({"command": "backup"})).await;
    assert_eq!(response["success"], false);
    assert_eq!(response["code"], "DATABASE_ERROR");
}

#[tokio::test]
async fn prices_above_the_ceiling_are_rejected() {
    let state = state().await;
    let huge = i64::MAX / 2 + 1;

    let responses = exchange(
        &state,
        &[
            create_product("Gold Bar", huge, 5),
            create_product("Tea", 100, 5),
        ],
    )
    .await;
    assert_eq!(responses[0]["code"], "VALIDATION_ERROR");
    let tea_id = responses[1]["data"]["id"].as_i64().unwrap();

    let sale = one(
        &state,
        json!({
            "command": "createSale",
            "subtotalCents": 0,
            "taxCents": 0,
            "totalCents": 0,
            "paymentMethod": "cash",
            "items": [{
                "productId": tea_id,
                "quantity": 2,
                "priceCents": huge,
                "taxCents": 0,
                "subtotalCents": 0,
                "totalCents": 0
            }]
        }),
    )
    .await;
    assert_eq!(sale["code"], "VALIDATION_ERROR");

    let tea = one(&state, json!({"command": "getProduct", "id": tea_id})).await;
    assert_eq!(tea["data"]["stock"], 5);
}
