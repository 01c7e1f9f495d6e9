use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn billsync_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("billsync"))
}

fn init_config(temp_dir: &TempDir) -> PathBuf {
    let config_path = temp_dir.path().join("billsync-config");
    billsync_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
    config_path
}

fn run_ok(config_path: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    billsync_cmd()
        .args(["-C", config_path.to_str().unwrap()])
        .args(args)
        .assert()
        .success()
}

fn run_err(config_path: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    billsync_cmd()
        .args(["-C", config_path.to_str().unwrap()])
        .args(args)
        .assert()
        .failure()
}

fn write_state(config_path: &Path, state: &str) {
    fs::write(config_path.join("state.toml"), state).unwrap();
}

const PROFIT_STATE: &str = r#"[[invoices]]
number = "INV-0000000001"
customer_id = "example-customer"
date = "2026-03-05"
subtotal = 500.0
tax_amount = 40.0
total_amount = 540.0
status = "paid"

[[invoices.items]]
product_id = "widget"
product_name = "Steel Widget"
quantity = 2.0
unit_price = 250.0
total_price = 500.0

[[invoices]]
number = "INV-0000000002"
date = "2026-03-20"
subtotal = 1500.0
tax_amount = 120.0
total_amount = 1620.0
status = "pending"

[[invoices.items]]
product_id = "service"
product_name = "Installation Service"
quantity = 1.0
unit_price = 1500.0
total_price = 1500.0
"#;

#[test]
fn test_help() {
    billsync_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Small-business billing from the command line",
        ));
}

#[test]
fn test_version() {
    billsync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("billsync"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("billsync-config");

    billsync_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized billsync config"));

    assert!(config_path.join("config.toml").exists());
    assert!(config_path.join("customers.toml").exists());
    assert!(config_path.join("products.toml").exists());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_err(&config_path, &["init"]).stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_status_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    run_err(&config_path, &["status"]).stderr(predicate::str::contains("not found"));
}

#[test]
fn test_customers_and_products_list() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_ok(&config_path, &["customers"])
        .stdout(predicate::str::contains("example-customer"))
        .stdout(predicate::str::contains("Example Traders"));

    run_ok(&config_path, &["products"])
        .stdout(predicate::str::contains("Steel Widget"))
        .stdout(predicate::str::contains("₹250.00"))
        .stdout(predicate::str::contains("₹180.00"))
        .stdout(predicate::str::contains("/visit"));
}

#[test]
fn test_status_shows_next_number() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_ok(&config_path, &["status"])
        .stdout(predicate::str::contains("Billing Status"))
        .stdout(predicate::str::contains("Next invoice:     INV-0000000001"));
}

#[test]
fn test_create_rejects_bad_input() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_err(
        &config_path,
        &["create", "--customer", "nobody", "--item", "widget:1"],
    )
    .stderr(predicate::str::contains("Customer 'nobody' not found"));

    run_err(
        &config_path,
        &["create", "--customer", "example-customer", "--item", "gizmo:1"],
    )
    .stderr(predicate::str::contains("Product 'gizmo' not found"));

    run_err(
        &config_path,
        &["create", "--customer", "example-customer", "--item", "widget:abc"],
    )
    .stderr(predicate::str::contains("Invalid quantity"));

    run_err(&config_path, &["create", "--customer", "example-customer"])
        .stderr(predicate::str::contains("No items specified"));

    run_err(
        &config_path,
        &[
            "create",
            "--customer",
            "example-customer",
            "--item",
            "widget:1",
            "--status",
            "draft",
        ],
    )
    .stderr(predicate::str::contains("Invalid status 'draft'"));
}

#[test]
fn test_create_and_list() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_ok(
        &config_path,
        &["create", "--customer", "example-customer", "--item", "widget:2"],
    )
    .stdout(predicate::str::contains("Created INV-0000000001"))
    .stdout(predicate::str::contains("Example Traders"))
    .stdout(predicate::str::contains("₹540.00"));

    run_ok(&config_path, &["list"])
        .stdout(predicate::str::contains("INV-0000000001"))
        .stdout(predicate::str::contains("PENDING"))
        .stdout(predicate::str::contains("OUTSTANDING"));

    run_ok(&config_path, &["show", "1"])
        .stdout(predicate::str::contains("Steel Widget"))
        .stdout(predicate::str::contains("Tax:      ₹40.00"));
}

#[test]
fn test_delete_returns_number_to_pool() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    for _ in 0..2 {
        run_ok(
            &config_path,
            &["create", "--customer", "example-customer", "--item", "widget:1"],
        );
    }

    run_ok(&config_path, &["delete", "INV-0000000001"])
        .stdout(predicate::str::contains("Deleted INV-0000000001"));

    run_ok(&config_path, &["pool"]).stdout(predicate::str::contains("INV-0000000001"));
    run_ok(&config_path, &["status"])
        .stdout(predicate::str::contains("Next invoice:     INV-0000000001"));

    run_ok(
        &config_path,
        &["create", "--customer", "example-customer", "--item", "cable:1"],
    )
    .stdout(predicate::str::contains("Created INV-0000000001"));

    run_ok(&config_path, &["pool"]).stdout(predicate::str::contains("No freed invoice numbers"));
}

#[test]
fn test_paid_invoice_cannot_be_deleted() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_ok(
        &config_path,
        &["create", "--customer", "example-customer", "--item", "widget:1"],
    );
    run_ok(&config_path, &["mark-paid", "1"])
        .stdout(predicate::str::contains("Marked INV-0000000001 as PAID"));

    run_err(&config_path, &["delete", "1"])
        .stderr(predicate::str::contains("cannot be deleted"));
}

#[test]
fn test_restore_deleted_invoice() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_ok(
        &config_path,
        &["create", "--customer", "example-customer", "--item", "widget:1"],
    );
    run_ok(&config_path, &["delete", "1"]);

    run_ok(&config_path, &["deleted"])
        .stdout(predicate::str::contains("INV-0000000001"))
        .stdout(predicate::str::contains("DELETED AT"));

    run_ok(&config_path, &["restore", "1"])
        .stdout(predicate::str::contains("Restored INV-0000000001"));

    run_ok(&config_path, &["deleted"]).stdout(predicate::str::contains("No deleted invoices"));
    run_ok(&config_path, &["status"])
        .stdout(predicate::str::contains("Next invoice:     INV-0000000002"));
}

#[test]
fn test_profit_summary() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    write_state(&config_path, PROFIT_STATE);

    run_ok(&config_path, &["profit"])
        .stdout(predicate::str::contains("Overall profit: ₹1,640.00"))
        .stdout(predicate::str::contains("Example Traders"))
        .stdout(predicate::str::contains("₹140.00"))
        .stdout(predicate::str::contains("25.93%"))
        .stdout(predicate::str::contains("Unknown"))
        .stdout(predicate::str::contains("92.59%"));

    run_ok(&config_path, &["profit", "--search", "traders"])
        .stdout(predicate::str::contains("Example Traders"))
        .stdout(predicate::str::contains("Unknown").not());

    run_err(&config_path, &["profit", "--sort", "colour"])
        .stderr(predicate::str::contains("Invalid sort key"));
}

#[test]
fn test_sales_report_exports_csv() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    write_state(&config_path, PROFIT_STATE);

    run_ok(&config_path, &["sales", "--month", "2026-03", "--csv"])
        .stdout(predicate::str::contains("Sales report for 2026-03"))
        .stdout(predicate::str::contains("Invoices: 2"))
        .stdout(predicate::str::contains("Paid:     ₹540.00"))
        .stdout(predicate::str::contains("Pending:  ₹1,620.00"));

    let csv = fs::read_to_string(
        config_path
            .join("exports")
            .join("sales-report-2026-03-all.csv"),
    )
    .unwrap();
    assert!(csv.starts_with("\"Invoice ID\",\"Client\""));
    assert!(csv.contains("\"INV-0000000001\",\"Example Traders\""));

    run_ok(&config_path, &["sales", "--month", "2026-04"])
        .stdout(predicate::str::contains("Invoices: 0"));

    run_err(&config_path, &["sales", "--month", "03/2026"])
        .stderr(predicate::str::contains("Invalid month"));
}

#[test]
fn test_stats() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);
    write_state(&config_path, PROFIT_STATE);

    run_ok(&config_path, &["stats"])
        .stdout(predicate::str::contains("Invoices: 2"))
        .stdout(predicate::str::contains("Total:    ₹2,160.00"));
}

#[test]
fn test_stock_lists_low_and_out_of_stock() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_ok(&config_path, &["stock"])
        .stdout(predicate::str::contains("Low stock (1):"))
        .stdout(predicate::str::contains("Copper Cable (10m)"))
        .stdout(predicate::str::contains("Steel Widget").not())
        .stdout(predicate::str::contains("Out of stock").not());

    let products = fs::read_to_string(config_path.join("products.toml")).unwrap();
    fs::write(
        config_path.join("products.toml"),
        products.replace("stock_quantity = 4\n", "stock_quantity = 0\n"),
    )
    .unwrap();

    run_ok(&config_path, &["stock"])
        .stdout(predicate::str::contains("Out of stock (1):"))
        .stdout(predicate::str::contains("Low stock").not());
}

#[test]
fn test_reply_and_replies() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init_config(&temp_dir);

    run_ok(&config_path, &["replies", "example-customer"])
        .stdout(predicate::str::contains("No replies for example-customer."));

    run_ok(
        &config_path,
        &["reply", "example-customer", "Cheque posted", "--author", "customer"],
    )
    .stdout(predicate::str::contains("Recorded reply from customer"));

    run_ok(&config_path, &["replies", "example-customer"])
        .stdout(predicate::str::contains("Cheque posted"))
        .stdout(predicate::str::contains("customer"));

    run_err(&config_path, &["reply", "ghost", "hello"])
        .stderr(predicate::str::contains("Customer 'ghost' not found"));
}
