use billsync::config::{load_state, CONFIG_TEMPLATE, CUSTOMERS_TEMPLATE, PRODUCTS_TEMPLATE};
use billsync::replies::{add_reply, replies_for, DEFAULT_AUTHOR};
use billsync::BillingError;
use std::fs;
use tempfile::TempDir;

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("config.toml"), CONFIG_TEMPLATE).unwrap();
    fs::write(dir.path().join("customers.toml"), CUSTOMERS_TEMPLATE).unwrap();
    fs::write(dir.path().join("products.toml"), PRODUCTS_TEMPLATE).unwrap();
    dir
}

#[test]
fn test_reply_defaults_author_and_trims_message() {
    let dir = setup();
    let reply = add_reply(dir.path(), "example-customer", "  Payment sent  ", None).unwrap();

    assert_eq!(reply.author, DEFAULT_AUTHOR);
    assert_eq!(reply.message, "Payment sent");
    assert_eq!(reply.customer_id, "example-customer");
}

#[test]
fn test_replies_listed_newest_first() {
    let dir = setup();
    add_reply(dir.path(), "example-customer", "first", Some("customer")).unwrap();
    add_reply(dir.path(), "example-customer", "second", None).unwrap();

    let state = load_state(dir.path()).unwrap();
    let replies = replies_for(&state, "example-customer");
    let messages: Vec<&str> = replies.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(messages, ["second", "first"]);
    assert_eq!(replies[1].author, "customer");

    assert!(replies_for(&state, "someone-else").is_empty());
}

#[test]
fn test_reply_rejects_unknown_customer_and_empty_message() {
    let dir = setup();

    let err = add_reply(dir.path(), "ghost", "hello", None).unwrap_err();
    assert!(matches!(err, BillingError::CustomerNotFound(_)));

    let err = add_reply(dir.path(), "example-customer", "   ", None).unwrap_err();
    assert!(matches!(err, BillingError::EmptyReply));

    assert!(load_state(dir.path()).unwrap().replies.is_empty());
}
