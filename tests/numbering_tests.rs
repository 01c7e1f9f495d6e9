use billsync::numbering::{
    extract_numeric, format_invoice_number, NumberPool, PoolStore, FREED_KEY, REVISION_KEY,
    STORAGE_FILE,
};
use billsync::BillingError;
use std::collections::HashSet;
use std::fs;
use tempfile::TempDir;

fn active(numbers: &[u64]) -> HashSet<u64> {
    numbers.iter().copied().collect()
}

#[test]
fn test_next_number_continues_after_highest_active() {
    let mut pool = NumberPool::new();
    assert_eq!(pool.next_number(&active(&[])), 1);
    assert_eq!(pool.next_number(&active(&[1, 2, 7])), 8);
}

#[test]
fn test_released_number_is_reused_first() {
    let mut pool = NumberPool::new();
    pool.release(5);
    assert_eq!(pool.next_number(&active(&[])), 5);
    assert!(pool.is_empty());
}

#[test]
fn test_smallest_freed_number_fills_first() {
    let mut pool = NumberPool::new();
    pool.release(9);
    pool.release(3);
    pool.release(6);

    let existing = active(&[1, 2, 4, 5, 7, 8, 10]);
    assert_eq!(pool.next_number(&existing), 3);
    assert_eq!(pool.next_number(&existing), 6);
    assert_eq!(pool.next_number(&existing), 9);
    assert_eq!(pool.next_number(&existing), 11);
}

#[test]
fn test_release_is_idempotent() {
    let mut once = NumberPool::new();
    once.release(4);

    let mut twice = NumberPool::new();
    twice.release(4);
    twice.release(4);

    assert_eq!(once, twice);
    assert_eq!(twice.len(), 1);
}

#[test]
fn test_reserve_removes_number_from_eligibility() {
    let mut pool = NumberPool::new();
    pool.release(2);
    pool.reserve(2);

    assert_eq!(pool.next_number(&active(&[1, 3])), 4);
}

#[test]
fn test_reserve_absent_number_is_noop() {
    let mut pool: NumberPool = [4, 8].into_iter().collect();
    pool.reserve(5);
    assert_eq!(pool.iter().collect::<Vec<_>>(), vec![4, 8]);
}

#[test]
fn test_next_number_never_returns_active_number() {
    // Pool diverged from storage: 2 was freed but is in use again.
    let mut pool: NumberPool = [2, 6].into_iter().collect();
    let existing = active(&[1, 2, 3]);

    assert_eq!(pool.next_number(&existing), 6);
    assert!(!pool.contains(2));
    assert_eq!(pool.next_number(&existing), 4);
}

#[test]
fn test_allocated_numbers_are_unique_among_active() {
    let mut pool = NumberPool::new();
    let mut in_use: HashSet<u64> = HashSet::new();

    for step in 0..40u64 {
        if step % 3 == 2 {
            let victim = *in_use.iter().min().unwrap();
            in_use.remove(&victim);
            pool.release(victim);
        } else {
            let n = pool.next_number(&in_use);
            assert!(in_use.insert(n), "number {n} issued while active");
        }
    }
}

#[test]
fn test_peek_does_not_consume() {
    let mut pool: NumberPool = [3].into_iter().collect();
    let existing = active(&[1, 2]);
    assert_eq!(pool.peek(&existing), 3);
    assert_eq!(pool.peek(&existing), 3);
    assert_eq!(pool.next_number(&existing), 3);
    assert_eq!(pool.peek(&existing), 3);
}

#[test]
fn test_extract_numeric() {
    assert_eq!(extract_numeric("INV-0000000042"), Some(42));
    assert_eq!(extract_numeric("42"), Some(42));
    assert_eq!(extract_numeric("2026/INV-7"), Some(7));
    assert_eq!(extract_numeric("INV-12-draft"), Some(12));
    assert_eq!(extract_numeric(""), None);
    assert_eq!(extract_numeric("INV-"), None);
}

#[test]
fn test_format_invoice_number_pads() {
    assert_eq!(format_invoice_number("INV-", 10, 42), "INV-0000000042");
    assert_eq!(format_invoice_number("", 3, 1234), "1234");
    assert_eq!(
        extract_numeric(&format_invoice_number("INV-", 10, 7)),
        Some(7)
    );
}

#[test]
fn test_store_missing_file_is_empty_pool() {
    let dir = TempDir::new().unwrap();
    let (store, pool) = PoolStore::open(dir.path()).unwrap();
    assert!(pool.is_empty());
    assert_eq!(store.revision(), 0);
}

#[test]
fn test_store_persists_sorted_array_under_key() {
    let dir = TempDir::new().unwrap();

    PoolStore::transact(dir.path(), |pool| {
        pool.release(9);
        pool.release(2);
        pool.release(9);
    })
    .unwrap();

    let raw = fs::read_to_string(dir.path().join(STORAGE_FILE)).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc[FREED_KEY], serde_json::json!([2, 9]));
    assert_eq!(doc[REVISION_KEY], serde_json::json!(1));

    let (_, pool) = PoolStore::open(dir.path()).unwrap();
    assert_eq!(pool.iter().collect::<Vec<_>>(), vec![2, 9]);
}

#[test]
fn test_store_drops_malformed_entries() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(STORAGE_FILE),
        r#"{"freedInvoiceNumbers": [4, "7", "abc", -3, 1.5, null, 2.0, {"n": 1}]}"#,
    )
    .unwrap();

    let (_, pool) = PoolStore::open(dir.path()).unwrap();
    assert_eq!(pool.iter().collect::<Vec<_>>(), vec![2, 4, 7]);
}

#[test]
fn test_store_tolerates_garbage_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(STORAGE_FILE), "not json at all").unwrap();

    let (_, pool) = PoolStore::open(dir.path()).unwrap();
    assert!(pool.is_empty());
}

#[test]
fn test_store_keeps_unrelated_keys() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(STORAGE_FILE),
        r#"{"theme": "dark", "freedInvoiceNumbers": []}"#,
    )
    .unwrap();

    PoolStore::transact(dir.path(), |pool| pool.release(3)).unwrap();

    let raw = fs::read_to_string(dir.path().join(STORAGE_FILE)).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["theme"], "dark");
    assert_eq!(doc[FREED_KEY], serde_json::json!([3]));
}

#[test]
fn test_stale_commit_is_rejected() {
    let dir = TempDir::new().unwrap();

    let (mut first, mut first_pool) = PoolStore::open(dir.path()).unwrap();
    let (mut second, mut second_pool) = PoolStore::open(dir.path()).unwrap();

    first_pool.release(5);
    first.commit(&first_pool).unwrap();

    second_pool.release(8);
    let err = second.commit(&second_pool).unwrap_err();
    assert!(matches!(
        err,
        BillingError::StalePool {
            expected: 0,
            found: 1
        }
    ));

    let (_, pool) = PoolStore::open(dir.path()).unwrap();
    assert_eq!(pool.iter().collect::<Vec<_>>(), vec![5]);
}

#[test]
fn test_restore_flow_pins_number() {
    let dir = TempDir::new().unwrap();

    PoolStore::transact(dir.path(), |pool| pool.release(3)).unwrap();
    PoolStore::transact(dir.path(), |pool| pool.reserve(3)).unwrap();
    let next = PoolStore::transact(dir.path(), |pool| pool.next_number(&active(&[1, 2, 3])))
        .unwrap();

    assert_eq!(next, 4);
}
