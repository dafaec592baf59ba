//! Integration test for carrying a cart across a sign-in redirect with
//! on-disk storage, where each "page load" is a fresh process.

use rust_decimal::Decimal;
use testresult::TestResult;
use trolley::prelude::*;

fn rice() -> Product {
    Product::new("rice", "Basmati Rice (1kg)", Decimal::from(120))
}

fn bread() -> Product {
    Product::new("bread", "Whole Wheat Bread", Decimal::from(45))
}

#[test]
fn cart_survives_sign_in_redirect() -> TestResult {
    let dir = tempfile::tempdir()?;

    let mut cart = Cart::open(FileStorage::open(dir.path())?);

    cart.add_item(&rice(), Some(Decimal::from(500)))?;
    cart.add_item(&bread(), None)?;

    let before = cart.lines().to_vec();

    assert!(cart.persist_for_auth());
    cart.close();

    // The sign-in flow runs in another tab and empties the working cart.
    let mut other_tab = Cart::open(FileStorage::open(dir.path())?);

    assert_eq!(other_tab.auth_state(), AuthSnapshotState::SnapshotPersisted);

    other_tab.clear();
    other_tab.close();

    // Back from the identity provider.
    let mut returned = Cart::open(FileStorage::open(dir.path())?);

    assert!(returned.is_empty());
    assert!(returned.restore_from_auth());
    assert_eq!(returned.lines(), before.as_slice());
    assert_eq!(returned.auth_state(), AuthSnapshotState::SnapshotConsumed);

    // Restoring twice in one session is a no-op.
    assert!(!returned.restore_from_auth());

    returned.close();

    // The restored cart was written through, and the snapshot is gone.
    let mut reloaded = Cart::open(FileStorage::open(dir.path())?);

    assert_eq!(reloaded.lines(), before.as_slice());
    assert_eq!(reloaded.auth_state(), AuthSnapshotState::NoPendingSnapshot);
    assert!(!reloaded.restore_from_auth());

    Ok(())
}

#[test]
fn separate_prefixes_do_not_share_snapshots() -> TestResult {
    let dir = tempfile::tempdir()?;

    let mut kiosk = Cart::with_keys(
        FileStorage::open(dir.path())?,
        SnapshotKeys::with_prefix("kiosk"),
    );

    kiosk.add_item(&bread(), None)?;
    assert!(kiosk.persist_for_auth());
    kiosk.close();

    let mut web = Cart::open(FileStorage::open(dir.path())?);

    assert!(web.is_empty());
    assert!(!web.restore_from_auth());

    Ok(())
}

#[test]
fn corrupt_snapshot_on_disk_is_discarded() -> TestResult {
    let dir = tempfile::tempdir()?;
    let keys = SnapshotKeys::default();

    let mut storage = FileStorage::open(dir.path())?;

    storage.set(&keys.auth_pending, "{\"version\":1,\"lines\":[{}]}")?;

    let mut cart = Cart::open(storage);

    assert!(!cart.restore_from_auth());
    assert_eq!(cart.storage().get(&keys.auth_pending)?, None);

    Ok(())
}
