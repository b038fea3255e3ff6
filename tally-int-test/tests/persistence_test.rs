use std::thread;
use tally::errors::ErrorKind;
use tally::sequence::BootstrapPolicy;
use tally::tally::Tally;
use tally_int_test::test_util::{fjall_module, random_path, remove_dir};

#[ctor::ctor]
fn init() {
    colog::init();
}

fn reopen(path: &str) -> Tally {
    Tally::builder()
        .load_module(fjall_module(path))
        .open()
        .unwrap()
}

#[test]
fn test_sequence_continues_after_reopen() {
    let path = random_path();

    let tally = Tally::builder()
        .load_module(fjall_module(&path))
        .provision("cities")
        .open()
        .unwrap();
    let sequences = tally.sequences();
    for expected in 1..=10 {
        assert_eq!(sequences.next("cities").unwrap(), expected);
    }
    tally.close().unwrap();
    drop(sequences);
    drop(tally);

    let tally = reopen(&path);
    let sequences = tally.sequences();
    assert_eq!(sequences.current("cities").unwrap(), 10);
    assert_eq!(sequences.next("cities").unwrap(), 11);
    tally.close().unwrap();
    drop(sequences);
    drop(tally);

    remove_dir(&path);
}

#[test]
fn test_every_sequence_survives_reopen() {
    let path = random_path();

    let tally = Tally::builder()
        .load_module(fjall_module(&path))
        .bootstrap_policy(BootstrapPolicy::UpsertOnFirstUse)
        .open()
        .unwrap();
    let sequences = tally.sequences();
    for (name, count) in [("cities", 3), ("orders", 7), ("users", 1)] {
        for _ in 0..count {
            sequences.next(name).unwrap();
        }
    }
    tally.close().unwrap();
    drop(sequences);
    drop(tally);

    let tally = reopen(&path);
    let sequences = tally.sequences();
    assert_eq!(sequences.names().unwrap(), vec!["cities", "orders", "users"]);
    assert_eq!(sequences.next("cities").unwrap(), 4);
    assert_eq!(sequences.next("orders").unwrap(), 8);
    assert_eq!(sequences.next("users").unwrap(), 2);
    tally.close().unwrap();
    drop(sequences);
    drop(tally);

    remove_dir(&path);
}

#[test]
fn test_reopen_does_not_reset_provisioned_counters() {
    let path = random_path();

    let tally = Tally::builder()
        .load_module(fjall_module(&path))
        .provision("cities")
        .open()
        .unwrap();
    tally.sequences().next("cities").unwrap();
    tally.sequences().next("cities").unwrap();
    tally.close().unwrap();
    drop(tally);

    // provisioning again at open must keep the stored value
    let tally = Tally::builder()
        .load_module(fjall_module(&path))
        .provision("cities")
        .open()
        .unwrap();
    assert_eq!(tally.sequences().next("cities").unwrap(), 3);
    tally.close().unwrap();
    drop(tally);

    remove_dir(&path);
}

#[test]
fn test_reset_is_persisted() {
    let path = random_path();

    let tally = Tally::builder()
        .load_module(fjall_module(&path))
        .provision("cities")
        .open()
        .unwrap();
    tally.sequences().next("cities").unwrap();
    assert!(tally.sequences().reset("cities").unwrap());
    tally.close().unwrap();
    drop(tally);

    let tally = reopen(&path);
    let err = tally.sequences().next("cities").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::NotFound);
    tally.close().unwrap();
    drop(tally);

    remove_dir(&path);
}

#[test]
fn test_concurrent_allocations_survive_reopen() {
    let path = random_path();

    let tally = Tally::builder()
        .load_module(fjall_module(&path))
        .provision("orders")
        .open()
        .unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let sequences = tally.sequences();
            thread::spawn(move || {
                for _ in 0..50 {
                    sequences.next("orders").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    tally.close().unwrap();
    drop(tally);

    let tally = reopen(&path);
    assert_eq!(tally.sequences().current("orders").unwrap(), 200);
    assert_eq!(tally.sequences().next("orders").unwrap(), 201);
    tally.close().unwrap();
    drop(tally);

    remove_dir(&path);
}
