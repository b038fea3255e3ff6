use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use tally::errors::TallyResult;
use tally::sequence::SequenceAllocator;
use tally_int_test::test_util::{
    cleanup, create_fjall_context, create_fjall_upsert_context, create_memory_context,
    create_memory_upsert_context, run_test, TestContext,
};

#[ctor::ctor]
fn init() {
    colog::init();
}

/// Runs `per_thread` allocations on `name` from each of `threads` threads started together.
fn allocate_concurrently(
    sequences: &SequenceAllocator,
    name: &str,
    threads: usize,
    per_thread: usize,
) -> Vec<u64> {
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let sequences = sequences.clone();
            let barrier = Arc::clone(&barrier);
            let name = name.to_string();
            thread::spawn(move || {
                barrier.wait();
                (0..per_thread)
                    .map(|_| sequences.next(&name).unwrap())
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect()
}

fn contiguous_range_under_contention(ctx: TestContext) -> TallyResult<()> {
    let sequences = ctx.tally().sequences();
    sequences.provision("cities")?;

    let threads = 8;
    let per_thread = 125;
    let mut values = allocate_concurrently(&sequences, "cities", threads, per_thread);
    let total = (threads * per_thread) as u64;

    values.sort();
    assert_eq!(values, (1..=total).collect::<Vec<u64>>());
    assert_eq!(sequences.current("cities")?, total);
    Ok(())
}

fn concurrent_names_do_not_interfere(ctx: TestContext) -> TallyResult<()> {
    let sequences = ctx.tally().sequences();
    let names = ["cities", "orders", "invoices", "users"];
    for name in names {
        sequences.provision(name)?;
    }

    let handles: Vec<_> = names
        .iter()
        .map(|name| {
            let sequences = sequences.clone();
            let name = name.to_string();
            thread::spawn(move || {
                let values = allocate_concurrently(&sequences, &name, 4, 50);
                (name, values.into_iter().collect::<HashSet<u64>>())
            })
        })
        .collect();

    for handle in handles {
        let (name, values) = handle.join().unwrap();
        assert_eq!(values, (1..=200).collect::<HashSet<u64>>());
        assert_eq!(sequences.current(&name)?, 200);
    }
    Ok(())
}

fn concurrent_first_use_starts_at_one(ctx: TestContext) -> TallyResult<()> {
    let sequences = ctx.tally().sequences();
    let threads = 16;
    let values: HashSet<u64> = allocate_concurrently(&sequences, "cities", threads, 1)
        .into_iter()
        .collect();

    assert_eq!(values, (1..=threads as u64).collect::<HashSet<u64>>());
    assert_eq!(sequences.names()?, vec!["cities"]);
    Ok(())
}

fn handles_on_separate_threads_share_counters(ctx: TestContext) -> TallyResult<()> {
    let tally = ctx.tally();
    tally.sequences().provision("cities")?;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let tally = tally.clone();
            thread::spawn(move || {
                let sequences = tally.sequences();
                (0..25)
                    .map(|_| sequences.next("cities").unwrap())
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let values: HashSet<u64> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();
    assert_eq!(values.len(), 100);
    assert_eq!(tally.sequences().current("cities")?, 100);
    Ok(())
}

#[test]
fn test_contiguous_range_under_contention() {
    run_test(create_memory_context, contiguous_range_under_contention, cleanup);
    run_test(create_fjall_context, contiguous_range_under_contention, cleanup);
}

#[test]
fn test_concurrent_names_do_not_interfere() {
    run_test(create_memory_context, concurrent_names_do_not_interfere, cleanup);
    run_test(create_fjall_context, concurrent_names_do_not_interfere, cleanup);
}

#[test]
fn test_concurrent_first_use_starts_at_one() {
    run_test(create_memory_upsert_context, concurrent_first_use_starts_at_one, cleanup);
    run_test(create_fjall_upsert_context, concurrent_first_use_starts_at_one, cleanup);
}

#[test]
fn test_handles_on_separate_threads_share_counters() {
    run_test(
        create_memory_context,
        handles_on_separate_threads_share_counters,
        cleanup,
    );
    run_test(
        create_fjall_context,
        handles_on_separate_threads_share_counters,
        cleanup,
    );
}
