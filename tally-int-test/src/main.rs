use std::thread;
use tally::doc;
use tally::errors::TallyResult;
use tally_int_test::test_util::{cleanup, create_test_context};

fn main() -> TallyResult<()> {
    println!("Starting stress test...");
    let ctx = create_test_context()?;
    let sequences = ctx.tally().sequences();
    sequences.provision("stress")?;

    let count = 1000000;
    let start = std::time::Instant::now();
    for _ in 0..count {
        sequences.next("stress")?;
    }
    println!("Allocated {} values in {:?}", count, start.elapsed());

    let threads = 8;
    let per_thread = count / threads;
    let start = std::time::Instant::now();
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let sequences = sequences.clone();
            thread::spawn(move || -> TallyResult<()> {
                for _ in 0..per_thread {
                    sequences.next("stress")?;
                }
                Ok(())
            })
        })
        .collect();
    for handle in handles {
        match handle.join() {
            Ok(result) => result?,
            Err(_) => eprintln!("Allocation thread panicked"),
        }
    }
    println!(
        "Allocated {} values on {} threads in {:?}",
        per_thread * threads,
        threads,
        start.elapsed()
    );

    let start = std::time::Instant::now();
    sequences.provision("records")?;
    for _ in 0..count / 10 {
        let mut record = doc! {
            first_name: (uuid::Uuid::new_v4().to_string()),
            processed: false,
        };
        sequences.assign_id("records", &mut record)?;
    }
    println!("Assigned {} record ids in {:?}", count / 10, start.elapsed());

    println!("Final value: {}", sequences.current("stress")?);
    cleanup(ctx)
}
