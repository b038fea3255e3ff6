use std::backtrace::Backtrace;
use std::time::{Duration, Instant};
use std::{env, fs, thread};
use tally::errors::TallyResult;
use tally::sequence::BootstrapPolicy;
use tally::store::memory::InMemoryStoreModule;
use tally::tally::Tally;
use tally::tally_builder::TallyBuilder;
use tally_fjall_adapter::FjallModule;

/// Runs a test with retry logic and error handling.
///
/// Each attempt gets a fresh context from `before`; `after` runs even when the test body
/// returns an error.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> TallyResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> TallyResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> TallyResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            let ctx = before()
                .map_err(|e| (format!("Before run failed: {:?}", e), backtrace.to_string()))?;
            match test(ctx.clone()) {
                Ok(_) => after(ctx)
                    .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            }
        });

        let elapsed = start_time.elapsed();
        let error = match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                if !bt.is_empty() && !bt.contains("disabled") {
                    format!("{}\nBacktrace:\n{}", e, bt)
                } else {
                    e
                }
            }
            Err(panic_err) => {
                let msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    format!("Unknown panic: {:?}", panic_err.type_id())
                };
                format!("Panic: {}", msg)
            }
        };

        if attempt < MAX_RETRIES {
            eprintln!(
                "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                attempt, MAX_RETRIES, elapsed
            );
            eprintln!("{}", error);
            eprintln!("Retrying in {}ms...\n", 100 * attempt);
            thread::sleep(Duration::from_millis(100 * attempt as u64));
        }
        last_error = Some(error);
    }

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

#[derive(Clone)]
pub struct TestContext {
    path: Option<String>,
    tally: Tally,
}

impl TestContext {
    pub fn new(path: Option<String>, tally: Tally) -> Self {
        Self { path, tally }
    }

    /// Directory of the fjall keyspace, `None` for in-memory contexts.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn tally(&self) -> Tally {
        self.tally.clone()
    }
}

pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    let temp_dir = env::temp_dir();
    temp_dir
        .join("tally-int-test")
        .join(id.to_string())
        .to_string_lossy()
        .to_string()
}

/// Fjall module tuned for tests: one flush and one compaction worker per keyspace.
pub fn fjall_module(path: &str) -> FjallModule {
    FjallModule::with_config()
        .low_memory_preset()
        .db_path(path)
        .build()
}

/// Builder over a fresh fjall keyspace, returned with the keyspace path.
pub fn fjall_builder() -> (String, TallyBuilder) {
    let path = random_path();
    let builder = Tally::builder().load_module(fjall_module(&path));
    (path, builder)
}

pub fn create_memory_context() -> TallyResult<TestContext> {
    let tally = Tally::builder()
        .load_module(InMemoryStoreModule::new())
        .open()?;
    Ok(TestContext::new(None, tally))
}

pub fn create_fjall_context() -> TallyResult<TestContext> {
    let (path, builder) = fjall_builder();
    match builder.open() {
        Ok(tally) => Ok(TestContext::new(Some(path), tally)),
        Err(e) => {
            let _ = fs::remove_dir_all(&path);
            Err(e)
        }
    }
}

pub fn create_memory_upsert_context() -> TallyResult<TestContext> {
    let tally = Tally::builder()
        .load_module(InMemoryStoreModule::new())
        .bootstrap_policy(BootstrapPolicy::UpsertOnFirstUse)
        .open()?;
    Ok(TestContext::new(None, tally))
}

pub fn create_fjall_upsert_context() -> TallyResult<TestContext> {
    let (path, builder) = fjall_builder();
    match builder
        .bootstrap_policy(BootstrapPolicy::UpsertOnFirstUse)
        .open()
    {
        Ok(tally) => Ok(TestContext::new(Some(path), tally)),
        Err(e) => {
            let _ = fs::remove_dir_all(&path);
            Err(e)
        }
    }
}

#[cfg(feature = "fjall")]
pub fn create_test_context() -> TallyResult<TestContext> {
    create_fjall_context()
}

#[cfg(all(feature = "memory", not(feature = "fjall")))]
pub fn create_test_context() -> TallyResult<TestContext> {
    create_memory_context()
}

pub fn cleanup(ctx: TestContext) -> TallyResult<()> {
    if let Err(e) = ctx.tally().close() {
        eprintln!("Warning: Failed to close tally: {:?}", e);
    }

    let path = match ctx.path() {
        Some(path) => path.to_string(),
        None => return Ok(()),
    };
    drop(ctx);
    remove_dir(&path);
    Ok(())
}

/// Removes a keyspace directory, retrying while fjall releases its files.
pub fn remove_dir(path: &str) {
    let max_retries = 10;
    for retry in 0..max_retries {
        if !std::path::Path::new(path).exists() {
            return;
        }
        match fs::remove_dir_all(path) {
            Ok(_) => return,
            Err(e) if retry < max_retries - 1 => {
                log::debug!("Retrying removal of {}: {}", path, e);
                thread::sleep(Duration::from_millis(50 * (retry as u64 + 1)));
            }
            Err(e) => {
                eprintln!("Warning: Failed to remove test directory {}: {:?}", path, e);
            }
        }
    }
}
