//! Token passing between a fixed ring of worker threads.
//!
//! Worker `id` may only advance the shared pass counter when
//! `current_pass % threads == id`, so a correct run hands the token around the
//! ring in order. How much the workers fight over the lock while waiting for
//! their turn is what separates the strategies.

use std::fmt;
use std::hint;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering::*};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, trace};

use crate::config::{BenchConfig, ConfigError, Strategy};
use crate::lock::{
    ArrayLock, ArrayRef, BorrowError, BoundedLock, Lock, LockRef, SeqLock, SeqRef, TasLock,
    UnboundedLock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassEvent {
    pub pass: usize,
    pub holder: usize,
    pub receiver: usize,
}

impl fmt::Display for PassEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pass number no: {}, Thread {} is passing the token to thread {}",
            self.pass, self.holder, self.receiver,
        )
    }
}

/// Receives the output of a run.
///
/// `on_pass` is called with the token lock held, so events arrive in pass
/// order. `on_elapsed` is called exactly once per run.
pub trait Observer: Sync {
    fn on_pass(&self, event: &PassEvent);
    fn on_elapsed(&self, elapsed: Duration);
}

/// Writes every event through the `log` facade.
pub struct LogObserver;

impl Observer for LogObserver {
    fn on_pass(&self, event: &PassEvent) {
        info!("{}", event);
    }
    fn on_elapsed(&self, elapsed: Duration) {
        info!("time elapsed: {:?}", elapsed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub elapsed: Duration,
    pub passes: usize,
}

/// Whether a worker should queue up for the lock on this round at all.
trait Turnstile<'a>: LockRef<'a> {
    fn worth_trying(&self, _my_turn: bool) -> bool { true }
}

impl<'a> Turnstile<'a> for &'a TasLock {}

impl<'a> Turnstile<'a> for ArrayRef<'a> {}

impl<'a> Turnstile<'a> for SeqRef<'a> {
    fn worth_trying(&self, my_turn: bool) -> bool {
        my_turn && self.read_version() % 2 == 0
    }
}

/// Records the elapsed time of the first worker to finish.
struct Stopwatch {
    lock: TasLock,
    recorded: AtomicBool,
    elapsed_nanos: AtomicU64,
}

impl Stopwatch {
    fn new() -> Self {
        Stopwatch {
            lock: TasLock::new(),
            recorded: AtomicBool::new(false),
            elapsed_nanos: AtomicU64::new(0),
        }
    }

    fn record(&self, started: Instant) -> Option<Duration> {
        if self.recorded.load(Acquire) { return None; }
        let mut lock = &self.lock;
        let _guard = lock.acquire();
        if self.recorded.load(Relaxed) { return None; }
        let elapsed = started.elapsed();
        self.elapsed_nanos.store(elapsed.as_nanos() as u64, Relaxed);
        self.recorded.store(true, Release);
        Some(elapsed)
    }

    fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Acquire))
    }
}

struct Table<'o, O> {
    threads: usize,
    passes: usize,
    current_pass: AtomicUsize,
    stopwatch: Stopwatch,
    observer: &'o O,
}

impl<O: Observer> Table<'_, O> {
    fn play<'a, R: Turnstile<'a>>(&self, id: usize, mut lock: R) {
        let started = Instant::now();
        debug!("thread {} joined", id);
        loop {
            let pass = self.current_pass.load(Relaxed);
            if pass >= self.passes { break; }
            if !lock.worth_trying(pass % self.threads == id) {
                hint::spin_loop();
                continue;
            }
            let _guard = lock.acquire();
            // the counter may have moved while we were queued
            let pass = self.current_pass.load(Relaxed);
            if pass < self.passes && pass % self.threads == id {
                let event = PassEvent { pass, holder: id, receiver: id + 1 };
                trace!("thread {} holds pass {}", id, pass);
                self.observer.on_pass(&event);
                self.current_pass.store(pass + 1, Relaxed);
            }
        }
        if let Some(elapsed) = self.stopwatch.record(started) {
            self.observer.on_elapsed(elapsed);
        }
        debug!("thread {} done", id);
    }

    fn race<'a, R: Turnstile<'a>>(&self, refs: Vec<R>) {
        thread::scope(|s| {
            for (id, lock) in refs.into_iter().enumerate() {
                s.spawn(move || self.play(id, lock));
            }
        });
    }
}

fn borrow_all<L: Lock>(lock: &L, threads: usize) -> Result<Vec<L::Ref<'_>>, BorrowError> {
    (0..threads).map(|_| lock.borrow()).collect()
}

/// Runs one benchmark and blocks until every worker has seen the last pass.
pub fn run<O: Observer>(config: &BenchConfig, observer: &O) -> Result<Report, ConfigError> {
    config.validate()?;
    info!(
        "passing the token {} times between {} threads with the {} lock",
        config.passes, config.threads, config.strategy,
    );
    let table = Table {
        threads: config.threads,
        passes: config.passes,
        current_pass: AtomicUsize::new(0),
        stopwatch: Stopwatch::new(),
        observer,
    };
    match config.strategy {
        Strategy::Spin => {
            let lock = TasLock::new();
            table.race(borrow_all(&lock, config.threads)?);
        }
        Strategy::Queue => {
            let lock = ArrayLock::with_capacity(config.capacity);
            table.race(borrow_all(&lock, config.threads)?);
        }
        Strategy::Seq => {
            let lock = SeqLock::with_capacity(config.capacity);
            table.race(borrow_all(&lock, config.threads)?);
        }
    }
    let report = Report {
        elapsed: table.stopwatch.elapsed(),
        passes: table.current_pass.into_inner(),
    };
    info!("{} passes done in {:?}", report.passes, report.elapsed);
    Ok(report)
}

/// Runs a benchmark with the default queue capacity, logging every pass.
pub fn run_benchmark(
    thread_count: i64,
    total_passes: i64,
    strategy: Strategy,
) -> Result<Duration, ConfigError> {
    let config = BenchConfig::new(thread_count, total_passes, strategy)?;
    Ok(run(&config, &LogObserver)?.elapsed)
}
