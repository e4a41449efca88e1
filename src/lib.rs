#![deny(unsafe_op_in_unsafe_fn)]

pub mod bench;
pub mod config;
pub mod lock;

mod guard;

pub use bench::{run, run_benchmark, LogObserver, Observer, PassEvent, Report};
pub use config::{BenchConfig, ConfigError, Strategy};
pub use guard::{ArrayGuard, SeqGuard, TasGuard};
