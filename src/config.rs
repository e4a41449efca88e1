use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::lock::{BorrowError, DEFAULT_CAPACITY};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("thread count must be positive, got {0}")]
    InvalidThreadCount(i64),
    #[error("pass count must not be negative, got {0}")]
    InvalidPassCount(i64),
    #[error("unknown lock strategy `{0}` (expected spin, queue or seq)")]
    UnknownStrategy(String),
    #[error("`{0}` is not a number")]
    InvalidNumber(String),
    #[error("queue capacity must be positive")]
    InvalidCapacity,
    #[error("{threads} threads do not fit in a queue of capacity {capacity}")]
    CapacityExceeded { threads: usize, capacity: usize },
    #[error(transparent)]
    Borrow(#[from] BorrowError),
}

/// Which lock guards the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Spin,
    Queue,
    Seq,
}

impl Strategy {
    pub fn is_bounded(self) -> bool {
        !matches!(self, Strategy::Spin)
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "spin" => Ok(Strategy::Spin),
            "2" | "queue" | "anderson" => Ok(Strategy::Queue),
            "3" | "seq" | "seqlock" => Ok(Strategy::Seq),
            _ => Err(ConfigError::UnknownStrategy(s.to_owned())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Spin => "spin",
            Strategy::Queue => "queue",
            Strategy::Seq => "seq",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub threads: usize,
    pub passes: usize,
    pub strategy: Strategy,
    /// Slots in the array lock backing the queue and seq strategies.
    pub capacity: usize,
}

impl BenchConfig {
    pub fn new(threads: i64, passes: i64, strategy: Strategy) -> Result<Self, ConfigError> {
        if threads <= 0 {
            return Err(ConfigError::InvalidThreadCount(threads));
        }
        if passes < 0 {
            return Err(ConfigError::InvalidPassCount(passes));
        }
        let config = BenchConfig {
            threads: threads as usize,
            passes: passes as usize,
            strategy,
            capacity: DEFAULT_CAPACITY,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn parse(threads: &str, passes: &str, strategy: &str) -> Result<Self, ConfigError> {
        let threads = parse_number(threads)?;
        let passes = parse_number(passes)?;
        Self::new(threads, passes, strategy.parse()?)
    }

    pub fn with_capacity(mut self, capacity: usize) -> Result<Self, ConfigError> {
        self.capacity = capacity;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidThreadCount(0));
        }
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        if self.strategy.is_bounded() && self.threads > self.capacity {
            return Err(ConfigError::CapacityExceeded {
                threads: self.threads,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

fn parse_number(s: &str) -> Result<i64, ConfigError> {
    s.trim().parse().map_err(|_| ConfigError::InvalidNumber(s.to_owned()))
}
