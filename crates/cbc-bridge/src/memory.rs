//! Process memory around native solves.
//!
//! The engine allocates outside Rust's allocator, so resident set size is the
//! only view of what a solve costs.

use std::fmt;
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Point in the solve at which memory was sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolvePhase {
    Start,
    End,
}

impl SolvePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SolvePhase::Start => "solve_start",
            SolvePhase::End => "solve_end",
        }
    }
}

impl fmt::Display for SolvePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resident set size of this process at one solve phase.
#[derive(Debug, Clone, Copy)]
pub struct MemorySnapshot {
    pub phase: SolvePhase,
    pub rss_bytes: u64,
    pub taken_at: Instant,
}

impl MemorySnapshot {
    /// Growth in RSS bytes since `earlier` (negative means shrinkage).
    pub fn diff(&self, earlier: &Self) -> i64 {
        self.rss_bytes as i64 - earlier.rss_bytes as i64
    }
}

/// Memory cost of one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveMemoryReport {
    pub rss_before: u64,
    pub rss_after: u64,
    pub elapsed: Duration,
}

impl SolveMemoryReport {
    pub fn growth_bytes(&self) -> i64 {
        self.rss_after as i64 - self.rss_before as i64
    }
}

#[derive(Debug, Clone)]
pub enum MemoryError {
    /// sysinfo could not see the current process.
    ProcessUnavailable { pid: u32 },
    /// `finish` was called without a matching `begin`.
    NotStarted,
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::ProcessUnavailable { pid } => {
                write!(f, "process {} is not visible to sysinfo", pid)
            }
            MemoryError::NotStarted => f.write_str("no solve_start sample was taken"),
        }
    }
}

impl std::error::Error for MemoryError {}

/// Samples RSS at the start and end of a single solve.
///
/// The `System` is created once and only this process is refreshed on each
/// sample.
#[derive(Debug)]
pub struct SolveMemory {
    system: System,
    pid: Pid,
    start: Option<MemorySnapshot>,
}

impl SolveMemory {
    pub fn new() -> Self {
        SolveMemory {
            system: System::new(),
            pid: Pid::from_u32(std::process::id()),
            start: None,
        }
    }

    /// Read the current RSS and tag it with `phase`.
    ///
    /// # Errors
    ///
    /// Returns `ProcessUnavailable` if the process cannot be refreshed.
    pub fn sample(&mut self, phase: SolvePhase) -> Result<MemorySnapshot, MemoryError> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let process = self
            .system
            .process(self.pid)
            .ok_or(MemoryError::ProcessUnavailable {
                pid: self.pid.as_u32(),
            })?;
        Ok(MemorySnapshot {
            phase,
            rss_bytes: process.memory(),
            taken_at: Instant::now(),
        })
    }

    /// Take the `solve_start` sample.
    ///
    /// # Errors
    ///
    /// Same as [`sample`](Self::sample).
    pub fn begin(&mut self) -> Result<MemorySnapshot, MemoryError> {
        let snapshot = self.sample(SolvePhase::Start)?;
        self.start = Some(snapshot);
        Ok(snapshot)
    }

    /// Take the `solve_end` sample and compare it with the start.
    ///
    /// # Errors
    ///
    /// Returns `NotStarted` without a prior [`begin`](Self::begin), otherwise
    /// the same as [`sample`](Self::sample).
    pub fn finish(&mut self) -> Result<SolveMemoryReport, MemoryError> {
        let start = self.start.take().ok_or(MemoryError::NotStarted)?;
        let end = self.sample(SolvePhase::End)?;
        Ok(SolveMemoryReport {
            rss_before: start.rss_bytes,
            rss_after: end.rss_bytes,
            elapsed: end.taken_at.duration_since(start.taken_at),
        })
    }
}

impl Default for SolveMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_and_finish() {
        let mut memory = SolveMemory::new();
        let start = memory.begin().unwrap_or_else(|err| panic!("{}", err));
        assert_eq!(start.phase, SolvePhase::Start);
        assert!(start.rss_bytes > 0);

        let report = memory.finish().unwrap_or_else(|err| panic!("{}", err));
        assert_eq!(report.rss_before, start.rss_bytes);
        assert!(report.rss_after > 0);
    }

    #[test]
    fn test_finish_without_begin() {
        let mut memory = SolveMemory::new();
        assert!(matches!(memory.finish(), Err(MemoryError::NotStarted)));
    }

    #[test]
    fn test_growth_and_diff() {
        let report = SolveMemoryReport {
            rss_before: 4096,
            rss_after: 1024,
            elapsed: Duration::ZERO,
        };
        assert_eq!(report.growth_bytes(), -3072);

        let now = Instant::now();
        let before = MemorySnapshot {
            phase: SolvePhase::Start,
            rss_bytes: 1024,
            taken_at: now,
        };
        let after = MemorySnapshot {
            phase: SolvePhase::End,
            rss_bytes: 4096,
            taken_at: now,
        };
        assert_eq!(after.diff(&before), 3072);
        assert_eq!(SolvePhase::End.to_string(), "solve_end");
    }
}
