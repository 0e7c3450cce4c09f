//! Query statistics appended to DEFINE and MATCH replies.
//!
//! With `timing` enabled the closing status line reads
//! `250 ok [d/m/c = D/M/C Rr Uu Ss]`: definitions and matches sent,
//! comparisons the backends reported, then wall-clock, user and system
//! time in seconds.

use std::fmt;
use std::time::{Duration, Instant};

use dico::ResultHandle;
use nix::sys::resource::{UsageWho, getrusage};
use nix::sys::time::{TimeVal, TimeValLike};

/// Counts reported for one reply.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QueryCounts {
    pub(crate) defines: usize,
    pub(crate) matches: usize,
    pub(crate) compares: usize,
}

impl QueryCounts {
    fn compares(results: &[ResultHandle]) -> usize {
        results.iter().map(ResultHandle::compare_count).sum()
    }

    fn items(results: &[ResultHandle]) -> usize {
        results.iter().map(ResultHandle::count).sum()
    }

    /// Counts for a DEFINE reply over `results`.
    pub(crate) fn definitions(results: &[ResultHandle]) -> Self {
        Self {
            defines: Self::items(results),
            matches: 0,
            compares: Self::compares(results),
        }
    }

    /// Counts for a MATCH reply over `results`.
    pub(crate) fn matches(results: &[ResultHandle]) -> Self {
        Self {
            defines: 0,
            matches: Self::items(results),
            compares: Self::compares(results),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CpuTime {
    user: Duration,
    system: Duration,
}

impl CpuTime {
    fn now() -> Option<Self> {
        let usage = getrusage(UsageWho::RUSAGE_SELF).ok()?;
        Some(Self {
            user: duration(usage.user_time())?,
            system: duration(usage.system_time())?,
        })
    }
}

fn duration(value: TimeVal) -> Option<Duration> {
    u64::try_from(value.num_microseconds())
        .ok()
        .map(Duration::from_micros)
}

/// Time spent answering one command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Elapsed {
    pub(crate) real: Duration,
    pub(crate) user: Duration,
    pub(crate) system: Duration,
}

/// Seconds with millisecond precision.
struct Seconds(Duration);

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.0.as_secs(), self.0.subsec_millis())
    }
}

/// Renders the final status text of a timed reply.
pub(crate) fn timed_status(counts: QueryCounts, elapsed: Elapsed) -> String {
    format!(
        "ok [d/m/c = {}/{}/{} {}r {}u {}s]",
        counts.defines,
        counts.matches,
        counts.compares,
        Seconds(elapsed.real),
        Seconds(elapsed.user),
        Seconds(elapsed.system),
    )
}

/// Clock started when a DEFINE or MATCH begins; inert unless timing is on.
pub(crate) struct QueryTimer {
    started: Option<(Instant, Option<CpuTime>)>,
}

impl QueryTimer {
    pub(crate) fn start(enabled: bool) -> Self {
        Self {
            started: enabled.then(|| (Instant::now(), CpuTime::now())),
        }
    }

    /// Final status text: plain `ok`, or `ok` followed by the statistics.
    pub(crate) fn status(&self, counts: QueryCounts) -> String {
        let Some((started, cpu)) = self.started else {
            return "ok".to_owned();
        };
        let (user, system) = match (cpu, CpuTime::now()) {
            (Some(before), Some(after)) => (
                after.user.saturating_sub(before.user),
                after.system.saturating_sub(before.system),
            ),
            _ => (Duration::ZERO, Duration::ZERO),
        };
        timed_status(
            counts,
            Elapsed {
                real: started.elapsed(),
                user,
                system,
            },
        )
    }
}
