//! Interval timer for background jobs.
//!
//! Work that telemetry does not drive (the weather refresh) registers a
//! [`Job`] here.  The owner calls [`Scheduler::tick`] with the time that
//! passed; every job whose interval ran out is reported to a
//! [`SchedulerDelegate`] by label.
//!
//! ```text
//!  tick(1s) ──▶ Scheduler ──▶ delegate.on_due("weather-refresh")
//!                  │
//!                  └─ Job { every: 600s, immediate: true }
//! ```

use core::time::Duration;

use heapless::Vec;
use log::debug;

use crate::app::ports::SchedulerDelegate;

/// Upper bound on registered jobs.
const MAX_JOBS: usize = 4;

/// A recurring job.
#[derive(Debug, Clone)]
pub struct Job {
    pub label: &'static str,
    /// Time between two runs.
    pub every: Duration,
    /// Run on the first tick instead of waiting one full interval.
    pub immediate: bool,
}

#[derive(Debug)]
struct Slot {
    job: Job,
    since_last: Duration,
    ran: bool,
}

/// Fixed-capacity set of recurring jobs.
#[derive(Debug, Default)]
pub struct Scheduler {
    slots: Vec<Slot, MAX_JOBS>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Register a job.  Hands it back when every slot is taken.
    pub fn add(&mut self, job: Job) -> Result<(), Job> {
        let label = job.label;
        self.slots
            .push(Slot {
                job,
                since_last: Duration::ZERO,
                ran: false,
            })
            .map_err(|slot| slot.job)?;
        debug!("Job '{}' registered", label);
        Ok(())
    }

    /// Advance all jobs by `elapsed`.  A job runs at most once per call.
    pub fn tick(&mut self, elapsed: Duration, delegate: &mut dyn SchedulerDelegate) {
        for slot in self.slots.iter_mut() {
            slot.since_last += elapsed;
            let due = if slot.ran || !slot.job.immediate {
                slot.since_last >= slot.job.every
            } else {
                true
            };
            if due {
                debug!("Job '{}' due after {:?}", slot.job.label, slot.since_last);
                slot.since_last = Duration::ZERO;
                slot.ran = true;
                delegate.on_due(slot.job.label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[derive(Default)]
    struct Log(std::vec::Vec<String>);

    impl SchedulerDelegate for Log {
        fn on_due(&mut self, label: &str) {
            self.0.push(label.to_string());
        }
    }

    fn job(every_secs: u64, immediate: bool) -> Job {
        Job {
            label: "weather-refresh",
            every: Duration::from_secs(every_secs),
            immediate,
        }
    }

    #[test]
    fn waits_one_interval_by_default() {
        let mut sched = Scheduler::new();
        let mut log = Log::default();
        sched.add(job(10, false)).unwrap();

        for _ in 0..9 {
            sched.tick(SECOND, &mut log);
        }
        assert!(log.0.is_empty());

        sched.tick(SECOND, &mut log);
        assert_eq!(log.0, ["weather-refresh"]);
    }

    #[test]
    fn immediate_job_runs_first_tick_then_on_interval() {
        let mut sched = Scheduler::new();
        let mut log = Log::default();
        sched.add(job(600, true)).unwrap();

        sched.tick(SECOND, &mut log);
        assert_eq!(log.0.len(), 1);

        for _ in 0..599 {
            sched.tick(SECOND, &mut log);
        }
        assert_eq!(log.0.len(), 1);

        sched.tick(SECOND, &mut log);
        assert_eq!(log.0.len(), 2);
    }

    #[test]
    fn late_tick_runs_once_and_restarts_interval() {
        let mut sched = Scheduler::new();
        let mut log = Log::default();
        sched.add(job(5, false)).unwrap();

        sched.tick(Duration::from_secs(17), &mut log);
        assert_eq!(log.0.len(), 1);

        sched.tick(Duration::from_secs(4), &mut log);
        assert_eq!(log.0.len(), 1);
    }

    #[test]
    fn capacity_is_bounded() {
        let mut sched = Scheduler::new();
        for _ in 0..MAX_JOBS {
            assert!(sched.add(job(1, false)).is_ok());
        }
        let rejected = sched.add(job(7, true)).unwrap_err();
        assert_eq!(rejected.every, Duration::from_secs(7));
    }
}
