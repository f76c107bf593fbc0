use chrono::Utc;
use crossbeam_channel::{Sender, bounded};
use log::{debug, trace};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tempo_core::{Duration, Timestamp};
use tempo_ports::{Clock, Timer, TimerReceiver};

/// Stand-in deadline for delays past what `Instant` can represent
const FAR_FUTURE: std::time::Duration = std::time::Duration::from_secs(60 * 60 * 24 * 365 * 30);

static NEXT_TIMER: AtomicU64 = AtomicU64::new(0);

/// Real system clock for production use
///
/// This simply returns the current wall-clock time, and its timers wait on
/// real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }

    /// Like [`Clock::new_timer`], but returns the concrete timer type
    pub fn timer(&self, duration: Duration) -> SystemTimer {
        SystemTimer::start(duration)
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn new_timer(&self, duration: Duration) -> Box<dyn Timer> {
        Box::new(self.timer(duration))
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}

/// Timer that waits on real time
///
/// `std` has no resettable timer, so each timer owns a worker thread that
/// sleeps until the armed deadline and then publishes the wall-clock fire
/// time. The worker is shut down and joined when the timer is dropped.
pub struct SystemTimer {
    shared: Arc<TimerShared>,
    receiver: TimerReceiver,
    worker: Option<JoinHandle<()>>,
}

struct TimerShared {
    state: Mutex<WorkerState>,
    wake: Condvar,
}

struct WorkerState {
    /// `Some` while armed
    deadline: Option<Instant>,
    closed: bool,
}

impl SystemTimer {
    fn start(duration: Duration) -> Self {
        let (tx, receiver) = bounded(1);
        let shared = Arc::new(TimerShared {
            state: Mutex::new(WorkerState {
                deadline: Some(instant_after(duration)),
                closed: false,
            }),
            wake: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(format!("tempo-timer-{}", NEXT_TIMER.fetch_add(1, Ordering::Relaxed)))
            .spawn(move || run_worker(worker_shared, tx))
            .expect("Failed to spawn timer thread");

        Self {
            shared,
            receiver,
            worker: Some(worker),
        }
    }

    /// Whether the timer is armed
    pub fn is_armed(&self) -> bool {
        self.shared.state.lock().deadline.is_some()
    }
}

impl Timer for SystemTimer {
    fn reset(&self, duration: Duration) -> bool {
        let mut state = self.shared.state.lock();
        let was_armed = state.deadline.is_some();
        state.deadline = Some(instant_after(duration));
        self.shared.wake.notify_one();
        was_armed
    }

    fn stop(&self) -> bool {
        let mut state = self.shared.state.lock();
        let was_armed = state.deadline.take().is_some();
        self.shared.wake.notify_one();
        was_armed
    }

    fn receiver(&self) -> &TimerReceiver {
        &self.receiver
    }
}

impl Drop for SystemTimer {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.closed = true;
            self.shared.wake.notify_one();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(shared: Arc<TimerShared>, tx: Sender<Timestamp>) {
    let mut state = shared.state.lock();
    loop {
        if state.closed {
            trace!("Timer worker exiting");
            return;
        }
        let deadline = state.deadline;
        match deadline {
            None => shared.wake.wait(&mut state),
            Some(deadline) if Instant::now() >= deadline => {
                state.deadline = None;
                let fired_at = Utc::now();
                debug!("System timer fired at {}", fired_at);
                if tx.try_send(fired_at).is_err() {
                    debug!("System timer notification dropped, previous one still unread");
                }
            }
            Some(deadline) => {
                let _ = shared.wake.wait_until(&mut state, deadline);
            }
        }
    }
}

/// Real-time instant `duration` from now; non-positive means now
fn instant_after(duration: Duration) -> Instant {
    let now = Instant::now();
    let delay = duration.to_std().unwrap_or_default();
    now.checked_add(delay).unwrap_or(now + FAR_FUTURE)
}
