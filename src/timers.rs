//! Background timers feeding events back to the game loop
//!
//! Both timers run as tasks on a tokio runtime and report through a plain
//! `std::sync::mpsc` channel, so the loop that owns the [`Game`] never has to
//! be async itself. Dropping a timer aborts its task.
//!
//! [`Game`]: crate::game::Game

use crate::game::Event;
use std::sync::mpsc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace};

/// Shortest period a ticker will run at
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Periodic source of [`Event::GravityTick`]
#[derive(Debug)]
pub struct GravityTicker {
    fast_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl GravityTicker {
    /// Start ticking every `tick`, or every `fast_tick` while fast drop is on
    pub fn spawn(
        handle: &Handle,
        tick: Duration,
        fast_tick: Duration,
        event_tx: mpsc::Sender<Event>,
    ) -> Self {
        let (fast_tx, mut fast_rx) = watch::channel(false);

        let task = handle.spawn(async move {
            let mut fast = false;
            let mut ticker = period(tick);
            debug!("Gravity ticker started at {:?}", tick);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if event_tx.send(Event::GravityTick).is_err() {
                            debug!("Event receiver gone, stopping gravity ticker");
                            break;
                        }
                    }
                    changed = fast_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let next = *fast_rx.borrow_and_update();
                        if next != fast {
                            fast = next;
                            let rate = if fast { fast_tick } else { tick };
                            trace!("Gravity now every {:?}", rate);
                            // Restart the period so the new rate applies from now
                            ticker = period(rate);
                        }
                    }
                }
            }
        });

        Self { fast_tx, task }
    }

    /// Switch between the normal and the fast rate
    pub fn set_fast(&self, on: bool) {
        self.fast_tx.send_replace(on);
    }

    pub fn is_fast(&self) -> bool {
        *self.fast_tx.borrow()
    }
}

impl Drop for GravityTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn period(every: Duration) -> Interval {
    let every = every.max(MIN_PERIOD);
    // First tick is one full period away, not immediate
    let mut interval = interval_at(Instant::now() + every, every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// One-shot source of [`Event::AnimationComplete`]
#[derive(Debug)]
pub struct AnimationTimer {
    task: JoinHandle<()>,
}

impl AnimationTimer {
    pub fn spawn(handle: &Handle, duration: Duration, event_tx: mpsc::Sender<Event>) -> Self {
        let task = handle.spawn(async move {
            sleep(duration).await;
            let _ = event_tx.send(Event::AnimationComplete);
        });
        Self { task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AnimationTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
