use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Source of wall-clock time for the scheduler.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// What the scheduler yields to while it waits for the queue to drain.
pub trait Host: Clock {
    fn idle(&mut self);
    /// Handle pending input and traps. Returns true when the user has
    /// broken in and all sound must stop.
    fn check_events(&mut self) -> bool;
}

/// The real clock. Idling sleeps for a millisecond.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl Host for SystemClock {
    fn idle(&mut self) {
        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    fn check_events(&mut self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Tone {
    Rest,
    Frequency(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundEvent {
    pub tone: Tone,
    /// Seconds, never negative.
    pub duration: f64,
    /// Fraction of the duration the tone sounds, `0.0..=1.0`.
    pub fill: f64,
    pub looping: bool,
    pub end: DateTime<Utc>,
}

/// ## Sound queue
///
/// Events play one after another. The head of the queue is the one
/// sounding now; the events behind it are pending.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoundQueue {
    queue: VecDeque<SoundEvent>,
}

impl SoundQueue {
    pub fn new() -> SoundQueue {
        SoundQueue::default()
    }

    /// Rebuild a queue from captured events, end times untouched.
    pub fn from_events(events: Vec<SoundEvent>) -> SoundQueue {
        SoundQueue {
            queue: events.into(),
        }
    }

    /// Queue a tone to start when the last queued one ends, or now if the
    /// queue has run dry. A duration that is not positive ends at once; a
    /// fill outside `0..=1` is clamped.
    pub fn enqueue(
        &mut self,
        now: DateTime<Utc>,
        tone: Tone,
        duration: f64,
        fill: f64,
        looping: bool,
    ) {
        let start = match self.queue.back() {
            Some(last) if last.end > now => last.end,
            _ => now,
        };
        let duration = clamp_duration(duration);
        let fill = if fill.is_nan() { 1.0 } else { fill.max(0.0).min(1.0) };
        let end = start + Duration::microseconds((duration * 1e6).round() as i64);
        self.queue.push_back(SoundEvent {
            tone,
            duration,
            fill,
            looping,
            end,
        });
    }

    /// Drop every event that has finished by `now`.
    pub fn reap(&mut self, now: DateTime<Utc>) {
        while let Some(head) = self.queue.front() {
            if head.end > now {
                break;
            }
            self.queue.pop_front();
        }
    }

    /// Block until no more than `max_pending` events are queued behind the
    /// head. With `count_head` the head counts as pending too. If the host
    /// breaks in, the queue is cleared and false is returned.
    pub fn wait<H: Host + ?Sized>(
        &mut self,
        max_pending: usize,
        count_head: bool,
        host: &mut H,
    ) -> bool {
        while self.queue.len() + count_head as usize > max_pending + 1 {
            host.idle();
            if host.check_events() {
                self.reset();
                return false;
            }
            self.reap(host.now());
        }
        true
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len().saturating_sub(1)
    }

    pub fn reset(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &SoundEvent> {
        self.queue.iter()
    }
}

const MAX_DURATION: f64 = 1e9;

fn clamp_duration(duration: f64) -> f64 {
    if duration.is_nan() || duration <= 0.0 {
        0.0
    } else {
        duration.min(MAX_DURATION)
    }
}
