//! One-shot, cancellable hold timer.
//!
//! A [`TimerHandle`] owns a spawned task that sleeps until the deadline and then
//! runs its callback. Firing and cancelling race on a single atomic slot: whichever
//! moves it out of `Armed` first wins, and the loser does nothing.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

const ARMED: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Armed,
    Fired,
    Cancelled,
}

pub struct TimerHandle {
    state: Arc<AtomicU8>,
    deadline: Instant,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Spawn a timer that runs `on_fire` at `deadline` unless cancelled first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F, Fut>(deadline: Instant, on_fire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(ARMED));
        let slot = Arc::clone(&state);
        let task = tokio::spawn(async move {
            time::sleep_until(deadline).await;
            if slot
                .compare_exchange(ARMED, FIRED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                on_fire().await;
            }
        });

        Self {
            state,
            deadline,
            task,
        }
    }

    /// Cancel the timer. Returns `true` if this call won, i.e. the callback will
    /// never run. Returns `false` if the timer already fired or was cancelled.
    pub fn cancel(&self) -> bool {
        let won = self
            .state
            .compare_exchange(ARMED, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.task.abort();
        }
        won
    }

    pub fn state(&self) -> TimerState {
        match self.state.load(Ordering::Acquire) {
            ARMED => TimerState::Armed,
            FIRED => TimerState::Fired,
            _ => TimerState::Cancelled,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("state", &self.state())
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn counting_timer(after: Duration, hits: &Arc<AtomicUsize>) -> TimerHandle {
        let hits = Arc::clone(hits);
        TimerHandle::arm(Instant::now() + after, move || async move {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_at_deadline() {
        let hits = Arc::new(AtomicUsize::new(0));
        let timer = counting_timer(Duration::from_secs(60), &hits);

        time::advance(Duration::from_secs(59)).await;
        settle().await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(timer.state(), TimerState::Armed);

        time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(timer.state(), TimerState::Fired);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let hits = Arc::new(AtomicUsize::new(0));
        let timer = counting_timer(Duration::from_secs(10), &hits);

        assert!(timer.cancel());
        time::advance(Duration::from_secs(30)).await;
        settle().await;

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(timer.state(), TimerState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_fire_is_a_benign_no_op() {
        let hits = Arc::new(AtomicUsize::new(0));
        let timer = counting_timer(Duration::from_secs(1), &hits);

        time::advance(Duration::from_secs(2)).await;
        settle().await;

        assert!(!timer.cancel());
        assert_eq!(timer.state(), TimerState::Fired);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_cancel_loses() {
        let hits = Arc::new(AtomicUsize::new(0));
        let timer = counting_timer(Duration::from_secs(5), &hits);

        assert!(timer.cancel());
        assert!(!timer.cancel());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn fire_and_cancel_race_has_exactly_one_winner() {
        for _ in 0..100 {
            let hits = Arc::new(AtomicUsize::new(0));
            let timer = Arc::new(counting_timer(Duration::from_micros(50), &hits));

            let racer = Arc::clone(&timer);
            let cancel = tokio::spawn(async move {
                time::sleep(Duration::from_micros(50)).await;
                racer.cancel()
            });
            let cancelled = cancel.await.unwrap();
            time::sleep(Duration::from_millis(10)).await;

            let fired = hits.load(Ordering::SeqCst);
            assert_eq!(usize::from(cancelled) + fired, 1, "cancelled={cancelled} fired={fired}");
        }
    }
}
