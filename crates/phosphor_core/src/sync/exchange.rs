//! # Frame Exchange
//!
//! Double-buffered handshake between one producer (simulation) and one
//! consumer (render).
//!
//! ## Architecture
//!
//! ```text
//!  Simulation thread                         Render thread
//!  ─────────────────                         ─────────────
//!  reclaim_slot()  ── take stale packet
//!  publish(packet) ── store into slot s ──►  render_frame(|p| ...)
//!        │              s = frame % N              │
//!        │ blocks until renderer                   │ blocks until a new
//!        │ has caught up (≤ 1 frame lead)          │ frame is published
//!        ▼                                         ▼
//!  simulated += 1  ◄──────── condvar ───────  rendered += 1
//! ```
//!
//! ## Ordering guarantees
//!
//! - The render thread never reads slot `s` before the simulation thread
//!   has fully published it (the counter increments happen under the gate
//!   mutex, with acquire/release atomics for lock-free observers).
//! - Every published frame is rendered, in strictly increasing order -
//!   this is not a drop-late-frames design.
//! - A slot's occupant is only taken back by [`FrameExchange::reclaim_slot`]
//!   on the *next* visit to that slot index, by which point the publish
//!   wait has already observed the renderer past it. With two slots this
//!   is the classic two-generation-delay reuse pattern.
//!
//! Waits park on a condvar rather than spinning; [`FrameExchange::shutdown`]
//! wakes both sides promptly.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex};
use tracing::debug;

/// Double-buffered frame handoff between a simulation and a render thread.
///
/// Generic over the packet type; the exchange owns the in-flight packets
/// and hands out only short-lived references to the consumer.
pub struct FrameExchange<T> {
    /// In-flight packet slots, indexed by `frame % slot_count`.
    slots: Box<[Mutex<Option<T>>]>,
    /// Frames fully published by the simulation thread.
    simulated: AtomicU64,
    /// Frames fully consumed by the render thread.
    rendered: AtomicU64,
    /// Cooperative shutdown flag, checked by every wait loop.
    run: AtomicBool,
    /// Gate for the progress condvar.
    gate: Mutex<()>,
    /// Signalled whenever a counter advances or shutdown begins.
    progress: Condvar,
}

impl<T> FrameExchange<T> {
    /// Creates an exchange with `slot_count` in-flight packets.
    ///
    /// Two slots give the classic double-buffer ping-pong; more reduce
    /// stall frequency at the cost of memory and latency.
    ///
    /// # Panics
    ///
    /// Panics if `slot_count < 2`.
    #[must_use]
    pub fn new(slot_count: usize) -> Self {
        assert!(slot_count >= 2, "frame exchange needs at least two slots");
        let slots = (0..slot_count)
            .map(|_| Mutex::new(None))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            simulated: AtomicU64::new(0),
            rendered: AtomicU64::new(0),
            run: AtomicBool::new(true),
            gate: Mutex::new(()),
            progress: Condvar::new(),
        }
    }

    /// Number of in-flight packet slots.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Frames fully published so far.
    #[inline]
    #[must_use]
    pub fn simulated_frames(&self) -> u64 {
        self.simulated.load(Ordering::Acquire)
    }

    /// Frames fully consumed so far.
    #[inline]
    #[must_use]
    pub fn rendered_frames(&self) -> u64 {
        self.rendered.load(Ordering::Acquire)
    }

    /// Whether the exchange is still running.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run.load(Ordering::Acquire)
    }

    /// Takes the stale occupant of the slot the *next* publish will write.
    ///
    /// Returns `None` during the first `slot_count` frames, when the slot
    /// has never been filled. Safe exactly because the publish wait one
    /// full cycle earlier observed the renderer finish this occupant.
    pub fn reclaim_slot(&self) -> Option<T> {
        let frame = self.simulated.load(Ordering::Acquire);
        let idx = (frame % self.slots.len() as u64) as usize;
        self.slots[idx].lock().take()
    }

    /// Publishes the next frame's packet and applies backpressure.
    ///
    /// Stores the packet into slot `simulated % slot_count`, then blocks
    /// until the render thread has caught up to the previous frame -
    /// at most one simulation frame of lead is ever tolerated. Returns
    /// `false` if the exchange shut down while waiting (the packet stays
    /// in its slot and is dropped with the exchange).
    pub fn publish(&self, packet: T) -> bool {
        let frame = self.simulated.load(Ordering::Acquire);
        let idx = (frame % self.slots.len() as u64) as usize;
        *self.slots[idx].lock() = Some(packet);

        let mut gate = self.gate.lock();
        while self.run.load(Ordering::Acquire) && self.rendered.load(Ordering::Acquire) < frame {
            self.progress.wait(&mut gate);
        }
        if !self.run.load(Ordering::Acquire) {
            return false;
        }
        self.simulated.store(frame + 1, Ordering::Release);
        drop(gate);
        self.progress.notify_all();
        true
    }

    /// Waits for the next published frame and consumes it in place.
    ///
    /// Blocks until a frame is available, runs `consume` on a reference to
    /// the packet (the packet stays in its slot for later reclamation),
    /// then advances the rendered counter. Returns `false` only once the
    /// exchange has shut down *and* no published frame is pending: every
    /// published frame is still consumed, in order - this is not a
    /// drop-late-frames design.
    ///
    /// # Panics
    ///
    /// Panics if the published slot is empty - a protocol violation that
    /// cannot occur through [`FrameExchange::publish`].
    pub fn render_frame<F: FnOnce(&T)>(&self, consume: F) -> bool {
        let frame = self.rendered.load(Ordering::Acquire);
        {
            let mut gate = self.gate.lock();
            while self.run.load(Ordering::Acquire)
                && self.simulated.load(Ordering::Acquire) == frame
            {
                self.progress.wait(&mut gate);
            }
            // Shutdown drains: only bail once nothing is pending.
            if self.simulated.load(Ordering::Acquire) == frame {
                return false;
            }
        }

        let idx = (frame % self.slots.len() as u64) as usize;
        {
            let slot = self.slots[idx].lock();
            let packet = slot
                .as_ref()
                .expect("published frame slot is empty: exchange protocol violation");
            consume(packet);
        }

        let gate = self.gate.lock();
        self.rendered.store(frame + 1, Ordering::Release);
        drop(gate);
        self.progress.notify_all();
        true
    }

    /// Begins cooperative shutdown, waking both sides' waits.
    pub fn shutdown(&self) {
        self.run.store(false, Ordering::Release);
        let gate = self.gate.lock();
        drop(gate);
        self.progress.notify_all();
        debug!("frame exchange shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn startup_first_frames_reclaim_nothing() {
        let ex: FrameExchange<u64> = FrameExchange::new(2);

        // Frame 0: slot 0 empty, publish does not block.
        assert!(ex.reclaim_slot().is_none());
        assert!(ex.publish(0));
        assert_eq!(ex.simulated_frames(), 1);

        assert!(ex.render_frame(|p| assert_eq!(*p, 0)));

        // Frame 1: slot 1 also empty.
        assert!(ex.reclaim_slot().is_none());
        assert!(ex.publish(1));
        assert!(ex.render_frame(|p| assert_eq!(*p, 1)));

        // Frame 2 revisits slot 0: now its stale occupant comes back.
        assert_eq!(ex.reclaim_slot(), Some(0));
    }

    #[test]
    fn slot_not_reclaimed_until_renderer_advanced_past_it() {
        let ex: FrameExchange<u64> = FrameExchange::new(2);

        assert!(ex.publish(0));
        assert!(ex.render_frame(|_| {}));
        assert!(ex.publish(1));

        // Frame 2 would reuse slot 0. The renderer finished frame 0
        // already (rendered = 1), which is exactly what the frame-1
        // publish waited for - reclaiming frame 0's packet is safe.
        assert!(ex.rendered_frames() >= 1);
        assert_eq!(ex.reclaim_slot(), Some(0));
    }

    #[test]
    fn frames_consumed_in_order_across_threads() {
        let ex: Arc<FrameExchange<u64>> = Arc::new(FrameExchange::new(2));
        let consumer = Arc::clone(&ex);

        let handle = std::thread::spawn(move || {
            let mut seen = Vec::new();
            for _ in 0..50 {
                assert!(consumer.render_frame(|p| seen.push(*p)));
            }
            seen
        });

        for frame in 0..50u64 {
            let _ = ex.reclaim_slot();
            assert!(ex.publish(frame));
        }

        let seen = handle.join().unwrap();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn simulation_leads_by_at_most_one_frame() {
        let ex: Arc<FrameExchange<u64>> = Arc::new(FrameExchange::new(2));
        let producer = Arc::clone(&ex);

        let handle = std::thread::spawn(move || {
            for frame in 0..10u64 {
                let _ = producer.reclaim_slot();
                if !producer.publish(frame) {
                    break;
                }
            }
        });

        // With no renderer running, the producer can finish frame 0 and
        // must then block inside the frame-1 publish.
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(ex.simulated_frames(), 1);

        // Each consumed frame releases exactly one more publish.
        assert!(ex.render_frame(|_| {}));
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(ex.simulated_frames(), 2);

        ex.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn shutdown_wakes_blocked_producer() {
        let ex: Arc<FrameExchange<u64>> = Arc::new(FrameExchange::new(2));
        let producer = Arc::clone(&ex);

        let handle = std::thread::spawn(move || {
            assert!(producer.publish(0));
            // Blocks: renderer never runs.
            producer.publish(1)
        });

        std::thread::sleep(Duration::from_millis(50));
        ex.shutdown();
        assert!(!handle.join().unwrap());
    }

    #[test]
    fn shutdown_wakes_blocked_consumer() {
        let ex: Arc<FrameExchange<u64>> = Arc::new(FrameExchange::new(2));
        let consumer = Arc::clone(&ex);

        let handle = std::thread::spawn(move || consumer.render_frame(|_| {}));

        std::thread::sleep(Duration::from_millis(50));
        ex.shutdown();
        assert!(!handle.join().unwrap());
    }

    #[test]
    fn shutdown_drains_pending_frames_before_exiting() {
        let ex: FrameExchange<u64> = FrameExchange::new(2);

        assert!(ex.publish(0));
        ex.shutdown();

        // The already-published frame is still consumed, in order.
        let mut seen = None;
        assert!(ex.render_frame(|p| seen = Some(*p)));
        assert_eq!(seen, Some(0));

        // Nothing pending now: the consumer is released.
        assert!(!ex.render_frame(|_| {}));
    }

    #[test]
    fn triple_buffering_allows_deeper_lead() {
        let ex: FrameExchange<u64> = FrameExchange::new(3);
        assert_eq!(ex.slot_count(), 3);

        // Same protocol, more slots: the first three frames reclaim
        // nothing and the fourth revisits slot 0.
        assert!(ex.publish(0));
        assert!(ex.render_frame(|_| {}));
        assert!(ex.reclaim_slot().is_none());
        assert!(ex.publish(1));
        assert!(ex.render_frame(|_| {}));
        assert!(ex.reclaim_slot().is_none());
        assert!(ex.publish(2));
        assert!(ex.render_frame(|_| {}));
        assert_eq!(ex.reclaim_slot(), Some(0));
    }
}
