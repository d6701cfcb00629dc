//! Bounded single-producer single-consumer ring buffer.
//!
//! Infrastructure utility for ingress/egress plumbing around the engine
//! thread; the matching core itself never touches it. Push rejects on full
//! and pop rejects on empty, both without blocking. The producer publishes
//! with a release store on `head` and the consumer acquires it before
//! reading the slot, so a successful pop always observes the complete value
//! of the corresponding push. Head and tail live on separate cache lines to
//! keep the two threads from false-sharing.
//!
//! One slot is kept empty to tell full from empty, so a ring of capacity
//! `n` holds at most `n - 1` values.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

struct Shared<T> {
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
    /// Next slot the producer writes.
    head: CachePadded<AtomicUsize>,
    /// Next slot the consumer reads.
    tail: CachePadded<AtomicUsize>,
}

// The producer and consumer each touch disjoint slots, handed over through
// the release/acquire pair on `head` and `tail`.
unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send> Sync for Shared<T> {}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        let head = *self.head.get_mut();
        let mut tail = *self.tail.get_mut();
        while tail != head {
            unsafe { (*self.buffer[tail].get()).assume_init_drop() };
            tail = (tail + 1) % self.buffer.len();
        }
    }
}

/// Create a ring with `capacity` slots (usable capacity `capacity - 1`).
///
/// # Panics
/// Panics if `capacity < 2` (a one-slot ring could hold nothing).
pub fn channel<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    assert!(capacity >= 2, "ring capacity must be at least 2");
    let buffer: Box<[UnsafeCell<MaybeUninit<T>>]> = (0..capacity)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect();
    let shared = Arc::new(Shared {
        buffer,
        head: CachePadded::new(AtomicUsize::new(0)),
        tail: CachePadded::new(AtomicUsize::new(0)),
    });
    (
        Producer {
            shared: Arc::clone(&shared),
        },
        Consumer { shared },
    )
}

/// Write half of the ring. Not clonable; exactly one producer exists.
pub struct Producer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Producer<T> {
    /// Push a value, or hand it back when the ring is full. Never blocks.
    #[inline]
    pub fn push(&mut self, value: T) -> Result<(), T> {
        let head = self.shared.head.load(Ordering::Relaxed);
        let next = (head + 1) % self.shared.buffer.len();

        if next == self.shared.tail.load(Ordering::Acquire) {
            return Err(value);
        }

        unsafe { (*self.shared.buffer[head].get()).write(value) };
        self.shared.head.store(next, Ordering::Release);
        Ok(())
    }

    /// Usable capacity (one slot is reserved).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.buffer.len() - 1
    }
}

/// Read half of the ring. Not clonable; exactly one consumer exists.
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Consumer<T> {
    /// Pop the oldest value, or `None` when the ring is empty. Never blocks.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        let tail = self.shared.tail.load(Ordering::Relaxed);

        if tail == self.shared.head.load(Ordering::Acquire) {
            return None;
        }

        let value = unsafe { (*self.shared.buffer[tail].get()).assume_init_read() };
        self.shared
            .tail
            .store((tail + 1) % self.shared.buffer.len(), Ordering::Release);
        Some(value)
    }

    /// Usable capacity (one slot is reserved).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.buffer.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_fifo() {
        let (mut tx, mut rx) = channel(8);
        for i in 0..5 {
            tx.push(i).unwrap();
        }
        for i in 0..5 {
            assert_eq!(rx.pop(), Some(i));
        }
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn push_rejects_on_full() {
        let (mut tx, mut rx) = channel(4);
        assert_eq!(tx.capacity(), 3);

        tx.push(1).unwrap();
        tx.push(2).unwrap();
        tx.push(3).unwrap();
        assert_eq!(tx.push(4), Err(4));

        // Draining one slot makes room for exactly one more.
        assert_eq!(rx.pop(), Some(1));
        tx.push(4).unwrap();
        assert_eq!(tx.push(5), Err(5));
    }

    #[test]
    fn pop_rejects_on_empty() {
        let (mut tx, mut rx) = channel::<u64>(4);
        assert_eq!(rx.pop(), None);
        tx.push(7).unwrap();
        assert_eq!(rx.pop(), Some(7));
        assert_eq!(rx.pop(), None);
    }

    #[test]
    fn wraps_around_many_times() {
        let (mut tx, mut rx) = channel(3);
        for i in 0..1000u64 {
            tx.push(i).unwrap();
            assert_eq!(rx.pop(), Some(i));
        }
    }

    #[test]
    fn drops_undelivered_values() {
        let (mut tx, rx) = channel(8);
        tx.push(String::from("a")).unwrap();
        tx.push(String::from("b")).unwrap();
        drop(tx);
        drop(rx);
    }

    #[test]
    fn transfers_across_threads_in_order() {
        const COUNT: u64 = 100_000;
        let (mut tx, mut rx) = channel(1024);

        let producer = std::thread::spawn(move || {
            for i in 0..COUNT {
                let mut value = i;
                loop {
                    match tx.push(value) {
                        Ok(()) => break,
                        Err(v) => {
                            value = v;
                            std::hint::spin_loop();
                        }
                    }
                }
            }
        });

        let mut expected = 0;
        while expected < COUNT {
            if let Some(value) = rx.pop() {
                assert_eq!(value, expected);
                expected += 1;
            } else {
                std::hint::spin_loop();
            }
        }

        producer.join().unwrap();
        assert_eq!(rx.pop(), None);
    }
}
