//! Bounded SPSC ring between the decoder (UART interrupt) and the main loop.
//!
//! Built on `heapless::spsc::Queue`: the producer writes the slot and then
//! publishes the new tail; the consumer only reads up to the published
//! index.  A full ring rejects the incoming tag and leaves its contents
//! untouched.
//!
//! ```text
//!  UART ISR ──▶ TagDecoder ──▶ TagProducer ══▶ [ ring ] ══▶ TagConsumer ──▶ compliance
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::spsc::{Consumer, Producer, Queue};
use log::warn;

use super::TagId;

/// Default ring size (usable capacity is one less).
pub const TAG_RING_LEN: usize = 16;

pub struct TagRing<const N: usize> {
    queue: Queue<TagId, N>,
    drops: AtomicU32,
}

impl<const N: usize> TagRing<N> {
    pub const fn new() -> Self {
        Self {
            queue: Queue::new(),
            drops: AtomicU32::new(0),
        }
    }

    /// Split into the interrupt-side producer and main-loop consumer.
    pub fn split(&mut self) -> (TagProducer<'_, N>, TagConsumer<'_, N>) {
        let Self { queue, drops } = self;
        let drops = &*drops;
        let (producer, consumer) = queue.split();
        (
            TagProducer {
                inner: producer,
                drops,
            },
            TagConsumer {
                inner: consumer,
                drops,
            },
        )
    }

    /// Single-context push (host builds and tests).
    pub fn push(&mut self, tag: TagId) -> bool {
        record_push(self.queue.enqueue(tag).is_ok(), &self.drops)
    }

    pub fn pop(&mut self) -> Option<TagId> {
        self.queue.dequeue()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Tags the ring can hold at once.
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn ring_full_drops(&self) -> u32 {
        self.drops.load(Ordering::Relaxed)
    }

    /// Iterate pending tags oldest first without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &TagId> {
        self.queue.iter()
    }
}

impl<const N: usize> Default for TagRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

fn record_push(accepted: bool, drops: &AtomicU32) -> bool {
    if !accepted {
        let total = drops.fetch_add(1, Ordering::Relaxed) + 1;
        warn!("rfid: tag ring full, dropped ({total} total)");
    }
    accepted
}

/// Interrupt-side handle.
pub struct TagProducer<'a, const N: usize> {
    inner: Producer<'a, TagId, N>,
    drops: &'a AtomicU32,
}

impl<const N: usize> TagProducer<'_, N> {
    /// Publish a tag.  Returns `false` (and counts the drop) when full.
    pub fn push(&mut self, tag: TagId) -> bool {
        record_push(self.inner.enqueue(tag).is_ok(), self.drops)
    }

    pub fn ready(&self) -> bool {
        self.inner.ready()
    }
}

/// Main-loop handle.
pub struct TagConsumer<'a, const N: usize> {
    inner: Consumer<'a, TagId, N>,
    drops: &'a AtomicU32,
}

impl<const N: usize> TagConsumer<'_, N> {
    pub fn pop(&mut self) -> Option<TagId> {
        self.inner.dequeue()
    }

    /// Hand every pending tag to `handler`, oldest first.
    pub fn drain(&mut self, mut handler: impl FnMut(TagId)) {
        while let Some(tag) = self.inner.dequeue() {
            handler(tag);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    pub fn ring_full_drops(&self) -> u32 {
        self.drops.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(n: u32) -> TagId {
        TagId::right_aligned(n.to_string().as_bytes())
    }

    #[test]
    fn usable_capacity_is_one_less_than_len() {
        let ring: TagRing<8> = TagRing::new();
        assert_eq!(ring.capacity(), 7);
    }

    #[test]
    fn full_ring_rejects_and_counts_once_per_push() {
        let mut ring: TagRing<8> = TagRing::new();
        for i in 0..7 {
            assert!(ring.push(tag(i)));
        }
        let before: Vec<TagId> = ring.iter().copied().collect();

        assert!(!ring.push(tag(99)));
        assert_eq!(ring.ring_full_drops(), 1);
        assert!(!ring.push(tag(100)));
        assert_eq!(ring.ring_full_drops(), 2);

        let after: Vec<TagId> = ring.iter().copied().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn split_halves_share_fifo_and_drop_counter() {
        let mut ring: TagRing<4> = TagRing::new();
        let (mut tx, mut rx) = ring.split();
        assert!(tx.push(tag(1)));
        assert!(tx.push(tag(2)));
        assert!(tx.push(tag(3)));
        assert!(!tx.ready());
        assert!(!tx.push(tag(4)));
        assert_eq!(rx.ring_full_drops(), 1);

        let mut seen = Vec::new();
        rx.drain(|t| seen.push(t));
        assert_eq!(seen, vec![tag(1), tag(2), tag(3)]);
        assert!(rx.is_empty());
    }
}
