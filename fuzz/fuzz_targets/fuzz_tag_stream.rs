//! Fuzz target: `TagDecoder::feed` → `TagRing`
//!
//! Drives arbitrary byte sequences through the reader-frame decoder into
//! the tag ring.  The decoder must never panic, every tag must be exactly
//! `TAG_LEN` wide, and the ring must never exceed its usable capacity.
//!
//! cargo fuzz run fuzz_tag_stream

#![no_main]

use libfuzzer_sys::fuzz_target;
use mopguard::config::SystemConfig;
use mopguard::rfid::TAG_LEN;
use mopguard::rfid::decoder::TagDecoder;
use mopguard::rfid::ring::{TAG_RING_LEN, TagRing};

fuzz_target!(|data: &[u8]| {
    let mut decoder = TagDecoder::new(&SystemConfig::default());
    let mut ring: TagRing<TAG_RING_LEN> = TagRing::new();
    let mut decoded = 0u32;

    decoder.feed(data, |tag| {
        assert_eq!(tag.as_bytes().len(), TAG_LEN);
        decoded += 1;
        ring.push(tag);
    });

    assert!(ring.len() <= ring.capacity());
    assert_eq!(ring.len() as u32 + ring.ring_full_drops(), decoded);

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    decoder.feed(data, |_| {});
});
