//! Fuzz target: record decoding from raw flash slots.
//!
//! Arbitrary slot bytes must decode to a record or a `DbError`, never
//! panic.  Successfully decoded records re-encode to a slot with the same
//! key.
//!
//! cargo fuzz run fuzz_record_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use mopguard::storage::record::Record;
use mopguard::storage::{MopRecord, RfidRecord, RoomRecord};

fn check<R: Record + core::fmt::Debug>(data: &[u8]) {
    if data.len() < R::STRIDE {
        return;
    }
    let slot = &data[..R::STRIDE];
    if let Ok(record) = R::decode(slot) {
        let mut buf = [0u8; 32];
        record.encode(&mut buf);
        assert!(R::key_from_bytes(&buf[..R::STRIDE]) == R::key_from_bytes(slot));
    }
}

fuzz_target!(|data: &[u8]| {
    check::<RfidRecord>(data);
    check::<RoomRecord>(data);
    check::<MopRecord>(data);
});
