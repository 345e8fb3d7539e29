//! Iteration-capped binary search over index-addressed records.
//!
//! The probe reads one record and compares its key to the target.  Sorted
//! order is assumed but not trusted: unsorted data yields a wrong answer,
//! never a hang, because the probe count is hard-capped.

use core::cmp::Ordering;

/// Default probe cap.  2^13 RFID records need at most 14 probes.
pub const DEFAULT_SEARCH_CAP: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub found: bool,
    /// Index of the match, or the insertion point on a miss.
    pub index: u32,
    pub iterations: u8,
    /// The cap ran out before the range closed.
    pub capped: bool,
}

/// Binary search over `[0, count)`.
///
/// `probe(i)` returns how record `i` compares to the target.
pub fn bounded_search<E>(
    count: u32,
    cap: u8,
    mut probe: impl FnMut(u32) -> Result<Ordering, E>,
) -> Result<SearchResult, E> {
    let mut lo = 0u32;
    let mut hi = count;
    let mut iterations = 0u8;

    while lo < hi {
        if iterations >= cap {
            return Ok(SearchResult {
                found: false,
                index: lo,
                iterations,
                capped: true,
            });
        }
        iterations += 1;

        let mid = lo + (hi - lo) / 2;
        match probe(mid)? {
            Ordering::Equal => {
                return Ok(SearchResult {
                    found: true,
                    index: mid,
                    iterations,
                    capped: false,
                });
            }
            Ordering::Less => lo = mid + 1,
            Ordering::Greater => hi = mid,
        }
    }

    Ok(SearchResult {
        found: false,
        index: lo,
        iterations,
        capped: false,
    })
}
