//! CPU fan-out for data-parallel kernels.
//!
//! Large element-wise, reduction, and transpose kernels partition their flat
//! output range into `N ≈ hardware_parallelism` chunks and process them on a
//! [`std::thread::scope`] fan-out; below [`PARALLEL_THRESHOLD`] elements the
//! work runs serially on the calling thread to avoid paying thread spawn
//! overhead on small tensors.
//!
//! Every kernel owns exactly one output buffer and every output cell is
//! written by exactly one worker, so chunking is done by splitting that
//! buffer with [`slice::chunks_mut`] — safe, disjoint, mutable sub-slices —
//! rather than by computing raw offsets into a shared pointer.

use std::sync::atomic::{AtomicBool, Ordering};

/// Element-count threshold above which a kernel fans out across worker
/// threads. Below this, the kernel runs serially on the calling thread.
pub(crate) const PARALLEL_THRESHOLD: usize = 32_768;

/// Splits `out` into contiguous chunks, each a multiple of `unit` elements
/// (the last chunk may be shorter), and runs `body` on each chunk — in
/// parallel across up to `workers` threads when `out.len()` reaches
/// [`PARALLEL_THRESHOLD`], serially otherwise.
///
/// `body` receives the flat index of the chunk's first element and the
/// chunk itself, so a kernel that computes output cell `i` from `i` and a
/// set of read-only inputs can be written once and run either way.
///
/// `unit` must evenly divide `out.len()` (e.g. the stripe size for a
/// reduction, or `1` for plain element-wise ops); passing `0` disables
/// chunk-size alignment and is treated as `1`.
pub(crate) fn parallel_chunks_mut<S: Send>(
    out: &mut [S],
    workers: usize,
    unit: usize,
    body: impl Fn(usize, &mut [S]) + Sync,
) {
    let total = out.len();
    let unit = unit.max(1);

    if total < PARALLEL_THRESHOLD || workers <= 1 {
        body(0, out);
        return;
    }

    let units = total / unit;
    let units_per_chunk = units.div_ceil(workers).max(1);
    let chunk_elems = units_per_chunk * unit;

    std::thread::scope(|scope| {
        let mut start = 0;
        for chunk in out.chunks_mut(chunk_elems) {
            let body = &body;
            let chunk_start = start;
            start += chunk.len();
            scope.spawn(move || body(chunk_start, chunk));
        }
    });
}

/// Like [`parallel_chunks_mut`], but `body` reports whether it observed an
/// error (e.g. an integer divide-by-zero) within its chunk. Returns `true`
/// if any chunk reported one.
///
/// Uses a shared "first error observed" atomic flag: each worker writes
/// `true` if its chunk hit the condition, and the flag is inspected only
/// after every worker has joined. The output is undefined on any chunk that
/// wrote past an observed error — callers must discard the result when this
/// returns `true`.
pub(crate) fn parallel_chunks_mut_checked<S: Send>(
    out: &mut [S],
    workers: usize,
    unit: usize,
    body: impl Fn(usize, &mut [S]) -> bool + Sync,
) -> bool {
    let total = out.len();
    let unit = unit.max(1);
    let error = AtomicBool::new(false);

    if total < PARALLEL_THRESHOLD || workers <= 1 {
        if body(0, out) {
            error.store(true, Ordering::Relaxed);
        }
        return error.load(Ordering::Relaxed);
    }

    let units = total / unit;
    let units_per_chunk = units.div_ceil(workers).max(1);
    let chunk_elems = units_per_chunk * unit;

    std::thread::scope(|scope| {
        let mut start = 0;
        for chunk in out.chunks_mut(chunk_elems) {
            let body = &body;
            let error = &error;
            let chunk_start = start;
            start += chunk.len();
            scope.spawn(move || {
                if body(chunk_start, chunk) {
                    error.store(true, Ordering::Relaxed);
                }
            });
        }
    });

    error.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_below_threshold() {
        let mut out = vec![0i32; 8];
        parallel_chunks_mut(&mut out, 4, 1, |start, chunk| {
            for (i, slot) in chunk.iter_mut().enumerate() {
                *slot = i32::try_from(start + i).unwrap();
            }
        });
        assert_eq!(out, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_parallel_covers_full_range() {
        let total = PARALLEL_THRESHOLD * 3;
        let mut out = vec![0i64; total];
        parallel_chunks_mut(&mut out, 4, 1, |start, chunk| {
            for (i, slot) in chunk.iter_mut().enumerate() {
                *slot = i64::try_from(start + i).unwrap();
            }
        });
        assert!(
            out.iter()
                .enumerate()
                .all(|(i, &v)| v == i64::try_from(i).unwrap())
        );
    }

    #[test]
    fn test_parallel_respects_unit_alignment() {
        let total = PARALLEL_THRESHOLD * 2;
        let unit = 4;
        let mut out = vec![0usize; total];
        parallel_chunks_mut(&mut out, 3, unit, |start, chunk| {
            assert_eq!(start % unit, 0);
            assert_eq!(chunk.len() % unit, 0);
            for slot in chunk.iter_mut() {
                *slot = start;
            }
        });
    }

    #[test]
    fn test_checked_detects_error() {
        let total = PARALLEL_THRESHOLD * 2;
        let mut out = vec![0i32; total];
        let found = parallel_chunks_mut_checked(&mut out, 4, 1, |start, chunk| {
            for (i, slot) in chunk.iter_mut().enumerate() {
                *slot = 1;
                if start + i == total / 2 {
                    return true;
                }
            }
            false
        });
        assert!(found);
    }

    #[test]
    fn test_checked_no_error() {
        let total = PARALLEL_THRESHOLD * 2;
        let mut out = vec![0i32; total];
        let found = parallel_chunks_mut_checked(&mut out, 4, 1, |_, chunk| {
            chunk.fill(1);
            false
        });
        assert!(!found);
    }
}
