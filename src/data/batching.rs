/// Fixed-size batch windows over a split
///
/// Both the training cursor and the evaluation chunker keep every window at
/// exactly the configured size: a window that would run past the end of the
/// split is snapped to the end and walked backward instead of being truncated.
use std::ops::Range;

use super::{Batch, Split};

/// Cycles through a training split in contiguous, non-shuffled windows
#[derive(Debug, Clone)]
pub struct BatchCursor {
    len: usize,
    batch_size: usize,
    counter: usize,
}

impl BatchCursor {
    /// Create a cursor over `len` samples; requires `0 < batch_size <= len`
    pub fn new(len: usize, batch_size: usize) -> crate::Result<Self> {
        if batch_size == 0 || batch_size > len {
            return Err(crate::ConvNetError::Config(format!(
                "batch size {} must be in 1..={} (training split size)",
                batch_size, len
            )));
        }

        Ok(Self {
            len,
            batch_size,
            counter: 0,
        })
    }

    /// Next window `[lo, hi)`, always `batch_size` long
    pub fn next_window(&mut self) -> Range<usize> {
        let lo = (self.counter * self.batch_size) % self.len;
        let hi = ((self.counter + 1) * self.batch_size) % self.len;

        // hi == lo only when batch_size == len
        if hi <= lo {
            self.counter = 0;
            return (self.len - self.batch_size)..self.len;
        }

        self.counter += 1;
        lo..hi
    }
}

/// The `ceil(len / chunk_size)` evaluation windows over a split
///
/// The final window ends at `len` and starts at `len - chunk_size`, so it may
/// overlap its predecessor.
#[derive(Debug, Clone)]
pub struct EvalChunks {
    len: usize,
    chunk_size: usize,
    index: usize,
    count: usize,
}

impl EvalChunks {
    /// Chunks over `len` samples; requires `0 < chunk_size <= len`
    pub fn new(len: usize, chunk_size: usize) -> crate::Result<Self> {
        if chunk_size == 0 || chunk_size > len {
            return Err(crate::ConvNetError::Config(format!(
                "evaluation batch size {} must be in 1..={} (evaluated split size)",
                chunk_size, len
            )));
        }

        Ok(Self {
            len,
            chunk_size,
            index: 0,
            count: (len + chunk_size - 1) / chunk_size,
        })
    }
}

impl Iterator for EvalChunks {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        if self.index >= self.count {
            return None;
        }

        let mut lo = self.index * self.chunk_size;
        let mut hi = (self.index + 1) * self.chunk_size;
        if hi > self.len {
            hi = self.len;
            lo = self.len - self.chunk_size;
        }

        self.index += 1;
        Some(lo..hi)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for EvalChunks {}

/// Unweighted mean of `error_fn` over the evaluation chunks of `split`
///
/// The first error returned by `error_fn` aborts the pass.
pub fn eval_batches<F>(split: &Split, chunk_size: usize, mut error_fn: F) -> crate::Result<f32>
where
    F: FnMut(Batch<'_>) -> crate::Result<f32>,
{
    let chunks = EvalChunks::new(split.len(), chunk_size)?;
    let count = chunks.len();

    let mut total = 0.0f32;
    for range in chunks {
        total += error_fn(split.batch(range))?;
    }

    Ok(total / count as f32)
}
