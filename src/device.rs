//! Execution device for the data-parallel stages.
//!
//! The preprocess and transform stages are written as kernels: a function
//! applied independently to every row (or block) of a staging buffer. The
//! [`Device`] runs those kernels on its own worker pool when the `parallel`
//! feature is enabled and inline on the calling thread otherwise.
//!
//! Staging memory lives in [`DeviceBuffer`]s that are tagged with the
//! pipeline stage they serve. Host data moves in and out only through
//! [`Device::upload`] and [`Device::download`], which check sizes so a
//! short transfer is reported instead of silently truncated.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Pipeline stage a staging buffer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferRole {
    /// Interleaved input pixels
    Source,
    /// Color-converted, subsampled, padded planes
    Preprocessed,
    /// Quantized coefficient blocks
    Quantized,
}

/// A staging buffer allocated once and overwritten by every encode.
#[derive(Debug)]
pub struct DeviceBuffer<T> {
    role: BufferRole,
    data: Vec<T>,
}

impl<T: Copy + Default> DeviceBuffer<T> {
    /// Allocate `len` zeroed elements, failing instead of aborting on OOM.
    pub fn alloc(role: BufferRole, len: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(len)?;
        data.resize(len, T::default());
        Ok(Self { role, data })
    }
}

impl<T> DeviceBuffer<T> {
    /// The stage this buffer serves.
    pub fn role(&self) -> BufferRole {
        self.role
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a zero-length buffer.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read access for kernels.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Write access for kernels.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

/// Runs kernels over staging buffers.
pub struct Device {
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("threads", &self.threads())
            .finish()
    }
}

impl Device {
    /// Start a device with `threads` workers (`0` picks the pool default).
    ///
    /// Without the `parallel` feature the thread count is ignored.
    pub fn new(threads: usize) -> Result<Self> {
        #[cfg(feature = "parallel")]
        let device = Self {
            pool: rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("parajpeg-worker-{}", i))
                .build()
                .map_err(|e| Error::DevicePool(e.to_string()))?,
        };

        #[cfg(not(feature = "parallel"))]
        let device = {
            let _ = threads;
            Self {}
        };

        Ok(device)
    }

    /// Number of workers kernels are spread over.
    pub fn threads(&self) -> usize {
        #[cfg(feature = "parallel")]
        let threads = self.pool.current_num_threads();

        #[cfg(not(feature = "parallel"))]
        let threads = 1;

        threads
    }

    /// Copy host data into a staging buffer. Sizes must match exactly.
    pub fn upload<T: Copy>(&self, buffer: &mut DeviceBuffer<T>, host: &[T]) -> Result<()> {
        if host.len() != buffer.len() {
            return Err(Error::TransferFailed {
                role: buffer.role,
                expected: buffer.len(),
                actual: host.len(),
            });
        }
        buffer.data.copy_from_slice(host);
        log::trace!("upload {:?}: {} elements", buffer.role, host.len());
        Ok(())
    }

    /// Copy a staging buffer back to the host. Sizes must match exactly.
    ///
    /// Kernels have all completed by the time a launch returns, so this
    /// always observes finished results.
    pub fn download<T: Copy>(&self, buffer: &DeviceBuffer<T>, host: &mut [T]) -> Result<()> {
        if host.len() != buffer.len() {
            return Err(Error::TransferFailed {
                role: buffer.role,
                expected: buffer.len(),
                actual: host.len(),
            });
        }
        host.copy_from_slice(&buffer.data);
        log::trace!("download {:?}: {} elements", buffer.role, host.len());
        Ok(())
    }

    /// Run `kernel(row_index, row)` over every `row_len` chunk of `data`.
    pub fn for_each_row<T, F>(&self, data: &mut [T], row_len: usize, kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        if data.is_empty() {
            return;
        }

        #[cfg(feature = "parallel")]
        self.pool.install(|| {
            data.par_chunks_mut(row_len)
                .enumerate()
                .for_each(|(i, row)| kernel(i, row))
        });

        #[cfg(not(feature = "parallel"))]
        data.chunks_mut(row_len)
            .enumerate()
            .for_each(|(i, row)| kernel(i, row));
    }

    /// Run `kernel(scratch, row_index, a_row, b_row)` over matching rows
    /// of two equally sized buffers.
    ///
    /// Each worker builds its own scratch value with `init`.
    pub fn for_each_row_pair_init<T, S, I, F>(
        &self,
        a: &mut [T],
        b: &mut [T],
        row_len: usize,
        init: I,
        kernel: F,
    ) where
        T: Send,
        I: Fn() -> S + Sync + Send,
        F: Fn(&mut S, usize, &mut [T], &mut [T]) + Sync + Send,
    {
        debug_assert_eq!(a.len(), b.len());
        if a.is_empty() {
            return;
        }

        #[cfg(feature = "parallel")]
        self.pool.install(|| {
            a.par_chunks_mut(row_len)
                .zip(b.par_chunks_mut(row_len))
                .enumerate()
                .for_each_init(&init, |scratch, (i, (ra, rb))| kernel(scratch, i, ra, rb))
        });

        #[cfg(not(feature = "parallel"))]
        {
            let mut scratch = init();
            a.chunks_mut(row_len)
                .zip(b.chunks_mut(row_len))
                .enumerate()
                .for_each(|(i, (ra, rb))| kernel(&mut scratch, i, ra, rb));
        }
    }
}
