//! Simulated device memory, streams and timed kernel launches.
//!
//! Device allocations are byte buffers behind a shared handle. A
//! [`DeviceBuffer`] plays the role of a raw device pointer: cheap to clone,
//! freely aliasable, and only dereferenced by a running kernel.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{KernelError, Result};

/// Shared handle to a device allocation.
#[derive(Clone)]
pub struct DeviceBuffer {
    bytes: Arc<RwLock<Vec<u8>>>,
    len: usize,
}

impl DeviceBuffer {
    /// Size of the allocation in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when both handles point at the same allocation.
    pub fn same_allocation(&self, other: &DeviceBuffer) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, Vec<u8>>> {
        self.bytes.read().map_err(|_| KernelError::BufferPoisoned)
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<u8>>> {
        self.bytes.write().map_err(|_| KernelError::BufferPoisoned)
    }
}

impl fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceBuffer({:p}, {} bytes)", Arc::as_ptr(&self.bytes), self.len)
    }
}

/// An owned device allocation.
pub struct DeviceMem {
    buffer: DeviceBuffer,
}

impl DeviceMem {
    /// Allocate `size_bytes` zeroed bytes.
    pub fn new(size_bytes: usize) -> Self {
        trace!(size_bytes, "device allocation");
        Self {
            buffer: DeviceBuffer {
                bytes: Arc::new(RwLock::new(vec![0; size_bytes])),
                len: size_bytes,
            },
        }
    }

    /// Allocate room for `elements` values of `elem_bytes` each.
    pub fn for_elements(elements: usize, elem_bytes: usize) -> Result<Self> {
        let size = elements
            .checked_mul(elem_bytes)
            .ok_or(KernelError::AllocationOverflow { elements, elem_bytes })?;
        Ok(Self::new(size))
    }

    /// Handle passed to device operations.
    pub fn device_buffer(&self) -> DeviceBuffer {
        self.buffer.clone()
    }

    /// Upload `host` into the allocation. Sizes must match exactly.
    pub fn to_device(&self, host: &[u8]) -> Result<()> {
        let mut bytes = self.buffer.write()?;
        if bytes.len() != host.len() {
            return Err(KernelError::BufferSize { device: bytes.len(), host: host.len() });
        }
        bytes.copy_from_slice(host);
        Ok(())
    }

    /// Download the allocation into `host`. Sizes must match exactly.
    pub fn from_device(&self, host: &mut [u8]) -> Result<()> {
        let bytes = self.buffer.read()?;
        if bytes.len() != host.len() {
            return Err(KernelError::BufferSize { device: bytes.len(), host: host.len() });
        }
        host.copy_from_slice(&bytes);
        Ok(())
    }

    /// Download the whole allocation.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(self.buffer.read()?.clone())
    }

    /// Reset every byte to zero.
    pub fn set_zero(&self) -> Result<()> {
        self.buffer.write()?.fill(0);
        Ok(())
    }
}

/// Identifier of a device queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamHandle(pub u32);

/// Launch options for an invoker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Queue to launch on; `None` is the default (null) stream.
    pub stream: Option<StreamHandle>,
    /// Measure elapsed time. When false the kernel runs once and 0 ms is reported.
    pub time_kernel: bool,
    /// Untimed warm-up launches before measuring.
    pub cold_niters: usize,
    /// Timed launches averaged into the reported time.
    pub nrepeat: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { stream: None, time_kernel: false, cold_niters: 5, nrepeat: 50 }
    }
}

impl StreamConfig {
    /// Single untimed launch on the default stream.
    pub fn untimed() -> Self {
        Self::default()
    }

    /// Timed launch with the given warm-up and repeat counts.
    pub fn timed(cold_niters: usize, nrepeat: usize) -> Self {
        Self { time_kernel: true, cold_niters, nrepeat, ..Self::default() }
    }
}

/// Launch `kernel` according to `config` and return the mean elapsed time in ms.
///
/// Blocks until every launch has completed.
pub fn launch_and_time_kernel<F>(config: &StreamConfig, name: &str, mut kernel: F) -> Result<f32>
where
    F: FnMut() -> Result<()>,
{
    debug!(
        kernel = name,
        stream = ?config.stream,
        time_kernel = config.time_kernel,
        "launching kernel"
    );

    if !config.time_kernel {
        kernel()?;
        return Ok(0.0);
    }

    for _ in 0..config.cold_niters {
        kernel()?;
    }

    let nrepeat = config.nrepeat.max(1);
    let start = Instant::now();
    for _ in 0..nrepeat {
        kernel()?;
    }
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0 / nrepeat as f64;

    trace!(kernel = name, nrepeat, elapsed_ms, "kernel timed");
    Ok(elapsed_ms as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_download_round_trip() {
        let mem = DeviceMem::new(4);
        mem.to_device(&[1, 2, 3, 4]).unwrap();
        let mut host = [0u8; 4];
        mem.from_device(&mut host).unwrap();
        assert_eq!(host, [1, 2, 3, 4]);
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let mem = DeviceMem::new(4);
        assert!(matches!(
            mem.to_device(&[1, 2]),
            Err(KernelError::BufferSize { device: 4, host: 2 })
        ));
    }

    #[test]
    fn set_zero_clears() {
        let mem = DeviceMem::new(3);
        mem.to_device(&[9, 9, 9]).unwrap();
        mem.set_zero().unwrap();
        assert_eq!(mem.to_vec().unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn handles_share_allocation() {
        let mem = DeviceMem::new(8);
        let other = DeviceMem::new(8);
        assert!(mem.device_buffer().same_allocation(&mem.device_buffer()));
        assert!(!mem.device_buffer().same_allocation(&other.device_buffer()));
    }

    #[test]
    fn allocation_overflow_is_an_error() {
        assert!(DeviceMem::for_elements(usize::MAX, 2).is_err());
    }

    #[test]
    fn untimed_launch_runs_once_and_reports_zero() {
        let mut calls = 0;
        let ms = launch_and_time_kernel(&StreamConfig::untimed(), "k", || {
            calls += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(ms, 0.0);
    }

    #[test]
    fn timed_launch_runs_warmup_and_repeats() {
        let mut calls = 0;
        let ms = launch_and_time_kernel(&StreamConfig::timed(2, 3), "k", || {
            calls += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(calls, 5);
        assert!(ms >= 0.0);
    }
}
