//! Batched 2-D tensor descriptors and host-side storage.
//!
//! A descriptor describes a `{batch, rows, cols}` view of memory without
//! owning it. Strides are expressed in elements.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dtype::Element;
use crate::error::{CommonError, Result};
use crate::layout::Layout;

/// Shape, strides and layout of a batched matrix operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorDescriptor {
    lengths: [usize; 3],
    strides: [usize; 3],
    layout: Layout,
}

impl TensorDescriptor {
    /// Build a descriptor from a leading-dimension stride and a batch stride.
    ///
    /// Row-major puts `stride` on the row axis, column-major on the column
    /// axis; the contiguous axis always has stride 1.
    pub fn new(
        batch: usize,
        rows: usize,
        cols: usize,
        stride: usize,
        batch_stride: usize,
        layout: Layout,
    ) -> Self {
        let strides = match layout {
            Layout::RowMajor => [batch_stride, stride, 1],
            Layout::ColumnMajor => [batch_stride, 1, stride],
        };
        Self { lengths: [batch, rows, cols], strides, layout }
    }

    /// Packed descriptor with default strides.
    pub fn packed(batch: usize, rows: usize, cols: usize, layout: Layout) -> Self {
        let stride = layout.default_stride(rows, cols);
        let batch_stride = layout.outer_len(rows, cols) * stride;
        Self::new(batch, rows, cols, stride, batch_stride, layout)
    }

    pub fn lengths(&self) -> [usize; 3] {
        self.lengths
    }

    pub fn strides(&self) -> [usize; 3] {
        self.strides
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn batch(&self) -> usize {
        self.lengths[0]
    }

    pub fn rows(&self) -> usize {
        self.lengths[1]
    }

    pub fn cols(&self) -> usize {
        self.lengths[2]
    }

    /// Number of logical elements.
    pub fn element_size(&self) -> usize {
        self.lengths.iter().product()
    }

    /// Number of elements spanned in memory (max offset + 1).
    ///
    /// Saturates at `usize::MAX` for descriptors whose span does not fit.
    pub fn element_space_size(&self) -> usize {
        self.checked_element_space_size().unwrap_or(usize::MAX)
    }

    /// Like [`element_space_size`](Self::element_space_size), `None` on overflow.
    pub fn checked_element_space_size(&self) -> Option<usize> {
        if self.lengths.contains(&0) {
            return Some(0);
        }
        self.lengths
            .iter()
            .zip(self.strides.iter())
            .try_fold(1usize, |acc, (&l, &s)| (l - 1).checked_mul(s)?.checked_add(acc))
    }

    /// Element offset of `(b, row, col)`.
    pub fn offset(&self, b: usize, row: usize, col: usize) -> usize {
        b * self.strides[0] + row * self.strides[1] + col * self.strides[2]
    }

    /// Check that no two logical elements share a memory location.
    ///
    /// Axes of length 1 are ignored, as are axes with stride 0 listed in
    /// `broadcast_axes` (the per-row/per-column scale vectors).
    pub fn validate(&self, name: &str) -> Result<()> {
        self.validate_with_broadcast(name, &[])
    }

    pub fn validate_with_broadcast(&self, name: &str, broadcast_axes: &[usize]) -> Result<()> {
        if self.checked_element_space_size().is_none() {
            return Err(self.overflow(name));
        }

        let mut axes: Vec<(usize, usize)> = (0..3)
            .filter(|axis| self.lengths[*axis] > 1 && !broadcast_axes.contains(axis))
            .map(|axis| (self.strides[axis], self.lengths[axis]))
            .collect();
        axes.sort_unstable();

        // Sorted by stride, each axis must step past the full extent of the
        // axes nested inside it.
        let mut extent = 1usize;
        for (stride, length) in axes {
            if stride < extent {
                return Err(CommonError::AliasingStrides {
                    name: name.to_string(),
                    lengths: self.lengths,
                    strides: self.strides,
                });
            }
            extent = stride
                .checked_mul(length - 1)
                .and_then(|span| span.checked_add(extent))
                .ok_or_else(|| self.overflow(name))?;
        }
        Ok(())
    }

    fn overflow(&self, name: &str) -> CommonError {
        CommonError::InvalidProblem(format!(
            "tensor {name} spans more than usize::MAX elements: lengths {:?}, strides {:?}",
            self.lengths, self.strides
        ))
    }
}

impl fmt::Display for TensorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dim 3, lengths {{{}, {}, {}}}, strides {{{}, {}, {}}}",
            self.lengths[0],
            self.lengths[1],
            self.lengths[2],
            self.strides[0],
            self.strides[1],
            self.strides[2]
        )
    }
}

/// Host-resident tensor backed by a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct HostTensor<T: Element> {
    desc: TensorDescriptor,
    data: Vec<T>,
}

impl<T: Element> HostTensor<T> {
    /// Zero-initialised storage covering the descriptor's element space.
    pub fn zeros(desc: TensorDescriptor) -> Self {
        Self { desc, data: vec![T::default(); desc.element_space_size()] }
    }

    pub fn desc(&self) -> &TensorDescriptor {
        &self.desc
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Raw bytes of the backing storage, as uploaded to the device.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Replace the storage with decoded device bytes.
    pub fn copy_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let elem = std::mem::size_of::<T>();
        if bytes.len() != self.data.len() * elem {
            return Err(CommonError::SizeMismatch {
                expected: self.data.len() * elem,
                actual: bytes.len(),
            });
        }
        for (dst, chunk) in self.data.iter_mut().zip(bytes.chunks_exact(elem)) {
            *dst = T::read_bytes(chunk);
        }
        Ok(())
    }

    pub fn get(&self, b: usize, row: usize, col: usize) -> T {
        self.data[self.desc.offset(b, row, col)]
    }

    pub fn set(&mut self, b: usize, row: usize, col: usize, value: T) {
        let offset = self.desc.offset(b, row, col);
        self.data[offset] = value;
    }

    /// Fill every logical element with `f(b, row, col)`.
    pub fn generate(&mut self, mut f: impl FnMut(usize, usize, usize) -> T) {
        let [batch, rows, cols] = self.desc.lengths();
        for b in 0..batch {
            for row in 0..rows {
                for col in 0..cols {
                    self.set(b, row, col, f(b, row, col));
                }
            }
        }
    }

    /// Logical elements in `(b, row, col)` order, converted to `f32`.
    pub fn logical_values(&self) -> Vec<f32> {
        let [batch, rows, cols] = self.desc.lengths();
        let mut out = Vec::with_capacity(self.desc.element_size());
        for b in 0..batch {
            for row in 0..rows {
                for col in 0..cols {
                    out.push(self.get(b, row, col).to_f32());
                }
            }
        }
        out
    }
}
