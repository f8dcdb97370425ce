//! Boundary between the draw encoder and the rest of the driver.
//!
//! The encoder never talks to the kernel, the shader compiler or the texture
//! code directly. Everything it needs from them goes through these traits, so a
//! test can stand in for all of them with one mock.

use crate::shader::{CompileError, CompiledShader, ShaderSelectorDesc, VariantKey};

/// Opaque buffer-object handle owned by the winsys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Opaque texture handle owned by the texture subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// A buffer object together with its size in bytes (`width0`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Buffer {
    pub handle: BufferHandle,
    pub size: u64,
}

/// How a command buffer touches a referenced buffer object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Read,
    Write,
    ReadWrite,
}

impl BufferUsage {
    pub fn merge(self, other: BufferUsage) -> BufferUsage {
        if self == other {
            self
        } else {
            BufferUsage::ReadWrite
        }
    }
}

/// A buffer the submitted command buffer depends on. Submission must keep it
/// resident until the device has finished executing the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferReloc {
    pub handle: BufferHandle,
    pub usage: BufferUsage,
}

/// A filled command buffer handed to submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandBuffer {
    pub dwords: Vec<u32>,
    pub relocs: Vec<BufferReloc>,
}

pub trait ResourceAddressing {
    /// Device virtual address of `offset` bytes into `buffer`.
    fn resource_va(&self, buffer: BufferHandle, offset: u64) -> u64;
}

pub trait UploadAllocator {
    /// Copy `data` into a fresh GPU-visible buffer. `None` means the upload
    /// heap is exhausted; the caller aborts its draw.
    fn upload(&mut self, data: &[u32]) -> Option<Buffer>;
}

pub trait ShaderCompiler {
    fn compile(
        &mut self,
        selector: &ShaderSelectorDesc,
        key: &VariantKey,
    ) -> Result<CompiledShader, CompileError>;
}

pub trait CommandSubmitter {
    /// Accept a filled command buffer. May block until the device queue has room.
    fn submit(&mut self, cb: CommandBuffer);
}

pub trait SurfaceTracker {
    /// A draw wrote `level` of `texture`; it needs resolve/decompression before
    /// being sampled.
    fn mark_level_dirty(&mut self, texture: TextureHandle, level: u32);
}

/// Everything a [`crate::DrawContext`] needs from its environment.
pub trait Winsys:
    ResourceAddressing + UploadAllocator + ShaderCompiler + CommandSubmitter + SurfaceTracker
{
}

impl<T> Winsys for T where
    T: ResourceAddressing + UploadAllocator + ShaderCompiler + CommandSubmitter + SurfaceTracker
{
}
