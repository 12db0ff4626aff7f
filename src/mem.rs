//! Page arithmetic and the OS memory-operation boundary.
//!
//! Every address range handed to the kernel goes through [`Region`], so the
//! page-alignment invariants live in one place. The syscalls themselves sit
//! behind [`MemOps`] so the orchestration can run under test without ever
//! touching real page permissions.

use std::ffi::c_void;
use std::num::NonZeroUsize;
use std::ptr::NonNull;

use nix::errno::Errno;
use nix::sys::mman::{MapFlags, ProtFlags, mmap_anonymous, mprotect};

pub const PAGE_SIZE: usize = 4096;

/// Largest page multiple `<= addr`.
pub const fn align_down(addr: usize) -> usize {
    addr & !(PAGE_SIZE - 1)
}

/// Smallest page multiple `>= addr`.
pub const fn align_up(addr: usize) -> usize {
    (addr + PAGE_SIZE - 1) & !(PAGE_SIZE - 1)
}

/// A page-aligned address range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub base: usize,
    pub len: usize,
}

impl Region {
    /// The smallest page-aligned region containing `[addr, addr + span)`.
    pub const fn covering(addr: usize, span: usize) -> Region {
        let base = align_down(addr);
        Region {
            base,
            len: align_up(addr + span) - base,
        }
    }

    pub const fn end(&self) -> usize {
        self.base + self.len
    }
}

/// OS memory operations used by the bootstrap. The real implementation is
/// [`Os`]; tests substitute a recording mock.
pub trait MemOps {
    /// Maps a fresh anonymous, private, read+write+execute range of `len`
    /// bytes (page-rounded by the kernel).
    fn map_rwx(&self, len: usize) -> nix::Result<NonNull<u8>>;

    /// Marks an existing page-aligned region read+write+execute.
    fn make_rwx(&self, region: Region) -> nix::Result<()>;
}

/// [`MemOps`] backed by the kernel via `nix`.
pub struct Os;

impl MemOps for Os {
    fn map_rwx(&self, len: usize) -> nix::Result<NonNull<u8>> {
        let len = NonZeroUsize::new(len).ok_or(Errno::EINVAL)?;
        // Safety: an anonymous private mapping with no fixed address has no
        // aliasing or placement preconditions.
        let ptr = unsafe {
            mmap_anonymous(
                None,
                len,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE | ProtFlags::PROT_EXEC,
                MapFlags::MAP_PRIVATE,
            )
        }?;
        Ok(ptr.cast())
    }

    fn make_rwx(&self, region: Region) -> nix::Result<()> {
        let base: NonNull<c_void> =
            NonNull::new(region.base as *mut c_void).ok_or(Errno::EINVAL)?;
        // Safety: callers only pass regions covering memory they own for the
        // rest of the process lifetime (the static stub bytes, the assembled
        // launcher buffer); nothing is unmapped before control transfer.
        unsafe { mprotect(base, region.len, ProtFlags::PROT_READ | ProtFlags::PROT_WRITE | ProtFlags::PROT_EXEC) }
    }
}
