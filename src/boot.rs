//! Single-shot bootstrap: decode, assemble, adjust permissions, transfer
//! control. Straight-line by design; once the stub has control there is
//! nothing left to clean up.

use std::ptr::NonNull;

use anyhow::{Context, Result};

use crate::base85;
use crate::launcher::Launcher;
use crate::mem::{MemOps, PAGE_SIZE, Region, align_up};
use crate::platform::{FN_ALLOC_RWX, PlatformData};

/// Entry signature of the assembled launcher. The stub is built for a
/// Windows-style target, so on x86_64 it expects its arguments in the
/// Microsoft registers, not the System V ones.
#[cfg(target_arch = "x86_64")]
pub type StubEntry = unsafe extern "win64" fn(*mut PlatformData, *mut u8) -> i32;
#[cfg(not(target_arch = "x86_64"))]
pub type StubEntry = unsafe extern "C" fn(*mut PlatformData, *mut u8) -> i32;

/// The control-transfer seam. [`TransferControl`] jumps into the launcher
/// for real; tests substitute a probe that records its arguments instead.
pub trait Invoke {
    /// # Safety
    ///
    /// `entry` must point at the first byte of an executable launcher buffer
    /// assembled by [`Launcher::assemble`], and `payload` at a live payload
    /// buffer. Under the real implementation the call usually never returns.
    unsafe fn invoke(
        &self,
        entry: NonNull<u8>,
        pd: &mut PlatformData,
        payload: NonNull<u8>,
    ) -> i32;
}

/// Reinterprets the launcher buffer as a [`StubEntry`] and calls it. This is
/// the only place bytes become code.
pub struct TransferControl;

impl Invoke for TransferControl {
    unsafe fn invoke(
        &self,
        entry: NonNull<u8>,
        pd: &mut PlatformData,
        payload: NonNull<u8>,
    ) -> i32 {
        // Safety: caller guarantees `entry` is the base of an assembled,
        // permission-adjusted launcher, whose prologue has the StubEntry
        // signature.
        let entry: StubEntry = unsafe { std::mem::transmute(entry.as_ptr()) };
        unsafe { entry(pd, payload.as_ptr()) }
    }
}

/// The build-time template contract: everything the generator substitutes
/// into the produced executable.
pub struct BootImage<'a> {
    /// Base85 text decoding to exactly [`crate::launcher::header::LEN`]
    /// prologue bytes.
    pub prologue_b85: &'a [u8],
    /// Raw stub instruction bytes, embedded in the program image.
    pub stub: &'a [u8],
    /// Base85 text of the payload the stub will run.
    pub payload_b85: &'a [u8],
    /// Minimum payload buffer size; at least one page.
    pub min_payload_len: usize,
}

/// Boots `image`: decodes the payload into a fresh rwx mapping, assembles
/// and patches the launcher, makes the stub and launcher regions executable,
/// and transfers control with a populated [`PlatformData`]. Returns the
/// stub's result code in the unusual case that the invocation returns.
///
/// OS failures abort the attempt with context; there is no retry.
pub fn boot(image: &BootImage<'_>, mem: &impl MemOps, invoker: &impl Invoke) -> Result<i32> {
    assert!(
        image.min_payload_len >= PAGE_SIZE,
        "minimum payload buffer must be at least one page"
    );

    let payload = base85::decode(image.payload_b85);
    let payload_buf = mem
        .map_rwx(align_up(payload.len().max(image.min_payload_len)))
        .context("mapping the payload buffer failed")?;
    // Safety: the mapping is at least `payload.len()` bytes and freshly
    // allocated, so the ranges cannot overlap.
    unsafe {
        std::ptr::copy_nonoverlapping(payload.as_ptr(), payload_buf.as_ptr(), payload.len());
    }

    // The prologue locates the stub's original image copy through these
    // patched fields, so the region is the static one, not the launcher's.
    let stub_region = Region::covering(image.stub.as_ptr() as usize, image.stub.len());
    let launcher = Launcher::assemble(image.prologue_b85, image.stub, stub_region);

    mem.make_rwx(stub_region)
        .context("making the static stub region executable failed")?;
    mem.make_rwx(launcher.covering_region())
        .context("making the launcher buffer executable failed")?;

    let mut pd = PlatformData::hosted_linux();
    pd.fn_table[FN_ALLOC_RWX] = launcher.alloc_entry() as usize;

    let entry = NonNull::from(&launcher.as_bytes()[0]);
    // Safety: `entry` is the assembled launcher, executable as of the
    // permission change above; `payload_buf` stays mapped for the lifetime
    // of the process.
    let code = unsafe { invoker.invoke(entry, &mut pd, payload_buf) };
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    // mov eax, 0x2a; ret: valid under both calling conventions, so it
    // exercises the transmute-and-call path without a real prologue.
    #[cfg(target_arch = "x86_64")]
    #[test]
    fn transfer_control_calls_into_mapped_code() {
        let buf = crate::mem::Os.map_rwx(PAGE_SIZE).expect("rwx mapping");
        let code: &[u8] = &[0xb8, 0x2a, 0x00, 0x00, 0x00, 0xc3];
        unsafe {
            std::ptr::copy_nonoverlapping(code.as_ptr(), buf.as_ptr(), code.len());
        }
        let mut pd = PlatformData::hosted_linux();
        let mut payload = [0u8; 8];
        let ret = unsafe {
            TransferControl.invoke(buf, &mut pd, NonNull::from(&mut payload[0]))
        };
        assert_eq!(ret, 0x2a);
    }

    #[test]
    #[should_panic(expected = "at least one page")]
    fn rejects_sub_page_minimum() {
        struct NoMem;
        impl MemOps for NoMem {
            fn map_rwx(&self, _len: usize) -> nix::Result<NonNull<u8>> {
                unreachable!()
            }
            fn make_rwx(&self, _region: Region) -> nix::Result<()> {
                unreachable!()
            }
        }
        struct NoInvoke;
        impl Invoke for NoInvoke {
            unsafe fn invoke(&self, _: NonNull<u8>, _: &mut PlatformData, _: NonNull<u8>) -> i32 {
                unreachable!()
            }
        }
        let image = BootImage {
            prologue_b85: b"]",
            stub: &[],
            payload_b85: b"]",
            min_payload_len: 16,
        };
        let _ = boot(&image, &NoMem, &NoInvoke);
    }
}
