//! Launcher assembly: the decoded bootstrap prologue followed by the raw
//! secondary-stub instructions, with the prologue's discovery fields patched.

use crate::base85;
use crate::mem::Region;

/// Byte layout of the decoded prologue. These offsets are the contract
/// between the assembler and the generator-produced prologue code; the
/// prologue reads them as immediates once it runs.
pub mod header {
    /// Decoded prologue length in bytes.
    pub const LEN: usize = 68;
    /// u64 (little-endian): base of the page-aligned region holding the
    /// static stub bytes in the program image.
    pub const STUB_BASE: usize = 0x08;
    /// u32 (little-endian, unaligned): length of that region. Lands inside
    /// an instruction immediate, hence the odd offset.
    pub const STUB_LEN: usize = 0x11;
    /// Entry of the rwx-allocator helper the prologue exposes; published to
    /// the stub through the platform descriptor's function table.
    pub const ALLOC_ENTRY: usize = 0x1c;
}

/// The assembled launcher buffer: `header::LEN` bytes of decoded prologue,
/// then the stub's instruction bytes.
pub struct Launcher {
    bytes: Vec<u8>,
}

impl Launcher {
    /// Decodes `prologue_b85`, appends `stub`, and patches the prologue's
    /// discovery fields with `stub_region` (the page-aligned region covering
    /// the stub bytes at their *static* location; the prologue needs the
    /// original image copy for its fix-ups, not the copy appended here).
    ///
    /// The prologue text must decode to exactly [`header::LEN`] bytes; the
    /// generator guarantees this and a mismatch panics.
    pub fn assemble(prologue_b85: &[u8], stub: &[u8], stub_region: Region) -> Launcher {
        let mut bytes = base85::decode(prologue_b85);
        assert_eq!(
            bytes.len(),
            header::LEN,
            "prologue text must decode to exactly {} bytes",
            header::LEN
        );
        bytes.extend_from_slice(stub);

        bytes[header::STUB_BASE..header::STUB_BASE + 8]
            .copy_from_slice(&(stub_region.base as u64).to_le_bytes());
        bytes[header::STUB_LEN..header::STUB_LEN + 4]
            .copy_from_slice(&(stub_region.len as u32).to_le_bytes());

        Launcher { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Address of the first prologue byte; the launcher's entry point.
    pub fn entry(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    /// Address of the allocator helper inside the prologue.
    pub fn alloc_entry(&self) -> *const u8 {
        self.bytes[header::ALLOC_ENTRY..].as_ptr()
    }

    /// The page-aligned region covering this buffer, for the permission
    /// change that makes it executable in place.
    pub fn covering_region(&self) -> Region {
        Region::covering(self.bytes.as_ptr() as usize, self.bytes.len())
    }
}
