//! stub_boot: boots a base85-embedded payload through a relocatable launcher.
//!
//! A build-time generator substitutes three blobs into the produced binary:
//! an encoded bootstrap prologue, raw stub instructions in a foreign calling
//! convention, and the encoded payload. At startup the crate decodes the
//! blobs, assembles the launcher, makes the right pages executable, and
//! jumps in. Most users only need [`boot`] and [`BootImage`].

pub mod base85;
pub mod boot;
pub mod launcher;
pub mod mem;
pub mod platform;

pub use boot::{BootImage, Invoke, StubEntry, TransferControl, boot};
pub use mem::{MemOps, Os, Region};
pub use platform::PlatformData;
