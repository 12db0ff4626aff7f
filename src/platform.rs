//! The descriptor handed to the invoked stub. The stub reads it by byte
//! offset, so the layout here is a wire format, not just a Rust struct.

pub const ENV_ID_LINUX: u64 = 2;

/// The stub's code is built for a Windows-style target; this flag tells it
/// the host provides a Linux-style stack and no `__chkstk`.
pub const ENV_FLAGS_LINUX_STYLE_CHKSTK: u64 = 0x1;

/// Slot in [`PlatformData::fn_table`] holding the host's rwx-allocator
/// callback.
pub const FN_ALLOC_RWX: usize = 0;

/// Environment descriptor passed by reference as the stub's first argument.
///
/// All fields are 8 bytes on x86_64, so `repr(C)` yields the same packed
/// layout the stub expects: `env_id` at 0, `env_flags` at 8, the reserved
/// window-handle slots at 16, the function table at 32.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PlatformData {
    pub env_id: u64,
    pub env_flags: u64,
    /// Reserved for module handles on Windows hosts; always zero here.
    pub win: [u64; 2],
    pub fn_table: [usize; 6],
}

impl PlatformData {
    /// Descriptor for a payload hosted on Linux under a foreign-convention
    /// stub. The function table starts empty; the bootstrap fills
    /// [`FN_ALLOC_RWX`] before transferring control.
    pub fn hosted_linux() -> PlatformData {
        PlatformData {
            env_id: ENV_ID_LINUX,
            env_flags: ENV_FLAGS_LINUX_STYLE_CHKSTK,
            win: [0; 2],
            fn_table: [0; 6],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn layout_matches_the_stub_contract() {
        assert_eq!(offset_of!(PlatformData, env_id), 0);
        assert_eq!(offset_of!(PlatformData, env_flags), 8);
        assert_eq!(offset_of!(PlatformData, win), 16);
        assert_eq!(offset_of!(PlatformData, fn_table), 32);
        assert_eq!(size_of::<PlatformData>(), 32 + 6 * size_of::<usize>());
    }

    #[test]
    fn hosted_linux_descriptor_constants() {
        let pd = PlatformData::hosted_linux();
        assert_eq!(pd.env_id, ENV_ID_LINUX);
        assert_eq!(pd.env_flags, ENV_FLAGS_LINUX_STYLE_CHKSTK);
        assert_eq!(pd.win, [0; 2]);
        assert_eq!(pd.fn_table, [0; 6]);
    }
}
