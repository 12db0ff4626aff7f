//! Base85 text decoding, matching the encoding the payload generator emits:
//! 5 symbols from an 85-character alphabet per 4 bytes of output, terminated
//! by `]`.

/// The 85 symbols, in rank order. Chosen by the generator so that the encoded
/// text survives C string literals (no `"`, `\` or whitespace).
pub const ALPHABET: &[u8; 85] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!#$%&()*+-;<=>?@^_`{|}~";

/// Terminates every encoded blob.
pub const SENTINEL: u8 = b']';

const INVALID: u8 = 0xff;

// Byte value -> rank (0..85), built once at compile time. Entries outside the
// alphabet hold `INVALID`.
static RANK: [u8; 256] = build_rank();

const fn build_rank() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Decodes base85 `text` up to (not including) the `]` sentinel.
///
/// NUL bytes between groups are skipped; the encoder may emit them as
/// padding. Each complete 5-symbol group yields exactly 4 output bytes: the
/// group accumulates big-endian in base 85 and the resulting 32-bit value is
/// emitted most-significant byte first.
///
/// The input comes from the build-time generator, which guarantees it is well
/// formed. A symbol outside the alphabet, or input that ends before the
/// sentinel, is a precondition violation and panics.
pub fn decode(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() / 5 * 4);
    let mut i = 0;
    loop {
        while i < text.len() && text[i] == 0 {
            i += 1;
        }
        assert!(i < text.len(), "encoded text ended without a ']' sentinel");
        if text[i] == SENTINEL {
            break;
        }
        let mut value: u32 = 0;
        for _ in 0..5 {
            assert!(i < text.len(), "encoded text ended mid-group");
            let rank = RANK[text[i] as usize];
            assert!(
                rank != INVALID,
                "byte {:#04x} at offset {i} is not a base85 symbol",
                text[i]
            );
            value = value * 85 + u32::from(rank);
            i += 1;
        }
        out.extend_from_slice(&value.to_be_bytes());
    }
    out
}
