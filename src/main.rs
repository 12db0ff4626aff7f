use anyhow::Result;

use stub_boot::{BootImage, Os, TransferControl, boot};

// The generator rewrites the four items below when it produces a real
// executable. The checked-in values keep the template compiling: the
// prologue is the reference one, the stub and payload are inert.

/// Decodes to the 68-byte launcher prologue (discovery fields zeroed; the
/// bootstrap patches them at runtime).
static PROLOGUE_B85: &[u8] =
    b"QMd~L002n8@6D@;XGJ3cz5oya01pLO>naZmS5~+Q0000n|450>x(5IN07=KfA^-pYO)<bp|Hw@-$qxlyU&9Xz]";

/// Raw stub instructions. Placeholder: xor eax, eax; ret.
static STUB_RAW: &[u8] = &[0x31, 0xc0, 0xc3];

/// Encoded payload. Placeholder: four zero bytes.
static PAYLOAD_B85: &[u8] = b"00000]";

/// Payload buffer floor; the generator keeps this at one page or more.
const MIN_PAYLOAD_LEN: usize = 4096;

fn main() -> Result<()> {
    let image = BootImage {
        prologue_b85: PROLOGUE_B85,
        stub: STUB_RAW,
        payload_b85: PAYLOAD_B85,
        min_payload_len: MIN_PAYLOAD_LEN,
    };
    let code = boot(&image, &Os, &TransferControl)?;
    std::process::exit(code)
}
