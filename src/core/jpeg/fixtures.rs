//! Hand-assembled baseline JPEG used by the unit tests.
//!
//! Layout (offsets for the header are fixed):
//!
//! | segment | offsets    |
//! |---------|------------|
//! | SOI     | 0..2       |
//! | APP0    | 2..20      |
//! | DQT     | 20..89     |
//! | SOF0    | 89..102    |
//! | DHT     | 102..124   |
//! | SOS     | 124..134   |
//! | scan    | 134..134+n |
//! | EOI     | last two   |

/// First byte after the SOS header
pub const SCAN_START: usize = 134;

pub fn baseline_jpeg(scan: &[u8]) -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];

    // APP0 / JFIF 1.01, no thumbnail
    jpeg.extend_from_slice(&[
        0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00,
        0x01, 0x00, 0x00,
    ]);

    // DQT, table 0, all ones
    jpeg.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x43, 0x00]);
    jpeg.extend_from_slice(&[0x01; 64]);

    // SOF0, 1x1, one component
    jpeg.extend_from_slice(&[
        0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x01, 0x00, 0x01, 0x01, 0x01, 0x11, 0x00,
    ]);

    // DHT, DC table 0 with a single one-bit code
    jpeg.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x14, 0x00, 0x01]);
    jpeg.extend_from_slice(&[0x00; 15]);
    jpeg.push(0x00);

    // SOS, one component
    jpeg.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);

    jpeg.extend_from_slice(scan);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

/// Scan bytes with one stuffed `0xFF`
pub const SAMPLE_SCAN: [u8; 12] = [
    0x12, 0x34, 0xFF, 0x00, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11, 0x22,
];
