//! Attribution stamp.
//!
//! Replaces everything before the first quantization table with a fixed
//! JFIF header and a comment segment naming who ran the race and when.
//! The source APPn segments (EXIF and friends) are dropped.

use super::marker::{find_marker, Marker};
use crate::error::JpegError;

/// SOI + APP0 (JFIF 1.02, 72x72 DPI, no thumbnail)
const JFIF_HEADER: [u8; 20] = [
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x02, 0x01, 0x00,
    0x48, 0x00, 0x48, 0x00, 0x00,
];

const MAX_SEGMENT_PAYLOAD: usize = u16::MAX as usize - 2;

/// Build a COM segment carrying `text`
pub fn comment_segment(text: &str) -> Result<Vec<u8>, JpegError> {
    let payload = text.as_bytes();
    if payload.len() > MAX_SEGMENT_PAYLOAD {
        return Err(JpegError::CommentTooLong { len: payload.len() });
    }

    let length = (payload.len() + 2) as u16;
    let mut segment = Vec::with_capacity(payload.len() + 4);
    segment.extend_from_slice(&[0xFF, Marker::COM.0]);
    segment.extend_from_slice(&length.to_be_bytes());
    segment.extend_from_slice(payload);
    Ok(segment)
}

/// Rewrite the image header with an attribution comment.
///
/// `name` defaults to a single space. The image data from the first DQT
/// marker onwards is kept byte for byte.
pub fn stamp(data: &[u8], name: Option<&str>, time: &str) -> Result<Vec<u8>, JpegError> {
    let dqt = find_marker(data, Marker::DQT, 0).ok_or(JpegError::MissingMarker {
        marker: Marker::DQT.name(),
    })?;
    let comment = comment_segment(&format!("{}, {}", name.unwrap_or(" "), time))?;

    let image = &data[dqt..];
    let mut stamped = Vec::with_capacity(JFIF_HEADER.len() + comment.len() + image.len());
    stamped.extend_from_slice(&JFIF_HEADER);
    stamped.extend_from_slice(&comment);
    stamped.extend_from_slice(image);
    Ok(stamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::jpeg::entropy::locate;
    use crate::core::jpeg::fixtures::{baseline_jpeg, SAMPLE_SCAN};

    #[test]
    fn comment_segment_has_big_endian_length() {
        let segment = comment_segment("hi").unwrap();
        assert_eq!(segment, vec![0xFF, 0xFE, 0x00, 0x04, b'h', b'i']);
    }

    #[test]
    fn oversized_comment_is_rejected() {
        let text = "x".repeat(MAX_SEGMENT_PAYLOAD + 1);
        assert_eq!(
            comment_segment(&text),
            Err(JpegError::CommentTooLong {
                len: MAX_SEGMENT_PAYLOAD + 1
            })
        );
    }

    #[test]
    fn stamp_replaces_header_and_keeps_image_data() {
        let jpeg = baseline_jpeg(&SAMPLE_SCAN);
        let time = "2026-10-16T12:00:00.000Z";

        let stamped = stamp(&jpeg, Some("alice"), time).unwrap();

        let text = format!("alice, {time}");
        let comment_end = JFIF_HEADER.len() + 4 + text.len();
        assert_eq!(&stamped[..JFIF_HEADER.len()], &JFIF_HEADER);
        assert_eq!(&stamped[JFIF_HEADER.len() + 4..comment_end], text.as_bytes());
        assert_eq!(&stamped[comment_end..], &jpeg[20..]);
    }

    #[test]
    fn stamped_image_keeps_its_scan() {
        let jpeg = baseline_jpeg(&SAMPLE_SCAN);
        let before = locate(&jpeg).unwrap();

        let stamped = stamp(&jpeg, None, "now").unwrap();
        let after = locate(&stamped).unwrap();

        assert_eq!(after.len(), before.len());
        assert_eq!(&stamped[after.bytes()], &jpeg[before.bytes()]);
    }

    #[test]
    fn default_name_is_a_space() {
        let jpeg = baseline_jpeg(&SAMPLE_SCAN);
        let stamped = stamp(&jpeg, None, "t").unwrap();
        let start = JFIF_HEADER.len() + 4;
        assert_eq!(&stamped[start..start + 4], b" , t");
    }

    #[test]
    fn missing_dqt_is_malformed() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02, 0x01, 0xFF, 0xD9];
        assert_eq!(
            stamp(&jpeg, None, "t"),
            Err(JpegError::MissingMarker { marker: "DQT" })
        );
    }
}
