//! Container-level tests: zlib and gzip headers, trailers, and format
//! detection.

mod common;

use common::{gzip_wrap, raw_fixed, raw_stored, zlib_fixed, zlib_stored};
use oxizlib_core::checksum::Crc32;
use oxizlib_inflate::{
    FlushMode, InflateConfig, InflateStatus, Inflater, OxiZlibError, Wrapper, gzip_decompress,
    inflate, zlib_decompress,
};

#[test]
fn test_zlib_stored_roundtrip() {
    let data = b"Hello, World!";
    assert_eq!(zlib_decompress(&zlib_stored(data)).unwrap(), data);
}

#[test]
fn test_zlib_fixed_roundtrip() {
    let data = b"fixed-table literals, including high bytes: \xC3\xA9\xC3\xBC";
    assert_eq!(zlib_decompress(&zlib_fixed(data)).unwrap(), data);
}

#[test]
fn test_raw_roundtrip() {
    let data = b"no container at all";
    assert_eq!(inflate(&raw_fixed(data)).unwrap(), data);
    assert_eq!(inflate(&raw_stored(data)).unwrap(), data);
}

#[test]
fn test_gzip_minimal_member() {
    let data = b"gzip payload";
    assert_eq!(gzip_decompress(&gzip_wrap(&raw_fixed(data), data)).unwrap(), data);
}

#[test]
fn test_gzip_with_all_optional_fields() {
    let data = b"decorated";
    let flags = 0x02 | 0x04 | 0x08 | 0x10; // FHCRC, FEXTRA, FNAME, FCOMMENT
    let mut header = vec![0x1F, 0x8B, 8, flags, 0x21, 0x43, 0x65, 0x87, 0, 0xFF];
    header.extend_from_slice(&[4, 0]); // XLEN
    header.extend_from_slice(b"opqr");
    header.extend_from_slice(b"name.txt\0");
    header.extend_from_slice(b"no comment\0");
    let crc16 = (Crc32::checksum(&header) & 0xFFFF) as u16;
    header.extend_from_slice(&crc16.to_le_bytes());

    let mut stream = header;
    stream.extend_from_slice(&raw_fixed(data));
    stream.extend_from_slice(&Crc32::checksum(data).to_le_bytes());
    stream.extend_from_slice(&(data.len() as u32).to_le_bytes());

    assert_eq!(gzip_decompress(&stream).unwrap(), data);
}

#[test]
fn test_auto_detects_zlib() {
    let data = b"which one is it";
    let config = InflateConfig {
        wrapper: Wrapper::Auto,
        ..InflateConfig::default()
    };
    let mut inf = Inflater::with_config(config).unwrap();
    let stream = zlib_stored(data);
    let mut out = vec![0u8; 64];
    let step = inf.inflate(&stream, &mut out, FlushMode::Finish).unwrap();
    assert_eq!(step.status, InflateStatus::StreamEnd);
    assert_eq!(&out[..step.produced], data);
}

#[test]
fn test_auto_detects_gzip() {
    let data = b"which one is it";
    let config = InflateConfig {
        wrapper: Wrapper::Auto,
        ..InflateConfig::default()
    };
    let mut inf = Inflater::with_config(config).unwrap();
    let stream = gzip_wrap(&raw_stored(data), data);
    let mut out = vec![0u8; 64];
    let step = inf.inflate(&stream, &mut out, FlushMode::Finish).unwrap();
    assert_eq!(step.status, InflateStatus::StreamEnd);
    assert_eq!(&out[..step.produced], data);
}

#[test]
fn test_gzip_expected_but_zlib_found() {
    let err = gzip_decompress(&zlib_stored(b"x")).unwrap_err();
    assert!(matches!(err, OxiZlibError::InvalidMagic { .. }));
}

#[test]
fn test_zlib_bad_adler_trailer() {
    let data = b"checksummed";
    let mut stream = zlib_stored(data);
    let last = stream.len() - 1;
    stream[last] ^= 0x01;
    let err = zlib_decompress(&stream).unwrap_err();
    assert!(matches!(err, OxiZlibError::ChecksumMismatch { .. }));
}

#[test]
fn test_gzip_bad_crc_trailer() {
    let data = b"checksummed";
    let mut stream = gzip_wrap(&raw_stored(data), data);
    let crc_pos = stream.len() - 8;
    stream[crc_pos] ^= 0x01;
    let err = gzip_decompress(&stream).unwrap_err();
    assert!(matches!(err, OxiZlibError::ChecksumMismatch { .. }));
}

#[test]
fn test_gzip_bad_isize_trailer() {
    let data = b"measured";
    let mut stream = gzip_wrap(&raw_stored(data), data);
    let last = stream.len() - 1;
    stream[last] ^= 0x01;
    let err = gzip_decompress(&stream).unwrap_err();
    assert!(matches!(err, OxiZlibError::SizeMismatch { .. }));
}

#[test]
fn test_truncated_zlib_stream() {
    let data = b"cut short";
    let stream = zlib_stored(data);
    let err = zlib_decompress(&stream[..stream.len() - 2]).unwrap_err();
    assert!(matches!(err, OxiZlibError::Stream { .. }));
}

#[test]
fn test_trailing_garbage_left_unconsumed() {
    let data = b"payload";
    let mut stream = zlib_stored(data);
    let clean_len = stream.len();
    stream.extend_from_slice(b"GARBAGE");

    let mut inf = Inflater::new().unwrap();
    let mut out = vec![0u8; 64];
    let step = inf.inflate(&stream, &mut out, FlushMode::Finish).unwrap();
    assert_eq!(step.status, InflateStatus::StreamEnd);
    assert_eq!(step.consumed, clean_len);
    assert_eq!(&out[..step.produced], data);
}

#[test]
fn test_zlib_reserved_method_rejected() {
    // CM nibble 7; FCHECK adjusted so the mod-31 test passes first
    // (0x77 * 256 + 0x09 = 30473 = 31 * 983)
    let mut inf = Inflater::new().unwrap();
    let mut out = [0u8; 8];
    let err = inf
        .inflate(&[0x77, 0x09], &mut out, FlushMode::None)
        .unwrap_err();
    assert!(matches!(err, OxiZlibError::UnsupportedMethod { method: 7 }));
}

#[test]
fn test_multiple_members_via_reset() {
    let first = b"first stream";
    let second = b"second stream";
    let mut stream = zlib_stored(first);
    stream.extend_from_slice(&zlib_stored(second));

    let mut inf = Inflater::new().unwrap();
    let mut out = vec![0u8; 64];
    let step = inf.inflate(&stream, &mut out, FlushMode::None).unwrap();
    assert_eq!(step.status, InflateStatus::StreamEnd);
    assert_eq!(&out[..step.produced], first);

    inf.reset().unwrap();
    let step2 = inf
        .inflate(&stream[step.consumed..], &mut out, FlushMode::Finish)
        .unwrap();
    assert_eq!(step2.status, InflateStatus::StreamEnd);
    assert_eq!(&out[..step2.produced], second);
}
