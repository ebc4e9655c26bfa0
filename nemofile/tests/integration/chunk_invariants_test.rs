// /////////////////////////////////////////////////////////////////////////////
// Nemofile
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Codec Invariants
//!
//! Property tests over the writer/parser pair: every primitive, string,
//! buffer, and packed-16-bit value must read back exactly as written, for
//! all values.

use proptest::prelude::*;

use nemofile_domain::chunk::{ChunkParser, ChunkWriter, CHUNK_VERSION_CURRENT};
use nemofile_domain::{ClassId, Guid, ObjectId};

fn writer() -> ChunkWriter {
    let mut writer = ChunkWriter::new();
    writer.start(ClassId::new(1), CHUNK_VERSION_CURRENT).unwrap();
    writer
}

proptest! {
    #[test]
    fn prop_primitive_roundtrip(byte: u8, word: u16, dword: u32, int: i32, float: f32) {
        let mut w = writer();
        w.write_byte(byte).unwrap();
        w.write_word(word).unwrap();
        w.write_dword(dword).unwrap();
        w.write_int(int).unwrap();
        w.write_float(float).unwrap();
        let chunk = w.finalize().unwrap();

        let mut p = ChunkParser::new(&chunk);
        prop_assert_eq!(p.read_byte().unwrap(), byte);
        prop_assert_eq!(p.read_word().unwrap(), word);
        prop_assert_eq!(p.read_dword().unwrap(), dword);
        prop_assert_eq!(p.read_int().unwrap(), int);
        // Bit-compare so NaN payloads round-trip too.
        prop_assert_eq!(p.read_float().unwrap().to_bits(), float.to_bits());
        prop_assert!(p.at_end());
    }

    #[test]
    fn prop_guid_roundtrip(d1: u32, d2: u32) {
        let mut w = writer();
        w.write_guid(Guid::new(d1, d2)).unwrap();
        let chunk = w.finalize().unwrap();
        prop_assert_eq!(ChunkParser::new(&chunk).read_guid().unwrap(), Guid::new(d1, d2));
    }

    #[test]
    fn prop_string_roundtrip(s in "\\PC{0,120}") {
        let mut w = writer();
        w.write_string(&s).unwrap();
        w.write_dword(0xFEED).unwrap();
        let chunk = w.finalize().unwrap();

        let mut p = ChunkParser::new(&chunk);
        prop_assert_eq!(p.read_string().unwrap(), s);
        prop_assert_eq!(p.read_dword().unwrap(), 0xFEED);
    }

    #[test]
    fn prop_buffer_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut w = writer();
        w.write_buffer(&bytes).unwrap();
        w.write_buffer_nosize(&bytes).unwrap();
        let chunk = w.finalize().unwrap();

        let mut p = ChunkParser::new(&chunk);
        prop_assert_eq!(p.read_buffer().unwrap(), bytes.clone());
        prop_assert_eq!(p.read_buffer_nosize(bytes.len()).unwrap(), bytes);
    }

    #[test]
    fn prop_dword_as_words_roundtrip(value: u32) {
        let mut w = writer();
        w.write_dword_as_words(value).unwrap();
        let chunk = w.finalize().unwrap();
        prop_assert_eq!(ChunkParser::new(&chunk).read_dword_as_words().unwrap(), value);
    }

    #[test]
    fn prop_lendian16_roundtrip(values in proptest::collection::vec(any::<u16>(), 0..1100)) {
        let mut w = writer();
        w.write_buffer_nosize_lendian16(&values).unwrap();
        let chunk = w.finalize().unwrap();

        let mut p = ChunkParser::new(&chunk);
        prop_assert_eq!(p.read_buffer_nosize_lendian16(values.len()).unwrap(), values);
        prop_assert!(p.at_end());
    }

    #[test]
    fn prop_nonzero_citations_tracked_once(ids in proptest::collection::vec(any::<u32>(), 0..64)) {
        let mut w = writer();
        for &id in &ids {
            w.write_object_id(ObjectId::new(id)).unwrap();
        }
        let chunk = w.finalize().unwrap();

        let nonzero = ids.iter().filter(|&&id| id != 0).count();
        prop_assert_eq!(chunk.ids().len(), nonzero);
        prop_assert_eq!(chunk.data_size(), ids.len());
    }
}

#[test]
fn test_dword_as_words_edge_values() {
    for value in [0u32, 0x7FFF_FFFF, 0x8000_0000, 0xFFFF_FFFF] {
        let mut w = writer();
        w.write_dword_as_words(value).unwrap();
        let chunk = w.finalize().unwrap();
        assert_eq!(ChunkParser::new(&chunk).read_dword_as_words().unwrap(), value);
    }
}

#[test]
fn test_lendian16_single_and_large_buffers() {
    for len in [1usize, 1000] {
        let values: Vec<u16> = (0..len).map(|i| (i * 7) as u16).collect();
        let mut w = writer();
        w.write_buffer_nosize_lendian16(&values).unwrap();
        let chunk = w.finalize().unwrap();
        assert_eq!(
            ChunkParser::new(&chunk).read_buffer_nosize_lendian16(len).unwrap(),
            values
        );
    }
}

/// The packed-animation shape: an element count stored as two 16-bit
/// halves, then two unprefixed 16-bit tracks.
#[test]
fn test_packed_animation_layout() {
    let times = [0u16, 10, 20, 30, 40];
    let keys = [100u16, 200, 150, 175, 125];

    let mut w = writer();
    w.write_dword_as_words(5).unwrap();
    w.write_buffer_nosize_lendian16(&times).unwrap();
    w.write_buffer_nosize_lendian16(&keys).unwrap();
    let chunk = w.finalize().unwrap();

    let mut p = ChunkParser::new(&chunk);
    let count = p.read_dword_as_words().unwrap() as usize;
    assert_eq!(count, 5);
    assert_eq!(p.read_buffer_nosize_lendian16(count).unwrap(), times);
    assert_eq!(p.read_buffer_nosize_lendian16(count).unwrap(), keys);
    assert!(p.at_end());
}

/// Sub-chunk reconstruction preserves identity, size, and payload.
#[test]
fn test_nested_subchunk_roundtrip() {
    let mut inner = writer();
    inner.write_object_id(ObjectId::new(31)).unwrap();
    inner.write_string("innermost").unwrap();
    let inner = inner.finalize().unwrap();

    let mut middle = ChunkWriter::new();
    middle.start(ClassId::new(2), CHUNK_VERSION_CURRENT).unwrap();
    middle.write_dword(0xA0).unwrap();
    middle.write_subchunk(&inner).unwrap();
    let middle = middle.finalize().unwrap();

    let mut outer = ChunkWriter::new();
    outer.start(ClassId::new(3), CHUNK_VERSION_CURRENT).unwrap();
    outer.write_subchunk(&middle).unwrap();
    let outer = outer.finalize().unwrap();

    let mut p = ChunkParser::new(&outer);
    let restored_middle = p.read_subchunk().unwrap();
    assert_eq!(restored_middle.class_id(), middle.class_id());
    assert_eq!(restored_middle.data(), middle.data());

    let mut p = ChunkParser::new(&restored_middle);
    p.read_dword().unwrap();
    let restored_inner = p.read_subchunk().unwrap();
    assert_eq!(restored_inner.class_id(), inner.class_id());
    assert_eq!(restored_inner.data_size(), inner.data_size());
    assert_eq!(restored_inner.id_count(), inner.id_count());
    assert_eq!(restored_inner.data(), inner.data());
}
