//! Byte-level fixture builders for archives and shapefiles.

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::Crc;
use flate2::write::DeflateEncoder;
use std::io::Write;

#[derive(Clone, Copy, PartialEq)]
pub enum Method {
    Stored,
    Deflate,
}

struct Member {
    name: String,
    method: Method,
    crc: u32,
    raw_len: u32,
    payload: Vec<u8>,
    /// `(compressed, uncompressed)` written to a ZIP64 extra field
    zip64: Option<(u64, u64)>,
}

/// Writes a minimal single-disk ZIP archive.
#[derive(Default)]
pub struct ZipBuilder {
    members: Vec<Member>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        self.add(name, data, Method::Stored)
    }

    pub fn deflated(self, name: &str, data: &[u8]) -> Self {
        self.add(name, data, Method::Deflate)
    }

    pub fn directory(mut self, name: &str) -> Self {
        self.members.push(Member {
            name: name.to_string(),
            method: Method::Stored,
            crc: 0,
            raw_len: 0,
            payload: Vec::new(),
            zip64: None,
        });
        self
    }

    pub fn add(mut self, name: &str, data: &[u8], method: Method) -> Self {
        let mut crc = Crc::new();
        crc.update(data);
        let payload = match method {
            Method::Stored => data.to_vec(),
            Method::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data).unwrap();
                encoder.finish().unwrap()
            }
        };
        self.members.push(Member {
            name: name.to_string(),
            method,
            crc: crc.sum(),
            raw_len: data.len() as u32,
            payload,
            zip64: None,
        });
        self
    }

    /// Overwrite the recorded CRC of the last member.
    pub fn with_bad_crc(mut self) -> Self {
        if let Some(last) = self.members.last_mut() {
            last.crc ^= 0xFFFF_FFFF;
        }
        self
    }

    /// Record a different uncompressed size for the last member.
    pub fn with_declared_size(mut self, size: u32) -> Self {
        if let Some(last) = self.members.last_mut() {
            last.raw_len = size;
        }
        self
    }

    /// Move the last member's sizes into a ZIP64 extra field in the
    /// Central Directory, claiming the given values.
    pub fn with_zip64_sizes(mut self, compressed: u64, uncompressed: u64) -> Self {
        if let Some(last) = self.members.last_mut() {
            last.zip64 = Some((compressed, uncompressed));
        }
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::new();

        for m in &self.members {
            offsets.push(out.len() as u32);
            out.write_u32::<LittleEndian>(0x0403_4b50).unwrap();
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(method_code(m.method)).unwrap();
            out.write_u16::<LittleEndian>(0x6000).unwrap();
            out.write_u16::<LittleEndian>(0x5863).unwrap();
            out.write_u32::<LittleEndian>(m.crc).unwrap();
            out.write_u32::<LittleEndian>(m.payload.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(m.raw_len).unwrap();
            out.write_u16::<LittleEndian>(m.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.extend_from_slice(m.name.as_bytes());
            out.extend_from_slice(&m.payload);
        }

        let cd_offset = out.len() as u32;
        for (m, offset) in self.members.iter().zip(&offsets) {
            let mut extra = Vec::new();
            let (compressed, uncompressed) = match m.zip64 {
                Some((compressed, uncompressed)) => {
                    extra.write_u16::<LittleEndian>(0x0001).unwrap();
                    extra.write_u16::<LittleEndian>(16).unwrap();
                    extra.write_u64::<LittleEndian>(uncompressed).unwrap();
                    extra.write_u64::<LittleEndian>(compressed).unwrap();
                    (0xFFFF_FFFF, 0xFFFF_FFFF)
                }
                None => (m.payload.len() as u32, m.raw_len),
            };

            out.write_u32::<LittleEndian>(0x0201_4b50).unwrap();
            out.write_u16::<LittleEndian>(45).unwrap();
            out.write_u16::<LittleEndian>(45).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(method_code(m.method)).unwrap();
            out.write_u16::<LittleEndian>(0x6000).unwrap();
            out.write_u16::<LittleEndian>(0x5863).unwrap();
            out.write_u32::<LittleEndian>(m.crc).unwrap();
            out.write_u32::<LittleEndian>(compressed).unwrap();
            out.write_u32::<LittleEndian>(uncompressed).unwrap();
            out.write_u16::<LittleEndian>(m.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(extra.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(*offset).unwrap();
            out.extend_from_slice(m.name.as_bytes());
            out.extend_from_slice(&extra);
        }
        let cd_size = out.len() as u32 - cd_offset;

        out.write_u32::<LittleEndian>(0x0605_4b50).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(self.members.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(self.members.len() as u16).unwrap();
        out.write_u32::<LittleEndian>(cd_size).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out
    }
}

fn method_code(method: Method) -> u16 {
    match method {
        Method::Stored => 0,
        Method::Deflate => 8,
    }
}

pub enum Shape {
    Null,
    Point(f64, f64),
    /// One coordinate list per part
    Parts(Vec<Vec<(f64, f64)>>),
}

/// Encode a `.shp` file whose header declares `shape_type`.
pub fn shp(shape_type: i32, shapes: &[Shape]) -> Vec<u8> {
    let mut records = Vec::new();
    for (i, shape) in shapes.iter().enumerate() {
        let mut content = Vec::new();
        match shape {
            Shape::Null => content.write_i32::<LittleEndian>(0).unwrap(),
            Shape::Point(x, y) => {
                content.write_i32::<LittleEndian>(shape_type).unwrap();
                content.write_f64::<LittleEndian>(*x).unwrap();
                content.write_f64::<LittleEndian>(*y).unwrap();
            }
            Shape::Parts(parts) => {
                content.write_i32::<LittleEndian>(shape_type).unwrap();
                for _ in 0..4 {
                    content.write_f64::<LittleEndian>(0.0).unwrap();
                }
                let num_points: usize = parts.iter().map(Vec::len).sum();
                content.write_i32::<LittleEndian>(parts.len() as i32).unwrap();
                content.write_i32::<LittleEndian>(num_points as i32).unwrap();
                let mut start = 0;
                for part in parts {
                    content.write_i32::<LittleEndian>(start as i32).unwrap();
                    start += part.len();
                }
                for (x, y) in parts.iter().flatten() {
                    content.write_f64::<LittleEndian>(*x).unwrap();
                    content.write_f64::<LittleEndian>(*y).unwrap();
                }
            }
        }
        records.write_i32::<BigEndian>(i as i32 + 1).unwrap();
        records.write_i32::<BigEndian>(content.len() as i32 / 2).unwrap();
        records.extend_from_slice(&content);
    }

    let mut out = Vec::new();
    out.write_i32::<BigEndian>(9994).unwrap();
    out.extend_from_slice(&[0u8; 20]);
    out.write_i32::<BigEndian>(((100 + records.len()) / 2) as i32).unwrap();
    out.write_i32::<LittleEndian>(1000).unwrap();
    out.write_i32::<LittleEndian>(shape_type).unwrap();
    out.extend_from_slice(&[0u8; 64]);
    out.extend_from_slice(&records);
    out
}

/// Encode a `.dbf` table. Fields are `(name, type, length, decimals)`.
pub fn dbf(fields: &[(&str, char, u8, u8)], rows: &[&[&str]]) -> Vec<u8> {
    let header_len = 32 + fields.len() * 32 + 1;
    let record_len = 1 + fields.iter().map(|f| f.2 as usize).sum::<usize>();

    let mut out = Vec::new();
    out.push(0x03);
    out.extend_from_slice(&[124, 1, 1]);
    out.write_u32::<LittleEndian>(rows.len() as u32).unwrap();
    out.write_u16::<LittleEndian>(header_len as u16).unwrap();
    out.write_u16::<LittleEndian>(record_len as u16).unwrap();
    out.extend_from_slice(&[0u8; 20]);

    for (name, kind, length, decimals) in fields {
        let mut desc = [0u8; 32];
        desc[..name.len()].copy_from_slice(name.as_bytes());
        desc[11] = *kind as u8;
        desc[16] = *length;
        desc[17] = *decimals;
        out.extend_from_slice(&desc);
    }
    out.push(0x0D);

    for row in rows {
        out.push(b' ');
        for ((_, _, length, _), value) in fields.iter().zip(row.iter()) {
            let mut cell = value.as_bytes().to_vec();
            cell.resize(*length as usize, b' ');
            out.extend_from_slice(&cell);
        }
    }
    out.push(0x1A);
    out
}

/// Wrap bytes as a base64 data URL.
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}
