//! Order-preserving primary-key encoding.
//!
//! Each value is encoded as a type discriminant byte followed by a
//! payload whose lexicographic byte order matches the value's semantic
//! order: big-endian with the sign bit flipped for signed integers, the
//! IEEE total-order transform for floats, raw bytes for strings. NULL
//! encodes as a bare `0x00` tag, sorting before every non-null value.
//!
//! Encoding is pure and reuses one scratch buffer (the packer) across
//! the rows of a column vector.

use osprey_batch::{Vector, VectorData};
use osprey_common::error::StateError;

const TAG_NULL: u8 = 0x00;
const TAG_INT8: u8 = 0x01;
const TAG_INT16: u8 = 0x02;
const TAG_INT32: u8 = 0x03;
const TAG_INT64: u8 = 0x04;
const TAG_UINT8: u8 = 0x05;
const TAG_UINT16: u8 = 0x06;
const TAG_UINT32: u8 = 0x07;
const TAG_UINT64: u8 = 0x08;
const TAG_FLOAT32: u8 = 0x09;
const TAG_FLOAT64: u8 = 0x0a;
const TAG_STRING: u8 = 0x0b;
const TAG_DATE: u8 = 0x0c;
const TAG_TIME: u8 = 0x0d;
const TAG_DATETIME: u8 = 0x0e;
const TAG_TIMESTAMP: u8 = 0x0f;
const TAG_DECIMAL64: u8 = 0x10;
const TAG_DECIMAL128: u8 = 0x11;

/// Reusable scratch buffer for key encoding.
#[derive(Debug, Default)]
pub struct KeyPacker {
    buf: Vec<u8>,
}

impl KeyPacker {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.buf.clear();
    }

    /// Hand the packed bytes out as an owned key. Empty keys do not
    /// allocate.
    fn take(&self) -> Vec<u8> {
        if self.buf.is_empty() {
            Vec::new()
        } else {
            self.buf.clone()
        }
    }

    fn put_null(&mut self) {
        self.buf.push(TAG_NULL);
    }

    fn put_i8(&mut self, v: i8) {
        self.buf.push(TAG_INT8);
        self.buf.push((v as u8) ^ (1 << 7));
    }

    fn put_i16(&mut self, v: i16) {
        self.buf.push(TAG_INT16);
        let flipped = (v as u16) ^ (1 << 15);
        self.buf.extend_from_slice(&flipped.to_be_bytes());
    }

    fn put_i32(&mut self, v: i32) {
        self.buf.push(TAG_INT32);
        self.put_i32_raw(v);
    }

    fn put_i64(&mut self, v: i64) {
        self.buf.push(TAG_INT64);
        self.put_i64_raw(v);
    }

    fn put_u8(&mut self, v: u8) {
        self.buf.push(TAG_UINT8);
        self.buf.push(v);
    }

    fn put_u16(&mut self, v: u16) {
        self.buf.push(TAG_UINT16);
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u32(&mut self, v: u32) {
        self.buf.push(TAG_UINT32);
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u64(&mut self, v: u64) {
        self.buf.push(TAG_UINT64);
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_f32(&mut self, v: f32) {
        self.buf.push(TAG_FLOAT32);
        let bits = v.to_bits();
        let ordered = if bits & (1u32 << 31) != 0 {
            !bits
        } else {
            bits ^ (1u32 << 31)
        };
        self.buf.extend_from_slice(&ordered.to_be_bytes());
    }

    fn put_f64(&mut self, v: f64) {
        self.buf.push(TAG_FLOAT64);
        let bits = v.to_bits();
        let ordered = if bits & (1u64 << 63) != 0 {
            !bits
        } else {
            bits ^ (1u64 << 63)
        };
        self.buf.extend_from_slice(&ordered.to_be_bytes());
    }

    fn put_str(&mut self, v: &str) {
        self.buf.push(TAG_STRING);
        self.buf.extend_from_slice(v.as_bytes());
        self.buf.push(0x00);
    }

    fn put_date(&mut self, days: i32) {
        self.buf.push(TAG_DATE);
        self.put_i32_raw(days);
    }

    fn put_time(&mut self, micros: i64) {
        self.buf.push(TAG_TIME);
        self.put_i64_raw(micros);
    }

    fn put_datetime(&mut self, micros: i64) {
        self.buf.push(TAG_DATETIME);
        self.put_i64_raw(micros);
    }

    fn put_timestamp(&mut self, micros: i64) {
        self.buf.push(TAG_TIMESTAMP);
        self.put_i64_raw(micros);
    }

    fn put_decimal64(&mut self, mantissa: i64, scale: u8) {
        self.buf.push(TAG_DECIMAL64);
        self.buf.push(scale);
        self.put_i64_raw(mantissa);
    }

    fn put_decimal128(&mut self, mantissa: i128, scale: u8) {
        self.buf.push(TAG_DECIMAL128);
        self.buf.push(scale);
        let flipped = (mantissa as u128) ^ (1u128 << 127);
        self.buf.extend_from_slice(&flipped.to_be_bytes());
    }

    fn put_i32_raw(&mut self, v: i32) {
        let flipped = (v as u32) ^ (1u32 << 31);
        self.buf.extend_from_slice(&flipped.to_be_bytes());
    }

    fn put_i64_raw(&mut self, v: i64) {
        let flipped = (v as u64) ^ (1u64 << 63);
        self.buf.extend_from_slice(&flipped.to_be_bytes());
    }
}

/// Encode a primary-key column into one key per row.
pub fn encode_key_vector(
    vector: &Vector,
    packer: &mut KeyPacker,
) -> Result<Vec<Vec<u8>>, StateError> {
    let mut keys = Vec::with_capacity(vector.len());
    for row in 0..vector.len() {
        packer.reset();
        if vector.is_null(row) {
            packer.put_null();
        } else {
            match &vector.data {
                VectorData::Int8(v) => packer.put_i8(v[row]),
                VectorData::Int16(v) => packer.put_i16(v[row]),
                VectorData::Int32(v) => packer.put_i32(v[row]),
                VectorData::Int64(v) => packer.put_i64(v[row]),
                VectorData::UInt8(v) => packer.put_u8(v[row]),
                VectorData::UInt16(v) => packer.put_u16(v[row]),
                VectorData::UInt32(v) => packer.put_u32(v[row]),
                VectorData::UInt64(v) => packer.put_u64(v[row]),
                VectorData::Float32(v) => packer.put_f32(v[row]),
                VectorData::Float64(v) => packer.put_f64(v[row]),
                VectorData::String(v) => packer.put_str(&v[row]),
                VectorData::Date(v) => packer.put_date(v[row]),
                VectorData::Time(v) => packer.put_time(v[row]),
                VectorData::DateTime(v) => packer.put_datetime(v[row]),
                VectorData::Timestamp(v) => packer.put_timestamp(v[row]),
                VectorData::Decimal64 { values, scale } => {
                    packer.put_decimal64(values[row], *scale)
                }
                VectorData::Decimal128 { values, scale } => {
                    packer.put_decimal128(values[row], *scale)
                }
                other @ (VectorData::Bool(_) | VectorData::RowId(_) | VectorData::Ts(_)) => {
                    return Err(StateError::UnsupportedKeyColumn(other.kind_name()))
                }
            }
        }
        keys.push(packer.take());
    }
    Ok(keys)
}
