//! Binary encoding of a finished [`KdIndex`].
//!
//! Layout (little-endian):
//!
//! | bytes | content                                            |
//! |-------|----------------------------------------------------|
//! | 0     | magic `0xdb`                                       |
//! | 1     | `(version << 4) \| coordinate type`                |
//! | 2..4  | node size (`u16`)                                  |
//! | 4..8  | item count (`u32`)                                 |
//! | ...   | ids, `u16` when count < 65536 else `u32`           |
//! | ...   | zero padding to an 8-byte boundary                 |
//! | ...   | `f32` coordinate pairs                             |

use super::{KdIndex, MAX_NODE_SIZE, MIN_NODE_SIZE};
use crate::error::{ClusterError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

const MAGIC: u8 = 0xdb;
const VERSION: u8 = 1;
const HEADER_SIZE: usize = 8;
/// Slot of `f32` in the coordinate-type table of the format.
const COORD_TYPE_F32: u8 = 7;
const WIDE_IDS_THRESHOLD: usize = 65_536;

fn ids_byte_size(num_items: usize) -> usize {
    if num_items < WIDE_IDS_THRESHOLD {
        num_items * 2
    } else {
        num_items * 4
    }
}

fn padding(ids_size: usize) -> usize {
    (8 - ids_size % 8) % 8
}

impl KdIndex {
    /// Encode the index so it can be shipped or cached and restored with [`KdIndex::from_bytes`].
    pub fn to_bytes(&self) -> Bytes {
        let num_items = self.ids.len();
        let ids_size = ids_byte_size(num_items);
        let pad = padding(ids_size);

        let mut buf = BytesMut::with_capacity(HEADER_SIZE + ids_size + pad + num_items * 8);
        buf.put_u8(MAGIC);
        buf.put_u8((VERSION << 4) | COORD_TYPE_F32);
        buf.put_u16_le(self.node_size as u16);
        buf.put_u32_le(num_items as u32);

        if num_items < WIDE_IDS_THRESHOLD {
            for &id in &self.ids {
                buf.put_u16_le(id as u16);
            }
        } else {
            for &id in &self.ids {
                buf.put_u32_le(id);
            }
        }
        buf.put_bytes(0, pad);

        for &coord in &self.coords {
            buf.put_f32_le(coord);
        }

        buf.freeze()
    }

    /// Decode an index produced by [`KdIndex::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::InvalidFormat`] when the magic byte, version or
    /// coordinate type is wrong, the buffer length disagrees with the header,
    /// or an id is out of range.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(ClusterError::InvalidFormat(format!(
                "buffer of {} bytes is shorter than the {} byte header",
                data.len(),
                HEADER_SIZE
            )));
        }

        let mut buf = data;
        let magic = buf.get_u8();
        if magic != MAGIC {
            return Err(ClusterError::InvalidFormat(
                "data does not appear to be in a kd index format".to_string(),
            ));
        }

        let version_and_type = buf.get_u8();
        let version = version_and_type >> 4;
        if version != VERSION {
            return Err(ClusterError::InvalidFormat(format!(
                "got v{} data when expected v{}",
                version, VERSION
            )));
        }
        let coord_type = version_and_type & 0x0f;
        if coord_type != COORD_TYPE_F32 {
            return Err(ClusterError::InvalidFormat(format!(
                "unsupported coordinate type {}",
                coord_type
            )));
        }

        let node_size = usize::from(buf.get_u16_le()).clamp(MIN_NODE_SIZE, MAX_NODE_SIZE);
        let num_items = buf.get_u32_le() as usize;

        let ids_size = ids_byte_size(num_items);
        let pad = padding(ids_size);
        let expected = HEADER_SIZE + ids_size + pad + num_items * 8;
        if data.len() != expected {
            return Err(ClusterError::InvalidFormat(format!(
                "expected {} bytes for {} items, got {}",
                expected,
                num_items,
                data.len()
            )));
        }

        let mut ids = Vec::with_capacity(num_items);
        for _ in 0..num_items {
            let id = if num_items < WIDE_IDS_THRESHOLD {
                u32::from(buf.get_u16_le())
            } else {
                buf.get_u32_le()
            };
            if id as usize >= num_items {
                return Err(ClusterError::InvalidFormat(format!(
                    "id {} out of range for {} items",
                    id, num_items
                )));
            }
            ids.push(id);
        }
        buf.advance(pad);

        let mut coords = Vec::with_capacity(num_items * 2);
        for _ in 0..num_items * 2 {
            coords.push(buf.get_f32_le());
        }

        Ok(Self {
            node_size,
            ids,
            coords,
        })
    }
}
