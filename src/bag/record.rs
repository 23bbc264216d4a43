use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

use crate::msgs::RosTime;

pub const MAGIC: &[u8] = b"#ROSBAG V2.0\n";

/// The file header record is padded to exactly this many bytes.
pub const FILE_HEADER_LENGTH: usize = 4096;

pub const INDEX_VERSION: u32 = 1;
pub const CHUNK_INFO_VERSION: u32 = 1;

pub mod op {
    pub const MSG_DATA: u8 = 0x02;
    pub const FILE_HEADER: u8 = 0x03;
    pub const INDEX_DATA: u8 = 0x04;
    pub const CHUNK: u8 = 0x05;
    pub const CHUNK_INFO: u8 = 0x06;
    pub const CONNECTION: u8 = 0x07;
}

/// Ordered `name=value` fields of a record header.
#[derive(Debug, Default, Clone)]
pub struct RecordHeader {
    fields: Vec<(&'static str, Vec<u8>)>,
}

impl RecordHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_op(op: u8) -> Self {
        Self::new().field("op", vec![op])
    }

    pub fn field(mut self, name: &'static str, value: Vec<u8>) -> Self {
        self.fields.push((name, value));
        self
    }

    pub fn u32(self, name: &'static str, value: u32) -> Self {
        self.field(name, value.to_le_bytes().to_vec())
    }

    pub fn u64(self, name: &'static str, value: u64) -> Self {
        self.field(name, value.to_le_bytes().to_vec())
    }

    pub fn time(self, name: &'static str, value: RosTime) -> Self {
        self.field(name, value.to_bytes().to_vec())
    }

    pub fn string(self, name: &'static str, value: &str) -> Self {
        self.field(name, value.as_bytes().to_vec())
    }

    /// Encoded fields, without the leading header length.
    pub fn encode(&self) -> Vec<u8> {
        let len = self
            .fields
            .iter()
            .map(|(name, value)| 4 + name.len() + 1 + value.len())
            .sum();
        let mut out = Vec::with_capacity(len);
        for (name, value) in &self.fields {
            out.extend_from_slice(&((name.len() + 1 + value.len()) as u32).to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.push(b'=');
            out.extend_from_slice(value);
        }
        out
    }
}

/// Lengths and offsets in a bag are 32-bit.
pub fn len_u32(len: usize, what: &str) -> io::Result<u32> {
    u32::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} of {} bytes does not fit a 32-bit bag field", what, len),
        )
    })
}

/// Writes `header_len, header, data_len, data` and returns the byte count.
pub fn write_record<W: Write>(out: &mut W, header: &RecordHeader, data: &[u8]) -> io::Result<u64> {
    let header = header.encode();
    let header_len = len_u32(header.len(), "record header")?;
    let data_len = len_u32(data.len(), "record data")?;
    out.write_u32::<LittleEndian>(header_len)?;
    out.write_all(&header)?;
    out.write_u32::<LittleEndian>(data_len)?;
    out.write_all(data)?;
    Ok(8 + header.len() as u64 + data.len() as u64)
}

/// File header record padded with spaces to [`FILE_HEADER_LENGTH`].
pub fn write_file_header<W: Write>(
    out: &mut W,
    index_pos: u64,
    conn_count: u32,
    chunk_count: u32,
) -> io::Result<u64> {
    let header = RecordHeader::with_op(op::FILE_HEADER)
        .u64("index_pos", index_pos)
        .u32("conn_count", conn_count)
        .u32("chunk_count", chunk_count);
    let padding = FILE_HEADER_LENGTH - 8 - header.encode().len();
    write_record(out, &header, &vec![b' '; padding])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_field_encoding() {
        let header = RecordHeader::with_op(op::CONNECTION).u32("conn", 2).string("topic", "/a");
        let bytes = header.encode();

        let mut expected = Vec::new();
        expected.extend_from_slice(&4u32.to_le_bytes());
        expected.extend_from_slice(b"op=\x07");
        expected.extend_from_slice(&9u32.to_le_bytes());
        expected.extend_from_slice(b"conn=\x02\x00\x00\x00");
        expected.extend_from_slice(&8u32.to_le_bytes());
        expected.extend_from_slice(b"topic=/a");
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_len_u32_rejects_oversized_lengths() {
        assert_eq!(len_u32(4096, "chunk").unwrap(), 4096);
        assert_eq!(len_u32(u32::MAX as usize, "chunk").unwrap(), u32::MAX);
        if let Some(too_big) = (u32::MAX as usize).checked_add(1) {
            let err = len_u32(too_big, "chunk").unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn test_file_header_is_padded() {
        let mut buf = Vec::new();
        let written = write_file_header(&mut buf, 123, 1, 2).unwrap();
        assert_eq!(written as usize, FILE_HEADER_LENGTH);
        assert_eq!(buf.len(), FILE_HEADER_LENGTH);
        assert_eq!(*buf.last().unwrap(), b' ');
    }
}
