//! Minimal bag reader used by the tests to check what the writer produced.

use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::path::Path;

use super::record::{op, FILE_HEADER_LENGTH, MAGIC};
use crate::msgs::RosTime;

pub type Fields = HashMap<String, Vec<u8>>;

pub struct Record {
    pub header: Fields,
    pub data: Vec<u8>,
}

impl Record {
    pub fn op(&self) -> u8 {
        self.header["op"][0]
    }

    pub fn u32(&self, name: &str) -> u32 {
        u32::from_le_bytes(self.header[name][..4].try_into().unwrap())
    }

    pub fn u64(&self, name: &str) -> u64 {
        u64::from_le_bytes(self.header[name][..8].try_into().unwrap())
    }

    pub fn time(&self, name: &str) -> RosTime {
        RosTime::from_bytes(self.header[name][..8].try_into().unwrap())
    }

    pub fn string(&self, name: &str) -> String {
        String::from_utf8(self.header[name].clone()).unwrap()
    }
}

pub struct Message {
    pub topic: String,
    pub time: RosTime,
    pub data: Vec<u8>,
}

pub struct ChunkSummary {
    pub pos: u64,
    pub compression: String,
    pub start: RosTime,
    pub end: RosTime,
    pub message_count: u32,
}

pub struct Bag {
    pub index_pos: u64,
    pub conn_count: u32,
    pub chunk_count: u32,
    pub connections: HashMap<u32, Fields>,
    pub messages: Vec<Message>,
    pub chunks: Vec<ChunkSummary>,
    pub index_entries: usize,
}

pub fn parse_fields(bytes: &[u8]) -> io::Result<Fields> {
    let mut cursor = Cursor::new(bytes);
    let mut fields = HashMap::new();
    while (cursor.position() as usize) < bytes.len() {
        let len = cursor.read_u32::<LittleEndian>()? as usize;
        let mut field = vec![0u8; len];
        cursor.read_exact(&mut field)?;
        let eq = field
            .iter()
            .position(|b| *b == b'=')
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "field without '='"))?;
        let name = String::from_utf8_lossy(&field[..eq]).to_string();
        fields.insert(name, field[eq + 1..].to_vec());
    }
    Ok(fields)
}

fn read_record<R: Read>(input: &mut R) -> io::Result<Record> {
    let header_len = input.read_u32::<LittleEndian>()? as usize;
    let mut header = vec![0u8; header_len];
    input.read_exact(&mut header)?;
    let data_len = input.read_u32::<LittleEndian>()? as usize;
    let mut data = vec![0u8; data_len];
    input.read_exact(&mut data)?;
    Ok(Record { header: parse_fields(&header)?, data })
}

pub fn read_file(path: &Path) -> io::Result<Bag> {
    read(&std::fs::read(path)?)
}

pub fn read(bytes: &[u8]) -> io::Result<Bag> {
    if !bytes.starts_with(MAGIC) {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "missing bag magic"));
    }
    let mut cursor = Cursor::new(bytes);
    cursor.set_position(MAGIC.len() as u64);

    let file_header = read_record(&mut cursor)?;
    assert_eq!(file_header.op(), op::FILE_HEADER);
    assert_eq!(cursor.position() as usize, MAGIC.len() + FILE_HEADER_LENGTH);
    let index_pos = file_header.u64("index_pos");

    let mut bag = Bag {
        index_pos,
        conn_count: file_header.u32("conn_count"),
        chunk_count: file_header.u32("chunk_count"),
        connections: HashMap::new(),
        messages: Vec::new(),
        chunks: Vec::new(),
        index_entries: 0,
    };

    let mut topics: HashMap<u32, String> = HashMap::new();
    while (cursor.position() as usize) < bytes.len() {
        let pos = cursor.position();
        let record = read_record(&mut cursor)?;
        match record.op() {
            op::CHUNK => {
                let compression = record.string("compression");
                let size = record.u32("size") as usize;
                let data = match compression.as_str() {
                    "none" => record.data.clone(),
                    "lz4" => {
                        let mut decoded = Vec::new();
                        lz4::Decoder::new(record.data.as_slice())?.read_to_end(&mut decoded)?;
                        decoded
                    }
                    other => panic!("unexpected compression {}", other),
                };
                assert_eq!(data.len(), size);

                let mut inner = Cursor::new(data.as_slice());
                while (inner.position() as usize) < data.len() {
                    let record = read_record(&mut inner)?;
                    match record.op() {
                        op::CONNECTION => {
                            topics.insert(record.u32("conn"), record.string("topic"));
                        }
                        op::MSG_DATA => bag.messages.push(Message {
                            topic: topics[&record.u32("conn")].clone(),
                            time: record.time("time"),
                            data: record.data,
                        }),
                        other => panic!("unexpected op {:#x} inside chunk", other),
                    }
                }
                bag.chunks.push(ChunkSummary {
                    pos,
                    compression,
                    start: RosTime::ZERO,
                    end: RosTime::ZERO,
                    message_count: 0,
                });
            }
            op::INDEX_DATA => {
                assert!(pos < index_pos);
                bag.index_entries += record.u32("count") as usize;
            }
            op::CONNECTION => {
                assert!(pos >= index_pos);
                bag.connections.insert(record.u32("conn"), parse_fields(&record.data)?);
            }
            op::CHUNK_INFO => {
                let chunk_pos = record.u64("chunk_pos");
                let chunk = bag
                    .chunks
                    .iter_mut()
                    .find(|c| c.pos == chunk_pos)
                    .expect("chunk info points at a chunk");
                chunk.start = record.time("start_time");
                chunk.end = record.time("end_time");
                let mut counts = Cursor::new(record.data.as_slice());
                for _ in 0..record.u32("count") {
                    let _conn = counts.read_u32::<LittleEndian>()?;
                    chunk.message_count += counts.read_u32::<LittleEndian>()?;
                }
            }
            other => panic!("unexpected op {:#x}", other),
        }
    }
    Ok(bag)
}
