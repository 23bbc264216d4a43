use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::mem;
use std::path::Path;

use super::record::{self, op, RecordHeader};
use super::Compression;
use crate::msgs::{RosMessage, RosTime};
use crate::shared::constants;
use crate::utils::logger;

#[derive(Debug, Clone, Copy)]
pub struct BagOptions {
    pub compression: Compression,
    pub chunk_threshold: usize,
}

impl Default for BagOptions {
    fn default() -> Self {
        Self {
            compression: Compression::None,
            chunk_threshold: constants::DEFAULT_CHUNK_THRESHOLD,
        }
    }
}

struct Connection {
    id: u32,
    topic: String,
    datatype: &'static str,
    md5sum: &'static str,
    definition: &'static str,
}

impl Connection {
    fn write_record<W: Write>(&self, out: &mut W) -> io::Result<u64> {
        let header = RecordHeader::with_op(op::CONNECTION)
            .u32("conn", self.id)
            .string("topic", &self.topic);
        let data = RecordHeader::new()
            .string("topic", &self.topic)
            .string("type", self.datatype)
            .string("md5sum", self.md5sum)
            .string("message_definition", self.definition)
            .encode();
        record::write_record(out, &header, &data)
    }
}

/// Records of the chunk currently being filled.
#[derive(Default)]
struct OpenChunk {
    data: Vec<u8>,
    start: Option<RosTime>,
    end: RosTime,
    index: BTreeMap<u32, Vec<(RosTime, u32)>>,
}

struct ChunkInfo {
    pos: u64,
    start: RosTime,
    end: RosTime,
    counts: Vec<(u32, u32)>,
}

/// Append-only bag writer. Call [`BagWriter::close`] to write the index; a
/// writer dropped without closing closes itself and logs any error.
pub struct BagWriter<W: Write + Seek> {
    out: W,
    pos: u64,
    options: BagOptions,
    connections: Vec<Connection>,
    topics: HashMap<String, u32>,
    chunk: OpenChunk,
    chunk_infos: Vec<ChunkInfo>,
    message_count: u64,
    closed: bool,
}

impl BagWriter<BufWriter<File>> {
    /// Creates (or truncates) the bag at `path`.
    pub fn create(path: &Path, options: BagOptions) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), options)
    }
}

impl<W: Write + Seek> BagWriter<W> {
    pub fn new(mut out: W, options: BagOptions) -> io::Result<Self> {
        out.write_all(record::MAGIC)?;
        let header_len = record::write_file_header(&mut out, 0, 0, 0)?;

        Ok(Self {
            out,
            pos: record::MAGIC.len() as u64 + header_len,
            options,
            connections: Vec::new(),
            topics: HashMap::new(),
            chunk: OpenChunk::default(),
            chunk_infos: Vec::new(),
            message_count: 0,
            closed: false,
        })
    }

    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    /// Appends `msg` on `topic` with record time `time`.
    pub fn write<M: RosMessage>(&mut self, topic: &str, msg: &M, time: RosTime) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::Other, "bag is already closed"));
        }

        let payload = msg.to_bytes()?;
        // a new connection's record goes into the chunk ahead of the message
        let conn = self.connection_for::<M>(topic)?;
        let offset = record::len_u32(self.chunk.data.len(), "chunk offset")?;

        let header = RecordHeader::with_op(op::MSG_DATA).u32("conn", conn).time("time", time);
        record::write_record(&mut self.chunk.data, &header, &payload)?;

        self.chunk.index.entry(conn).or_default().push((time, offset));
        self.chunk.start = Some(self.chunk.start.map_or(time, |start| start.min(time)));
        self.chunk.end = self.chunk.end.max(time);
        self.message_count += 1;

        if self.chunk.data.len() > self.options.chunk_threshold {
            self.flush_chunk()?;
        }
        Ok(())
    }

    fn connection_for<M: RosMessage>(&mut self, topic: &str) -> io::Result<u32> {
        if let Some(&id) = self.topics.get(topic) {
            return Ok(id);
        }

        let connection = Connection {
            id: self.connections.len() as u32,
            topic: topic.to_string(),
            datatype: M::DATATYPE,
            md5sum: M::MD5SUM,
            definition: M::DEFINITION,
        };
        // First use of a connection is recorded inside the chunk as well
        connection.write_record(&mut self.chunk.data)?;

        let id = connection.id;
        self.topics.insert(connection.topic.clone(), id);
        self.connections.push(connection);
        Ok(id)
    }

    fn flush_chunk(&mut self) -> io::Result<()> {
        if self.chunk.index.is_empty() {
            return Ok(());
        }
        let chunk = mem::take(&mut self.chunk);
        let uncompressed_size = record::len_u32(chunk.data.len(), "chunk")?;

        let body = match self.options.compression {
            Compression::None => chunk.data,
            Compression::Lz4 => compress_lz4(&chunk.data)?,
        };

        let chunk_pos = self.pos;
        let header = RecordHeader::with_op(op::CHUNK)
            .string("compression", self.options.compression.as_str())
            .u32("size", uncompressed_size);
        self.pos += record::write_record(&mut self.out, &header, &body)?;

        let mut counts = Vec::with_capacity(chunk.index.len());
        for (conn, entries) in &chunk.index {
            let header = RecordHeader::with_op(op::INDEX_DATA)
                .u32("ver", record::INDEX_VERSION)
                .u32("conn", *conn)
                .u32("count", entries.len() as u32);
            let mut data = Vec::with_capacity(entries.len() * 12);
            for (time, offset) in entries {
                data.extend_from_slice(&time.to_bytes());
                data.extend_from_slice(&offset.to_le_bytes());
            }
            self.pos += record::write_record(&mut self.out, &header, &data)?;
            counts.push((*conn, entries.len() as u32));
        }

        self.chunk_infos.push(ChunkInfo {
            pos: chunk_pos,
            start: chunk.start.unwrap_or_default(),
            end: chunk.end,
            counts,
        });
        Ok(())
    }

    /// Flushes the open chunk, writes the index section and rewrites the file
    /// header. Only the first call does anything.
    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.flush_chunk()?;

        let index_pos = self.pos;
        for connection in &self.connections {
            self.pos += connection.write_record(&mut self.out)?;
        }
        for info in &self.chunk_infos {
            let header = RecordHeader::with_op(op::CHUNK_INFO)
                .u32("ver", record::CHUNK_INFO_VERSION)
                .u64("chunk_pos", info.pos)
                .time("start_time", info.start)
                .time("end_time", info.end)
                .u32("count", info.counts.len() as u32);
            let mut data = Vec::with_capacity(info.counts.len() * 8);
            for (conn, count) in &info.counts {
                data.extend_from_slice(&conn.to_le_bytes());
                data.extend_from_slice(&count.to_le_bytes());
            }
            self.pos += record::write_record(&mut self.out, &header, &data)?;
        }

        self.out.seek(SeekFrom::Start(record::MAGIC.len() as u64))?;
        record::write_file_header(
            &mut self.out,
            index_pos,
            self.connections.len() as u32,
            self.chunk_infos.len() as u32,
        )?;
        self.out.seek(SeekFrom::Start(self.pos))?;
        self.out.flush()
    }
}

impl<W: Write + Seek> Drop for BagWriter<W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            logger::error(&format!("Failed to close bag: {}", e));
        }
    }
}

/// LZ4 frame in the only layout roslz4 reads: independent blocks, content
/// checksum, no block checksum, no content size.
fn compress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = lz4::EncoderBuilder::new()
        .block_mode(lz4::BlockMode::Independent)
        .block_checksum(lz4::liblz4::BlockChecksum::NoBlockChecksum)
        .checksum(lz4::ContentChecksum::ChecksumEnabled)
        .build(Vec::with_capacity(data.len() / 2))?;
    encoder.write_all(data)?;
    let (compressed, result) = encoder.finish();
    result?;
    Ok(compressed)
}
