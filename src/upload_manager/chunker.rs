use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// 调试慢速上传时的默认分片大小。
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// 上传内容中的一段连续字节。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u64,
    pub data: Vec<u8>,
}

impl Chunk {
    /// 该分片结束位置，即发送完后的累计字节数。
    pub fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }
}

pub type ChunkStream = Box<dyn Iterator<Item = Chunk> + Send>;

/// 将待上传的字节切分为分片流。
pub trait Chunker: Send + Sync {
    fn chunks(&self, bytes: Arc<[u8]>) -> ChunkStream;
}

/// 一次性交出全部内容（正常上传路径）。
#[derive(Clone, Copy, Debug, Default)]
pub struct WholeBufferChunker;

impl Chunker for WholeBufferChunker {
    fn chunks(&self, bytes: Arc<[u8]>) -> ChunkStream {
        Box::new(std::iter::once(Chunk {
            offset: 0,
            data: bytes.to_vec(),
        }))
    }
}

/// 按固定大小切片，并在相邻分片之间等待 `delay`，用于在可控条件下观察进度 UI。
#[derive(Clone, Copy, Debug)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    delay: Duration,
}

impl FixedSizeChunker {
    /// chunk_size 为 0 时按 1 字节处理。
    pub fn new(chunk_size: usize, delay: Duration) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            delay,
        }
    }

    pub fn instant(chunk_size: usize) -> Self {
        Self::new(chunk_size, Duration::ZERO)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedSizeChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, Duration::from_millis(50))
    }
}

impl Chunker for FixedSizeChunker {
    fn chunks(&self, bytes: Arc<[u8]>) -> ChunkStream {
        Box::new(FixedSizeChunks {
            bytes,
            offset: 0,
            chunk_size: self.chunk_size,
            delay: self.delay,
        })
    }
}

struct FixedSizeChunks {
    bytes: Arc<[u8]>,
    offset: usize,
    chunk_size: usize,
    delay: Duration,
}

impl Iterator for FixedSizeChunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.offset >= self.bytes.len() {
            return None;
        }
        if self.offset > 0 && !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        let end = (self.offset + self.chunk_size).min(self.bytes.len());
        let chunk = Chunk {
            offset: self.offset as u64,
            data: self.bytes[self.offset..end].to_vec(),
        };
        self.offset = end;
        Some(chunk)
    }
}
