pub mod chunker;
pub mod core;
pub mod tracker;
pub mod transport;

pub use chunker::{Chunk, ChunkStream, Chunker, FixedSizeChunker, WholeBufferChunker};
pub use self::core::{ProgressObserver, UploadManager};
pub use tracker::UploadTracker;
pub use transport::{
    ProgressChunks, SimulatedTransport, TransferControl, TransferError, TransferEvent,
    TransferPhase, UploadRequest, UploadTransport,
};
