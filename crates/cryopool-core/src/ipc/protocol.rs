//! Wire protocol for cryopool worker processes.
//!
//! Uses length-prefixed rkyv messages over the worker's stdin/stdout.
//! Format: 4-byte length (u32 LE) + rkyv-encoded message.

use std::io::{ErrorKind, Read, Write};

use rkyv::{Archive, Deserialize, Serialize};

use crate::error::{Error, Result};

/// Command sent from the coordinator to a worker process.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub enum WorkerCommand {
    /// One-time startup message carrying the worker's identity and any
    /// caller-supplied initialization data. Always the first frame a worker
    /// reads; workers never inherit coordinator state any other way.
    Init {
        /// Stable ordinal of this worker in the pool.
        index: u32,
        /// Opaque caller-supplied setup bytes. Empty if unused.
        init_payload: Vec<u8>,
    },

    /// One unit of work.
    Task {
        /// Per-worker iterable item, absent when the request supplied fewer
        /// items than actions.
        item: Option<Vec<u8>>,
        /// Payload shared by every task of the request.
        payload: Vec<u8>,
    },

    /// Empty command; the worker echoes [`WorkerResponse::Empty`] and loops.
    Drain,
}

/// Response sent from a worker to the coordinator.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
pub enum WorkerResponse {
    /// Startup handshake acknowledgment.
    Ready,

    /// Task completed with a result.
    Output {
        /// Caller-encoded result bytes.
        bytes: Vec<u8>,
    },

    /// Sentinel: the task produced no result, or the work function failed.
    /// The two cases are indistinguishable on the wire.
    Empty,
}

/// Upper bound on a single frame body (64 MB).
const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Write a message to a writer using length-prefixed rkyv encoding.
pub fn write_message<W: Write>(
    writer: &mut W,
    message: &impl for<'a> Serialize<
        rkyv::rancor::Strategy<
            rkyv::ser::Serializer<
                rkyv::util::AlignedVec,
                rkyv::ser::allocator::ArenaHandle<'a>,
                rkyv::ser::sharing::Share,
            >,
            rkyv::rancor::Error,
        >,
    >,
) -> Result<()> {
    let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(message)
        .map_err(|e| Error::Serialization(format!("failed to encode frame: {}", e)))?;

    let len = bytes.len() as u32;
    writer
        .write_all(&len.to_le_bytes())
        .map_err(|e| Error::Ipc(format!("failed to write frame length: {}", e)))?;
    writer
        .write_all(&bytes)
        .map_err(|e| Error::Ipc(format!("failed to write frame body: {}", e)))?;
    writer
        .flush()
        .map_err(|e| Error::Ipc(format!("failed to flush channel: {}", e)))?;

    Ok(())
}

/// Read a message from a reader using length-prefixed rkyv encoding.
///
/// Returns [`Error::Disconnected`] when the stream ends cleanly at a frame
/// boundary (the peer closed its end of the channel).
///
/// # Safety
///
/// Uses unchecked deserialization for performance. Only safe when reading
/// from trusted sources (our own coordinator/worker processes).
pub fn read_message<R: Read, T>(reader: &mut R) -> Result<T>
where
    T: Archive,
    T::Archived: Deserialize<T, rkyv::rancor::Strategy<rkyv::de::Pool, rkyv::rancor::Error>>,
{
    let mut len_bytes = [0u8; 4];
    if let Err(e) = reader.read_exact(&mut len_bytes) {
        if e.kind() == ErrorKind::UnexpectedEof {
            return Err(Error::Disconnected);
        }
        return Err(Error::Ipc(format!("failed to read frame length: {}", e)));
    }
    let len = u32::from_le_bytes(len_bytes) as usize;

    if len > MAX_FRAME_LEN {
        return Err(Error::Ipc(format!("frame too large: {} bytes", len)));
    }

    let mut bytes = vec![0u8; len];
    reader
        .read_exact(&mut bytes)
        .map_err(|e| Error::Ipc(format!("failed to read frame body: {}", e)))?;

    // SAFETY: We trust data from our own coordinator/worker processes.
    // Using unchecked deserialization avoids CheckBytes trait complexity.
    let message = unsafe { rkyv::from_bytes_unchecked::<T, rkyv::rancor::Error>(&bytes) }
        .map_err(|e| Error::Serialization(format!("failed to decode frame: {}", e)))?;

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_init_roundtrip() {
        let cmd = WorkerCommand::Init {
            index: 3,
            init_payload: vec![9, 8, 7],
        };

        let mut buf = Vec::new();
        write_message(&mut buf, &cmd).unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded: WorkerCommand = read_message(&mut cursor).unwrap();

        match decoded {
            WorkerCommand::Init { index, init_payload } => {
                assert_eq!(index, 3);
                assert_eq!(init_payload, vec![9, 8, 7]);
            }
            _ => panic!("Wrong command type"),
        }
    }

    #[test]
    fn test_task_roundtrip() {
        let cmd = WorkerCommand::Task {
            item: Some(vec![1, 2, 3]),
            payload: vec![4, 5, 6],
        };

        let mut buf = Vec::new();
        write_message(&mut buf, &cmd).unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded: WorkerCommand = read_message(&mut cursor).unwrap();

        match decoded {
            WorkerCommand::Task { item, payload } => {
                assert_eq!(item, Some(vec![1, 2, 3]));
                assert_eq!(payload, vec![4, 5, 6]);
            }
            _ => panic!("Wrong command type"),
        }
    }

    #[test]
    fn test_task_without_item_roundtrip() {
        let cmd = WorkerCommand::Task {
            item: None,
            payload: vec![42],
        };

        let mut buf = Vec::new();
        write_message(&mut buf, &cmd).unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded: WorkerCommand = read_message(&mut cursor).unwrap();

        match decoded {
            WorkerCommand::Task { item, payload } => {
                assert!(item.is_none());
                assert_eq!(payload, vec![42]);
            }
            _ => panic!("Wrong command type"),
        }
    }

    #[test]
    fn test_response_roundtrip() {
        let resp = WorkerResponse::Output {
            bytes: vec![1, 2, 3, 4, 5],
        };

        let mut buf = Vec::new();
        write_message(&mut buf, &resp).unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded: WorkerResponse = read_message(&mut cursor).unwrap();

        match decoded {
            WorkerResponse::Output { bytes } => assert_eq!(bytes, vec![1, 2, 3, 4, 5]),
            _ => panic!("Wrong response type"),
        }
    }

    #[test]
    fn test_sentinel_responses_roundtrip() {
        for resp in [WorkerResponse::Ready, WorkerResponse::Empty] {
            let mut buf = Vec::new();
            write_message(&mut buf, &resp).unwrap();

            let mut cursor = Cursor::new(buf);
            let decoded: WorkerResponse = read_message(&mut cursor).unwrap();
            assert!(matches!(
                (&resp, &decoded),
                (WorkerResponse::Ready, WorkerResponse::Ready)
                    | (WorkerResponse::Empty, WorkerResponse::Empty)
            ));
        }
    }

    #[test]
    fn test_eof_maps_to_disconnected() {
        let mut cursor = Cursor::new(Vec::new());
        let err = read_message::<_, WorkerResponse>(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::Disconnected));
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(u32::MAX).to_le_bytes());
        let mut cursor = Cursor::new(buf);
        let err = read_message::<_, WorkerResponse>(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::Ipc(_)));
    }
}
