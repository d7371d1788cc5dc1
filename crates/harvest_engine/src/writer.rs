use std::sync::mpsc;
use std::thread;

use engine_logging::{engine_debug, engine_error};
use harvest_core::AcceptedRecord;
use tokio::sync::oneshot;

use crate::persist::{JsonlSink, PersistError};

struct WriteRequest {
    record: AcceptedRecord,
    ack: oneshot::Sender<Result<(), PersistError>>,
}

/// Cloneable front end of the single writer thread that owns the sink.
///
/// All appends are serialized through one channel; `append` resolves only
/// after the record has been synced to disk.
#[derive(Clone)]
pub struct SinkHandle {
    tx: mpsc::Sender<WriteRequest>,
}

impl SinkHandle {
    /// Moves `sink` onto a dedicated thread. The thread exits once every
    /// handle has been dropped.
    pub fn spawn(mut sink: JsonlSink) -> Self {
        let (tx, rx) = mpsc::channel::<WriteRequest>();

        thread::spawn(move || {
            while let Ok(request) = rx.recv() {
                let appid = request.record.appid;
                let result = sink.append(&request.record);
                if let Err(err) = &result {
                    engine_error!("Failed to append app {} to {:?}: {}", appid, sink.path(), err);
                }
                let _ = request.ack.send(result);
            }
            engine_debug!("Output writer for {:?} finished", sink.path());
        });

        Self { tx }
    }

    pub async fn append(&self, record: AcceptedRecord) -> Result<(), PersistError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(WriteRequest { record, ack })
            .map_err(|_| PersistError::WriterClosed)?;
        done.await.map_err(|_| PersistError::WriterClosed)?
    }
}
