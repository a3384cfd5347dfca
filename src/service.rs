//! Async plumbing around the module: the event loop feeding it, the background flush, and
//! replay of recorded packet captures.

use crate::classifier::Classification;
use crate::error::Result;
use crate::logger::{log, LogSeverity};
use crate::module::{ChunkDataEvent, ChunkDataOutcome, PaletteNewChunks};
use crate::protocol::{ChunkDataPacket, MinecraftPacketBuffer, Packet, PacketFrameCodec};
use crate::world::{DimensionId, Registries};
use futures::StreamExt;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use LogSeverity::*;

/// Outcome counts of an event loop run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct EventLoopStats {
    pub events: u64,
    pub new_chunks: u64,
    pub old_chunks: u64,
    pub seen_chunks: u64,
    pub already_classified: u64,
    pub unsupported_dimension: u64,
    pub failed: u64,
    pub disabled: u64,
}

impl EventLoopStats {
    pub fn record(&mut self, outcome: ChunkDataOutcome) {
        self.events += 1;
        let counter = match outcome {
            ChunkDataOutcome::Classified(Classification::New) => &mut self.new_chunks,
            ChunkDataOutcome::Classified(Classification::Old) => &mut self.old_chunks,
            ChunkDataOutcome::SeenChunk => &mut self.seen_chunks,
            ChunkDataOutcome::AlreadyClassified => &mut self.already_classified,
            ChunkDataOutcome::UnsupportedDimension => &mut self.unsupported_dimension,
            ChunkDataOutcome::Failed => &mut self.failed,
            ChunkDataOutcome::Disabled => &mut self.disabled,
        };
        *counter += 1;
    }
}

/// Feeds every received event to `module` until all senders are dropped.
pub fn spawn_event_loop(
    module: Arc<PaletteNewChunks>,
    mut events: mpsc::Receiver<ChunkDataEvent>,
) -> JoinHandle<EventLoopStats> {
    tokio::spawn(async move {
        let mut stats = EventLoopStats::default();
        while let Some(event) = events.recv().await {
            stats.record(module.on_chunk_data(&event));
        }
        log(format!("Event loop finished after {} events", stats.events), Info);
        stats
    })
}

/// Flushes `module` every `period` on the blocking pool. Runs until aborted.
pub fn spawn_periodic_flush(module: Arc<PaletteNewChunks>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let module = module.clone();
            match tokio::task::spawn_blocking(move || module.flush()).await {
                Ok(0) => {}
                Ok(written) => log(format!("Periodic flush wrote {} sets", written), Debug),
                Err(e) => log(format!("Periodic flush failed: {}", e), Warning),
            }
        }
    })
}

/// Counts of a capture replay.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub frames: u64,
    pub chunk_packets: u64,
    pub other_packets: u64,
    pub decode_errors: u64,
    pub events_sent: u64,
}

/// Replays a capture of length-prefixed client-bound packets, turning every chunk data
/// packet into an event for `dimension`. A chunk that already appeared earlier in the
/// capture is sent as seen.
pub async fn replay_capture(
    path: &Path,
    dimension: DimensionId,
    registries: Arc<Registries>,
    events: mpsc::Sender<ChunkDataEvent>,
) -> Result<ReplayStats> {
    let file = tokio::fs::File::open(path).await?;
    let mut frames = FramedRead::new(file, PacketFrameCodec::new());
    let mut stats = ReplayStats::default();
    let mut loaded = HashSet::new();

    while let Some(frame) = frames.next().await {
        let frame = frame?;
        stats.frames += 1;

        let mut buffer = MinecraftPacketBuffer::from_bytes(frame.to_vec());
        match buffer.read_varint() {
            Ok(id) if id == ChunkDataPacket::packet_id() => {}
            Ok(_) => {
                stats.other_packets += 1;
                continue;
            }
            Err(e) => {
                stats.decode_errors += 1;
                log(format!("Skipping frame {}: {}", stats.frames, e), Warning);
                continue;
            }
        }
        stats.chunk_packets += 1;

        let mut buffer = MinecraftPacketBuffer::from_bytes(frame.to_vec());
        let column = match ChunkDataPacket::read_from_buffer(&mut buffer)
            .and_then(|packet| packet.to_column(&registries))
        {
            Ok(column) => column,
            Err(e) => {
                stats.decode_errors += 1;
                log(format!("Skipping chunk packet in frame {}: {}", stats.frames, e), Warning);
                continue;
            }
        };

        let seen_chunk = !loaded.insert(column.pos.pack());
        let event = ChunkDataEvent::new(dimension.clone(), seen_chunk, column);
        if events.send(event).await.is_err() {
            log("Event receiver closed, stopping replay".to_owned(), Warning);
            break;
        }
        stats.events_sent += 1;
    }
    Ok(stats)
}
