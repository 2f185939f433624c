//! # Generation Workers
//!
//! A fixed pool of threads turning `(coord, seed, epoch)` requests into
//! [`GeneratedChunk`]s. Workers never touch the block store; replies are
//! applied by the mutation thread in completion order.
//!
//! ```text
//! ChunkManager ──requests──> [worker 0..n] ──replies──> ChunkManager
//! ```

use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};

use loam_core::{ChunkCoord, WorldSeed};
use loam_procedural::{ChunkGenerator, GeneratedChunk, GenerationConfig};

/// One chunk to generate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Chunk key.
    pub coord: ChunkCoord,
    /// Seed to generate with.
    pub seed: WorldSeed,
    /// Seed epoch at dispatch time.
    pub epoch: u64,
}

/// A finished chunk.
#[derive(Clone, Debug)]
pub struct GenerationReply {
    /// Request this answers.
    pub request: GenerationRequest,
    /// Generated blocks.
    pub chunk: GeneratedChunk,
}

/// Pool of generation threads.
pub struct GenerationWorker {
    requests: Option<Sender<GenerationRequest>>,
    replies: Receiver<GenerationReply>,
    handles: Vec<JoinHandle<()>>,
    in_flight: usize,
}

impl GenerationWorker {
    /// Starts `threads` workers (at least one).
    ///
    /// # Errors
    ///
    /// Returns an error if a thread cannot be spawned.
    pub fn spawn(threads: usize, config: &GenerationConfig) -> std::io::Result<Self> {
        let (request_tx, request_rx) = unbounded::<GenerationRequest>();
        let (reply_tx, reply_rx) = unbounded::<GenerationReply>();

        let mut handles = Vec::with_capacity(threads.max(1));
        for index in 0..threads.max(1) {
            let requests = request_rx.clone();
            let replies = reply_tx.clone();
            let config = config.clone();
            let handle = std::thread::Builder::new()
                .name(format!("loam-gen-{index}"))
                .spawn(move || run(&requests, &replies, &config))?;
            handles.push(handle);
        }
        tracing::debug!("Started {} generation workers", handles.len());

        Ok(Self {
            requests: Some(request_tx),
            replies: reply_rx,
            handles,
            in_flight: 0,
        })
    }

    /// Threads in the pool.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.handles.len()
    }

    /// Requests sent but not yet received back.
    #[must_use]
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Queues `request`. Returns `false` if the pool has shut down.
    pub fn submit(&mut self, request: GenerationRequest) -> bool {
        let Some(tx) = &self.requests else {
            return false;
        };
        if tx.send(request).is_err() {
            return false;
        }
        self.in_flight += 1;
        true
    }

    /// Next finished chunk, if one is ready.
    pub fn try_recv(&mut self) -> Option<GenerationReply> {
        let reply = self.replies.try_recv().ok()?;
        self.in_flight -= 1;
        Some(reply)
    }

    /// Waits for the next finished chunk. `None` if nothing is in flight.
    pub fn recv(&mut self) -> Option<GenerationReply> {
        if self.in_flight == 0 {
            return None;
        }
        let reply = self.replies.recv().ok()?;
        self.in_flight -= 1;
        Some(reply)
    }
}

impl Drop for GenerationWorker {
    fn drop(&mut self) {
        // Closing the request channel ends every worker loop.
        self.requests = None;
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::error!("Generation worker panicked");
            }
        }
    }
}

fn run(
    requests: &Receiver<GenerationRequest>,
    replies: &Sender<GenerationReply>,
    config: &GenerationConfig,
) {
    let mut generator: Option<ChunkGenerator> = None;
    while let Ok(request) = requests.recv() {
        if generator.as_ref().map(ChunkGenerator::seed) != Some(request.seed) {
            generator = Some(ChunkGenerator::new(request.seed, config));
        }
        let Some(current) = generator.as_ref() else {
            continue;
        };
        let chunk = current.generate(request.coord);
        if replies.send(GenerationReply { request, chunk }).is_err() {
            break;
        }
    }
}
