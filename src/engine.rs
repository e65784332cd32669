//! Message-driven entry point.
//!
//! An ordering request crosses into the engine by value and the answer comes
//! back as messages: zero or more [`EngineMessage::Progress`] notifications,
//! then exactly one [`EngineMessage::Finished`]. Nothing is shared with the
//! caller except the [`CancelToken`].
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use hashwalk::engine::{Engine, OrderRequest, OrderResponse};
//!
//! let request = OrderRequest {
//!     strategy: "mst".into(),
//!     items: vec!["a.jpg".into(), "b.jpg".into(), "c.jpg".into()],
//!     hashes: HashMap::from([
//!         ("a.jpg".into(), "0000".into()),
//!         ("b.jpg".into(), "0001".into()),
//!     ]),
//!     focus_index: Some(0),
//!     max_comparisons: None,
//! };
//!
//! let engine = Engine::default();
//! let job = engine.spawn(request);
//! match job.wait() {
//!     Some(OrderResponse::Ordered { ordered_keys, .. }) => println!("{ordered_keys:?}"),
//!     Some(OrderResponse::Failed { error_kind, message }) => eprintln!("{error_kind:?}: {message}"),
//!     None => eprintln!("worker exited without answering"),
//! }
//! ```

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{HashEncoding, OrderConfig};
use crate::distance::{BitHamming, Hamming, HashMetric};
use crate::error::{ErrorKind, OrderError, Result};
use crate::hash::PerceptualHash;
use crate::ordering::greedy::order_vptree;
use crate::ordering::mst::order_mst;
use crate::ordering::simple::order_simple;
use crate::ordering::{OrderInput, OrderOutcome, OrderStats, RunContext, Strategy};
use crate::progress::{CancelToken, NoProgress, Progress, ProgressSink};

/// A request to order a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// `"simple"`, `"vptree"`, `"mst"` or `"auto"`.
    pub strategy: String,
    /// Item keys, in the caller's current order.
    pub items: Vec<String>,
    /// Hash string per item key. Keys missing here are hashless.
    #[serde(default)]
    pub hashes: HashMap<String, String>,
    /// Index into `items` of the focused item.
    #[serde(default)]
    pub focus_index: Option<usize>,
    /// Simple Greedy per-step candidate cap.
    #[serde(default)]
    pub max_comparisons: Option<usize>,
}

/// Terminal answer to an [`OrderRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderResponse {
    Ordered {
        #[serde(rename = "orderedKeys")]
        ordered_keys: Vec<String>,
        stats: OrderStats,
    },
    Failed {
        #[serde(rename = "errorKind")]
        error_kind: ErrorKind,
        message: String,
    },
}

impl OrderResponse {
    pub fn from_result(result: Result<Ordered>) -> Self {
        match result {
            Ok(ordered) => OrderResponse::Ordered {
                ordered_keys: ordered.keys,
                stats: ordered.stats,
            },
            Err(e) => OrderResponse::Failed {
                error_kind: e.kind(),
                message: e.to_string(),
            },
        }
    }
}

/// Message emitted by a spawned job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum EngineMessage {
    Progress(Progress),
    Finished(OrderResponse),
}

/// Successful result of [`Engine::execute`].
#[derive(Debug, Clone, PartialEq)]
pub struct Ordered {
    pub keys: Vec<String>,
    pub stats: OrderStats,
}

/// Ordering engine. Holds configuration only; every call builds its
/// structures from scratch.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: OrderConfig,
}

impl Engine {
    pub fn new(config: OrderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run a request on the calling thread.
    pub fn execute(
        &self,
        request: &OrderRequest,
        cancel: &CancelToken,
        progress: &dyn ProgressSink,
    ) -> Result<Ordered> {
        let started = Instant::now();
        let selector: Strategy = request.strategy.parse()?;
        let ctx = RunContext::new(cancel, progress, self.config.progress_interval);
        ctx.checkpoint()?;

        let decoded = self.decode_hashes(request);
        let focus = request
            .focus_index
            .filter(|&i| i < request.items.len());
        let input = OrderInput::new(decoded.iter().map(Option::as_ref).collect(), focus);
        let strategy = selector.resolve(input.hashed_count(), self.config.auto_threshold);

        tracing::info!(
            strategy = %strategy,
            items = input.len(),
            hashed = input.hashed_count(),
            "order.start"
        );

        let outcome = match self.config.hash_encoding {
            HashEncoding::Symbols => self.dispatch(strategy, request, &input, Hamming, &ctx),
            HashEncoding::Hex => self.dispatch(strategy, request, &input, BitHamming, &ctx),
        };

        let OrderOutcome {
            positions,
            mut stats,
        } = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::info!(strategy = %strategy, error = %e, "order.failed");
                return Err(e);
            }
        };
        stats.elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            strategy = %strategy,
            comparisons = stats.comparisons,
            fallback_jumps = stats.fallback_jumps,
            unplaced = stats.unplaced,
            elapsed_ms = stats.elapsed_ms,
            "order.done"
        );

        let keys = positions
            .into_iter()
            .map(|p| request.items[p].clone())
            .collect();
        Ok(Ordered { keys, stats })
    }

    /// Run a request and fold the outcome into a response message.
    pub fn respond(
        &self,
        request: &OrderRequest,
        cancel: &CancelToken,
        progress: &dyn ProgressSink,
    ) -> OrderResponse {
        OrderResponse::from_result(self.execute(request, cancel, progress))
    }

    /// Run a request on a worker thread.
    pub fn spawn(&self, request: OrderRequest) -> OrderJob {
        let (tx, rx) = mpsc::sync_channel(self.config.progress_channel_capacity.max(1));
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let engine = self.clone();

        let handle = thread::spawn(move || {
            let progress_tx = tx.clone();
            // A full channel drops the notification rather than stall the run.
            let sink = move |p: Progress| {
                let _ = progress_tx.try_send(EngineMessage::Progress(p));
            };
            let response = engine.respond(&request, &worker_cancel, &sink);
            let _ = tx.send(EngineMessage::Finished(response));
        });

        OrderJob {
            cancel,
            messages: rx,
            handle: Some(handle),
        }
    }

    fn decode_hashes(&self, request: &OrderRequest) -> Vec<Option<PerceptualHash>> {
        request
            .items
            .iter()
            .map(|key| {
                let raw = request.hashes.get(key)?;
                let parsed = match self.config.hash_encoding {
                    HashEncoding::Symbols => PerceptualHash::from_symbols(raw),
                    HashEncoding::Hex => PerceptualHash::from_hex(raw),
                };
                match parsed {
                    Ok(hash) => Some(hash),
                    Err(e) => {
                        tracing::warn!(
                            key = %key,
                            error = %e,
                            "unparseable hash; treating item as hashless"
                        );
                        None
                    }
                }
            })
            .collect()
    }

    fn dispatch<M: HashMetric>(
        &self,
        strategy: Strategy,
        request: &OrderRequest,
        input: &OrderInput<'_>,
        metric: M,
        ctx: &RunContext<'_>,
    ) -> Result<OrderOutcome> {
        match strategy {
            Strategy::Simple | Strategy::Auto => {
                let cap = request
                    .max_comparisons
                    .unwrap_or(self.config.max_comparisons);
                let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
                let mut rng = StdRng::seed_from_u64(seed);
                order_simple(input, metric, cap, &mut rng, ctx)
            }
            Strategy::VpTree => order_vptree(input, metric, ctx),
            Strategy::Mst => order_mst(input, metric, &self.config.knn, ctx),
        }
    }
}

/// Run a request to completion on the calling thread without progress.
pub fn order(request: &OrderRequest, config: &OrderConfig) -> Result<Ordered> {
    let engine = Engine::new(config.clone())?;
    engine.execute(request, &CancelToken::new(), &NoProgress)
}

/// Handle to a spawned ordering job.
///
/// Dropping the handle cancels the job.
pub struct OrderJob {
    cancel: CancelToken,
    messages: Receiver<EngineMessage>,
    handle: Option<JoinHandle<()>>,
}

impl OrderJob {
    /// Ask the job to stop at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block for the next message. `None` once the job has exited.
    pub fn recv(&self) -> Option<EngineMessage> {
        self.messages.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineMessage> {
        match self.messages.recv_timeout(timeout) {
            Ok(msg) => Some(msg),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_recv(&self) -> Option<EngineMessage> {
        match self.messages.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drain messages until the terminal response, discarding progress.
    pub fn wait(self) -> Option<OrderResponse> {
        self.wait_with_progress(|_| {})
    }

    /// Drain messages until the terminal response, handing each progress
    /// notification to `on_progress`.
    ///
    /// `None` means the worker exited without answering.
    pub fn wait_with_progress<F: FnMut(Progress)>(
        mut self,
        mut on_progress: F,
    ) -> Option<OrderResponse> {
        let mut response = None;
        while let Ok(msg) = self.messages.recv() {
            match msg {
                EngineMessage::Progress(p) => on_progress(p),
                EngineMessage::Finished(r) => {
                    response = Some(r);
                    break;
                }
            }
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("order worker panicked");
            }
        }
        response
    }
}

impl Drop for OrderJob {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel.cancel();
        }
    }
}
