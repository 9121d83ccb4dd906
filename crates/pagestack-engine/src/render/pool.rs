use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::render::{Bitmap, RenderError, RenderOutcome, RenderRequest, Renderer};

pub const DEFAULT_WORKERS: usize = 2;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed pool of render workers pulling thumbnail requests from one queue.
///
/// Each request runs on a blocking thread under a timeout; a request that
/// overruns is reported as [`RenderError::TimedOut`] and the worker moves on.
/// Must be created inside a tokio runtime.
pub struct RenderPool {
    renderer: Arc<dyn Renderer>,
    timeout: Duration,
    jobs: mpsc::UnboundedSender<RenderRequest>,
    outcome_tx: mpsc::UnboundedSender<RenderOutcome>,
    outcomes: mpsc::UnboundedReceiver<RenderOutcome>,
    workers: Vec<JoinHandle<()>>,
}

impl RenderPool {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self::with_config(renderer, DEFAULT_WORKERS, DEFAULT_TIMEOUT)
    }

    pub fn with_config(renderer: Arc<dyn Renderer>, workers: usize, timeout: Duration) -> Self {
        let (jobs, queue) = mpsc::unbounded_channel::<RenderRequest>();
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        let queue = Arc::new(Mutex::new(queue));

        let workers = (0..workers.max(1))
            .map(|worker| {
                let queue = Arc::clone(&queue);
                let renderer = Arc::clone(&renderer);
                let outcome_tx = outcome_tx.clone();
                tokio::spawn(async move {
                    loop {
                        let next = queue.lock().await.recv().await;
                        let Some(request) = next else {
                            break;
                        };
                        let result = render_with_timeout(&renderer, request.clone(), timeout).await;
                        if outcome_tx.send(RenderOutcome { request, result }).is_err() {
                            break;
                        }
                    }
                    debug!("Render worker {worker} stopped");
                })
            })
            .collect();

        Self {
            renderer,
            timeout,
            jobs,
            outcome_tx,
            outcomes,
            workers,
        }
    }

    /// Queue a request for the next free worker
    pub fn submit(&self, request: RenderRequest) -> Result<(), RenderError> {
        self.jobs
            .send(request)
            .map_err(|_| RenderError::WorkerGone)
    }

    /// Render outside the queue, abandoning the result as soon as `cancel`
    /// fires. Cancelled renders report nothing.
    pub fn render_viewer(&self, request: RenderRequest, cancel: CancellationToken) -> JoinHandle<()> {
        let renderer = Arc::clone(&self.renderer);
        let outcome_tx = self.outcome_tx.clone();
        let timeout = self.timeout;
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                result = render_with_timeout(&renderer, request.clone(), timeout) => result,
            };
            if cancel.is_cancelled() {
                return;
            }
            let _ = outcome_tx.send(RenderOutcome { request, result });
        })
    }

    pub fn try_next_outcome(&mut self) -> Option<RenderOutcome> {
        self.outcomes.try_recv().ok()
    }

    pub async fn next_outcome(&mut self) -> Option<RenderOutcome> {
        self.outcomes.recv().await
    }
}

impl Drop for RenderPool {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}

async fn render_with_timeout(
    renderer: &Arc<dyn Renderer>,
    request: RenderRequest,
    timeout: Duration,
) -> Result<Bitmap, RenderError> {
    let renderer = Arc::clone(renderer);
    let page = request.page_id;
    let task = tokio::task::spawn_blocking(move || renderer.render(&request));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(RenderError::Failed(e.to_string())),
        Err(_) => {
            warn!("Render of {page} timed out after {timeout:?}");
            Err(RenderError::TimedOut(timeout))
        }
    }
}

/// The viewer's single in-flight full-resolution render.
///
/// Starting a render cancels the previous one and bumps the generation, so a
/// late result can be recognised as stale even if it slipped past the
/// cancellation.
#[derive(Debug, Default)]
pub struct ViewerRenderSlot {
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl ViewerRenderSlot {
    pub fn begin(&mut self) -> (u64, CancellationToken) {
        self.cancel();
        self.generation += 1;
        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        (self.generation, token)
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.cancel.is_some() && generation == self.generation
    }

    /// Mark the current render as delivered
    pub fn finish(&mut self, generation: u64) {
        if self.is_current(generation) {
            self.cancel = None;
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
