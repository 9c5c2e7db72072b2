use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::generation::GenerationClient;
use crate::llm::{GenerationError, Transport};
use crate::models::{EffectiveConfig, GenerationRequest, GenerationResult};
use crate::utils::timing::{complete_command_timer, start_command_timer};

pub const SUBMIT_FALLBACK_ERROR: &str = "生成失败，请稍后重试";
pub const REGENERATE_FALLBACK_ERROR: &str = "重新生成失败，请稍后重试";

/// What the front-end shows: the current characters, the last complete
/// result and the last error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionView {
    pub characters: Option<GenerationRequest>,
    pub result: Option<GenerationResult>,
    pub error: Option<String>,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket(u64);

impl GenerationTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Failed,
    /// A newer submit or regenerate started before this one finished.
    Stale,
}

/// Tracks the latest generation and drops results from superseded ones.
#[derive(Clone, Default)]
pub struct GenerationSession {
    latest_ticket: Arc<AtomicU64>,
    view: Arc<Mutex<SessionView>>,
}

impl GenerationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SessionView {
        self.view.lock().clone()
    }

    pub fn begin_submit(&self, request: GenerationRequest) -> GenerationTicket {
        let mut view = self.view.lock();
        let ticket = self.next_ticket();
        view.characters = Some(request);
        view.error = None;
        view.loading = true;
        ticket
    }

    /// Returns `None` when nothing has been submitted yet.
    pub fn begin_regenerate(&self) -> Option<(GenerationTicket, GenerationRequest)> {
        let mut view = self.view.lock();
        let request = view.characters.clone()?;
        let ticket = self.next_ticket();
        view.error = None;
        view.loading = true;
        Some((ticket, request))
    }

    pub fn complete(
        &self,
        ticket: GenerationTicket,
        outcome: Result<GenerationResult, GenerationError>,
        fallback_error: &str,
    ) -> Outcome {
        let mut view = self.view.lock();
        if ticket.0 != self.latest_ticket.load(Ordering::SeqCst) {
            info!("Discarding stale generation ticket={}", ticket.0);
            return Outcome::Stale;
        }

        view.loading = false;
        match outcome {
            Ok(result) => {
                view.result = Some(result);
                view.error = None;
                Outcome::Applied
            }
            Err(err) => {
                let message = err.to_string();
                warn!("Generation ticket={} failed: {}", ticket.0, message);
                view.error = Some(if message.trim().is_empty() {
                    fallback_error.to_string()
                } else {
                    message
                });
                Outcome::Failed
            }
        }
    }

    pub async fn submit<T: Transport>(
        &self,
        client: &GenerationClient<T>,
        config: &EffectiveConfig,
        request: GenerationRequest,
    ) -> Outcome {
        let ticket = self.begin_submit(request.clone());
        let mut timer = start_command_timer("submit", Some(ticket.id()));
        let result = client.generate(config, &request).await;
        let outcome = self.complete(ticket, result, SUBMIT_FALLBACK_ERROR);
        complete_command_timer(&mut timer, outcome.as_str(), self.snapshot().error);
        outcome
    }

    pub async fn regenerate<T: Transport>(
        &self,
        client: &GenerationClient<T>,
        config: &EffectiveConfig,
    ) -> Option<Outcome> {
        let (ticket, request) = self.begin_regenerate()?;
        let mut timer = start_command_timer("regenerate", Some(ticket.id()));
        let result = client.generate(config, &request).await;
        let outcome = self.complete(ticket, result, REGENERATE_FALLBACK_ERROR);
        complete_command_timer(&mut timer, outcome.as_str(), self.snapshot().error);
        Some(outcome)
    }

    fn next_ticket(&self) -> GenerationTicket {
        GenerationTicket(self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Applied => "success",
            Outcome::Failed => "error",
            Outcome::Stale => "stale",
        }
    }
}
