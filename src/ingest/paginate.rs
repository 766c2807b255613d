//! Incremental loading with a stall-based stopping rule.

use std::time::Duration;
use tracing::debug;

use crate::ingest::browser::PageSession;
use crate::ingest::extract::ResilientExtractor;

/// Drives scroll / "load more" until enough cards exist or loading stalls.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    pub settle: Duration,
    pub max_stalls: u32,
}

/// Why pagination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Target,
    Stalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationOutcome {
    pub cards: usize,
    pub attempts: u32,
    pub reason: StopReason,
}

impl Paginator {
    pub fn new(settle: Duration, max_stalls: u32) -> Self {
        Self {
            settle,
            max_stalls: max_stalls.max(1),
        }
    }

    /// Reveal cards until `target` are present or `max_stalls` consecutive
    /// attempts add nothing. Each attempt scrolls to the bottom, waits the
    /// settle delay, then clicks the first available load-more control.
    pub async fn run(
        &self,
        session: &mut dyn PageSession,
        extractor: &ResilientExtractor,
        load_more: &[&str],
        target: usize,
    ) -> anyhow::Result<PaginationOutcome> {
        let mut best = 0usize;
        let mut stalls = 0u32;
        let mut attempts = 0u32;

        loop {
            let html = session.content().await?;
            let count = extractor.count_cards(&html);

            if count >= target {
                return Ok(PaginationOutcome {
                    cards: count,
                    attempts,
                    reason: StopReason::Target,
                });
            }

            if count > best {
                best = count;
                stalls = 0;
            } else if attempts > 0 {
                stalls += 1;
                if stalls >= self.max_stalls {
                    debug!(target: "scrape", platform = %extractor.platform(), cards = best, attempts, "pagination stalled");
                    return Ok(PaginationOutcome {
                        cards: best,
                        attempts,
                        reason: StopReason::Stalled,
                    });
                }
            }

            attempts += 1;
            if let Err(e) = session.scroll_to_bottom().await {
                debug!(target: "scrape", error = %e, "scroll failed");
            }
            tokio::time::sleep(self.settle).await;

            for sel in load_more {
                match session.click(sel).await {
                    Ok(true) => {
                        tokio::time::sleep(self.settle).await;
                        break;
                    }
                    Ok(false) => {}
                    Err(e) => debug!(target: "scrape", error = %e, selector = *sel, "load-more click failed"),
                }
            }
        }
    }
}
