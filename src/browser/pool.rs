//! A single lazily-launched Chrome instance shared across concurrent
//! `browse_page` calls, with per-host pacing and bounded page concurrency.
//!
//! Grounded in the teacher corpus's browser-lifecycle wrapper: one
//! `chromiumoxide::Browser` plus its event-loop handler task, the handler
//! aborted on drop so Chrome doesn't outlive the pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chromiumoxide::browser::{Browser, BrowserConfig};
use dashmap::DashMap;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};

struct Launched {
    browser: Browser,
    handler: JoinHandle<()>,
}

/// Shared pooled access to one headless Chrome instance.
pub struct BrowserPool {
    launched: Mutex<Option<Launched>>,
    page_slots: Arc<Semaphore>,
    host_last_access: DashMap<String, Instant>,
    pacing: Duration,
    shutting_down: AtomicBool,
}

/// A checked-out page, returned to the pool's concurrency budget on drop.
pub struct PageGuard {
    page: chromiumoxide::Page,
    _permit: tokio::sync::OwnedSemaphorePermit,
}

impl PageGuard {
    pub fn page(&self) -> &chromiumoxide::Page {
        &self.page
    }
}

impl BrowserPool {
    pub fn new(max_concurrent_pages: usize, per_host_pacing: Duration) -> Arc<Self> {
        Arc::new(Self {
            launched: Mutex::new(None),
            page_slots: Arc::new(Semaphore::new(max_concurrent_pages)),
            host_last_access: DashMap::new(),
            pacing: per_host_pacing,
            shutting_down: AtomicBool::new(false),
        })
    }

    async fn ensure_launched<'a>(&'a self, guard: &mut tokio::sync::MutexGuard<'a, Option<Launched>>) -> Result<()> {
        if guard.is_some() {
            return Ok(());
        }
        let config = BrowserConfig::builder()
            .build()
            .map_err(|e| Error::internal(format!("invalid browser config: {e}")))?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::page_load(format!("failed to launch browser: {e}")))?;

        let join = tokio::spawn(async move {
            use futures::StreamExt;
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    log::warn!("browser event loop error: {event:?}");
                }
            }
        });

        **guard = Some(Launched { browser, handler: join });
        Ok(())
    }

    /// Wait out any remaining per-host pacing window for `host`, then record
    /// this access.
    pub async fn pace(self: &Arc<Self>, host: &str) {
        let wait = {
            match self.host_last_access.get(host) {
                Some(last) => self.pacing.saturating_sub(last.elapsed()),
                None => Duration::ZERO,
            }
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        self.host_last_access.insert(host.to_string(), Instant::now());
    }

    /// Check out a blank page, bounded by `max_concurrent_pages`.
    pub async fn checkout_page(self: &Arc<Self>) -> Result<PageGuard> {
        let permit = Arc::clone(&self.page_slots)
            .acquire_owned()
            .await
            .map_err(|e| Error::internal(format!("page semaphore closed: {e}")))?;

        let mut guard = self.launched.lock().await;
        self.ensure_launched(&mut guard).await?;
        let launched = guard.as_ref().expect("just ensured launched");

        let page = launched
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::page_load(format!("failed to open page: {e}")))?;

        Ok(PageGuard { page, _permit: permit })
    }

    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        if let Some(launched) = self.launched.lock().await.take() {
            launched.handler.abort();
        }
    }
}
