//! Queue host: wires a configured request queue to its URL group

use anyhow::{Context, Result};
use hsq_core::port::{HttpDriver, InMemoryHttpDriver};
use hsq_core::{RequestQueue, RequestQueueOptions, UrlGroup};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{DaemonConfig, DriverKind};

/// Build the driver named by the configuration
pub fn select_driver(kind: DriverKind) -> Result<Arc<dyn HttpDriver>> {
    match kind {
        DriverKind::HttpSys => {
            hsq_infra_system::http_sys_driver().context("HTTP.sys driver unavailable")
        }
        DriverKind::Emulated => {
            warn!("Using the emulated HTTP driver, no traffic will be served");
            Ok(Arc::new(InMemoryHttpDriver::new()))
        }
    }
}

/// A running request queue and the URL group feeding it
///
/// Field order matters: the queue is released before its group.
pub struct QueueHost {
    queue: RequestQueue,
    url_group: UrlGroup,
}

impl QueueHost {
    /// Create the URL group and queue, then start listening if this process owns the queue
    ///
    /// On error everything opened so far is released.
    pub fn start(driver: Arc<dyn HttpDriver>, config: &DaemonConfig) -> Result<Self> {
        let prefixes = config.parsed_prefixes()?;
        let options = RequestQueueOptions {
            skip_completion_on_success: config.skip_completion_on_success,
        };

        let url_group = UrlGroup::create(Arc::clone(&driver)).context("URL group creation failed")?;
        let queue = RequestQueue::new(
            driver,
            url_group.id(),
            config.queue_name(),
            config.mode,
            &options,
        )
        .context("Request queue creation failed")?;

        if !queue.created() {
            info!(
                request_queue_name = ?queue.name(),
                "Queue owned by another process, URL prefixes and limits not applied"
            );
            return Ok(Self { queue, url_group });
        }

        for prefix in prefixes {
            url_group
                .register_prefix(prefix)
                .context("URL prefix registration failed")?;
        }
        queue
            .attach_to_url_group()
            .context("Binding queue to URL group failed")?;

        if let Some(max_length) = config.max_queue_length {
            queue
                .set_length_limit(max_length)
                .context("Setting queue length limit failed")?;
        }
        if let Some(level) = config.rejection_verbosity {
            queue
                .set_rejection_verbosity(level)
                .context("Setting 503 verbosity failed")?;
        }

        info!(
            request_queue_name = ?queue.name(),
            url_group = %url_group.id(),
            prefixes = url_group.prefixes().len(),
            "Request queue listening"
        );
        Ok(Self { queue, url_group })
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub fn url_group(&self) -> &UrlGroup {
        &self.url_group
    }

    /// Stop routing, then release the queue and the group
    pub fn shutdown(self) {
        if self.queue.created() {
            if let Err(e) = self.queue.detach_from_url_group() {
                warn!(error = %e, "Detach during shutdown failed");
            }
        }
        self.queue.dispose();
        self.url_group.dispose();
        info!("Request queue host stopped");
    }
}
