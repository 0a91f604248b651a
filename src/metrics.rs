//! Page-level metrics for parse runs.
//!
//! Recording is always on; the values only leave the process when
//! [`init_metrics`] installed the Prometheus exporter.

use std::net::SocketAddr;
use std::time::Instant;

use crate::constants::METRICS_PORT_ENV;

/// Installs the Prometheus exporter when the port variable is set.
pub fn init_metrics() {
    let Some(port) = std::env::var(METRICS_PORT_ENV)
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
    else {
        tracing::debug!("{METRICS_PORT_ENV} not set, metrics exporter disabled");
        return;
    };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => tracing::warn!("Prometheus exporter install failed (possibly already installed): {}", e),
    }
}

/// Counters and timings for the page pipeline
pub struct PageMetrics;

impl PageMetrics {
    pub fn record_parsed() {
        ::metrics::counter!("course_pages_parsed_total").increment(1);
    }

    pub fn record_skipped() {
        ::metrics::counter!("course_pages_skipped_total").increment(1);
    }

    pub fn record_failed(stage: &str) {
        ::metrics::counter!("course_pages_failed_total", "stage" => stage.to_string()).increment(1);
    }
}

/// Records the elapsed time of one page when dropped
pub struct PageTimer {
    start: Instant,
}

impl PageTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Drop for PageTimer {
    fn drop(&mut self) {
        ::metrics::histogram!("course_page_duration_seconds")
            .record(self.start.elapsed().as_secs_f64());
    }
}
