//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Once;

use fcp_multipart::{MultipartEncoder, MultipartEncoderMonitor, Progress};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize tracing for tests.
///
/// Safe to call from every test; only the first call installs the subscriber.
/// Uses `RUST_LOG` if set, otherwise `info,fcp_multipart=debug`.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,fcp_multipart=debug"));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .compact(),
            )
            .init();
    });
}

/// Drain an encoder with fixed-size reads.
pub fn drain(encoder: &mut MultipartEncoder<'_>, step: usize) -> Vec<u8> {
    let mut body = Vec::new();
    loop {
        let chunk = encoder.read(step).expect("encoder read");
        if chunk.is_empty() {
            return body;
        }
        body.extend_from_slice(&chunk);
    }
}

/// Drain a monitor with fixed-size reads.
pub fn drain_monitor<F: FnMut(&Progress)>(
    monitor: &mut MultipartEncoderMonitor<'_, F>,
    step: usize,
) -> Vec<u8> {
    let mut body = Vec::new();
    loop {
        let chunk = monitor.read(step).expect("monitor read");
        if chunk.is_empty() {
            return body;
        }
        body.extend_from_slice(&chunk);
    }
}

/// Emit a structured JSON line describing a test result.
pub fn log_test_result(test_name: &str, details: &serde_json::Value) {
    let entry = serde_json::json!({
        "test": test_name,
        "result": "success",
        "details": details,
    });
    eprintln!("{entry}");
}
