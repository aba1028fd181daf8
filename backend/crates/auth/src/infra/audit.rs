//! Audit sinks

use crate::domain::directory::{AuditEvent, AuditSink};

/// Audit sink that emits structured tracing events
///
/// The audit trail is the process log stream; log shipping is the
/// deployment's concern.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent<'_>) {
        if event.success {
            tracing::info!(
                target: "audit",
                identity = %event.identity,
                client_addr = %event.client.addr_string(),
                user_agent = event.client.user_agent.as_deref().unwrap_or("unknown"),
                detail = event.detail,
                "Authentication succeeded"
            );
        } else {
            tracing::warn!(
                target: "audit",
                identity = %event.identity,
                client_addr = %event.client.addr_string(),
                user_agent = event.client.user_agent.as_deref().unwrap_or("unknown"),
                detail = event.detail,
                "Authentication failed"
            );
        }
    }
}
