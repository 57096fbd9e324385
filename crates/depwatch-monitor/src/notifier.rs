use depwatch_core::alert::Alert;
use depwatch_core::gate::Presentation;

/// UI collaborator that shows surfaced alerts to the user.
///
/// Called once per new alert that clears the notification threshold. The
/// call is synchronous and must not block; hosts with a slow UI should hand
/// the alert off to their own queue.
pub trait Notifier: Send + Sync {
    fn notify(&self, alert: &Alert, presentation: Presentation);
}

/// Writes surfaced alerts to the tracing log at a matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, alert: &Alert, presentation: Presentation) {
        match presentation {
            Presentation::Error => tracing::error!(
                resource = %alert.resource_name,
                severity = %alert.severity,
                kind = %alert.kind,
                "{}",
                alert.message
            ),
            Presentation::Warning => tracing::warn!(
                resource = %alert.resource_name,
                severity = %alert.severity,
                kind = %alert.kind,
                "{}",
                alert.message
            ),
            Presentation::Info => tracing::info!(
                resource = %alert.resource_name,
                severity = %alert.severity,
                kind = %alert.kind,
                "{}",
                alert.message
            ),
        }
    }
}
