//! Optional bridge to an embedding host (mini-app runtime, desktop shell).
//!
//! Every call is best-effort: implementations must never fail and the default
//! methods do nothing, so a missing host never changes chat control flow.

/// Strength of an impact haptic pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HapticImpact {
    Light,
}

/// Outcome signalled by a notification haptic pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HapticNotification {
    Success,
}

/// Colors requested from the host at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostTheme {
    pub header_color: &'static str,
    pub background_color: &'static str,
}

impl HostTheme {
    pub const KINOCHI: Self = Self {
        header_color: "#0c0c0c",
        background_color: "#0a0a0a",
    };
}

impl Default for HostTheme {
    fn default() -> Self {
        Self::KINOCHI
    }
}

pub trait HostBridge: Send + Sync {
    /// Signals that the interface finished loading.
    fn ready(&self) {}
    /// Requests the largest viewport the host allows.
    fn expand(&self) {}
    fn set_header_color(&self, _color: &str) {}
    fn set_background_color(&self, _color: &str) {}
    fn impact_occurred(&self, _impact: HapticImpact) {}
    fn notification_occurred(&self, _notification: HapticNotification) {}
}

/// Host used when no embedding runtime is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl HostBridge for NoopHost {}

/// Host that records requests in the trace log instead of forwarding them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHost;

impl HostBridge for TracingHost {
    fn ready(&self) {
        tracing::debug!("host ready");
    }

    fn expand(&self) {
        tracing::debug!("host expand requested");
    }

    fn set_header_color(&self, color: &str) {
        tracing::debug!(color, "host header color");
    }

    fn set_background_color(&self, color: &str) {
        tracing::debug!(color, "host background color");
    }

    fn impact_occurred(&self, impact: HapticImpact) {
        tracing::trace!(?impact, "haptic impact");
    }

    fn notification_occurred(&self, notification: HapticNotification) {
        tracing::trace!(?notification, "haptic notification");
    }
}

/// Startup handshake: ready, expand, then apply the theme colors.
pub fn initialize_host(host: &dyn HostBridge, theme: &HostTheme) {
    host.ready();
    host.expand();
    host.set_header_color(theme.header_color);
    host.set_background_color(theme.background_color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingHost;

    #[test]
    fn startup_handshake_order() {
        let host = RecordingHost::default();
        initialize_host(&host, &HostTheme::KINOCHI);

        assert_eq!(
            *host.calls.lock().unwrap(),
            vec![
                "ready".to_string(),
                "expand".to_string(),
                "header:#0c0c0c".to_string(),
                "background:#0a0a0a".to_string(),
            ]
        );
        assert!(host.impacts.lock().unwrap().is_empty());
    }

    #[test]
    fn noop_host_accepts_every_call() {
        let host = NoopHost;
        initialize_host(&host, &HostTheme::default());
        host.impact_occurred(HapticImpact::Light);
        host.notification_occurred(HapticNotification::Success);
    }
}
