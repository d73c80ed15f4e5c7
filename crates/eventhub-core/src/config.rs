use std::time::Duration;

/// Tunables for an [`crate::hub::EventHub`] instance, built the way the
/// teacher builds its engine: a plain struct with chained setters and a
/// `Default` matching production values.
#[derive(Debug, Clone)]
pub struct HubConfig {
    response_listener_timeout: Duration,
    hub_version: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            response_listener_timeout: Duration::from_secs(5),
            hub_version: "1.0.0".to_string(),
        }
    }
}

impl HubConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long [`crate::hub::EventHub::register_response_listener`] waits
    /// for a matching response before invoking the callback with `None`.
    pub fn response_listener_timeout(mut self, timeout: Duration) -> Self {
        self.response_listener_timeout = timeout;
        self
    }

    /// The version string published in the hub's own shared state
    /// (`com.adobe.module.eventhub`).
    pub fn hub_version(mut self, version: impl Into<String>) -> Self {
        self.hub_version = version.into();
        self
    }

    pub fn get_response_listener_timeout(&self) -> Duration {
        self.response_listener_timeout
    }

    pub fn get_hub_version(&self) -> &str {
        &self.hub_version
    }
}
