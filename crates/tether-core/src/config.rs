use std::time::Duration;

use crate::logging::LoggingConfig;

/// Render thread configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub thread_name: String,
    /// Target pass length. `None` runs continuously: the thread sleeps until
    /// work arrives and drains it right away.
    pub frame_interval: Option<Duration>,
    /// Upper bound on units run per pass. `None` drains the whole queue.
    pub max_units_per_frame: Option<usize>,
}

impl RenderConfig {
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_frame_interval(mut self, interval: Option<Duration>) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_max_units_per_frame(mut self, max: Option<usize>) -> Self {
        self.max_units_per_frame = max;
        self
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            thread_name: "tether-render".to_string(),
            frame_interval: Some(Duration::from_micros(16_667)),
            max_units_per_frame: None,
        }
    }
}

/// Top-level configuration consumed by [`Runtime::start`](crate::Runtime::start).
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub render: RenderConfig,
    /// Installs the `env_logger` backend when set.
    pub logging: Option<LoggingConfig>,
}

impl RuntimeConfig {
    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }
}
