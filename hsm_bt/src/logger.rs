//! Encapsulates how an [`crate::hsm::Hsm`] logs its own internal activity.
use log::LevelFilter;

#[derive(Clone)]
/// Logger for the hsm engine and the BT node library built on top of it.
pub struct HsmLogger {
    pub(crate) log_level_allowed: log::LevelFilter,
}

impl Default for HsmLogger {
    fn default() -> Self {
        Self {
            log_level_allowed: log::LevelFilter::Info,
        }
    }
}

impl HsmLogger {
    /// # Params
    /// level_allowed - the level of logs that will actually be emitted
    pub fn new(level_allowed: log::LevelFilter) -> Self {
        Self {
            log_level_allowed: level_allowed,
        }
    }

    fn log_msg(&self, log_requested: &log::LevelFilter, function_logging: String, msg: &str) {
        if log_requested <= &self.log_level_allowed {
            log::log!(
                log_level_to_log_level(*log_requested),
                "[{function_logging}] {msg}"
            );
        }
    }

    pub(crate) fn log_info(&self, function_logging: String, msg: &str) {
        self.log_msg(&log::LevelFilter::Info, function_logging, msg)
    }

    pub(crate) fn log_error(&self, function_logging: String, msg: &str) {
        self.log_msg(&log::LevelFilter::Error, function_logging, msg)
    }

    pub(crate) fn log_debug(&self, function_logging: String, msg: &str) {
        self.log_msg(&log::LevelFilter::Debug, function_logging, msg)
    }

    pub(crate) fn log_trace(&self, function_logging: String, msg: &str) {
        self.log_msg(&log::LevelFilter::Trace, function_logging, msg)
    }
}

fn log_level_to_log_level(filter: log::LevelFilter) -> log::Level {
    filter.to_level().unwrap_or(log::Level::Trace)
}

impl From<LevelFilter> for HsmLogger {
    fn from(level: LevelFilter) -> Self {
        HsmLogger::new(level)
    }
}
