use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Port assigned to the DICT protocol.
pub const DEFAULT_PORT: u16 = 2628;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default maximum Levenshtein distance for new sessions.
pub const DEFAULT_LEV_DISTANCE: usize = 1;

/// Content type announced for definitions when neither the module nor the
/// database configuration names one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Transfer encoding announced for definitions by default.
pub const DEFAULT_TRANSFER_ENCODING: &str = "8bit";

/// Default log filter expression used by the daemon.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub(crate) fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default listening endpoint: the DICT port on the loopback interface.
#[must_use]
pub fn default_listen() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_PORT)
}

pub(crate) const fn default_lev_distance() -> usize {
    DEFAULT_LEV_DISTANCE
}

pub(crate) fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_owned()
}

pub(crate) fn default_transfer_encoding() -> String {
    DEFAULT_TRANSFER_ENCODING.to_owned()
}
