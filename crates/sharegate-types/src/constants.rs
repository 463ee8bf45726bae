//! System-wide constants for the ShareGate compliance layer.

/// Maximum number of owners an arbitration wallet may have.
pub const MAX_ARBITRATION_OWNERS: usize = 50;

/// Category label that designates a Regulation-D whitelist.
pub const REG_D_LABEL: &str = "RegD";

/// Category label that designates a qualified-institutional-buyer whitelist.
pub const QIB_LABEL: &str = "QIB";

/// Category label given to newly created general whitelists.
pub const DEFAULT_WHITELIST_LABEL: &str = "RegS";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "ShareGate";
