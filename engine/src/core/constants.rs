// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "FilterForge";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "filterforge";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".filterforge";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "filterforge.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "FILTERFORGE_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "FILTERFORGE_LOG";

/// Environment variable for the field discovery base URL
pub const ENV_DISCOVERY_URL: &str = "FILTERFORGE_DISCOVERY_URL";

/// Environment variable for the column schema file
pub const ENV_COLUMNS: &str = "FILTERFORGE_COLUMNS";

/// Default log filter when neither environment variable is set
pub const DEFAULT_LOG_FILTER: &str = "info,filterforge=info";

// =============================================================================
// Filter Limits
// =============================================================================

/// Maximum nesting depth of filter groups
pub const DEFAULT_MAX_GROUP_DEPTH: usize = 32;

/// Maximum size of a filter descriptor document in bytes (64 KiB)
pub const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Maximum number of rules in a filter descriptor
pub const MAX_FILTER_RULES: usize = 200;

// =============================================================================
// Field Discovery
// =============================================================================

/// Default field discovery endpoint
pub const DEFAULT_DISCOVERY_URL: &str = "http://127.0.0.1:8080/api";

/// Field discovery request timeout in seconds
pub const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 10;

/// Maximum pages followed per field listing
pub const DEFAULT_DISCOVERY_MAX_PAGES: usize = 20;

/// Maximum cached field listings per module
pub const DEFAULT_DISCOVERY_CACHE_CAPACITY: u64 = 1_000;

/// Attempts per discovery request, including the first
pub const DEFAULT_DISCOVERY_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between discovery retries in milliseconds
pub const DISCOVERY_RETRY_BASE_DELAY_MS: u64 = 200;

// =============================================================================
// Option Search
// =============================================================================

/// Debounce window for remote option search in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Maximum options returned per search
pub const OPTION_SEARCH_LIMIT: usize = 50;

// =============================================================================
// Saved Searches
// =============================================================================

/// Saved searches file name inside the dot folder
pub const SAVED_SEARCHES_FILE_NAME: &str = "saved_searches.json";

/// Maximum length of a saved search name
pub const MAX_SAVED_SEARCH_NAME_LEN: usize = 120;
