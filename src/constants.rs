//! Application constants for the ingestion pipeline
//!
//! Reserved NGSI attribute names, header keys, default service path
//! mappings and HTTP defaults used throughout the crate.

// =============================================================================
// NGSI Message Fields
// =============================================================================

/// Header carrying the logical domain of the reporting subsystem
pub const SERVICE_PATH_HEADER: &str = "fiware-servicePath";

pub const LATITUDE_ATTR: &str = "latitude";
pub const LONGITUDE_ATTR: &str = "longitude";
pub const TIMESTAMP_ATTR: &str = "timestamp";

/// Attributes that never appear in a source's property list
pub const NON_PROPERTY_ATTRS: &[&str] = &[
    LATITUDE_ATTR,
    LONGITUDE_ATTR,
    TIMESTAMP_ATTR,
    "dateObserved",
    "location",
];

/// Attributes never stored as measurement values.
///
/// `timestamp` is not listed: it becomes the record time.
pub const SKIPPED_VALUE_ATTRS: &[&str] = &["dateObserved", "location", LATITUDE_ATTR, LONGITUDE_ATTR];

/// Pattern for `body.id`: `<Type>:<Edge>.<Node>.<Sensor>`
pub const MESSAGE_ID_PATTERN: &str = r"(?P<Type>\w+):(?P<Edge>[a-zA-Z0-9_-]+)\.(?P<Node>[a-zA-Z0-9_-]+)\.(?P<Sensor>[a-zA-Z0-9_-]+)";

// =============================================================================
// Default Service Path Table
// =============================================================================

/// Default service path to (category, subcategory) mappings
pub const DEFAULT_SERVICE_PATHS: &[(&str, &str, &str)] = &[
    ("/cagliari/edge/meteo", "WeatherObserver", "Station"),
    ("/cagliari/edge/energy", "EnergyConsumptionMonitor", "Station"),
];

/// Entity types accepted by the ingestion job
pub const ENTITY_TYPES: &[&str] = &[
    "PointWeatherObserver",
    "WeatherObserver",
    "EnergyConsumptionMonitor",
    "DeviceStatusMonitor",
];

// =============================================================================
// Configuration
// =============================================================================

pub const CONFIG_DIR_NAME: &str = "tdm-ingestion";
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const ENV_TDMQ_URL: &str = "TDM_TDMQ_URL";
pub const ENV_CKAN_URL: &str = "TDM_CKAN_URL";
pub const ENV_CKAN_API_KEY: &str = "TDM_CKAN_API_KEY";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "TDM_HTTP_TIMEOUT_SECS";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Maximum concurrent time series requests while polling TDMQ
pub const DEFAULT_POLL_CONCURRENCY: usize = 4;

// =============================================================================
// CKAN Resource Extras
// =============================================================================

pub const CKAN_PERIOD_EXTRA: &str = "tdm_period";
pub const CKAN_AFTER_EXTRA: &str = "tdm_after";

/// Date format used in descriptions and resource extras
pub const DATE_FORMAT: &str = "%Y-%m-%d";
