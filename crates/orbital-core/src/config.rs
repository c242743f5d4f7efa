//! Configuration loading and typed config structures for Orbital.
//!
//! The canonical configuration lives in `orbital-config.yaml` next to the
//! binaries. Every field has a serde default matching the tuned production
//! values, so an empty or missing file yields a working configuration.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `orbital-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OrbitalConfig {
    /// Engine-wide settings (seed, globe radius, frame cadence).
    #[serde(default)]
    pub engine: EngineConfig,

    /// Admission controller limits and drop curve.
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Burst and persistent-dot animation parameters.
    #[serde(default)]
    pub entities: EntityConfig,

    /// Indicator cycle timing and motion.
    #[serde(default)]
    pub indicator: IndicatorConfig,

    /// Rate window, feed, and display cadence.
    #[serde(default)]
    pub reporter: ReporterConfig,

    /// Inbound stream endpoint, skew tolerance, and reconnect timing.
    #[serde(default)]
    pub stream: StreamConfig,

    /// UDP-to-SSE relay settings.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Observer API bind address.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl OrbitalConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `ORBITAL_STREAM_URL` overrides `stream.url`
    /// - `ORBITAL_OBSERVER_PORT` overrides `observer.port`
    /// - `ORBITAL_SEED` overrides `engine.seed`
    /// - `ORBITAL_SYNTHETIC` overrides `relay.synthetic`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Unparseable numeric or boolean values are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("ORBITAL_STREAM_URL") {
            self.stream.url = url;
        }
        if let Some(raw) = lookup("ORBITAL_OBSERVER_PORT") {
            match raw.parse() {
                Ok(port) => self.observer.port = port,
                Err(e) => tracing::warn!(value = %raw, error = %e, "ignoring ORBITAL_OBSERVER_PORT"),
            }
        }
        if let Some(raw) = lookup("ORBITAL_SEED") {
            match raw.parse() {
                Ok(seed) => self.engine.seed = Some(seed),
                Err(e) => tracing::warn!(value = %raw, error = %e, "ignoring ORBITAL_SEED"),
            }
        }
        if let Some(raw) = lookup("ORBITAL_SYNTHETIC") {
            self.relay.synthetic = matches!(raw.trim(), "1" | "true" | "yes");
        }
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };

        if self.admission.soft_limit >= self.admission.hard_limit {
            return invalid("admission.soft_limit must be below admission.hard_limit");
        }
        if !(self.admission.drop_exponent.is_finite() && self.admission.drop_exponent > 0.0) {
            return invalid("admission.drop_exponent must be a positive number");
        }
        if !(0.0..=1.0).contains(&self.admission.max_drop_probability) {
            return invalid("admission.max_drop_probability must be within [0, 1]");
        }
        if self.entities.dot_duration_ms == 0 || self.entities.burst_duration_ms == 0 {
            return invalid("entity durations must be at least 1 ms");
        }
        if self.indicator.fade_ms == 0 || self.indicator.bob_period_ms == 0 {
            return invalid("indicator.fade_ms and indicator.bob_period_ms must be at least 1 ms");
        }
        if self.reporter.rate_window_ms == 0 {
            return invalid("reporter.rate_window_ms must be at least 1 ms");
        }
        if self.reporter.feed_capacity == 0 {
            return invalid("reporter.feed_capacity must be at least 1");
        }
        if self.engine.frame_interval_ms == 0 {
            return invalid("engine.frame_interval_ms must be at least 1 ms");
        }
        if self.engine.inbound_capacity == 0 {
            return invalid("engine.inbound_capacity must be at least 1");
        }
        if !(self.engine.globe_radius.is_finite() && self.engine.globe_radius > 0.0) {
            return invalid("engine.globe_radius must be a positive number");
        }
        if !(0.0..=1.0).contains(&self.relay.sample_rate) {
            return invalid("relay.sample_rate must be within [0, 1]");
        }
        Ok(())
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Seed for the admission sampler. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Radius of the globe entities are projected onto.
    #[serde(default = "default_globe_radius")]
    pub globe_radius: f64,

    /// Target milliseconds between frames.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Capacity of the inbound message channel feeding the frame driver.
    #[serde(default = "default_inbound_capacity")]
    pub inbound_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            globe_radius: default_globe_radius(),
            frame_interval_ms: default_frame_interval_ms(),
            inbound_capacity: default_inbound_capacity(),
        }
    }
}

/// Admission controller configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdmissionConfig {
    /// Live-dot count below which every event is admitted.
    #[serde(default = "default_soft_limit")]
    pub soft_limit: u32,

    /// Live-dot count at or above which every event is rejected.
    #[serde(default = "default_hard_limit")]
    pub hard_limit: u32,

    /// Exponent applied to the normalized load.
    #[serde(default = "default_drop_exponent")]
    pub drop_exponent: f64,

    /// Drop probability ceiling below the hard limit.
    #[serde(default = "default_max_drop_probability")]
    pub max_drop_probability: f64,

    /// Emit one throttle warning every this many drops.
    #[serde(default = "default_drop_log_every")]
    pub log_every: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            soft_limit: default_soft_limit(),
            hard_limit: default_hard_limit(),
            drop_exponent: default_drop_exponent(),
            max_drop_probability: default_max_drop_probability(),
            log_every: default_drop_log_every(),
        }
    }
}

/// Animation parameters for bursts and persistent dots.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntityConfig {
    /// Lifetime of a persistent dot.
    #[serde(default = "default_dot_duration_ms")]
    pub dot_duration_ms: u64,

    /// Opacity of a persistent dot at progress 0.
    #[serde(default = "default_dot_peak_opacity")]
    pub dot_peak_opacity: f64,

    /// Exponent of the persistent-dot fade curve.
    #[serde(default = "default_dot_fade_exponent")]
    pub dot_fade_exponent: f64,

    /// Bursts spawned per admitted event.
    #[serde(default = "default_burst_count")]
    pub burst_count: u32,

    /// Lifetime of one burst.
    #[serde(default = "default_burst_duration_ms")]
    pub burst_duration_ms: u64,

    /// Start offset between consecutive bursts.
    #[serde(default = "default_burst_stagger_ms")]
    pub burst_stagger_ms: u64,

    /// Terminal scale of the first burst.
    #[serde(default = "default_burst_base_scale")]
    pub burst_base_scale: f64,

    /// Terminal scale added per subsequent burst.
    #[serde(default = "default_burst_scale_step")]
    pub burst_scale_step: f64,

    /// Exponent of the burst ease-out curve.
    #[serde(default = "default_burst_ease_exponent")]
    pub burst_ease_exponent: f64,

    /// Opacity of a burst at progress 0.
    #[serde(default = "default_burst_peak_opacity")]
    pub burst_peak_opacity: f64,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            dot_duration_ms: default_dot_duration_ms(),
            dot_peak_opacity: default_dot_peak_opacity(),
            dot_fade_exponent: default_dot_fade_exponent(),
            burst_count: default_burst_count(),
            burst_duration_ms: default_burst_duration_ms(),
            burst_stagger_ms: default_burst_stagger_ms(),
            burst_base_scale: default_burst_base_scale(),
            burst_scale_step: default_burst_scale_step(),
            burst_ease_exponent: default_burst_ease_exponent(),
            burst_peak_opacity: default_burst_peak_opacity(),
        }
    }
}

/// Indicator cycle configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndicatorConfig {
    /// Duration of both the fade-in and fade-out phases.
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,

    /// Duration of the fully visible phase.
    #[serde(default = "default_hover_ms")]
    pub hover_ms: u64,

    /// Delay from the end of one cycle to the next appearance.
    #[serde(default = "default_cycle_ms")]
    pub cycle_ms: u64,

    /// Fraction of the globe radius the indicator hovers above the surface.
    #[serde(default = "default_hover_lift")]
    pub hover_lift: f64,

    /// Amplitude of the cosmetic bobbing motion, in globe units.
    #[serde(default = "default_bob_amplitude")]
    pub bob_amplitude: f64,

    /// Period of the bobbing motion.
    #[serde(default = "default_bob_period_ms")]
    pub bob_period_ms: u64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            fade_ms: default_fade_ms(),
            hover_ms: default_hover_ms(),
            cycle_ms: default_cycle_ms(),
            hover_lift: default_hover_lift(),
            bob_amplitude: default_bob_amplitude(),
            bob_period_ms: default_bob_period_ms(),
        }
    }
}

/// Rate window, feed, and display cadence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReporterConfig {
    /// Trailing window the event rate is computed over.
    #[serde(default = "default_rate_window_ms")]
    pub rate_window_ms: u64,

    /// Minimum spacing between feed entries.
    #[serde(default = "default_feed_interval_ms")]
    pub feed_interval_ms: u64,

    /// Maximum number of feed entries retained.
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,

    /// Minimum spacing between published stats snapshots.
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            rate_window_ms: default_rate_window_ms(),
            feed_interval_ms: default_feed_interval_ms(),
            feed_capacity: default_feed_capacity(),
            stats_interval_ms: default_stats_interval_ms(),
        }
    }
}

/// Inbound stream configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamConfig {
    /// Server-Sent-Events endpoint delivering event tuples.
    #[serde(default = "default_stream_url")]
    pub url: String,

    /// Maximum tolerated `|now - timestamp|` before an event is stale.
    #[serde(default = "default_stale_threshold_ms")]
    pub stale_threshold_ms: u64,

    /// Delay before a manual reconnect after a terminal failure.
    #[serde(default = "default_reconnect_backoff_ms")]
    pub reconnect_backoff_ms: u64,

    /// Transport retry delay when the stream sends no `retry:` hint.
    #[serde(default = "default_retry_ms")]
    pub default_retry_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: default_stream_url(),
            stale_threshold_ms: default_stale_threshold_ms(),
            reconnect_backoff_ms: default_reconnect_backoff_ms(),
            default_retry_ms: default_retry_ms(),
        }
    }
}

/// UDP-to-SSE relay configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RelayConfig {
    /// Address both the HTTP and UDP listeners bind to.
    #[serde(default = "default_relay_host")]
    pub host: String,

    /// Port serving `GET /stream` and `GET /healthz`.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Port receiving JSON event tuples.
    #[serde(default = "default_udp_port")]
    pub udp_port: u16,

    /// Fraction of received datagrams forwarded to stream clients.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,

    /// Emit generated events instead of serving.
    #[serde(default)]
    pub synthetic: bool,

    /// Pause between generated events, in microseconds.
    #[serde(default = "default_synthetic_interval_us")]
    pub synthetic_interval_us: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_relay_host(),
            http_port: default_http_port(),
            udp_port: default_udp_port(),
            sample_rate: default_sample_rate(),
            synthetic: false,
            synthetic_interval_us: default_synthetic_interval_us(),
        }
    }
}

/// Observer API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Address the observer binds to.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Port the observer listens on.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_globe_radius() -> f64 {
    100.0
}

const fn default_frame_interval_ms() -> u64 {
    16
}

const fn default_inbound_capacity() -> usize {
    1024
}

const fn default_soft_limit() -> u32 {
    100
}

const fn default_hard_limit() -> u32 {
    400
}

const fn default_drop_exponent() -> f64 {
    1.5
}

const fn default_max_drop_probability() -> f64 {
    0.95
}

const fn default_drop_log_every() -> u64 {
    100
}

const fn default_dot_duration_ms() -> u64 {
    14_000
}

const fn default_dot_peak_opacity() -> f64 {
    0.9
}

const fn default_dot_fade_exponent() -> f64 {
    1.8
}

const fn default_burst_count() -> u32 {
    3
}

const fn default_burst_duration_ms() -> u64 {
    2200
}

const fn default_burst_stagger_ms() -> u64 {
    300
}

const fn default_burst_base_scale() -> f64 {
    11.0
}

const fn default_burst_scale_step() -> f64 {
    2.5
}

const fn default_burst_ease_exponent() -> f64 {
    2.5
}

const fn default_burst_peak_opacity() -> f64 {
    0.8
}

const fn default_fade_ms() -> u64 {
    1200
}

const fn default_hover_ms() -> u64 {
    4000
}

const fn default_cycle_ms() -> u64 {
    10_000
}

const fn default_hover_lift() -> f64 {
    0.08
}

const fn default_bob_amplitude() -> f64 {
    1.5
}

const fn default_bob_period_ms() -> u64 {
    2000
}

const fn default_rate_window_ms() -> u64 {
    5000
}

const fn default_feed_interval_ms() -> u64 {
    320
}

const fn default_feed_capacity() -> usize {
    14
}

const fn default_stats_interval_ms() -> u64 {
    500
}

fn default_stream_url() -> String {
    "http://127.0.0.1:7000/stream".to_owned()
}

const fn default_stale_threshold_ms() -> u64 {
    5000
}

const fn default_reconnect_backoff_ms() -> u64 {
    3000
}

const fn default_retry_ms() -> u64 {
    1000
}

fn default_relay_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_http_port() -> u16 {
    7000
}

const fn default_udp_port() -> u16 {
    5556
}

const fn default_sample_rate() -> f64 {
    0.05
}

const fn default_synthetic_interval_us() -> u64 {
    500
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = OrbitalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.admission.soft_limit, 100);
        assert_eq!(config.admission.hard_limit, 400);
        assert_eq!(config.entities.burst_count, 3);
        assert_eq!(config.entities.dot_duration_ms, 14_000);
        assert_eq!(config.indicator.cycle_ms, 10_000);
        assert_eq!(config.reporter.feed_capacity, 14);
        assert_eq!(config.stream.stale_threshold_ms, 5000);
        assert_eq!(config.stream.reconnect_backoff_ms, 3000);
        assert_eq!(config.relay.udp_port, 5556);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
engine:
  seed: 7
  globe_radius: 50.0
  frame_interval_ms: 33
  inbound_capacity: 64

admission:
  soft_limit: 10
  hard_limit: 40
  drop_exponent: 2.0
  max_drop_probability: 0.5
  log_every: 10

entities:
  dot_duration_ms: 1000
  burst_count: 2
  burst_duration_ms: 500
  burst_stagger_ms: 100

indicator:
  fade_ms: 100
  hover_ms: 200
  cycle_ms: 1000

reporter:
  rate_window_ms: 2000
  feed_interval_ms: 0
  feed_capacity: 5
  stats_interval_ms: 100

stream:
  url: "http://relay:7000/stream"
  stale_threshold_ms: 2500

relay:
  host: "0.0.0.0"
  http_port: 7100
  udp_port: 6000
  sample_rate: 1.0
  synthetic: true

observer:
  host: "127.0.0.1"
  port: 9090

logging:
  level: "debug"
  json: true
"#;

        let config = OrbitalConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        let config = config.unwrap_or_default();

        assert_eq!(config.engine.seed, Some(7));
        assert_eq!(config.engine.frame_interval_ms, 33);
        assert_eq!(config.admission.hard_limit, 40);
        assert_eq!(config.entities.burst_count, 2);
        assert_eq!(config.indicator.hover_ms, 200);
        assert_eq!(config.reporter.feed_capacity, 5);
        assert_eq!(config.stream.url, "http://relay:7000/stream");
        assert!(config.relay.synthetic);
        assert_eq!(config.observer.port, 9090);
        assert!(config.logging.json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "admission:\n  soft_limit: 50\n";
        let config = OrbitalConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.unwrap_or_default();

        assert_eq!(config.admission.soft_limit, 50);
        // Everything else uses defaults
        assert_eq!(config.admission.hard_limit, 400);
        assert_eq!(config.entities.burst_duration_ms, 2200);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(OrbitalConfig::parse("").is_ok());
    }

    #[test]
    fn soft_limit_must_be_below_hard_limit() {
        let yaml = "admission:\n  soft_limit: 400\n  hard_limit: 400\n";
        assert!(matches!(
            OrbitalConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn non_positive_drop_exponent_is_rejected() {
        for exponent in ["0.0", "-1.0", ".nan", ".inf"] {
            let yaml = format!("admission:\n  drop_exponent: {exponent}\n");
            assert!(
                matches!(OrbitalConfig::parse(&yaml), Err(ConfigError::Invalid { .. })),
                "{exponent}"
            );
        }
        assert!(OrbitalConfig::parse("admission:\n  drop_exponent: 0.5\n").is_ok());
    }

    #[test]
    fn zero_durations_are_rejected() {
        let yaml = "entities:\n  burst_duration_ms: 0\n";
        assert!(OrbitalConfig::parse(yaml).is_err());
    }

    #[test]
    fn sample_rate_out_of_range_is_rejected() {
        let yaml = "relay:\n  sample_rate: 1.5\n";
        assert!(OrbitalConfig::parse(yaml).is_err());
    }

    #[test]
    fn overrides_replace_yaml_values() {
        let mut env = BTreeMap::new();
        env.insert("ORBITAL_STREAM_URL", "http://elsewhere/stream".to_owned());
        env.insert("ORBITAL_OBSERVER_PORT", "9999".to_owned());
        env.insert("ORBITAL_SEED", "123".to_owned());
        env.insert("ORBITAL_SYNTHETIC", "true".to_owned());

        let mut config = OrbitalConfig::default();
        config.apply_overrides(|key| env.get(key).cloned());

        assert_eq!(config.stream.url, "http://elsewhere/stream");
        assert_eq!(config.observer.port, 9999);
        assert_eq!(config.engine.seed, Some(123));
        assert!(config.relay.synthetic);
    }

    #[test]
    fn unparseable_overrides_are_ignored() {
        let mut config = OrbitalConfig::default();
        config.apply_overrides(|key| (key == "ORBITAL_OBSERVER_PORT").then(|| "abc".to_owned()));
        assert_eq!(config.observer.port, 8080);
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("orbital-config.yaml");
        if path.exists() {
            let config = OrbitalConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
