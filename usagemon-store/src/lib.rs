// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # usagemon Store
//!
//! Runtime state for usagemon.
//!
//! This crate provides:
//!
//! - **Config**: YAML configuration loading with env interpolation and validation
//! - **TtlCache**: In-memory key/value cache with per-entry expiry
//! - **PollingMonitor**: Timer-driven fetch loop with event listeners
//! - **UsageAggregator**: Cached fan-out over every usage provider
//!
//! ## Usage
//!
//! ```ignore
//! use usagemon_store::{load_config, PollingMonitor, MonitorEventKind};
//!
//! let loaded = load_config(None);
//! let monitor = PollingMonitor::new(plan, &loaded.config);
//!
//! let _sub = monitor.on(|event| {
//!     if event.kind == MonitorEventKind::Update {
//!         println!("new data");
//!     }
//! });
//! monitor.start();
//! ```

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod monitor;
pub mod persistence;

pub use aggregator::{AGGREGATOR_CACHE_TTL, AttemptOutcome, SourceAttempt, UsageAggregator};
pub use cache::{CacheEntry, DEFAULT_TTL, TtlCache};
pub use config::{
    AnthropicConfig, ConfigSource, Currency, DisplayConfig, FetchConfig, LoadConfigResult,
    OAuthConfig, Position, ProviderSourceConfig, ResolvedConfig, WidgetConfig, WidgetStyle,
    load_config, load_config_with, mask_secret,
};
pub use error::StoreError;
pub use events::{EventBus, Subscription};
pub use monitor::{MonitorEvent, MonitorEventKind, MonitorState, PollingMonitor, SourcePlan};
pub use persistence::{config_search_paths, default_config_dir, default_config_path};
