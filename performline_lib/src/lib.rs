//! Library layer for the PerformLine API: resource types, per-product
//! services, configuration, and the authenticated [`Client`].
//!
//! Builds on the generic `performline_api` REST machinery.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod products;
pub mod query;

pub use performline_api;
pub use performline_api::{Envelope, ErrorResponse, MemoryStats, Record, Stats};

pub use client::Client;
pub use config::{ClientConfig, ConfigError};
pub use error::PerformLineError;
pub use models::{
    Brand, BrandRule, Call, Campaign, CampaignRule, Chat, Item, Rule, TrafficSource, WebPage,
};
pub use query::{BrandQuery, CampaignQuery, ChatQuery, ItemQuery, ListQuery, Query, QueryCommon};
