#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Dataflow Core
//!
//! Run-time statistics and proxy plumbing for dataflows orchestrated by a
//! Prefect-compatible API behind a local proxy.
//!
//! ## Overview
//!
//! A dataflow is a scheduled workflow backed by a Prefect deployment. This
//! crate answers "how long does this dataflow usually take?" from its recent
//! flow-run history, and stores the answer on the dataflow so schedulers can
//! size timeouts and SLAs from it.
//!
//! ## Key Features
//!
//! - **Run-Time Statistics**: max, min, mean and recency-weighted mean duration,
//!   always rounded up to whole seconds
//! - **Injected Storage**: run history and dataflow persistence are traits, with
//!   PostgreSQL and in-memory adapters
//! - **Log Pagination**: walks the proxy's paged log API to the end
//! - **Proxy Client**: thin `reqwest` wrapper with stable error messages
//!
//! ## Module Organization
//!
//! - [`services`] - statistics engine, log pagination, flow-run sync
//! - [`database`] - storage ports and adapters
//! - [`models`] - dataflow and run-record models
//! - [`client`] - Prefect proxy client
//! - [`config`] - layered configuration
//! - [`error`] - structured error handling
//! - [`logging`] - structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dataflow_core::database::{InMemoryDataflowStore, InMemoryRunHistoryStore};
//! use dataflow_core::services::{RunTimeStatsOptions, RunTimeStatsService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = RunTimeStatsService::new(
//!     Arc::new(InMemoryRunHistoryStore::new()),
//!     Arc::new(InMemoryDataflowStore::new()),
//! );
//!
//! let (dataflow, stats) = service
//!     .compute_for_deployment("deployment-id", &RunTimeStatsOptions::default())
//!     .await?;
//! println!("{}: wt_avg={}s", dataflow.name, stats.wt_avg_run_time);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod validation;

pub use client::{FlowRunLogSource, FlowRunSource, HttpError, PrefectProxyClient};
pub use config::{ConfigManager, DataflowConfig};
pub use constants::FlowRunStatus;
pub use database::{DataflowStore, RunHistoryQuery, RunHistoryStore};
pub use error::{DataflowError, Result};
pub use models::{Dataflow, RunRecord};
pub use services::{
    compute_run_time_stats, fetch_all_logs, FlowRunSyncService, RunTimeStats,
    RunTimeStatsOptions, RunTimeStatsService,
};
