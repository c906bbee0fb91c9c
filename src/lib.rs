//! # peaksched
//!
//! Peak-demand scheduler for Braeburn BlueLink thermostats.
//!
//! During winter peak-demand events the utility bills electricity at a much
//! higher rate. This crate assembles a seven-day thermostat program that
//! pre-heats before each announced peak period, holds a reduced setpoint while
//! the peak is in effect, and restores the normal program afterwards. The
//! assembled program is diffed against the schedule currently on the device
//! and uploaded only when they differ.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: The weekly program model (slots, daily and weekly programs)
//!   and the fixed-width device wire format
//! - [`config`]: TOML configuration loading and validation
//! - [`events`]: Peak-event types, the utility's event feed (with a local
//!   file cache), and the seen-event store
//! - [`scheduler`]: The pure program-assembly algorithm
//! - [`api`]: Data Transfer Objects for the vendor REST API
//! - [`client`]: The vendor REST API client (login, devices, schedule upload)
//! - [`app`]: End-to-end orchestration used by the command-line binary

pub mod api;
pub mod app;
pub mod client;
pub mod config;
pub mod events;
pub mod models;
pub mod scheduler;
