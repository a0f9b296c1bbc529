//! GitLab client library behind the `tanuki` command
//!
//! [`client`] talks to the REST v4 API, [`viewmodel`] holds per-screen state
//! built on top of it and [`view`] renders that state as text.

pub mod app_init;
pub mod client;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod id;
pub mod logging;
pub mod result;
pub mod view;
pub mod viewmodel;
