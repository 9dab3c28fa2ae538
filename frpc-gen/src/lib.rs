// SPDX-License-Identifier: AGPL-3.0-or-later
//! frpc-gen: multi-location FRP client configuration generator
//!
//! Reads `frp-servers.json` and an frpc template, then writes one frpc
//! config per enabled server, a `docker-compose.yml` running a shadowsocks
//! service plus one frpc client per server, and an `.env.example`.
//!
//! # Features
//!
//! * **Sentinel server:** a server named `default` gets unprefixed file,
//!   service and environment-variable names
//! * **Runtime overrides:** compose services read `FRP_<NAME>_*` variables
//!   and fall back to the values from the configuration file
//! * **Fail fast:** missing or malformed inputs abort before any file is written

pub mod config;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod template;

pub use config::Config;
pub use error::{GenError, Result};
pub use pipeline::{run, RunOptions, RunSummary};
pub use template::Template;
