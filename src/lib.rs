// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod keepalive;
pub mod model;
pub mod profile;
pub mod resolve;
pub mod session;
pub mod transport;
pub mod url_builder;

pub use cache::ContentCache;
pub use client::PortalClient;
pub use config::{ClientSettings, Config};
pub use error::{ClientError, Result};
pub use fetch::ListResultExt;
pub use keepalive::spawn_keepalive;
pub use model::{Channel, Genre, VodItem};
pub use profile::DeviceProfile;
pub use transport::{HttpTransport, Transport};
