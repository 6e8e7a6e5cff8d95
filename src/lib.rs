//! # Bradford White Wave client for Rust
//!
//! Async client for the Bradford White "Wave" water heater cloud API, with the
//! Azure AD B2C authentication it sits behind.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bradford_white_wave::{ViewType, WaveClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = WaveClient::new("your-refresh-token")?;
//!
//!     for device in client.list_devices().await? {
//!         println!("{} ({})", device.friendly_name, device.mac_address);
//!         let status = client.get_status(&device.mac_address).await?;
//!         println!("  setpoint: {:?}°F, mode: {:?}", status.setpoint_fahrenheit, status.mode);
//!     }
//!
//!     // The refresh token may have rotated
//!     println!("persist: {:?}", client.refresh_token());
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Getting a refresh token
//!
//! The library does not store credentials. Obtain a token set once, persist the
//! `refresh_token`, and hand it to [`WaveClient::new`] afterwards:
//!
//! - [`auth::WaveAuth::generate_auth_url`] + [`auth::WaveAuth::parse_redirect_url`]
//!   + [`auth::WaveAuth::exchange_code_for_token`] for the browser flow, or
//! - [`auth::WaveAuth::authenticate`] / [`WaveClient::from_credentials`] for the
//!   scripted email + password login.
//!
//! The `wave-cli` demo in this workspace wraps both.
//!
//! ## Architecture
//!
//! - [`auth`]: B2C authorization URL, redirect parsing, token endpoint, scripted login
//! - [`client`]: authenticated requests with refresh-on-401 and the device endpoints
//! - [`types`]: records decoded from API responses
//! - [`error`]: error types
//! - [`utils`]: UTF-8 safe truncation for error messages
//!
//! ## Logging
//!
//! This crate uses [`tracing`](https://crates.io/crates/tracing) for structured logging.
//! Tokens are never logged. To see logs, attach a subscriber in your application:
//!
//! ```rust,ignore
//! tracing_subscriber::fmt::init();
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, WaveError>`](Result):
//!
//! ```no_run
//! # use bradford_white_wave::{WaveClient, WaveError};
//! # async fn example(client: &mut WaveClient) {
//! match client.list_devices().await {
//!     Ok(devices) => { /* ... */ }
//!     Err(WaveError::Auth(msg)) => eprintln!("Log in again: {msg}"),
//!     Err(WaveError::Connect(msg)) => eprintln!("API error: {msg}"),
//!     Err(e) => eprintln!("Error: {e}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod client;
pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use auth::{AuthConfig, TokenSet, WaveAuth};
pub use client::{ClientConfig, DEFAULT_BASE_URL, WaveClient};
pub use error::{Result, WaveError};
pub use reqwest::Method;
pub use types::{
    DeviceMode, DeviceStatus, EnergyUsage, MacAddress, RequestId, ViewType, WriteResponse,
};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
