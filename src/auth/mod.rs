//! Authentication against the Bradford White Azure AD B2C tenant
//!
//! # Overview
//!
//! The Wave API accepts bearer tokens issued by the vendor's B2C tenant to the
//! mobile app's client id. There are two ways to get the first token set:
//!
//! 1. **Authorization URL + pasted redirect** (the primary path). Open the URL
//!    from [`WaveAuth::generate_auth_url`] in a browser, log in, copy the
//!    `com.bradfordwhiteapps.bwconnect://...` redirect from the network tab, and
//!    hand it to [`WaveAuth::parse_redirect_url`] and
//!    [`WaveAuth::exchange_code_for_token`].
//! 2. **Scripted login** with [`WaveAuth::authenticate`], which drives the
//!    hosted login page with an email and password.
//!
//! Either way the caller persists the `refresh_token` and later builds a
//! [`crate::WaveClient`] from it; the client refreshes on demand.
//!
//! # Example
//!
//! ```no_run
//! use bradford_white_wave::auth::{WaveAuth, generate_state};
//!
//! # async fn example(pasted: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let auth = WaveAuth::new()?;
//! println!("Open: {}", auth.generate_auth_url(&generate_state(), &generate_state()));
//!
//! let code = WaveAuth::parse_redirect_url(pasted)?;
//! let tokens = auth.exchange_code_for_token(&code).await?;
//! println!("refresh token: {:?}", tokens.refresh_token());
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! - Tokens are never written to disk or to logs by this crate
//! - Access token claims are read without signature verification, only to find
//!   the account id (see [`account_id_from_token`])

mod oauth;
mod session;
mod token;

pub use oauth::{AuthConfig, LoginStage, WaveAuth, generate_state};
pub use session::Session;
pub use token::{TokenSet, account_id_from_token};
