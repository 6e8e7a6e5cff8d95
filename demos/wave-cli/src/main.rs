//! Bradford White Wave command-line companion
//!
//! Gets a refresh token once, stores it, and then talks to the heaters:
//!
//!   cargo run -p wave-cli -- auth-url           # open the printed URL, log in
//!   cargo run -p wave-cli -- exchange           # paste the app redirect URL
//!   cargo run -p wave-cli -- devices
//!   cargo run -p wave-cli -- status AA:BB:CC:DD:EE:FF
//!   cargo run -p wave-cli -- energy AA:BB:CC:DD:EE:FF --view daily
//!   cargo run -p wave-cli -- set-temp AA:BB:CC:DD:EE:FF 120
//!
//! `login` runs the scripted email/password login instead of the browser flow.

mod credentials;
mod output;

use bradford_white_wave::auth::generate_state;
use bradford_white_wave::{ClientConfig, DeviceMode, ViewType, WaveAuth, WaveClient};
use clap::{Parser, Subcommand};
use console::style;
use credentials::CredentialsFile;
use std::path::PathBuf;

/// Bradford White Wave water heater CLI
#[derive(Parser, Debug)]
#[command(name = "wave-cli")]
#[command(about = "Set up tokens for and control Bradford White Wave water heaters")]
struct Args {
    /// Path to the credentials file (default: platform config dir)
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// API gateway base URL
    #[arg(long, global = true, default_value = bradford_white_wave::DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the authorization URL to open in a browser
    AuthUrl,
    /// Exchange the pasted redirect URL (or bare code) for tokens
    Exchange {
        /// Redirect URL or code; prompted for when omitted
        redirect: Option<String>,
    },
    /// Log in with email and password through the hosted login page
    Login {
        #[arg(long, env = "WAVE_EMAIL")]
        email: Option<String>,
        #[arg(long, env = "WAVE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// List devices on the account
    Devices,
    /// Show one device's status
    Status { mac: String },
    /// Show energy usage for a device
    Energy {
        mac: String,
        /// hourly, daily or monthly
        #[arg(long, default_value = "hourly")]
        view: ViewType,
    },
    /// Change the setpoint (°F)
    SetTemp { mac: String, temperature: i64 },
    /// Change the operating mode (numeric code or label)
    SetMode { mac: String, mode: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bradford_white_wave=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let store = CredentialsFile::new(args.credentials.clone());
    let config = ClientConfig::builder().base_url(args.base_url.clone()).build();

    match args.command {
        Command::AuthUrl => auth_url(&config),
        Command::Exchange { redirect } => exchange(&config, &store, redirect).await,
        Command::Login { email, password } => login(config, &store, email, password).await,
        command => run_device_command(config, &store, command).await,
    }
}

fn auth_url(config: &ClientConfig) -> anyhow::Result<()> {
    let auth = WaveAuth::with_config(config.auth.clone())?;
    let url = auth.generate_auth_url(&generate_state(), &generate_state());

    cliclack::intro(style(" Wave token setup ").on_cyan().black())?;
    cliclack::log::step("Open this URL in a desktop browser and log in:")?;
    println!("{url}");
    cliclack::log::info(
        "After login the browser shows a blank page or an error.\n\
         Open Developer Tools → Network, find the request to '.../confirmed',\n\
         and copy its 'Location' response header (com.bradfordwhiteapps.bwconnect://...).",
    )?;
    cliclack::outro("Then run: wave-cli exchange")?;
    Ok(())
}

async fn exchange(
    config: &ClientConfig,
    store: &CredentialsFile,
    redirect: Option<String>,
) -> anyhow::Result<()> {
    let redirect = match redirect {
        Some(redirect) => redirect,
        None => cliclack::input("Paste the full redirect URL")
            .placeholder("com.bradfordwhiteapps.bwconnect://oauth/redirect?code=...")
            .interact()?,
    };

    let code = WaveAuth::parse_redirect_url(&redirect)?;
    let auth = WaveAuth::with_config(config.auth.clone())?;

    let spinner = cliclack::spinner();
    spinner.start("Exchanging code for tokens...");
    let tokens = match auth.exchange_code_for_token(&code).await {
        Ok(tokens) => tokens,
        Err(e) => {
            spinner.error("Token exchange failed");
            return Err(e.into());
        }
    };
    spinner.stop("Tokens received");

    save_tokens(store, tokens.refresh_token())
}

async fn login(
    config: ClientConfig,
    store: &CredentialsFile,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let email = match email {
        Some(email) => email,
        None => cliclack::input("Email").interact()?,
    };
    let password = match password {
        Some(password) => password,
        None => cliclack::password("Password").mask('▪').interact()?,
    };

    let mut client = WaveClient::from_credentials(config, email, password)?;
    let spinner = cliclack::spinner();
    spinner.start("Logging in...");
    if let Err(e) = client.authenticate().await {
        spinner.error("Login failed");
        return Err(e.into());
    }
    spinner.stop("Logged in");

    save_tokens(store, client.refresh_token())
}

fn save_tokens(store: &CredentialsFile, refresh_token: Option<&str>) -> anyhow::Result<()> {
    let refresh_token = refresh_token
        .ok_or_else(|| anyhow::anyhow!("The identity provider did not return a refresh token"))?;
    store.save_refresh_token(refresh_token)?;
    println!(
        "{} refresh token saved to {}",
        style("✓").green().bold(),
        store.path().display()
    );
    Ok(())
}

async fn run_device_command(
    config: ClientConfig,
    store: &CredentialsFile,
    command: Command,
) -> anyhow::Result<()> {
    let mut client = WaveClient::with_config(config, store.refresh_token()?)?;

    let result = match command {
        Command::Devices => client.list_devices().await.map(|devices| {
            output::display_devices(&devices);
        }),
        Command::Status { mac } => client
            .get_status(&mac)
            .await
            .map(|status| output::display_status(&status)),
        Command::Energy { mac, view } => client
            .get_energy_usage(&mac, view)
            .await
            .map(|records| output::display_energy(&records)),
        Command::SetTemp { mac, temperature } => client
            .set_temperature(&mac, temperature)
            .await
            .map(|response| output::display_write(&response)),
        Command::SetMode { mac, mode } => client
            .set_mode(&mac, DeviceMode::from(mode.as_str()))
            .await
            .map(|response| output::display_write(&response)),
        Command::AuthUrl | Command::Exchange { .. } | Command::Login { .. } => Ok(()),
    };

    // Keep a rotated refresh token even if the command itself failed
    if let Some(refresh_token) = client.refresh_token() {
        store.save_refresh_token(refresh_token)?;
    }
    client.close();

    Ok(result?)
}

