//! httpsig - sign and verify HTTP requests from the command line.
//!
//! # Usage
//!
//! ```text
//! HTTPSIG_KEY_ID=Test HTTPSIG_KEY=c2VjcmV0 \
//!     httpsig sign POST https://example.com/foo "Host: example.com"
//!
//! HTTPSIG_KEY=c2VjcmV0 HTTPSIG_ALLOWED_CLOCK_SKEW=-1 \
//!     httpsig verify POST https://example.com/foo "Host: example.com" "Date: ..." "Signature: ..."
//!
//! httpsig parse 'keyId="Test",algorithm="hmac-sha256",signature="..."'
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HTTPSIG_KEY` | *(unset)* | Base64 key used to sign or verify |
//! | `HTTPSIG_KEY_ID` | *(unset)* | Key id to sign with; when verifying, the only accepted key id |
//! | `HTTPSIG_ALGORITHM` | `hmac-sha256` | Signing algorithm |
//! | `HTTPSIG_HEADERS` | *(empty = date)* | Space-separated header list to sign |
//! | `HTTPSIG_ALLOWED_CLOCK_SKEW` | `300` | Allowed timestamp age in seconds, `-1` disables |
//! | `HTTPSIG_ALLOWED_ALGORITHMS` | `hmac-sha256` | Algorithms accepted when verifying |
//! | `HTTPSIG_REQUIRED_HEADERS` | *(empty)* | Headers a signature must cover |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod command;

use anyhow::{Context, Result, bail};
use clap::Parser;
use http::header::AUTHORIZATION;
use httpsig::params::SIGNATURE_HEADER;
use httpsig::{ParsedSignature, Signer, SignerConfig, Verifier, VerifierConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::command::{Cli, Command, RequestArgs};

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn log_level() -> String {
    std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

fn signing_key() -> Result<String> {
    std::env::var("HTTPSIG_KEY").context("HTTPSIG_KEY must hold the base64 key")
}

fn sign(auth: bool, args: RequestArgs) -> Result<()> {
    let config = SignerConfig::from_env();
    let key = signing_key()?;
    let mut request = args.into_request();

    let signer = Signer::from_config(&config).with_date_stamping(true);
    let header = if auth {
        signer.auth_request(&mut request, &config.key_id, &key)?;
        AUTHORIZATION
    } else {
        signer.sign_request(&mut request, &config.key_id, &key)?;
        SIGNATURE_HEADER.clone()
    };

    info!(key_id = %config.key_id, algorithm = %config.algorithm, "Signed request");

    for (name, value) in request.headers() {
        let value = value.to_str().context("signed header is not printable")?;
        if *name == header || *name == http::header::DATE {
            println!("{name}: {value}");
        }
    }
    Ok(())
}

fn verify(args: RequestArgs) -> Result<()> {
    let config = VerifierConfig::from_env();
    let expected_key_id = SignerConfig::from_env().key_id;
    let key = signing_key()?;
    let request = args.into_request();

    let lookup = |key_id: &str| -> Result<String, std::io::Error> {
        if expected_key_id.is_empty() || expected_key_id == key_id {
            Ok(key.clone())
        } else {
            Err(std::io::Error::other(format!("unknown key id: {key_id}")))
        }
    };

    debug!(?config, "Verifying request");

    match Verifier::from_config(config).verify(&request, &lookup) {
        Ok(true) => {
            println!("valid");
            Ok(())
        }
        Ok(false) => {
            println!("invalid");
            std::process::exit(1);
        }
        Err(e) => match e.status_code() {
            Some(status) => bail!("verification failed ({status}): {e}"),
            None => bail!("key lookup failed: {e}"),
        },
    }
}

fn parse(value: &str) -> Result<()> {
    let parsed = ParsedSignature::parse(value)?;
    let json = serde_json::to_string_pretty(&parsed).context("failed to encode parameters")?;
    println!("{json}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&log_level())?;

    match cli.command {
        Command::Sign { auth, request } => sign(auth, request),
        Command::Verify { request } => verify(request),
        Command::Parse { value } => parse(&value),
    }
}
