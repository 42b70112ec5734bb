//! Command line arguments.

use clap::{Args, Parser, Subcommand};
use http::{HeaderName, HeaderValue, Method};
use httpsig::OutgoingRequest;
use url::Url;

/// Sign and verify HTTP requests with HTTP Message Signatures.
#[derive(Debug, Parser)]
#[command(name = "httpsig", about, version, arg_required_else_help = true)]
pub struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// The subcommand to run.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign a request and print the header to attach
    Sign {
        /// Emit `Authorization: Signature ...` instead of `Signature: ...`
        #[arg(long)]
        auth: bool,

        #[command(flatten)]
        request: RequestArgs,
    },
    /// Verify the signature carried by a request's headers
    Verify {
        #[command(flatten)]
        request: RequestArgs,
    },
    /// Parse a signature parameter string and print its fields
    Parse {
        /// The raw header value
        value: String,
    },
}

/// The request described on the command line.
#[derive(Debug, Args)]
pub struct RequestArgs {
    /// Request method
    #[arg(value_parser = parse_method)]
    method: Method,

    /// Absolute request URL, including any query and fragment
    url: Url,

    /// Request headers as `NAME:VALUE`
    #[arg(value_parser = parse_header)]
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl RequestArgs {
    /// Build the request.
    pub fn into_request(self) -> OutgoingRequest {
        self.headers.into_iter().fold(
            OutgoingRequest::new(self.method, self.url),
            |request, (name, value)| request.with_header(name, value),
        )
    }
}

fn parse_method(arg: &str) -> Result<Method, String> {
    Method::from_bytes(arg.to_ascii_uppercase().as_bytes())
        .map_err(|_| format!("invalid method: {arg}"))
}

fn parse_header(arg: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (name, value) = arg
        .split_once(':')
        .ok_or_else(|| format!("header must be NAME:VALUE, got: {arg}"))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|_| format!("invalid header name: {name}"))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|_| format!("invalid value for header {name}"))?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use httpsig::SignableRequest;

    use super::*;

    fn parse(line: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("httpsig").chain(line.iter().copied()))
    }

    #[test]
    fn test_should_have_valid_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_should_parse_sign_command() {
        let cli = parse(&[
            "sign",
            "--auth",
            "post",
            "https://example.com/foo?a=1#frag",
            "Host: example.com",
            "Date:Sun, 05 Jan 2014 21:31:40 GMT",
        ])
        .unwrap();

        let Command::Sign { auth, request } = cli.command else {
            panic!("expected sign command");
        };
        assert!(auth);

        let request = request.into_request();
        assert_eq!(request.request_method(), Some(&Method::POST));
        assert_eq!(request.request_target().unwrap().fragment, Some("frag"));
        assert_eq!(request.headers()["host"], "example.com");
        assert_eq!(request.headers()["date"], "Sun, 05 Jan 2014 21:31:40 GMT");
    }

    #[test]
    fn test_should_accept_auth_flag_after_positionals() {
        let cli = parse(&["sign", "POST", "https://x/", "Host: x", "--auth"]).unwrap();

        let Command::Sign { auth, request } = cli.command else {
            panic!("expected sign command");
        };
        assert!(auth);
        assert_eq!(request.into_request().headers().len(), 1);
    }

    #[test]
    fn test_should_parse_parse_command() {
        let cli = parse(&["parse", r#"keyId="Test""#]).unwrap();
        assert!(matches!(cli.command, Command::Parse { value } if value == r#"keyId="Test""#));
    }

    #[test]
    fn test_should_reject_bad_arguments() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["verify", "GET"]).is_err());
        assert!(parse(&["verify", "GET", "not a url"]).is_err());
        assert!(parse(&["verify", "GET", "https://example.com/", "no-colon"]).is_err());
        assert!(parse(&["parse", "a", "b"]).is_err());
        assert!(parse(&["frobnicate"]).is_err());
    }
}
