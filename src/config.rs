use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::logging::LogFormat;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TOKEN_TTL_MINUTES: u32 = 30;

#[derive(Parser, Debug)]
#[command(name = "notes-api", version, about = "Note-taking web API")]
pub struct Cli {
    /// Raise the log level (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API
    Serve(ServeArgs),
    /// Probe a running server; exits nonzero unless it answers 200
    Healthcheck(HealthcheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// DynamoDB table; notes are kept in memory when unset
    #[arg(long, env = "NOTES_TABLE")]
    pub table: Option<String>,

    /// HS256 signing secret; a random one is generated when unset
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Access token lifetime, at least one minute
    #[arg(
        long,
        env = "ACCESS_TOKEN_EXPIRE_MINUTES",
        default_value_t = DEFAULT_TOKEN_TTL_MINUTES,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub token_ttl_minutes: u32,
}

impl ServeArgs {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Args, Debug, Clone)]
pub struct HealthcheckArgs {
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, default_value = "/docs")]
    pub path: String,

    #[arg(long, default_value_t = 5)]
    pub timeout_secs: u64,
}

impl HealthcheckArgs {
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.port, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["notes-api", "serve"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        // PORT may be set in the environment running the tests.
        if std::env::var_os("PORT").is_none() {
            assert_eq!(args.addr().to_string(), "0.0.0.0:8000");
        }
        if std::env::var_os("ACCESS_TOKEN_EXPIRE_MINUTES").is_none() {
            assert_eq!(args.token_ttl_minutes, 30);
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "notes-api",
            "-vv",
            "--log-format",
            "pretty",
            "serve",
            "--port",
            "9000",
            "--table",
            "notes",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormat::Pretty);
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, 9000);
        assert_eq!(args.table.as_deref(), Some("notes"));
    }

    #[test]
    fn test_token_ttl_must_be_positive() {
        for bad in ["0", "-5", "99999999999"] {
            let res = Cli::try_parse_from(["notes-api", "serve", "--token-ttl-minutes", bad]);
            assert!(res.is_err(), "accepted {}", bad);
        }
        let cli =
            Cli::try_parse_from(["notes-api", "serve", "--token-ttl-minutes", "1"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.token_ttl_minutes, 1);
    }

    #[test]
    fn test_healthcheck_url() {
        let cli =
            Cli::try_parse_from(["notes-api", "healthcheck", "--port", "8123"]).unwrap();
        let Command::Healthcheck(args) = cli.command else {
            panic!("expected healthcheck");
        };
        assert_eq!(args.url(), "http://127.0.0.1:8123/docs");
    }
}
