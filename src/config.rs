// ABOUTME: Command-line and environment configuration for the connection manager server
// ABOUTME: Every flag has an environment fallback so containers can run without arguments

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

const MIN_SECRET_LEN: usize = 16;

/// Connection manager server.
#[derive(Parser, Debug, Clone)]
#[command(name = "connection-manager", about = "Connection metadata management server")]
pub struct Config {
    /// Database connection string.
    #[arg(
        long = "database-url",
        env = "DATABASE_URL",
        default_value = "sqlite:connection_manager.db?mode=rwc"
    )]
    pub database_url: String,

    /// Address the HTTP server binds to.
    #[arg(long = "listen", env = "LISTEN_ADDR", default_value = "127.0.0.1:7009")]
    pub listen: SocketAddr,

    /// Deployment secret the login credential key is derived from.
    #[arg(long = "credential-secret", env = "CREDENTIAL_SECRET", hide_env_values = true)]
    pub credential_secret: String,

    /// Password for the seeded `admin` user. Generated when absent.
    #[arg(long = "admin-password", env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Per-request timeout in seconds; 0 disables it.
    #[arg(long = "request-timeout-secs", env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl Config {
    /// Rejects configurations the server should refuse to start with.
    pub fn verify(&self) -> anyhow::Result<()> {
        if self.credential_secret.trim().is_empty() {
            anyhow::bail!("Credential secret is empty. Set CREDENTIAL_SECRET or --credential-secret.");
        }
        if self.credential_secret.len() < MIN_SECRET_LEN {
            anyhow::bail!(
                "Credential secret must be at least {} bytes long.",
                MIN_SECRET_LEN
            );
        }
        if self.database_url.is_empty() {
            anyhow::bail!("Database URL is empty in configuration.");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["connection-manager"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = parse(&[
            "--credential-secret",
            "0123456789abcdef",
            "--listen",
            "0.0.0.0:9000",
            "--request-timeout-secs",
            "0",
        ]);

        assert_eq!(config.listen.port(), 9000);
        assert!(config.admin_password.is_none());
        assert!(config.request_timeout().is_none());
        assert!(config.verify().is_ok());
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let config = parse(&["--credential-secret", "short"]);
        assert!(config.verify().is_err());

        let blank = parse(&["--credential-secret", "                "]);
        assert!(blank.verify().is_err());
    }

    #[test]
    fn test_timeout_conversion() {
        let config = parse(&["--credential-secret", "0123456789abcdef"]);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }
}
