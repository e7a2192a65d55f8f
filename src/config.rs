use crate::domain::gateway::DeclineReason;
use crate::infrastructure::simulated_bank::BankBehavior;
use crate::logging::LogSettings;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SimulatedDecline {
    InvalidCardHash,
    InsufficientBalance,
    LimitExceeded,
    /// The bank fails to record the transaction.
    TransactionFailed,
}

impl From<SimulatedDecline> for BankBehavior {
    fn from(decline: SimulatedDecline) -> Self {
        match decline {
            SimulatedDecline::InvalidCardHash => {
                BankBehavior::Decline(DeclineReason::InvalidCardHash)
            }
            SimulatedDecline::InsufficientBalance => {
                BankBehavior::Decline(DeclineReason::InsufficientBalance)
            }
            SimulatedDecline::LimitExceeded => BankBehavior::Decline(DeclineReason::LimitExceeded),
            SimulatedDecline::TransactionFailed => BankBehavior::Fail,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Runs payment commands through the payment saga", long_about = None)]
pub struct Cli {
    /// Input commands CSV file
    pub input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Base URL of the bank API. When absent an in-process simulated bank is used.
    #[arg(long, env = "BANK_API_URL")]
    pub bank_url: Option<String>,

    /// Timeout for each call to the bank API, in milliseconds.
    #[arg(long, env = "BANK_TIMEOUT_MS", default_value_t = 10_000)]
    pub bank_timeout_ms: u64,

    /// Makes the simulated bank refuse every payment for this reason.
    #[arg(long, value_enum)]
    pub simulate_decline: Option<SimulatedDecline>,

    /// How long an idempotency key is remembered, in seconds.
    #[arg(long, env = "IDEMPOTENCY_TTL_SECS", default_value_t = 60)]
    pub idempotency_ttl_secs: u64,

    /// Deadline for each pay command, in milliseconds.
    #[arg(long, env = "REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Log level (error, warn, info, debug, trace). Defaults to PAYMENTS_LOG_LEVEL, then RUST_LOG.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Directory for log files, in addition to stderr. Defaults to PAYMENTS_LOG_DIR.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    pub fn bank_timeout(&self) -> Duration {
        Duration::from_millis(self.bank_timeout_ms)
    }

    pub fn idempotency_ttl(&self) -> Duration {
        Duration::from_secs(self.idempotency_ttl_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings::resolve(self.log_level.as_deref(), self.log_dir.clone())
    }

    pub fn bank_behavior(&self) -> BankBehavior {
        self.simulate_decline.map(BankBehavior::from).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["payment-saga", "commands.csv"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("commands.csv"));
        assert_eq!(cli.idempotency_ttl(), Duration::from_secs(60));
        assert_eq!(cli.bank_behavior(), BankBehavior::Approve);
        assert!(cli.db_path.is_none());
    }

    #[test]
    fn test_simulated_decline_flag() {
        let cli = Cli::try_parse_from([
            "payment-saga",
            "commands.csv",
            "--simulate-decline",
            "invalid-card-hash",
            "--request-timeout-ms",
            "250",
        ])
        .unwrap();
        assert_eq!(
            cli.bank_behavior(),
            BankBehavior::Decline(DeclineReason::InvalidCardHash)
        );
        assert_eq!(cli.request_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_log_flag_overrides_environment() {
        let cli = Cli::try_parse_from(["payment-saga", "c.csv", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_settings().level, log::LevelFilter::Debug);
    }

    #[test]
    fn test_unknown_decline_is_rejected() {
        assert!(
            Cli::try_parse_from(["payment-saga", "c.csv", "--simulate-decline", "stolen"])
                .is_err()
        );
    }
}
