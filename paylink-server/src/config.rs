//! Server configuration

use std::str::FromStr;

use crate::links::PaymentDefaults;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// SQLite database location (a path, `sqlite://path`, or `:memory:`)
    pub database_url: String,

    /// Prefix for the URLs of issued client links
    pub public_base_url: String,

    /// Token of the legacy fixed payment link seeded at migration
    pub legacy_link_token: String,

    /// Amount shown to a client who has no payment registration yet
    pub default_payment_amount: f64,

    /// Due date offset, in days, shown to a client who has no payment registration yet
    pub default_due_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        let defaults = PaymentDefaults::default();
        Self {
            port: 3000,
            database_url: "paylink.db".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            legacy_link_token: "default-payment-link".to_string(),
            default_payment_amount: defaults.amount,
            default_due_days: defaults.due_in_days,
        }
    }
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    /// Unset variables take their defaults; unparsable ones are logged and defaulted.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            public_base_url: lookup("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
            legacy_link_token: lookup("LEGACY_LINK_TOKEN").unwrap_or(defaults.legacy_link_token),
            default_payment_amount: parse_or(
                &lookup,
                "DEFAULT_PAYMENT_AMOUNT",
                defaults.default_payment_amount,
            ),
            default_due_days: parse_or(&lookup, "DEFAULT_DUE_DAYS", defaults.default_due_days),
        }
    }

    /// Filesystem path for SQLite, with any `sqlite://` scheme removed
    pub fn database_path(&self) -> &str {
        self.database_url
            .strip_prefix("sqlite://")
            .unwrap_or(&self.database_url)
    }

    pub fn payment_defaults(&self) -> PaymentDefaults {
        PaymentDefaults {
            amount: self.default_payment_amount,
            due_in_days: self.default_due_days,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable configuration value");
            default
        }),
        None => default,
    }
}
