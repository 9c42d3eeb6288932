use std::time::Duration;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(v) => v
                .parse::<u16>()
                .with_context(|| format!("invalid PORT {v:?}"))?,
            Err(_) => 5000,
        };
        let expires_in = std::env::var("EXPIRES_IN").unwrap_or_else(|_| "1h".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            expires_in: parse_expires_in(&expires_in)
                .with_context(|| format!("invalid EXPIRES_IN {expires_in:?}"))?,
        };
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            mongodb_uri: std::env::var("MONGODB_URI").context("MONGODB_URI must be set")?,
            mongodb_database: std::env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "authentication".into()),
            jwt,
        })
    }
}

/// Parses a token lifetime such as `"1h"`, `"90s"`, `"2 days"` or `"1.5h"`.
///
/// A bare number is taken as milliseconds. The result is truncated to whole
/// seconds because JWT timestamps carry second precision.
pub fn parse_expires_in(raw: &str) -> anyhow::Result<Duration> {
    lazy_static! {
        static ref DURATION_RE: Regex = Regex::new(
            r"(?i)^(-?(?:\d+)?\.?\d+)\s*(milliseconds?|msecs?|ms|seconds?|secs?|s|minutes?|mins?|m|hours?|hrs?|h|days?|d|weeks?|w|years?|yrs?|y)?$"
        )
        .unwrap();
    }

    const SECOND: f64 = 1000.0;
    const MINUTE: f64 = SECOND * 60.0;
    const HOUR: f64 = MINUTE * 60.0;
    const DAY: f64 = HOUR * 24.0;
    const WEEK: f64 = DAY * 7.0;
    const YEAR: f64 = DAY * 365.25;

    let raw = raw.trim();
    anyhow::ensure!(raw.len() <= 100, "duration string too long");
    let caps = DURATION_RE
        .captures(raw)
        .ok_or_else(|| anyhow::anyhow!("unrecognized duration"))?;

    let value: f64 = caps[1].parse().context("duration value")?;
    let unit = caps
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_else(|| "ms".into());
    let factor = match unit.as_str() {
        "years" | "year" | "yrs" | "yr" | "y" => YEAR,
        "weeks" | "week" | "w" => WEEK,
        "days" | "day" | "d" => DAY,
        "hours" | "hour" | "hrs" | "hr" | "h" => HOUR,
        "minutes" | "minute" | "mins" | "min" | "m" => MINUTE,
        "seconds" | "second" | "secs" | "sec" | "s" => SECOND,
        _ => 1.0,
    };

    let millis = value * factor;
    anyhow::ensure!(millis >= 0.0, "duration must not be negative");

    // the expiry has to land on a representable timestamp
    let secs = (millis / SECOND).floor();
    anyhow::ensure!(secs < i64::MAX as f64, "duration too large");
    let secs = secs as i64;
    anyhow::ensure!(
        OffsetDateTime::now_utc()
            .checked_add(time::Duration::seconds(secs))
            .is_some(),
        "duration too large"
    );
    Ok(Duration::from_secs(secs as u64))
}
