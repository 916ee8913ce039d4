// src/config.rs

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

/// Total exam duration: 3 hours.
pub const EXAM_DURATION_SECS: u32 = 10_800;

/// Per-question time limits, fixed by question type.
pub const MCQ_TIME_LIMIT_SECS: u32 = 90;
pub const SHORT_TIME_LIMIT_SECS: u32 = 240;
pub const LONG_TIME_LIMIT_SECS: u32 = 600;

/// Fixed section sizes of a paper.
pub const SECTION_A_SIZE: usize = 20;
pub const SECTION_B_SIZE: usize = 10;
pub const SECTION_C_SIZE: usize = 5;
pub const TOTAL_QUESTIONS: usize = SECTION_A_SIZE + SECTION_B_SIZE + SECTION_C_SIZE;

pub const MCQ_OPTION_COUNT: usize = 4;

/// Character caps enforced by the shell (not by the engine).
pub const SHORT_ANSWER_CHAR_CAP: usize = 500;
pub const LONG_ANSWER_CHAR_CAP: usize = 3000;

pub const ADVISORY_TTL_SECS: u64 = 3;

/// A session nobody has touched for this long is evicted.
pub const SESSION_IDLE_TTL_SECS: u64 = 1800;

/// Grace period for reading the result of a completed session.
pub const COMPLETED_SESSION_TTL_SECS: u64 = 300;

pub const SESSION_SWEEP_INTERVAL_SECS: u64 = 60;

pub const MAX_SESSIONS: usize = 10_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub rust_log: String,
    pub log_dir: String,
    pub exam_duration_secs: u32,
    pub tick_interval: Duration,
    pub advisory_ttl: Duration,
    pub session_idle_ttl: Duration,
    pub completed_session_ttl: Duration,
    pub session_sweep_interval: Duration,
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            rust_log: "info".to_string(),
            log_dir: "logs".to_string(),
            exam_duration_secs: EXAM_DURATION_SECS,
            tick_interval: Duration::from_millis(1000),
            advisory_ttl: Duration::from_secs(ADVISORY_TTL_SECS),
            session_idle_ttl: Duration::from_secs(SESSION_IDLE_TTL_SECS),
            completed_session_ttl: Duration::from_secs(COMPLETED_SESSION_TTL_SECS),
            session_sweep_interval: Duration::from_secs(SESSION_SWEEP_INTERVAL_SECS),
            max_sessions: MAX_SESSIONS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        let bind_addr = parse_var("BIND_ADDR").unwrap_or(defaults.bind_addr);

        let rust_log = env::var("RUST_LOG").unwrap_or(defaults.rust_log);

        let log_dir = env::var("LOG_DIR").unwrap_or(defaults.log_dir);

        let exam_duration_secs = parse_var::<u32>("EXAM_DURATION_SECS")
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.exam_duration_secs);

        let tick_interval = parse_var::<u64>("TICK_INTERVAL_MS")
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick_interval);

        let advisory_ttl = parse_var::<u64>("ADVISORY_TTL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.advisory_ttl);

        let session_idle_ttl = parse_var::<u64>("SESSION_IDLE_TTL_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_idle_ttl);

        let completed_session_ttl = parse_var::<u64>("COMPLETED_SESSION_TTL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.completed_session_ttl);

        let session_sweep_interval = parse_var::<u64>("SESSION_SWEEP_INTERVAL_SECS")
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_sweep_interval);

        let max_sessions = parse_var::<usize>("MAX_SESSIONS")
            .filter(|max| *max > 0)
            .unwrap_or(defaults.max_sessions);

        Self {
            bind_addr,
            rust_log,
            log_dir,
            exam_duration_secs,
            tick_interval,
            advisory_ttl,
            session_idle_ttl,
            completed_session_ttl,
            session_sweep_interval,
            max_sessions,
        }
    }
}

/// Reads an env var and parses it, logging (and ignoring) malformed values.
fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    parse_setting(key, &raw)
}

fn parse_setting<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring malformed {}={:?}, using default", key, raw);
            None
        }
    }
}
