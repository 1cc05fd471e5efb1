//! Constant-rate load generator.
//!
//! Replays the payments scenario (team add/get, user toggle and review
//! lookup, pr-1001 create/merge/reassign) against a running daemon. One
//! request is picked at random per tick; in-flight requests are capped by a
//! semaphore sized to `workers`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::{ApiClient, ApiReply};

#[derive(Debug, Clone)]
pub struct LoadTestConfig {
    /// Requests per second.
    pub rate: u32,
    pub duration: Duration,
    pub workers: usize,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            rate: 5,
            duration: Duration::from_secs(30),
            workers: 20,
            timeout: Duration::from_secs(10),
        }
    }
}

/// One canned request.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub path: &'static str,
    pub query: &'static [(&'static str, &'static str)],
    /// `Some` means POST with this JSON body.
    pub body: Option<Value>,
}

impl Scenario {
    async fn send(&self, client: &ApiClient) -> Result<ApiReply> {
        match &self.body {
            Some(body) => client.post(self.path, body).await,
            None => client.get(self.path, self.query).await,
        }
    }
}

pub fn payments_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "team.add",
            path: "/team/add",
            query: &[],
            body: Some(json!({
                "team_name": "payments",
                "members": [
                    {"user_id": "u1", "username": "Alice", "is_active": true},
                    {"user_id": "u2", "username": "Bob", "is_active": true}
                ]
            })),
        },
        Scenario {
            name: "team.get",
            path: "/team/get",
            query: &[("team_name", "payments")],
            body: None,
        },
        Scenario {
            name: "users.setIsActive",
            path: "/users/setIsActive",
            query: &[],
            body: Some(json!({"user_id": "u2", "is_active": false})),
        },
        Scenario {
            name: "users.getReview",
            path: "/users/getReview",
            query: &[("user_id", "u1")],
            body: None,
        },
        Scenario {
            name: "pr.create",
            path: "/pullRequest/create",
            query: &[],
            body: Some(json!({
                "pull_request_id": "pr-1001",
                "pull_request_name": "Add search",
                "author_id": "u1"
            })),
        },
        Scenario {
            name: "pr.merge",
            path: "/pullRequest/merge",
            query: &[],
            body: Some(json!({"pull_request_id": "pr-1001"})),
        },
        Scenario {
            name: "pr.reassign",
            path: "/pullRequest/reassign",
            query: &[],
            body: Some(json!({"pull_request_id": "pr-1001", "old_reviewer_id": "u2"})),
        },
    ]
}

/// Outcome of a single request. `status` is 0 when no response arrived.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub status: u16,
    pub latency: Duration,
}

impl Sample {
    fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LatencySummary {
    pub mean: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub max: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub requests: u64,
    pub successes: u64,
    pub elapsed: Duration,
    pub latencies: LatencySummary,
    /// Status code -> count; 0 collects timeouts and transport errors.
    pub status_codes: BTreeMap<u16, u64>,
}

impl LoadReport {
    pub fn from_samples(samples: &[Sample], elapsed: Duration) -> Self {
        let mut status_codes = BTreeMap::new();
        for sample in samples {
            *status_codes.entry(sample.status).or_insert(0) += 1;
        }

        let mut sorted: Vec<Duration> = samples.iter().map(|s| s.latency).collect();
        sorted.sort();

        let latencies = if sorted.is_empty() {
            LatencySummary::default()
        } else {
            let total: Duration = sorted.iter().sum();
            LatencySummary {
                mean: total / sorted.len() as u32,
                p50: percentile(&sorted, 50.0),
                p95: percentile(&sorted, 95.0),
                p99: percentile(&sorted, 99.0),
                max: sorted[sorted.len() - 1],
            }
        };

        Self {
            requests: samples.len() as u64,
            successes: samples.iter().filter(|s| s.is_success()).count() as u64,
            elapsed,
            latencies,
            status_codes,
        }
    }

    pub fn success_ratio(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.successes as f64 / self.requests as f64
    }

    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.requests as f64 / secs
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let l = &self.latencies;
        writeln!(
            f,
            "Requests      [total, rate]              {}, {:.2}/s",
            self.requests,
            self.throughput()
        )?;
        writeln!(f, "Duration      [total]                    {:.2?}", self.elapsed)?;
        writeln!(
            f,
            "Latencies     [mean, 50, 95, 99, max]    {:.2?}, {:.2?}, {:.2?}, {:.2?}, {:.2?}",
            l.mean, l.p50, l.p95, l.p99, l.max
        )?;
        writeln!(
            f,
            "Success       [ratio]                    {:.2}%",
            self.success_ratio() * 100.0
        )?;
        let codes: Vec<String> = self
            .status_codes
            .iter()
            .map(|(code, count)| format!("{code}:{count}"))
            .collect();
        write!(f, "Status Codes  [code:count]               {}", codes.join("  "))
    }
}

/// Nearest-rank percentile over an ascending slice.
pub fn percentile(sorted: &[Duration], pct: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Fire requests at `config.rate` for `config.duration`, then wait for the
/// in-flight tail and summarize.
pub async fn run(client: ApiClient, config: LoadTestConfig) -> Result<LoadReport> {
    if config.rate == 0 {
        bail!("rate must be at least 1 request per second");
    }
    if config.workers == 0 {
        bail!("workers must be at least 1");
    }

    let scenarios = Arc::new(payments_scenarios());
    let limiter = Arc::new(Semaphore::new(config.workers));
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / config.rate as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        rate = config.rate,
        duration_secs = config.duration.as_secs_f64(),
        workers = config.workers,
        target = %client.url(""),
        "load test started"
    );

    let started = Instant::now();
    let deadline = started + config.duration;
    let mut tasks = JoinSet::new();

    loop {
        ticker.tick().await;
        if Instant::now() >= deadline {
            break;
        }

        let permit = Arc::clone(&limiter).acquire_owned().await?;
        let pick = rand::thread_rng().gen_range(0..scenarios.len());
        let scenarios = Arc::clone(&scenarios);
        let client = client.clone();
        let timeout = config.timeout;

        tasks.spawn(async move {
            let _permit = permit;
            let scenario = &scenarios[pick];
            let begin = Instant::now();
            let status = match tokio::time::timeout(timeout, scenario.send(&client)).await {
                Ok(Ok(reply)) => reply.status.as_u16(),
                Ok(Err(e)) => {
                    debug!(scenario = scenario.name, error = %e, "request failed");
                    0
                }
                Err(_) => {
                    debug!(scenario = scenario.name, "request timed out");
                    0
                }
            };
            Sample {
                status,
                latency: begin.elapsed(),
            }
        });
    }

    let mut samples = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(sample) => samples.push(sample),
            Err(e) => warn!(error = %e, "load test task panicked"),
        }
    }

    let report = LoadReport::from_samples(&samples, started.elapsed());
    info!(
        requests = report.requests,
        success_ratio = report.success_ratio(),
        "load test finished"
    );
    Ok(report)
}
