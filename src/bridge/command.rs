use std::{path::PathBuf, process::Output, process::Stdio, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{BridgeError, UsageRecord, UsageStatsProvider};

/// Talks to the platform through a helper program that wraps the OS usage statistics service.
///
/// `<program> [args..] query <start_ms> <end_ms>` prints a JSON array of
/// `{"packageName", "totalTimeInForeground"}` objects, queried with the OS "best interval"
/// granularity. `<program> [args..] settings` opens the usage access screen.
pub struct CommandProvider {
    program: PathBuf,
    args: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawUsageStats {
    #[serde(rename = "packageName", default)]
    package_name: Option<Arc<str>>,
    #[serde(rename = "totalTimeInForeground", alias = "timeForeground", default)]
    foreground_millis: i64,
}

impl CommandProvider {
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }

    async fn run(&self, command: &[String]) -> Result<Output, BridgeError> {
        debug!("Running bridge {:?} {:?} {:?}", self.program, self.args, command);
        Command::new(&self.program)
            .args(&self.args)
            .args(command)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| BridgeError::Unavailable(format!("{}: {e}", self.program.display())))
    }
}

#[async_trait]
impl UsageStatsProvider for CommandProvider {
    async fn query_usage(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<UsageRecord>, BridgeError> {
        let output = self
            .run(&[
                "query".into(),
                start.timestamp_millis().to_string(),
                end.timestamp_millis().to_string(),
            ])
            .await?;

        if !output.status.success() {
            return Err(BridgeError::UsageStats(failure_reason(&output)));
        }

        parse_payload(&output.stdout)
            .map_err(|e| BridgeError::UsageStats(format!("malformed bridge payload: {e}")))
    }

    async fn open_settings(&self) -> Result<(), BridgeError> {
        let output = self.run(&["settings".into()]).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(BridgeError::ActivityUnavailable(failure_reason(&output)))
        }
    }
}

/// `null` is what the service hands out when it has no stats at all, so it's treated as empty.
fn parse_payload(payload: &[u8]) -> Result<Vec<UsageRecord>, serde_json::Error> {
    let stats = serde_json::from_slice::<Option<Vec<RawUsageStats>>>(payload)?;
    Ok(stats
        .unwrap_or_default()
        .into_iter()
        .filter_map(|raw| match raw.package_name {
            Some(package_name) => Some(UsageRecord {
                package_name,
                foreground_millis: raw.foreground_millis,
            }),
            None => {
                warn!("Bridge returned a record without a package name");
                None
            }
        })
        .collect())
}

fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("bridge exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::parse_payload;

    #[test]
    fn test_parse_payload_basic() -> Result<()> {
        let records = parse_payload(
            br#"[
                {"packageName": "com.a", "totalTimeInForeground": 125000},
                {"packageName": "com.b", "timeForeground": 60000}
            ]"#,
        )?;
        assert_eq!(records.len(), 2);
        assert_eq!(&*records[0].package_name, "com.a");
        assert_eq!(records[0].foreground_millis, 125000);
        assert_eq!(records[1].foreground_millis, 60000);
        Ok(())
    }

    #[test]
    fn test_parse_payload_null_and_missing_names() -> Result<()> {
        assert!(parse_payload(b"null")?.is_empty());
        let records = parse_payload(br#"[{"totalTimeInForeground": 5}, {"packageName": "x"}]"#)?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].foreground_millis, 0);
        Ok(())
    }

    #[test]
    fn test_parse_payload_rejects_garbage() {
        assert!(parse_payload(b"Could not open").is_err());
    }
}
