//! System operations like suspension and desktop notifications

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use tokio::process::Command;
use tracing::{debug, info};

use super::ports::{Clock, Notifier, Suspender};

/// Suspends the machine through `systemctl suspend`
#[derive(Debug, Clone, Copy, Default)]
pub struct Systemctl;

#[async_trait]
impl Suspender for Systemctl {
    async fn suspend(&self) -> Result<(), String> {
        execute_system_suspend().await
    }
}

/// Sends desktop notifications through `notify-send`
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifySend;

#[async_trait]
impl Notifier for NotifySend {
    async fn notify(&self, title: &str, message: &str) -> Result<(), String> {
        debug!("Sending notification: {}: {}", title, message);

        let output = Command::new("notify-send")
            .args([title, message])
            .output()
            .await
            .map_err(|e| format!("Failed to execute notify-send: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("notify-send failed: {}", stderr));
        }

        Ok(())
    }
}

/// Local time of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Execute system suspension
pub async fn execute_system_suspend() -> Result<(), String> {
    info!("Executing system suspension");

    // -i ignores inhibitor locks held by other sessions
    let output = Command::new("systemctl")
        .args(["suspend", "-i"])
        .output()
        .await
        .map_err(|e| format!("Failed to execute systemctl suspend: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("systemctl suspend failed: {}", stderr));
    }

    info!("System suspension command executed");
    Ok(())
}

/// Check if systemctl is available on the system
pub async fn check_systemctl_available() -> Result<(), String> {
    Command::new("systemctl")
        .arg("--version")
        .output()
        .await
        .map_err(|_| "systemctl is not available. Suspension requires systemd.".to_string())?;

    info!("systemctl is available");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_clock_tracks_wall_time() {
        let before = Local::now().naive_local();
        let now = LocalClock.now();
        let after = Local::now().naive_local();
        assert!(before <= now && now <= after);
    }
}
