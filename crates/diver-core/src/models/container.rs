//! Container listing and resource sampling types.
//!
//! Field names follow the Docker Engine API that UCP proxies.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Names", default)]
    pub names: Vec<String>,
    #[serde(rename = "Image", default)]
    pub image: String,
    #[serde(rename = "State", default)]
    pub state: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
}

impl Container {
    pub fn short_id(&self) -> &str {
        super::short_id(&self.id)
    }

    /// Container name without the leading slash or the node prefix.
    /// UCP schedules across nodes and reports names as `/<node>/<name>`.
    pub fn display_name(&self) -> String {
        match self.names.first() {
            Some(name) => {
                let trimmed = name.trim_start_matches('/');
                match trimmed.split_once('/') {
                    Some((_, rest)) => rest.to_string(),
                    None => trimmed.to_string(),
                }
            }
            None => self.short_id().to_string(),
        }
    }

    /// Node the container runs on, when the name carries one
    pub fn node(&self) -> Option<String> {
        let name = self.names.first()?;
        name.trim_start_matches('/')
            .split_once('/')
            .map(|(node, _)| node.to_string())
    }

    pub fn is_running(&self) -> bool {
        self.state.as_deref() == Some("running")
    }
}

/// One-shot stats sample from `GET /containers/{id}/stats?stream=false`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerStats {
    #[serde(default)]
    pub cpu_stats: CpuStats,
    #[serde(default)]
    pub precpu_stats: CpuStats,
    #[serde(default)]
    pub memory_stats: MemoryStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuStats {
    #[serde(default)]
    pub cpu_usage: CpuUsage,
    #[serde(default)]
    pub system_cpu_usage: Option<u64>,
    #[serde(default)]
    pub online_cpus: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuUsage {
    #[serde(default)]
    pub total_usage: u64,
    #[serde(default)]
    pub percpu_usage: Option<Vec<u64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryStats {
    #[serde(default)]
    pub usage: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl ContainerStats {
    /// CPU usage as a percentage of one CPU, the same figure `docker stats` shows
    pub fn cpu_percent(&self) -> f64 {
        let cpu_delta = self
            .cpu_stats
            .cpu_usage
            .total_usage
            .saturating_sub(self.precpu_stats.cpu_usage.total_usage);
        let system_delta = self
            .cpu_stats
            .system_cpu_usage
            .unwrap_or(0)
            .saturating_sub(self.precpu_stats.system_cpu_usage.unwrap_or(0));

        if cpu_delta == 0 || system_delta == 0 {
            return 0.0;
        }

        let cpus = self
            .cpu_stats
            .online_cpus
            .filter(|n| *n > 0)
            .map(f64::from)
            .or_else(|| {
                self.cpu_stats
                    .cpu_usage
                    .percpu_usage
                    .as_ref()
                    .filter(|v| !v.is_empty())
                    .map(|v| v.len() as f64)
            })
            .unwrap_or(1.0);

        (cpu_delta as f64 / system_delta as f64) * cpus * 100.0
    }
}

/// A container paired with its sampled usage, as shown by `containers top`.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerUsage {
    pub id: String,
    pub name: String,
    pub node: Option<String>,
    pub image: String,
    pub cpu_percent: f64,
    pub memory_bytes: Option<u64>,
}

impl ContainerUsage {
    pub fn new(container: &Container, stats: &ContainerStats) -> Self {
        Self {
            id: container.short_id().to_string(),
            name: container.display_name(),
            node: container.node(),
            image: container.image.clone(),
            cpu_percent: stats.cpu_percent(),
            memory_bytes: stats.memory_stats.usage,
        }
    }
}
