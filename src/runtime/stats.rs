// Resource usage from either the Engine API stats response or `docker stats` JSON lines.

use crate::error::{Result, ServiceError};
use crate::models::ResourceUsage;
use bollard::models::ContainerStatsResponse;
use serde::Deserialize;

/// Engine API stats sample -> ResourceUsage. `None` when cpu sections are missing.
pub(crate) fn usage_from_api(s: &ContainerStatsResponse) -> Option<ResourceUsage> {
    let cpu_stats = s.cpu_stats.as_ref()?;
    let precpu_stats = s.precpu_stats.as_ref()?;

    let cpu_usage = cpu_stats.cpu_usage.as_ref()?;
    let precpu_usage = precpu_stats.cpu_usage.as_ref()?;

    let cpu_delta =
        cpu_usage.total_usage.unwrap_or(0) as i64 - precpu_usage.total_usage.unwrap_or(0) as i64;
    let system_delta = cpu_stats.system_cpu_usage.unwrap_or(0) as i64
        - precpu_stats.system_cpu_usage.unwrap_or(0) as i64;
    let online = cpu_stats.online_cpus.unwrap_or(1) as f64;
    let cpu_percent = if system_delta > 0 && online > 0.0 {
        (cpu_delta as f64 / system_delta as f64) * online * 100.0
    } else {
        0.0
    };

    let memory_usage_bytes = s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0);
    let memory_limit_bytes = s.memory_stats.as_ref().and_then(|m| m.limit).unwrap_or(0);

    let (network_rx_bytes, network_tx_bytes) = s.networks.as_ref().map_or((0, 0), |n| {
        n.values().fold((0u64, 0u64), |(rx, tx), v| {
            (rx + v.rx_bytes.unwrap_or(0), tx + v.tx_bytes.unwrap_or(0))
        })
    });

    let (block_read_bytes, block_write_bytes) = s
        .blkio_stats
        .as_ref()
        .and_then(|b| b.io_service_bytes_recursive.as_ref())
        .map_or((0, 0), |entries| {
            let mut read = 0u64;
            let mut write = 0u64;
            for e in entries {
                match e.op.as_deref() {
                    Some(op) if op.eq_ignore_ascii_case("read") => read += e.value.unwrap_or(0),
                    Some(op) if op.eq_ignore_ascii_case("write") => write += e.value.unwrap_or(0),
                    _ => {}
                }
            }
            (read, write)
        });

    let pids = s.pids_stats.as_ref().and_then(|p| p.current).unwrap_or(0);

    Some(ResourceUsage {
        cpu_percent,
        memory_usage_bytes,
        memory_limit_bytes,
        network_rx_bytes,
        network_tx_bytes,
        block_read_bytes,
        block_write_bytes,
        pids,
    })
}

/// One line of `docker stats --no-stream --format '{{json .}}'`.
#[derive(Debug, Deserialize)]
struct CliStatsLine {
    #[serde(rename = "CPUPerc", default)]
    cpu_perc: String,
    #[serde(rename = "MemUsage", default)]
    mem_usage: String,
    #[serde(rename = "NetIO", default)]
    net_io: String,
    #[serde(rename = "BlockIO", default)]
    block_io: String,
    #[serde(rename = "PIDs", default)]
    pids: String,
}

/// Parses a human size as printed by docker ("1.5MiB", "12kB", "0B").
pub fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || s == "--" {
        return None;
    }
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(split);
    let value: f64 = num.parse().ok()?;
    let multiplier: f64 = match unit.trim() {
        "" | "B" => 1.0,
        "kB" | "KB" => 1e3,
        "MB" => 1e6,
        "GB" => 1e9,
        "TB" => 1e12,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some((value * multiplier).round() as u64)
}

fn parse_pair(s: &str) -> (u64, u64) {
    let mut parts = s.split('/');
    let a = parts.next().and_then(parse_size).unwrap_or(0);
    let b = parts.next().and_then(parse_size).unwrap_or(0);
    (a, b)
}

/// Parses the first JSON line of CLI stats output.
pub fn parse_cli_stats(output: &str) -> Result<ResourceUsage> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| ServiceError::Runtime("stats produced no output".into()))?;
    let parsed: CliStatsLine = serde_json::from_str(line).map_err(|e| ServiceError::Parse {
        what: "container stats".into(),
        source: e,
    })?;

    let cpu_percent = parsed
        .cpu_perc
        .trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .unwrap_or(0.0);
    let (memory_usage_bytes, memory_limit_bytes) = parse_pair(&parsed.mem_usage);
    let (network_rx_bytes, network_tx_bytes) = parse_pair(&parsed.net_io);
    let (block_read_bytes, block_write_bytes) = parse_pair(&parsed.block_io);
    let pids = parsed.pids.trim().parse().unwrap_or(0);

    Ok(ResourceUsage {
        cpu_percent,
        memory_usage_bytes,
        memory_limit_bytes,
        network_rx_bytes,
        network_tx_bytes,
        block_read_bytes,
        block_write_bytes,
        pids,
    })
}
