//! Snapshot data contracts for the `sys` and `proc` alert objects.
//!
//! Actual OS sampling lives outside this crate; an external sampler fills
//! these structs each poll cycle and hands them to the resolver. Sizes are
//! bytes, rates are bytes per second, percentages are 0-100.

use serde::Serialize;

use super::{FieldSource, FieldValue};

/// Host-wide resource snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemSnapshot {
    pub mem_used: f64,
    pub mem_free: f64,
    pub mem_percent: f64,
    pub cpu_percent: f64,
    pub disk_percent: f64,
    pub disk_read: f64,
    pub disk_write: f64,
    pub net_recv: f64,
    pub net_sent: f64,
}

impl FieldSource for SystemSnapshot {
    fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "mem_used" => self.mem_used,
            "mem_free" => self.mem_free,
            "mem_percent" => self.mem_percent,
            "cpu_percent" => self.cpu_percent,
            "disk_percent" => self.disk_percent,
            "disk_read" => self.disk_read,
            "disk_write" => self.disk_write,
            "net_recv" => self.net_recv,
            "net_sent" => self.net_sent,
            _ => return None,
        };
        Some(FieldValue::Num(value))
    }
}

/// Per-process resource snapshot for the watched process.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub name: String,
    pub mem_used: f64,
    pub mem_percent: f64,
    pub cpu_percent: f64,
    pub disk_read: f64,
    pub disk_write: f64,
}

impl FieldSource for ProcessSnapshot {
    fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "pid" => f64::from(self.pid),
            "mem_used" => self.mem_used,
            "mem_percent" => self.mem_percent,
            "cpu_percent" => self.cpu_percent,
            "disk_read" => self.disk_read,
            "disk_write" => self.disk_write,
            _ => return None,
        };
        Some(FieldValue::Num(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_snapshot_fields() {
        let sys = SystemSnapshot {
            cpu_percent: 42.0,
            ..SystemSnapshot::default()
        };
        assert_eq!(sys.field("cpu_percent"), Some(FieldValue::Num(42.0)));
        assert_eq!(sys.field("mem_free"), Some(FieldValue::Num(0.0)));
        assert!(sys.field("uptime").is_none());
    }

    #[test]
    fn test_process_snapshot_fields() {
        let proc = ProcessSnapshot {
            pid: 4242,
            name: "java".to_string(),
            mem_percent: 12.5,
            ..ProcessSnapshot::default()
        };
        assert_eq!(proc.field("pid"), Some(FieldValue::Num(4242.0)));
        assert_eq!(proc.field("mem_percent"), Some(FieldValue::Num(12.5)));
        assert!(proc.field("name").is_none());
    }
}
