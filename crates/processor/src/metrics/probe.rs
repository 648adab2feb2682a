//! Host resource probes

use sysinfo::System;

/// Host utilization at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceUsage {
    /// Global CPU usage in percent
    pub cpu_percent: f64,
    /// Used memory as percent of total
    pub memory_percent: f64,
}

/// Source of host utilization figures
pub trait ResourceProbe: Send {
    fn sample(&mut self) -> ResourceUsage;
}

/// Probe backed by `sysinfo`
///
/// CPU usage is measured between consecutive refreshes, so the first sample
/// covers the time since the probe was created.
pub struct SystemProbe {
    system: System,
}

impl SystemProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self { system }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProbe for SystemProbe {
    fn sample(&mut self) -> ResourceUsage {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let memory_percent = if total > 0 {
            self.system.used_memory() as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        ResourceUsage {
            cpu_percent: f64::from(self.system.global_cpu_usage()),
            memory_percent,
        }
    }
}

/// Probe that always reports the same figures
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticProbe(pub ResourceUsage);

impl ResourceProbe for StaticProbe {
    fn sample(&mut self) -> ResourceUsage {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_probe_reports_percentages() {
        let mut probe = SystemProbe::new();
        let usage = probe.sample();

        assert!(usage.cpu_percent >= 0.0);
        assert!((0.0..=100.0).contains(&usage.memory_percent));
    }

    #[test]
    fn test_static_probe() {
        let usage = ResourceUsage {
            cpu_percent: 12.5,
            memory_percent: 40.0,
        };
        assert_eq!(StaticProbe(usage).sample(), usage);
    }
}
