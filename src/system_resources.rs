use log::{info, warn};
use sysinfo::{System, SystemExt};

// sysinfo 0.29 reports memory in bytes.
const BYTES_TO_GB: f32 = 1024.0 * 1024.0 * 1024.0;

/// Below this, loading even the small checkpoint may push the host into swap.
pub const LOW_MEMORY_THRESHOLD_GB: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SystemResources {
    pub cpu_core_count: usize,
    pub ram_total_gb: f32,
    pub ram_available_gb: f32,
}

impl SystemResources {
    pub fn snapshot() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu();

        Self {
            cpu_core_count: sys.cpus().len(),
            ram_total_gb: sys.total_memory() as f32 / BYTES_TO_GB,
            ram_available_gb: sys.available_memory() as f32 / BYTES_TO_GB,
        }
    }

    pub fn is_memory_low(&self) -> bool {
        self.ram_available_gb < LOW_MEMORY_THRESHOLD_GB
    }

    pub fn log_summary(&self) {
        info!(
            "Host: {} logical cores, {:.1} GB RAM available of {:.1} GB",
            self.cpu_core_count, self.ram_available_gb, self.ram_total_gb
        );
        if self.is_memory_low() {
            warn!(
                "Only {:.2} GB RAM available; model loading may be slow",
                self.ram_available_gb
            );
        }
    }
}
