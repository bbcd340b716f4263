//! SoC services: free memory and full device reset.
//!
//! On ESP-IDF `restart` never returns.  On the host it only logs; the
//! boot loop in `main` then rebuilds the device from scratch.

use crate::app::ports::SystemPort;
use crate::error::Fatal;

#[derive(Debug, Default)]
pub struct SystemAdapter {
    restarts: u32,
}

impl SystemAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets requested so far (always 0 on hardware, where the first
    /// one does not return).
    pub fn restarts(&self) -> u32 {
        self.restarts
    }
}

#[cfg(target_os = "espidf")]
impl SystemPort for SystemAdapter {
    fn free_memory(&self) -> u32 {
        unsafe { esp_idf_svc::sys::esp_get_free_heap_size() }
    }

    fn restart(&mut self, reason: Fatal) {
        log::error!("system: restarting ({})", reason);
        self.restarts += 1;
        unsafe { esp_idf_svc::sys::esp_restart() }
    }
}

#[cfg(not(target_os = "espidf"))]
impl SystemPort for SystemAdapter {
    fn free_memory(&self) -> u32 {
        std::fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|text| parse_mem_available(&text))
            .unwrap_or(0)
    }

    fn restart(&mut self, reason: Fatal) {
        self.restarts += 1;
        log::error!("system(sim): restart #{} ({})", self.restarts, reason);
    }
}

/// `MemAvailable` from a `/proc/meminfo` dump, in bytes.
#[cfg(not(target_os = "espidf"))]
fn parse_mem_available(meminfo: &str) -> Option<u32> {
    let line = meminfo.lines().find(|l| l.starts_with("MemAvailable:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(u32::try_from(kib.saturating_mul(1024)).unwrap_or(u32::MAX))
}
