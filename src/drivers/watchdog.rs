//! SoC task watchdog (TWDT).
//!
//! Backstop for hangs inside blocking driver calls, which the
//! cooperative liveness watchdog cannot see because the supervisor
//! never yields.  The supervisor task calls `feed()` on every iteration.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Watchdog {
    /// Reconfigure the TWDT to `timeout_secs` and subscribe the calling
    /// task.  A failed subscription is logged and `feed()` becomes a no-op.
    pub fn new(timeout_secs: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms: timeout_secs.saturating_mul(1000),
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!("TWDT reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    log::info!("Watchdog: subscribed ({}s timeout)", timeout_secs);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }
                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): {}s timeout, no-op", timeout_secs);
            Self {}
        }
    }

    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}
