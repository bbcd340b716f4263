//! PinBridge firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  MqttBroker      HostLink       GpioBank      SystemAdapter  │
//! │  (BrokerPort)    (LinkPort)     (OutputBank)  (SystemPort)   │
//! │  StatusLed (IndicatorPort)                                   │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  Supervisor · Router · Interpreter · Reporter          │  │
//! │  │  Liveness watchdog                                     │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  runtime: edge-executor tasks on one thread                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Context, Result};
use log::{info, warn};

use pinbridge::adapters::device_id;
use pinbridge::adapters::link::HostLink;
use pinbridge::adapters::mqtt::MqttBroker;
use pinbridge::adapters::system::SystemAdapter;
use pinbridge::config::DeviceConfig;
use pinbridge::runtime::{self, Device};

/// Environment variable naming the JSON config file.
const CONFIG_ENV: &str = "PINBRIDGE_CONFIG";

fn init_logging() -> Result<()> {
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }

    #[cfg(not(target_os = "espidf"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    Ok(())
}

fn load_config() -> Result<DeviceConfig> {
    let path = std::env::var_os(CONFIG_ENV)
        .map(std::path::PathBuf::from)
        .or_else(|| std::env::args_os().nth(1).map(std::path::PathBuf::from));

    match path {
        Some(path) => DeviceConfig::load(&path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => {
            warn!("no config given ({} or first argument), using defaults", CONFIG_ENV);
            Ok(DeviceConfig::default())
        }
    }
}

// ── Output lines ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod board {
    use anyhow::Result;
    use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, PinDriver};
    use esp_idf_svc::hal::ledc::config::TimerConfig;
    use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::units::Hertz;
    use pinbridge::drivers::gpio::GpioBank;
    use pinbridge::drivers::status_led::StatusLed;

    pub type Line = PinDriver<'static, AnyOutputPin, Output>;

    fn line(gpio: u8) -> Result<Line> {
        // SAFETY: each GPIO is claimed once per boot and nothing else in
        // the firmware drives the configured lines.
        let pin = unsafe { AnyOutputPin::new(i32::from(gpio)) };
        Ok(PinDriver::output(pin)?)
    }

    pub fn outputs(pins: &[u8]) -> Result<GpioBank<Line>> {
        let lines = pins.iter().map(|&g| line(g)).collect::<Result<Vec<_>>>()?;
        Ok(GpioBank::new(lines))
    }

    /// LEDC timer 0 with channels 0..=2.  Called once: the restart at the
    /// end of a boot does not return on hardware.
    pub fn status_led(gpios: Option<[u8; 3]>) -> Result<StatusLed<LedcDriver<'static>>> {
        let Some([r, g, b]) = gpios else {
            return Ok(StatusLed::new(None));
        };
        let p = Peripherals::take()?;
        let config = TimerConfig::default()
            .frequency(Hertz(5_000))
            .resolution(Resolution::Bits8);
        // Channels must not outlive their timer; the LED lives until restart.
        let timer = &*Box::leak(Box::new(LedcTimerDriver::new(p.ledc.timer0, &config)?));

        // SAFETY: the LED GPIOs are claimed once and are not output lines.
        let (r, g, b) = unsafe {
            (
                AnyOutputPin::new(i32::from(r)),
                AnyOutputPin::new(i32::from(g)),
                AnyOutputPin::new(i32::from(b)),
            )
        };
        let red = LedcDriver::new(p.ledc.channel0, timer, r)?;
        let green = LedcDriver::new(p.ledc.channel1, timer, g)?;
        let blue = LedcDriver::new(p.ledc.channel2, timer, b)?;
        Ok(StatusLed::new(Some([red, green, blue])))
    }
}

#[cfg(not(target_os = "espidf"))]
mod board {
    use anyhow::Result;
    use pinbridge::drivers::gpio::{GpioBank, SimLine};
    use pinbridge::drivers::status_led::{SimPwm, StatusLed};

    pub fn outputs(pins: &[u8]) -> Result<GpioBank<SimLine>> {
        Ok(GpioBank::new(pins.iter().map(|&g| SimLine::new(g))))
    }

    pub fn status_led(gpios: Option<[u8; 3]>) -> Result<StatusLed<SimPwm>> {
        Ok(StatusLed::new(gpios.map(|rgb| rgb.map(SimPwm::new))))
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_logging()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PinBridge v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config()?;
    info!(
        "MAC {} · client '{}' · {} lines under '{}'",
        device_id::format_mac(&config.mac),
        config.client_id(),
        config.pin_count(),
        config.topic_prefix
    );

    // Each pass is one boot.  On hardware the restart at the end of
    // `runtime::run` never returns; on the host the device is rebuilt.
    let mut boot: u32 = 0;
    loop {
        boot += 1;
        info!("boot #{}", boot);

        let mut outputs = board::outputs(&config.pins)?;
        outputs.all_low();

        let device = Device {
            broker: MqttBroker::new(&config),
            link: HostLink::new(&config.broker_host, config.broker_port),
            outputs,
            system: SystemAdapter::new(),
            indicator: board::status_led(config.status_led)?,
        };

        let halt = runtime::run(&config, device);
        info!(
            "boot #{} ended: {} (pins {}, counters {})",
            boot,
            halt.fatal,
            halt.state.ports_string(),
            halt.state.counters
        );
    }
}
