//! Graphics adapter check

use crate::config::{AppConfig, DriverType};
use crate::health::check::{CheckResult, SystemCheck};

/// Checks that wgpu offers an adapter suitable for the configured driver
///
/// The hardware driver wants a GPU adapter; the software driver wants a CPU
/// (fallback) adapter.
pub struct GraphicsBackendCheck;

fn device_type_name(device_type: wgpu::DeviceType) -> &'static str {
    match device_type {
        wgpu::DeviceType::DiscreteGpu => "Discrete GPU",
        wgpu::DeviceType::IntegratedGpu => "Integrated GPU",
        wgpu::DeviceType::VirtualGpu => "Virtual GPU",
        wgpu::DeviceType::Cpu => "CPU",
        wgpu::DeviceType::Other => "Other",
    }
}

impl SystemCheck for GraphicsBackendCheck {
    fn name(&self) -> &'static str {
        "Graphics Backend"
    }

    fn check(&self, config: &AppConfig) -> CheckResult {
        let driver = config.window.driver;
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapters: Vec<_> = instance
            .enumerate_adapters(wgpu::Backends::all())
            .into_iter()
            .collect();

        let mut details = vec![format!("configured driver: {driver}")];
        if adapters.is_empty() {
            details.push("✗ no adapters found".to_string());
            return CheckResult::fail("No graphics adapters available").with_details(details);
        }

        let mut cpu = 0;
        for (i, adapter) in adapters.iter().enumerate() {
            let info = adapter.get_info();
            if info.device_type == wgpu::DeviceType::Cpu {
                cpu += 1;
            }
            details.push(format!(
                "[{i}] {} - {} ({:?})",
                info.name,
                device_type_name(info.device_type),
                info.backend
            ));
        }
        let gpu = adapters.len() - cpu;

        match driver {
            DriverType::Hardware if gpu > 0 => {
                CheckResult::pass(format!("{gpu} GPU adapter(s) available")).with_details(details)
            }
            DriverType::Hardware => {
                CheckResult::warn("Only CPU adapters found; rendering will be slow")
                    .with_details(details)
            }
            DriverType::Software if cpu > 0 => {
                CheckResult::pass(format!("{cpu} CPU adapter(s) available")).with_details(details)
            }
            DriverType::Software => CheckResult::warn(
                "No CPU adapter listed; the software driver relies on the fallback adapter",
            )
            .with_details(details),
        }
    }
}
