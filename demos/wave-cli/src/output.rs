//! Styled output for devices, energy records and command results

use bradford_white_wave::{DeviceStatus, EnergyUsage, WriteResponse};
use console::style;

/// One-line summary per device
pub fn display_devices(devices: &[DeviceStatus]) {
    if devices.is_empty() {
        println!("{}", style("No devices on this account").dim());
        return;
    }
    for device in devices {
        println!(
            "  {} {} {}",
            style(&device.friendly_name).cyan().bold(),
            style(device.mac_address.as_str()).dim(),
            style(format!("SN {}", device.serial_number)).dim()
        );
    }
}

/// Full status block for one device
pub fn display_status(status: &DeviceStatus) {
    println!();
    println!(
        "{} ({})",
        style(&status.friendly_name).cyan().bold(),
        status.mac_address
    );
    println!("  {} {}", style("Serial:").dim(), status.serial_number);
    if let Some(setpoint) = status.setpoint_fahrenheit {
        println!("  {} {setpoint}°F", style("Setpoint:").dim());
    }
    if let Some(ref mode) = status.mode {
        println!("  {} {mode}", style("Mode:").dim());
    }
    if let Some(heat_mode) = status.heat_mode_value {
        println!("  {} {heat_mode}", style("Heat mode:").dim());
    }
    if let Some(ref kind) = status.appliance_type {
        println!("  {} {kind}", style("Type:").dim());
    }
}

/// Energy records with a total line
pub fn display_energy(records: &[EnergyUsage]) {
    if records.is_empty() {
        println!("{}", style("Energy usage: no data returned").dim());
        return;
    }

    println!(
        "{}",
        style("─── ENERGY (kWh) ──────────────────────────────────").dim()
    );
    for record in records {
        println!(
            "  {}  total {:>7.2}  heat pump {:>7.2}  element {:>7.2}",
            record.timestamp.format("%Y-%m-%d %H:%M"),
            record.total_energy,
            record.heat_pump_energy,
            record.element_energy
        );
    }
    let total: f64 = records.iter().map(|r| r.total_energy).sum();
    println!("  {} {total:.2} kWh", style("Total:").bold());
}

/// Result of a setpoint or mode change
pub fn display_write(response: &WriteResponse) {
    let status = if response.is_success() {
        style(response.status.as_str()).green().bold()
    } else {
        style(response.status.as_str()).yellow().bold()
    };
    println!("  {} {status}", style("Status:").dim());
    if let Some(requested) = response.requested_temperature {
        println!("  {} {requested}°F", style("Requested:").dim());
    }
    if let Some(actual) = response.actual_temperature {
        println!("  {} {actual}°F", style("Actual:").dim());
    }
}
