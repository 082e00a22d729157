//! End-to-end logging over the simulated device manager.

use std::fs;
use std::time::{Duration, Instant};

use mvlog_core::{DeviceConfig, Monitor, Result, SimDeviceManager};

fn monitor_with_bench() -> Result<(Monitor, Vec<mvlog_types::DeviceId>)> {
    let mut monitor = Monitor::new(Box::new(SimDeviceManager::new()), Duration::from_secs(1));

    let meter = monitor.add_device(&DeviceConfig::port("multimeter", "sim0"))?;
    let mux = monitor.add_device(&DeviceConfig::port("multiplexer", "sim1"))?;
    let probe = monitor.add_device(&DeviceConfig::channel("thermometer", mux, 1))?;

    Ok((monitor, vec![meter, mux, probe]))
}

#[test]
fn a_session_saves_plausible_rows_in_display_order() -> Result<()> {
    let (mut monitor, ids) = monitor_with_bench()?;
    let meter = ids[0];

    // The carrier gets no dashboard row; the meter and the probe do.
    assert_eq!(monitor.registry().len(), 2);
    assert_eq!(
        monitor.registry().get(meter).map(|e| e.label.as_str()),
        Some("multimeter on sim0")
    );

    monitor.start_measurement();
    let start = Instant::now();
    monitor.start_logging(start);
    for millis in (0..=3200).step_by(50) {
        monitor.tick(start + Duration::from_millis(millis));
    }
    monitor.stop_logging();

    let dir = tempfile::tempdir().unwrap();
    let written = monitor.save_log(&dir.path().join("session"))?;
    assert_eq!(written, dir.path().join("session.csv"));
    assert!(!monitor.has_unsaved_log());

    let contents = fs::read_to_string(&written).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    for line in lines {
        let fields: Vec<&str> = line.split(',').collect();
        // Two columns, each terminated by a comma.
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[2], "");

        // Voltage column in base units: 330 mV give or take the jitter.
        let volts: f64 = fields[0].parse().unwrap();
        assert!((0.3249..=0.3351).contains(&volts), "volts = {volts}");

        // Temperature column: 21.5 C give or take the jitter.
        let degrees: f64 = fields[1].parse().unwrap();
        assert!((21.09..=21.91).contains(&degrees), "degrees = {degrees}");
    }
    Ok(())
}

#[test]
fn removing_the_carrier_sweeps_its_channels_off_the_dashboard() -> Result<()> {
    let (mut monitor, ids) = monitor_with_bench()?;
    let (meter, mux, probe) = (ids[0], ids[1], ids[2]);

    monitor.remove_device(mux)?;
    let report = monitor.tick(Instant::now());

    // The probe went down with its carrier; reconciliation notices.
    assert_eq!(report.removed, vec![probe]);
    assert!(monitor.registry().contains(meter));
    assert_eq!(monitor.registry().len(), 1);
    assert_eq!(monitor.manager().device_ids(), vec![meter]);
    Ok(())
}

#[test]
fn stopping_measurement_freezes_the_displayed_values() -> Result<()> {
    let (mut monitor, ids) = monitor_with_bench()?;
    let meter = ids[0];

    monitor.start_measurement();
    monitor.tick(Instant::now());
    let frozen = monitor.registry().get(meter).and_then(|e| e.last.clone());
    assert!(frozen.is_some());

    monitor.stop_measurement();
    monitor.tick(Instant::now());
    monitor.tick(Instant::now());

    let after = monitor.registry().get(meter).and_then(|e| e.last.clone());
    assert_eq!(frozen, after);
    Ok(())
}

#[test]
fn closing_the_last_channel_releases_the_carrier() -> Result<()> {
    let (mut monitor, ids) = monitor_with_bench()?;
    let (meter, mux, probe) = (ids[0], ids[1], ids[2]);

    monitor.remove_device(probe)?;
    monitor.tick(Instant::now());

    // With its only subdevice gone the carrier is released too.
    let remaining = monitor.manager().device_ids();
    assert_eq!(remaining, vec![meter]);
    assert!(!remaining.contains(&mux));
    Ok(())
}
