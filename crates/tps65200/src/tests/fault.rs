use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{
    ChannelFilter, Error, Escalation, FaultChannel, FaultPhase, FaultState, HalError, Notifier,
    PlatformConfig,
};

use super::sim::{driver, driver_with, tick, SimDriver, ADDRESS, FAULT_LINE};

type Seen = Arc<Mutex<Vec<(FaultChannel, u8)>>>;

fn record(drv: &SimDriver) -> Seen {
    let seen: Seen = Arc::default();
    let sink = seen.clone();
    drv.register_notifier(Notifier::new("battery").on_fault(move |channel, value| {
        sink.lock().unwrap().push((channel, value));
    }))
    .unwrap();
    seen
}

#[test]
fn edge_masks_line_and_waits_for_debounce() {
    let (drv, chip, lines) = driver();

    assert!(drv.on_fault_interrupt());

    assert_eq!(lines.disables(FAULT_LINE), 1);
    for channel in FaultChannel::ALL {
        assert_eq!(drv.fault_state(channel).phase, FaultPhase::Pending);
    }
    assert_eq!(tick(&drv, 199), 0);
    assert!(chip.log().is_empty());
    assert_eq!(tick(&drv, 1), 1);
}

#[test]
fn over_voltage_escalation_polls_until_clear() {
    let (drv, chip, lines) = driver();
    let seen = record(&drv);
    // classify, confirm, confirm again while polling, then clear
    chip.script(0x08, &[0x40, 0x40, 0x40, 0x40, 0x40, 0x00, 0x00]);

    drv.on_fault_interrupt();
    tick(&drv, 200);
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(chip.reads(), [0x09, 0x08]);

    tick(&drv, 200);
    assert_eq!(*seen.lock().unwrap(), [(FaultChannel::Int1, 1)]);
    assert_eq!(
        drv.fault_state(FaultChannel::Int1),
        FaultState {
            latched: true,
            phase: FaultPhase::Confirmed
        }
    );

    // still set at the next poll: no repeat notification
    assert_eq!(tick(&drv, 4999), 0);
    tick(&drv, 1);
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(lines.enables(FAULT_LINE), 0);

    tick(&drv, 5000);
    assert_eq!(
        *seen.lock().unwrap(),
        [(FaultChannel::Int1, 1), (FaultChannel::Int1, 0)]
    );
    assert_eq!(drv.fault_state(FaultChannel::Int1).phase, FaultPhase::Cleared);
    assert!(!drv.fault_state(FaultChannel::Int1).latched);
    assert_eq!(lines.disables(FAULT_LINE), 1);
    assert_eq!(lines.enables(FAULT_LINE), 1);
    assert!(!drv.fault_in_flight());
    assert!(chip.writes().is_empty());

    // escalation over, nothing left scheduled
    assert_eq!(tick(&drv, 60_000), 0);
}

#[test]
fn over_voltage_gone_by_confirmation_is_cleared() {
    let (drv, chip, lines) = driver();
    let seen = record(&drv);
    chip.script(0x08, &[0x40]);

    drv.on_fault_interrupt();
    tick(&drv, 200);
    tick(&drv, 200);

    assert_eq!(*seen.lock().unwrap(), [(FaultChannel::Int1, 0)]);
    assert_eq!(lines.enables(FAULT_LINE), 1);
}

#[test]
fn reverse_current_resets_charger_and_notifies_once() {
    let (drv, chip, lines) = driver();
    let seen = record(&drv);
    drv.set_status_monitoring(true);
    chip.script(0x09, &[0x80, 0x80, 0x80]);

    drv.on_fault_interrupt();
    tick(&drv, 200);

    assert_eq!(chip.reads_of(0x09), 3);
    assert_eq!(chip.reads_of(0x08), 0);
    assert_eq!(chip.writes(), [(0x01, 0x29), (0x00, 0x28)]);
    assert!(!drv.status_monitoring());
    assert_eq!(*seen.lock().unwrap(), [(FaultChannel::Int2, 1)]);
    assert_eq!(drv.fault_state(FaultChannel::Int2).phase, FaultPhase::Confirmed);
    assert_eq!(drv.fault_state(FaultChannel::Int1).phase, FaultPhase::Idle);
    assert_eq!(lines.disables(FAULT_LINE), 1);
    assert_eq!(lines.enables(FAULT_LINE), 1);
    assert_eq!(tick(&drv, 10_000), 0);
}

#[test]
fn fault_without_bits_is_anomalous() {
    let (drv, chip, lines) = driver();
    let seen = record(&drv);

    drv.on_fault_interrupt();
    drv.advance(Duration::from_millis(200));
    assert_eq!(drv.pending_work(), 1);
    assert_eq!(drv.fault_recheck(), Escalation::Anomalous);

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(chip.reads(), [0x09, 0x08]);
    assert_eq!(lines.enables(FAULT_LINE), 1);
    for channel in FaultChannel::ALL {
        assert_eq!(drv.fault_state(channel).phase, FaultPhase::Idle);
    }
    // the queued recheck was cancelled with the escalation
    assert_eq!(drv.pending_work(), 0);
}

#[test]
fn bus_errors_read_as_clear() {
    let (drv, chip, lines) = driver();
    chip.set(0x08, 0x40);
    chip.set(0x09, 0x80);
    chip.fail_reads_of(0x08);
    chip.fail_reads_of(0x09);

    drv.on_fault_interrupt();
    drv.advance(Duration::from_millis(200));

    assert_eq!(drv.fault_recheck(), Escalation::Anomalous);
    assert_eq!(lines.enables(FAULT_LINE), 1);
}

#[test]
fn edge_during_escalation_is_ignored() {
    let (drv, chip, lines) = driver();
    chip.script(0x08, &[0x40, 0x40, 0x40]);

    assert!(drv.on_fault_interrupt());
    tick(&drv, 200);
    tick(&drv, 200);
    assert!(drv.fault_in_flight());

    assert!(!drv.on_fault_interrupt());
    assert_eq!(lines.disables(FAULT_LINE), 1);
    assert_eq!(drv.fault_state(FaultChannel::Int1).phase, FaultPhase::Confirmed);
}

#[test]
fn shutdown_mid_escalation_unmasks_the_line() {
    let (drv, chip, lines) = driver();
    drv.start().unwrap();
    chip.script(0x08, &[0x40, 0x40, 0x40]);

    assert!(drv.on_fault_interrupt());
    tick(&drv, 200);
    tick(&drv, 200);
    assert_eq!(drv.fault_state(FaultChannel::Int1).phase, FaultPhase::Confirmed);

    drv.shutdown().unwrap();

    assert!(!drv.fault_in_flight());
    assert_eq!(lines.disables(FAULT_LINE), 1);
    assert_eq!(lines.enables(FAULT_LINE), 1);
    assert_eq!(drv.fault_recheck(), Escalation::Idle);

    drv.start().unwrap();
    tick(&drv, 60_000);
    assert!(drv.on_fault_interrupt());
    assert_eq!(lines.disables(FAULT_LINE), 2);
}

#[test]
fn shutdown_reports_a_line_left_masked() {
    let (drv, chip, lines) = driver();
    chip.script(0x08, &[0x40]);
    lines.stick_masked(FAULT_LINE);

    drv.on_fault_interrupt();
    assert_eq!(tick(&drv, 200), 1);
    assert!(drv.fault_in_flight());

    assert_eq!(
        drv.shutdown(),
        Err(Error::Interrupt(HalError::HardwareError))
    );
    assert!(!drv.fault_in_flight());
    // the shunt monitor is still switched off
    assert_eq!(chip.writes().last(), Some(&(0x00, 0x00)));
}

#[test]
fn new_escalation_notifies_again() {
    let (drv, chip, lines) = driver();
    let seen = record(&drv);
    chip.script(0x09, &[0x80, 0x80, 0x80, 0x80, 0x80, 0x80]);

    for _ in 0..2 {
        drv.on_fault_interrupt();
        tick(&drv, 200);
    }

    assert_eq!(seen.lock().unwrap().len(), 2);
    assert_eq!(lines.disables(FAULT_LINE), 2);
    assert_eq!(lines.enables(FAULT_LINE), 2);
}

#[test]
fn filtered_notifier_only_hears_its_channel() {
    let (drv, chip, _) = driver();
    let int2_only: Seen = Arc::default();
    let sink = int2_only.clone();
    drv.register_notifier(
        Notifier::new("usb")
            .channels(ChannelFilter::Only(FaultChannel::Int2))
            .on_fault(move |channel, value| sink.lock().unwrap().push((channel, value))),
    )
    .unwrap();
    chip.script(0x08, &[0x40, 0x40, 0x40]);

    drv.on_fault_interrupt();
    tick(&drv, 200);
    tick(&drv, 200);

    assert_eq!(drv.fault_state(FaultChannel::Int1).phase, FaultPhase::Confirmed);
    assert!(int2_only.lock().unwrap().is_empty());
}

#[test]
fn without_fault_line_edges_are_dropped() {
    let config = PlatformConfig::builder(ADDRESS).build();
    let (drv, _, lines) = driver_with(config);

    assert!(!drv.on_fault_interrupt());
    assert_eq!(drv.fault_recheck(), Escalation::Idle);
    assert!(lines.calls().is_empty());
}

#[test]
fn recheck_without_escalation_is_idle() {
    let (drv, chip, _) = driver();

    assert_eq!(drv.fault_recheck(), Escalation::Idle);
    assert!(chip.log().is_empty());
}
