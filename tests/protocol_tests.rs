//! Keying Protocol Tests
//!
//! Tests for the Morse, teleprinter, pager and jammer machines.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test protocol_tests

use simradio_firmware::protocol::teleprinter::baudot;
use simradio_firmware::protocol::{
    BrownianDrift, Jammer, JammerTiming, Modulator, Morse, Pager, PagerPhase, PagerTiming, Teleprinter,
    TeleprinterTiming,
};
use simradio_firmware::types::{Millis, SimError, Transition};

/// Step `machine` every millisecond in `from..=to`, collecting edges
fn edges(machine: &mut impl Modulator, from: u32, to: u32) -> Vec<(u32, Transition)> {
    (from..=to)
        .filter_map(|t| {
            let tr = machine.step(Millis::new(t));
            match tr {
                Transition::LeaveOn | Transition::LeaveOff => None,
                _ => Some((t, tr)),
            }
        })
        .collect()
}

// =============================================================================
// Morse Tests
// =============================================================================

#[test]
fn morse_single_dit_timing() {
    let mut m = Morse::new(1);
    m.start("E", 20).unwrap();
    assert_eq!(
        edges(&mut m, 0, 400),
        vec![
            (0, Transition::TurnOn),
            (50, Transition::TurnOff),
            (200, Transition::MessageComplete),
        ]
    );
    assert!(m.is_complete());
    assert_eq!(m.step(Millis::new(500)), Transition::LeaveOff);
}

#[test]
fn morse_inter_character_gap_is_three_units() {
    let mut m = Morse::new(1);
    m.start("EE", 20).unwrap();
    let e = edges(&mut m, 0, 600);
    assert_eq!(e[1], (50, Transition::TurnOff));
    assert_eq!(e[2], (200, Transition::TurnOn));
}

#[test]
fn morse_word_gap_is_seven_units() {
    let mut m = Morse::new(1);
    m.start("E E", 20).unwrap();
    let e = edges(&mut m, 0, 800);
    assert_eq!(e[1], (50, Transition::TurnOff));
    assert_eq!(e[2], (400, Transition::TurnOn));
}

#[test]
fn morse_dah_is_three_dits() {
    let mut m = Morse::new(1);
    m.start("T", 10).unwrap();
    let e = edges(&mut m, 0, 1000);
    assert_eq!(e[0], (0, Transition::TurnOn));
    assert_eq!(e[1], (300, Transition::TurnOff));
}

#[test]
fn morse_empty_message_completes_once() {
    let mut m = Morse::new(1);
    m.start("   ", 20).unwrap();
    assert_eq!(m.step(Millis::new(0)), Transition::MessageComplete);
    assert_eq!(m.step(Millis::new(1)), Transition::LeaveOff);
    assert!(m.is_complete());
}

#[test]
fn morse_truncates_long_text() {
    let mut m = Morse::new(1);
    let long = "E".repeat(100);
    assert_eq!(m.start(&long, 20), Err(SimError::MessageTooLong));
    // Still sends what fit
    assert_eq!(m.step(Millis::new(0)), Transition::TurnOn);
}

#[test]
fn morse_sloppy_fist_keeps_rhythm_close() {
    let mut m = Morse::new(9).with_fist(200);
    m.start("E", 20).unwrap();
    let e = edges(&mut m, 0, 400);
    let off = e[1].0;
    assert!((40..=60).contains(&off));
}

// =============================================================================
// Teleprinter Tests
// =============================================================================

#[test]
fn baudot_letters_and_figures() {
    assert_eq!(baudot(b'E').0, 0x01);
    assert_eq!(baudot(b'e').0, 0x01);
    assert_eq!(baudot(b' ').0, 0x04);
    assert!(baudot(b'5').1.is_some());
}

#[test]
fn teleprinter_frame_timing() {
    let mut tp = Teleprinter::new(TeleprinterTiming::default());
    tp.start("E", false).unwrap();
    // Start bit (space), then bit 0 of E (mark), then four spaces, then stop
    assert_eq!(tp.step(Millis::new(0)), Transition::LeaveOff);
    assert_eq!(tp.step(Millis::new(22)), Transition::TurnOn);
    assert_eq!(tp.step(Millis::new(44)), Transition::TurnOff);
    assert_eq!(tp.step(Millis::new(132)), Transition::TurnOn);
    assert!(tp.is_complete());
}

#[test]
fn teleprinter_repeat_never_completes() {
    let mut tp = Teleprinter::new(TeleprinterTiming::default());
    tp.start("RY", true).unwrap();
    for t in 0..5000 {
        tp.step(Millis::new(t));
    }
    assert!(!tp.is_complete());
}

// =============================================================================
// Pager Tests
// =============================================================================

#[test]
fn pager_single_page() {
    let mut pager = Pager::new(PagerTiming::default(), 3);
    pager.start(false);
    assert_eq!(pager.phase(), PagerPhase::ToneA);
    assert_eq!(
        edges(&mut pager, 0, 6000),
        vec![
            (0, Transition::TurnOn),
            (1000, Transition::ChangeFrequency),
            (4000, Transition::TurnOff),
        ]
    );
    assert!(pager.is_complete());
    assert_eq!(pager.step(Millis::new(7000)), Transition::LeaveOff);
}

#[test]
fn pager_idle_until_started() {
    let mut pager = Pager::new(PagerTiming::default(), 3);
    assert_eq!(pager.step(Millis::new(0)), Transition::LeaveOff);
    assert!(!pager.is_transmitting());
}

// =============================================================================
// Jammer Tests
// =============================================================================

#[test]
fn drift_clamps_and_bounces() {
    let timing = JammerTiming::default();
    let mut drift = BrownianDrift::new(1990.0, 40.0);
    drift.advance(0.5, &timing);
    assert!((drift.offset_hz() - timing.max_drift_hz).abs() < f32::EPSILON);
    assert!(drift.velocity() < 0.0);

    let mut drift = BrownianDrift::new(-1990.0, -40.0);
    drift.advance(-0.5, &timing);
    assert!((drift.offset_hz() + timing.max_drift_hz).abs() < f32::EPSILON);
    assert!(drift.velocity() > 0.0);
}

#[test]
fn jammer_mutes_sometimes_and_never_completes() {
    let mut j = Jammer::new(JammerTiming::default(), 1234);
    j.start();
    let e = edges(&mut j, 0, 20_000);
    assert_eq!(e[0], (0, Transition::TurnOn));
    assert!(e.iter().any(|&(_, t)| t == Transition::TurnOff));
    assert!(!j.is_complete());
}
