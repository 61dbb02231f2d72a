// Behavioural tests for the device engine, driven the way the adapter and host drive it

use esplora_simulator::{Device, Level, MuxChannel, N_PINS, PinMode, PinState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

#[test]
fn test_output_high_reads_high_on_every_pin() {
    let device = Device::default();
    for pin in 0..N_PINS {
        device.set_mode(pin, PinMode::Output);
        device.set_digital_output(pin, Level::High);
        assert_eq!(device.read_digital(pin), Level::High, "pin {pin}");
    }
}

#[test]
fn test_floating_pullup_is_deterministic() {
    let device = Device::default();
    for pin in 0..N_PINS {
        device.set_mode(pin, PinMode::InputPullup);
        for _ in 0..20 {
            assert_eq!(device.read_digital(pin), Level::High);
        }
    }
}

#[test]
fn test_tone_period() {
    let device = Device::default();
    device.set_tone(5, 440);
    assert_eq!(device.pin(5).pwm_period_us, 2273);
}

#[test]
fn test_tone_countdown_expires_on_advance() {
    let device = Device::default();
    device.set_tone(5, 440);
    device.set_countdown(5, 1000);
    device.advance(1000);
    let pin = device.pin(5);
    assert!(!pin.is_tone_active);
    assert_eq!(pin.pwm_period_us, 0);
    assert_eq!(pin.pwm_high_time_us, 0);
}

#[test]
fn test_temperature_channel_mapping() {
    let device = Device::default();
    device.set_channel_voltage(MuxChannel::Temperature, 2.5);
    assert_eq!(device.get_channel_value(MuxChannel::Temperature), 512);
}

#[test]
fn test_injected_budget() {
    let device = Device::default();
    device.injector().set_forced_value(7, 3);
    for _ in 0..3 {
        assert_eq!(device.injector().next_draw(|| 0), 7);
        assert!(!device.injector().has_exceeded_budget());
    }
    assert_eq!(device.injector().next_draw(|| 0), 7);
    assert!(device.injector().has_exceeded_budget());
}

#[test]
fn test_injection_drives_floating_reads() {
    let device = Device::default();
    device.set_mode(2, PinMode::Input);
    device.injector().set_forced_value(1, 2);
    assert_eq!(device.read_digital(2), Level::High);
    assert_eq!(device.read_analog(2), 1);
    assert!(!device.injector().has_exceeded_budget());
    device.read_analog(2);
    assert!(device.injector().has_exceeded_budget());
}

#[test]
fn test_set_mode_twice_matches_once() {
    let once = Device::default();
    let twice = Device::default();
    for mode in [PinMode::Input, PinMode::InputPullup, PinMode::Output] {
        once.set_mode(9, mode);
        twice.set_mode(9, mode);
        twice.set_mode(9, mode);
        assert_eq!(once.pin(9), twice.pin(9));
    }
}

#[test]
fn test_suspend_blocks_advance_until_resume() {
    let device = Arc::new(Device::default());
    device.suspend();
    let done = Arc::new(AtomicBool::new(false));
    let worker = {
        let device = Arc::clone(&device);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            device.advance(500);
            done.store(true, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!done.load(Ordering::SeqCst));
    // time moves before the thread parks
    assert_eq!(device.elapsed_us(), 500);

    device.resume();
    worker.join().unwrap();
    assert!(done.load(Ordering::SeqCst));
    assert!(device.is_running());
}

#[test]
fn test_suspended_advance_ignores_shutdown_until_resume() {
    let device = Arc::new(Device::default());
    let rx = device.subscribe();
    device.suspend();
    let worker = {
        let device = Arc::clone(&device);
        thread::spawn(move || device.advance(100))
    };

    thread::sleep(Duration::from_millis(20));
    device.request_shutdown();
    thread::sleep(Duration::from_millis(50));
    assert!(!worker.is_finished());
    assert!(device.is_running());

    device.resume();
    worker.join().unwrap();
    assert!(!device.is_running());
    let last = rx.try_iter().last().unwrap();
    assert!(last.is_final);
    assert_eq!(last.elapsed_us, 100);
}

#[test]
fn test_shutdown_then_advances_never_block() {
    let device = Device::default();
    device.request_shutdown();
    assert!(device.is_running());
    device.advance(1);
    assert!(!device.is_running());
    assert!(device.is_fast_forward());

    device.suspend();
    for _ in 0..10 {
        device.advance(1);
    }
    assert!(device.is_suspended());
    assert_eq!(device.elapsed_us(), 11);
}

#[test]
fn test_snapshots_stop_after_final() {
    let device = Device::default();
    let rx = device.subscribe();
    device.advance(10);
    device.advance(10);
    device.request_shutdown();
    device.advance(10);
    device.advance(10);
    device.advance(10);

    let snaps: Vec<_> = rx.try_iter().collect();
    assert_eq!(snaps.len(), 3);
    assert_eq!(snaps.iter().filter(|s| s.is_final).count(), 1);
    let last = snaps.last().unwrap();
    assert!(last.is_final);
    assert!(!last.running);
    assert_eq!(last.elapsed_us, 30);
}

#[test]
fn test_final_snapshot_without_periodic_updates() {
    let mut config = esplora_shared::config::SimConfig::default();
    config.simulation.emit_snapshots = false;
    let device = Device::new(&config);
    let rx = device.subscribe();
    device.advance(5);
    device.request_shutdown();
    device.advance(5);
    let snaps: Vec<_> = rx.try_iter().collect();
    assert_eq!(snaps.len(), 1);
    assert!(snaps[0].is_final);
}

#[test]
fn test_host_reads_during_simulated_writes() {
    let device = Arc::new(Device::default());
    let writer = {
        let device = Arc::clone(&device);
        thread::spawn(move || {
            device.set_mode(9, PinMode::Output);
            for value in 1..=254u32 {
                device.set_pwm_duty_from_byte(9, value);
                device.advance(10);
            }
        })
    };
    for _ in 0..200 {
        let snap = device.snapshot();
        let pin = snap.pin(9).unwrap();
        assert!(pin.pwm_high_time_us <= pin.pwm_period_us);
        if pin.state == PinState::OutputPwm {
            assert!(pin.pwm_high_time_us > 0);
        }
    }
    writer.join().unwrap();
    assert_eq!(device.elapsed_us(), 2540);
}
