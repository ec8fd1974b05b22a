//! Cooperative foreground loop: command handling, failsafe and the periodic
//! tasks.
//!
//! Each [`Controller::poll`] performs, in order:
//!
//! 1. drain the link into the command parser
//! 2. apply every pending command and stamp the command time
//! 3. force the motor target to zero if commands have been stale for longer
//!    than the failsafe timeout
//! 4. run each periodic task whose period elapsed: motor state machine,
//!    speed measurement, telemetry
//!
//! Nothing blocks; a poll finishes in bounded time.

use embedded_hal::pwm::SetDutyCycle;

use crate::command::CommandReader;
use crate::config::{ControllerConfig, DriveConfig};
use crate::imu::InertialSensor;
use crate::motor::Motor;
use crate::registers::ShadowRegisters;
use crate::servo::SteeringServo;
use crate::speedometer::{PulseCounter, Speedometer};
use crate::telemetry;
use crate::transport::Link;

/// Fixed-period task gate on the microsecond clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeriodicTask {
    period_us: u32,
    last_run_us: u32,
}

impl PeriodicTask {
    /// First run is due one period after `now_us`.
    #[must_use]
    pub const fn new(period_us: u32, now_us: u32) -> Self {
        Self {
            period_us,
            last_run_us: now_us,
        }
    }

    /// Returns `true` and restarts the period if it has elapsed.
    pub fn poll(&mut self, now_us: u32) -> bool {
        if now_us.wrapping_sub(self.last_run_us) >= self.period_us {
            self.last_run_us = now_us;
            true
        } else {
            false
        }
    }
}

/// The outputs and sensors the controller drives.
pub struct Hardware<M, S, C, I> {
    pub motor: M,
    pub servo: S,
    pub wheel_counter: C,
    pub imu: I,
}

pub struct Controller<M, S, C, I> {
    config: ControllerConfig,
    reader: CommandReader,
    motor: Motor<M>,
    servo: SteeringServo<S>,
    speedometer: Speedometer<C>,
    imu: I,
    last_speed_m_s: f32,
    last_command_ms: u32,
    failsafe_active: bool,
    motor_task: PeriodicTask,
    speed_task: PeriodicTask,
    telemetry_task: PeriodicTask,
    telemetry_skipped: u32,
    telemetry_dropped: u32,
}

impl<M, S, C, I> Controller<M, S, C, I>
where
    M: SetDutyCycle,
    S: SetDutyCycle,
    C: PulseCounter,
    I: InertialSensor,
{
    /// Put the motor at neutral and the servo at center, and start every
    /// timer from the given instant.
    pub fn new(hw: Hardware<M, S, C, I>, config: DriveConfig, now_us: u32, now_ms: u32) -> Self {
        let c = config.controller;
        Self {
            config: c,
            reader: CommandReader::new(),
            motor: Motor::new(hw.motor, config.motor),
            servo: SteeringServo::new(hw.servo, config.servo),
            speedometer: Speedometer::new(hw.wheel_counter, config.speedometer, now_ms),
            imu: hw.imu,
            last_speed_m_s: 0.0,
            last_command_ms: now_ms,
            failsafe_active: false,
            motor_task: PeriodicTask::new(c.motor_period_us, now_us),
            speed_task: PeriodicTask::new(c.speed_period_us, now_us),
            telemetry_task: PeriodicTask::new(c.telemetry_period_us, now_us),
            telemetry_skipped: 0,
            telemetry_dropped: 0,
        }
    }

    /// One iteration of the foreground loop.
    pub fn poll<L: Link>(&mut self, link: &L, now_us: u32, now_ms: u32) {
        self.reader.poll(link);
        self.apply_command(now_ms);
        self.check_failsafe(now_ms);

        if self.motor_task.poll(now_us) {
            self.motor.tick(now_ms);
        }
        if self.speed_task.poll(now_us) {
            self.last_speed_m_s = self.speedometer.update(now_ms);
        }
        if self.telemetry_task.poll(now_us) {
            self.send_telemetry(link, now_ms);
        }
    }

    fn apply_command(&mut self, now_ms: u32) {
        let Some(pending) = self.reader.take_commands() else {
            return;
        };
        self.last_command_ms = now_ms;
        if self.failsafe_active {
            info!("commands resumed");
            self.failsafe_active = false;
        }
        let regs = *self.reader.registers();
        if pending.steering {
            self.servo.set_angle_degrees(regs.steering);
        }
        if pending.motor {
            self.motor.set_target_speed(regs.motor);
        }
    }

    fn check_failsafe(&mut self, now_ms: u32) {
        if now_ms.wrapping_sub(self.last_command_ms) <= self.config.failsafe_timeout_ms {
            return;
        }
        if !self.failsafe_active {
            warn!("no command for {} ms, motor to neutral", self.config.failsafe_timeout_ms);
            self.failsafe_active = true;
        }
        self.motor.set_target_speed(0);
    }

    fn send_telemetry<L: Link>(&mut self, link: &L, now_ms: u32) {
        let sample = match self.imu.read_sample() {
            Ok(sample) => sample,
            Err(_) => {
                self.telemetry_skipped = self.telemetry_skipped.wrapping_add(1);
                debug!("imu read failed, telemetry tick skipped");
                return;
            }
        };
        let frame = telemetry::assemble(
            now_ms,
            &sample,
            self.last_speed_m_s,
            self.reader.registers().motor,
        );
        if link.write_all(&frame.encode()).is_err() {
            self.telemetry_dropped = self.telemetry_dropped.wrapping_add(1);
            debug!("telemetry frame dropped, tx full");
        }
    }

    #[must_use]
    pub fn motor(&self) -> &Motor<M> {
        &self.motor
    }

    #[must_use]
    pub fn servo(&self) -> &SteeringServo<S> {
        &self.servo
    }

    pub fn speedometer_mut(&mut self) -> &mut Speedometer<C> {
        &mut self.speedometer
    }

    pub fn imu_mut(&mut self) -> &mut I {
        &mut self.imu
    }

    #[must_use]
    pub fn registers(&self) -> &ShadowRegisters {
        self.reader.registers()
    }

    #[must_use]
    pub fn reader(&self) -> &CommandReader {
        &self.reader
    }

    /// Speed from the last speed task run, m/s, unsigned.
    #[must_use]
    pub fn last_speed(&self) -> f32 {
        self.last_speed_m_s
    }

    #[must_use]
    pub fn failsafe_active(&self) -> bool {
        self.failsafe_active
    }

    /// Telemetry ticks skipped because the sensor read failed.
    #[must_use]
    pub fn telemetry_skipped(&self) -> u32 {
        self.telemetry_skipped
    }

    /// Telemetry frames rejected by the transport.
    #[must_use]
    pub fn telemetry_dropped(&self) -> u32 {
        self.telemetry_dropped
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::imu::ImuSample;
    use crate::mock::{MockCounter, MockImu, MockPwm};
    use crate::motor::MotorState;
    use crate::transport::tests::RecordingDriver;
    use crate::transport::SerialTransport;
    use drive_proto::{CommandFrame, LinkDecoder, LinkMessage, TelemetryFrame};
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use std::vec::Vec;

    type TestTransport = SerialTransport<CriticalSectionRawMutex, RecordingDriver, 256, 1024>;
    type TestController = Controller<MockPwm, MockPwm, MockCounter, MockImu>;

    struct Rig {
        link: TestTransport,
        ctrl: TestController,
        decoder: LinkDecoder,
        received: Vec<LinkMessage>,
        now_ms: u32,
    }

    impl Rig {
        fn new() -> Self {
            let hw = Hardware {
                motor: MockPwm::new(62_500),
                servo: MockPwm::new(62_500),
                wheel_counter: MockCounter::default(),
                imu: MockImu {
                    sample: ImuSample {
                        accel: [0.0, 0.0, 9810.0],
                        gyro: [0.0, 0.0, 0.5],
                    },
                    fail: false,
                },
            };
            Self {
                link: SerialTransport::new(RecordingDriver::default(), 255),
                ctrl: Controller::new(hw, DriveConfig::DEFAULT, 0, 0),
                decoder: LinkDecoder::new(),
                received: Vec::new(),
                now_ms: 0,
            }
        }

        fn command(&self, address: u8, value: i16) {
            for b in CommandFrame::write(address, value).encode() {
                self.link.push_byte(b);
            }
        }

        /// Poll once per millisecond up to and including `until_ms`,
        /// completing every transmit transfer as it starts.
        fn run_until(&mut self, until_ms: u32) {
            while self.now_ms <= until_ms {
                self.ctrl.poll(&self.link, self.now_ms * 1000, self.now_ms);
                let mut chunk = [0u8; 255];
                while self.link.is_busy() {
                    let n = self.link.in_flight(&mut chunk);
                    self.decoder.extend(&chunk[..n]).unwrap();
                    self.link.on_transfer_complete(n);
                    while let Some(msg) = self.decoder.next_message() {
                        self.received.push(msg);
                    }
                }
                self.now_ms += 1;
            }
        }

        /// Telemetry received since the last call.
        fn telemetry(&mut self) -> Vec<TelemetryFrame> {
            self.received
                .drain(..)
                .filter_map(|msg| match msg {
                    LinkMessage::Telemetry(frame) => Some(frame),
                    LinkMessage::Register { .. } => None,
                })
                .collect()
        }
    }

    #[test]
    fn test_periodic_task_gate() {
        let mut task = PeriodicTask::new(1000, 0);
        assert!(!task.poll(999));
        assert!(task.poll(1000));
        assert!(!task.poll(1500));
        assert!(task.poll(2100));
    }

    #[test]
    fn test_periodic_task_across_wrap() {
        let mut task = PeriodicTask::new(1000, u32::MAX - 200);
        assert!(!task.poll(u32::MAX));
        assert!(task.poll(799));
    }

    #[test]
    fn test_initial_outputs() {
        let rig = Rig::new();
        assert_eq!(rig.ctrl.motor().state(), MotorState::Neutral);
        assert_eq!(rig.ctrl.motor().applied_duty(), 50);
        assert_eq!(rig.ctrl.servo().percent(), 55);
        assert!(!rig.ctrl.failsafe_active());
    }

    #[test]
    fn test_motor_command_reaches_esc_on_next_tick() {
        let mut rig = Rig::new();
        rig.command(0x01, 500);
        rig.run_until(0);
        assert_eq!(rig.ctrl.motor().context().target_speed_mm_s, 500);
        assert_eq!(rig.ctrl.motor().state(), MotorState::Neutral);

        rig.run_until(1);
        assert_eq!(rig.ctrl.motor().state(), MotorState::ForwardHold);
        assert_eq!(rig.ctrl.motor().applied_duty(), 75);
    }

    #[test]
    fn test_steering_command_moves_servo() {
        let mut rig = Rig::new();
        rig.command(0x00, 20);
        rig.run_until(0);
        assert_eq!(rig.ctrl.registers().steering, 20);
        assert_eq!(rig.ctrl.servo().percent(), 83);
    }

    #[test]
    fn test_motor_and_steering_in_same_poll() {
        let mut rig = Rig::new();
        rig.command(0x01, 500);
        rig.command(0x00, 10);
        rig.run_until(50);
        assert_eq!(rig.ctrl.motor().context().target_speed_mm_s, 500);
        assert_eq!(rig.ctrl.motor().state(), MotorState::ForwardHold);
        assert_eq!(rig.ctrl.motor().applied_duty(), 75);
        assert_eq!(rig.ctrl.registers().steering, 10);
        assert_eq!(rig.ctrl.servo().percent(), 69);
    }

    #[test]
    fn test_failsafe_forces_neutral() {
        let mut rig = Rig::new();
        rig.command(0x01, 500);
        rig.run_until(500);
        assert!(!rig.ctrl.failsafe_active());
        assert_eq!(rig.ctrl.motor().state(), MotorState::ForwardHold);

        rig.run_until(501);
        assert!(rig.ctrl.failsafe_active());
        assert_eq!(rig.ctrl.motor().context().target_speed_mm_s, 0);
        assert_eq!(rig.ctrl.motor().state(), MotorState::Neutral);
    }

    #[test]
    fn test_any_write_feeds_failsafe() {
        let mut rig = Rig::new();
        rig.command(0x01, 500);
        rig.run_until(400);
        rig.command(0x02, 0);
        rig.run_until(800);
        assert!(!rig.ctrl.failsafe_active());
        assert_eq!(rig.ctrl.motor().state(), MotorState::ForwardHold);

        rig.command(0x55, 1);
        rig.run_until(1200);
        assert!(!rig.ctrl.failsafe_active());
    }

    #[test]
    fn test_read_request_does_not_feed_failsafe() {
        let mut rig = Rig::new();
        rig.command(0x01, 500);
        rig.run_until(300);
        for b in CommandFrame::read_burst(0x01, 1, 0).encode() {
            rig.link.push_byte(b);
        }
        rig.run_until(600);
        assert!(rig.ctrl.failsafe_active());
    }

    #[test]
    fn test_commands_resume_after_failsafe() {
        let mut rig = Rig::new();
        rig.run_until(600);
        assert!(rig.ctrl.failsafe_active());

        rig.command(0x01, 200);
        rig.run_until(602);
        assert!(!rig.ctrl.failsafe_active());
        assert_eq!(rig.ctrl.motor().state(), MotorState::ForwardHold);
    }

    #[test]
    fn test_telemetry_every_ten_ms() {
        let mut rig = Rig::new();
        rig.run_until(99);
        let frames = rig.telemetry();
        assert_eq!(frames.len(), 9);
        assert_eq!(frames[0].timestamp_ms, 10);
        assert_eq!(frames[8].timestamp_ms, 90);
        assert_eq!(frames[0].accel, [0.0, 0.0, 9810.0]);
    }

    #[test]
    fn test_telemetry_speed_signed_by_reverse_command() {
        let mut rig = Rig::new();
        rig.command(0x01, -300);
        rig.ctrl.speedometer_mut().counter_mut().count = 52;
        rig.run_until(110);

        let expected = 10.0 * 0.068 * core::f32::consts::PI * 10.0;
        let last = *rig.telemetry().last().unwrap();
        assert_eq!(last.timestamp_ms, 110);
        let d = last.speed + expected;
        assert!(d > -1e-3 && d < 1e-3);
        assert!(rig.ctrl.last_speed() > 0.0);
    }

    #[test]
    fn test_sensor_failure_skips_tick() {
        let mut rig = Rig::new();
        rig.ctrl.imu_mut().fail = true;
        rig.run_until(50);
        assert!(rig.telemetry().is_empty());
        assert_eq!(rig.ctrl.telemetry_skipped(), 5);

        rig.ctrl.imu_mut().fail = false;
        rig.run_until(60);
        assert_eq!(rig.telemetry().len(), 1);
    }

    #[test]
    fn test_read_reply_during_operation() {
        let mut rig = Rig::new();
        rig.command(0x00, -12);
        for b in CommandFrame::read_burst(0x00, 1, 0).encode() {
            rig.link.push_byte(b);
        }
        rig.run_until(0);
        assert_eq!(
            rig.received,
            [LinkMessage::Register {
                address: 0x00,
                value: -12
            }]
        );
    }
}
