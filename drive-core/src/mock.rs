//! Test doubles for the hardware seams.

use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};

use crate::imu::{ImuSample, InertialSensor};
use crate::speedometer::PulseCounter;

pub(crate) struct MockPwm {
    max: u16,
    duty: u16,
}

impl MockPwm {
    pub(crate) fn new(max: u16) -> Self {
        Self { max, duty: 0 }
    }

    pub(crate) fn duty(&self) -> u16 {
        self.duty
    }
}

impl ErrorType for MockPwm {
    type Error = Infallible;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty = duty;
        Ok(())
    }
}

/// Pulse counter advanced by hand.
#[derive(Default)]
pub(crate) struct MockCounter {
    pub(crate) count: u16,
}

impl PulseCounter for MockCounter {
    fn count(&mut self) -> u16 {
        self.count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SensorFault;

/// Inertial sensor returning a fixed sample, or failing on demand.
pub(crate) struct MockImu {
    pub(crate) sample: ImuSample,
    pub(crate) fail: bool,
}

impl InertialSensor for MockImu {
    type Error = SensorFault;

    fn read_sample(&mut self) -> Result<ImuSample, Self::Error> {
        if self.fail {
            Err(SensorFault)
        } else {
            Ok(self.sample)
        }
    }
}
