//! Default inertial sensor collaborator.

use core::convert::Infallible;

use drive_core::{ImuSample, InertialSensor};

/// Reports a vehicle at rest. Boards with an IMU swap in their own
/// [`InertialSensor`] when building the controller's `Hardware`.
#[derive(Default)]
pub struct StaticImu;

impl InertialSensor for StaticImu {
    type Error = Infallible;

    fn read_sample(&mut self) -> Result<ImuSample, Self::Error> {
        Ok(ImuSample::default())
    }
}

