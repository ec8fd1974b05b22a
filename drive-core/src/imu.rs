//! Inertial sensor seam.

/// One acceleration and angular-rate reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImuSample {
    /// Acceleration x, y, z in mm/s².
    pub accel: [f32; 3],
    /// Angular rate x, y, z in rad/s.
    pub gyro: [f32; 3],
}

/// A device that can produce an [`ImuSample`] on demand.
///
/// Register-level access and unit conversion live in the implementation.
pub trait InertialSensor {
    type Error;

    /// Read the current sample. Must complete in bounded time.
    fn read_sample(&mut self) -> Result<ImuSample, Self::Error>;
}
