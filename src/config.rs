// Retry bounds, signal periods, unit conversion

/// Attempts made for every hardware configuration call before giving up
pub const MAXIMUM_RETRIES: u32 = 5;

/// Status frame period for analog position/velocity/voltage signals
pub const ANALOG_SIGNAL_PERIOD_MS: u16 = 20;

/// Analog input full-scale voltage when physicalproperties.json does not set one
pub const DEFAULT_ANALOG_MAX_VOLTAGE: f64 = 3.3;

/// Angle factor that asks for the absolute encoder to be used as feedback directly
pub const DIRECT_FEEDBACK_ANGLE_FACTOR: f64 = 360.0;

pub const METERS_PER_INCH: f64 = 0.0254;

/// Inches to meters
pub fn inches_to_meters(inches: f64) -> f64 {
    inches * METERS_PER_INCH
}
