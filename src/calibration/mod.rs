pub mod layer;
pub mod overrides;
pub mod state;

pub use self::layer::{apply_calibration, CalibrationReport, LedConflict};
pub use self::overrides::{apply_overrides, OverrideOverlap, OverrideReport};
pub use self::state::{
    CalibrationSchema, CalibrationState, KeyTrim, NormalizationReport, RawCalibration,
};
