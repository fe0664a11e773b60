//! User settings that shape how a drive is shared.
//!
//! The app persists these as a small JSON blob. Fields missing from an older
//! blob fall back to their defaults, so the settings format can grow.

use log::warn;
use serde::{Deserialize, Serialize};

/// Default trim distance from each end of a shared route, in kilometers.
pub const DEFAULT_TRIM_KM: f64 = 1.0;

/// Privacy settings for shared drives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[serde(default, rename_all = "camelCase")]
pub struct DriveSettings {
    /// Cut the start and end of shared routes
    pub hide_start_end: bool,
    /// How much to cut from each end, in kilometers
    pub trim_km: f64,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            hide_start_end: false,
            trim_km: DEFAULT_TRIM_KM,
        }
    }
}

impl DriveSettings {
    /// Parse stored settings, filling gaps with defaults.
    ///
    /// Unreadable JSON is logged and replaced by the defaults; settings are
    /// never a reason to fail a save.
    ///
    /// # Example
    ///
    /// ```rust
    /// use drive_telemetry::DriveSettings;
    ///
    /// let s = DriveSettings::from_json(r#"{"hideStartEnd": true}"#);
    /// assert!(s.hide_start_end);
    /// assert_eq!(s.trim_km, 1.0);
    /// ```
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<DriveSettings>(json) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                warn!("[DriveTelemetry] Ignoring unreadable settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> String {
        // Two plain fields; serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Distance to trim from each end, in meters. Zero when hiding is off.
    pub fn trim_meters(&self) -> f64 {
        if self.hide_start_end {
            self.trim_km * 1000.0
        } else {
            0.0
        }
    }

    fn sanitized(mut self) -> Self {
        if !self.trim_km.is_finite() || self.trim_km < 0.0 {
            warn!("[DriveTelemetry] Invalid trim distance {}, using default", self.trim_km);
            self.trim_km = DEFAULT_TRIM_KM;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = DriveSettings::default();
        assert!(!s.hide_start_end);
        assert_eq!(s.trim_km, 1.0);
        assert_eq!(s.trim_meters(), 0.0);
    }

    #[test]
    fn test_partial_json_merges_defaults() {
        let s = DriveSettings::from_json(r#"{"trimKm": 2.5}"#);
        assert!(!s.hide_start_end);
        assert_eq!(s.trim_km, 2.5);

        let s = DriveSettings::from_json("{}");
        assert_eq!(s, DriveSettings::default());
    }

    #[test]
    fn test_trim_meters_when_hiding() {
        let s = DriveSettings { hide_start_end: true, trim_km: 0.5 };
        assert_eq!(s.trim_meters(), 500.0);
    }

    #[test]
    fn test_garbage_gives_defaults() {
        assert_eq!(DriveSettings::from_json("not json"), DriveSettings::default());
        assert_eq!(DriveSettings::from_json(""), DriveSettings::default());
    }

    #[test]
    fn test_negative_trim_is_replaced() {
        let s = DriveSettings::from_json(r#"{"hideStartEnd": true, "trimKm": -3}"#);
        assert_eq!(s.trim_km, DEFAULT_TRIM_KM);
    }

    #[test]
    fn test_json_round_trip() {
        let s = DriveSettings { hide_start_end: true, trim_km: 1.5 };
        let json = s.to_json();
        assert!(json.contains("\"hideStartEnd\":true"));
        assert_eq!(DriveSettings::from_json(&json), s);
    }
}
