//! Alert engine for ingested vitals.
//!
//! Pure functions only: given one set of raw vitals this module computes the
//! apparent temperature (NWS heat index), walks the fixed threshold table and
//! produces the status line stored alongside the reading. No I/O, no clock,
//! no randomness, so every outcome here is unit-testable in isolation.

// ---

/// Status line stored when no threshold fires.
pub const STATUS_STABLE: &str = "All vitals within normal range";

// Alert fragments, ordered by vital. The status report joins the fired ones
// with " | " in exactly this order: heart rate, SpO2, body temperature,
// heat index.
pub const ALERT_SEVERE_TACHYCARDIA: &str = "CRITICAL: severe tachycardia (HR > 120 bpm)";
pub const ALERT_MILD_TACHYCARDIA: &str = "Warning: mild tachycardia (HR > 100 bpm)";
pub const ALERT_SEVERE_HYPOXIA: &str = "CRITICAL: severe hypoxia (SpO2 < 92%)";
pub const ALERT_MILD_HYPOXIA: &str = "Warning: low SpO2 (< 94%)";
pub const ALERT_SEVERE_FEVER: &str = "CRITICAL: high fever (39\u{b0}C or above)";
pub const ALERT_MILD_FEVER: &str = "Warning: mild fever (above 38\u{b0}C)";
pub const ALERT_SEVERE_HEAT: &str = "CRITICAL: extreme heat stress (heat index 40\u{b0}C or above)";
pub const ALERT_ELEVATED_HEAT: &str = "Warning: elevated heat index (above 35\u{b0}C)";

/// Raw vitals from one submitted reading.
#[derive(Debug, Clone, Copy)]
pub struct Vitals {
    // ---
    pub heart_rate: f64,
    pub spo2: f64,
    pub temp_c: f64,
    pub humidity: f64,
}

/// Values derived from one [`Vitals`], merged into the reading at creation
/// time and never recomputed afterwards.
#[derive(Debug, Clone)]
pub struct Derived {
    // ---
    pub temp_f: f64,
    pub heat_index: f64,
    pub alerts: Vec<&'static str>,
    pub status_report: String,
}

// ---

/// Run the full engine over one set of vitals.
///
/// `heat_index` comes back rounded to one decimal place for storage, but the
/// threshold walk sees the unrounded value, so a reading at 39.96°C apparent
/// temperature does not get promoted to the 40°C alert by rounding.
pub fn derive(vitals: &Vitals) -> Derived {
    // ---
    let temp_f = vitals.temp_c * 9.0 / 5.0 + 32.0;
    let heat_index_c = heat_index_celsius(vitals.temp_c, vitals.humidity);
    let alerts = classify(vitals, heat_index_c);

    let status_report = if alerts.is_empty() {
        STATUS_STABLE.to_string()
    } else {
        alerts.join(" | ")
    };

    Derived {
        temp_f,
        heat_index: round_to_tenth(heat_index_c),
        alerts,
        status_report,
    }
}

/// Apparent temperature in °C for a given air temperature and relative
/// humidity.
///
/// Follows the NWS two-stage scheme: a cheap simplified formula first, and
/// the full Rothfusz regression only when the simplified result reaches
/// 80°F. Out-of-range humidity (<= 0 or > 100) disables the computation and
/// the air temperature is returned unchanged.
pub fn heat_index_celsius(temp_c: f64, humidity: f64) -> f64 {
    // ---
    if humidity <= 0.0 || humidity > 100.0 {
        return temp_c;
    }

    let t = temp_c * 9.0 / 5.0 + 32.0;
    let rh = humidity;

    let mut hi = 0.5 * (t + 61.0 + (t - 68.0) * 1.2 + rh * 0.094);

    if hi >= 80.0 {
        hi = -42.379 + 2.04901523 * t + 10.14333127 * rh
            - 0.22475541 * t * rh
            - 0.00683783 * t * t
            - 0.05481717 * rh * rh
            + 0.00122874 * t * t * rh
            + 0.00085282 * t * rh * rh
            - 0.00000199 * t * t * rh * rh;
    }

    (hi - 32.0) * 5.0 / 9.0
}

/// Walk the threshold table and collect the fired alerts in report order.
fn classify(vitals: &Vitals, heat_index_c: f64) -> Vec<&'static str> {
    // ---
    let mut alerts = Vec::new();

    if vitals.heart_rate > 120.0 {
        alerts.push(ALERT_SEVERE_TACHYCARDIA);
    } else if vitals.heart_rate > 100.0 {
        alerts.push(ALERT_MILD_TACHYCARDIA);
    }

    if vitals.spo2 > 0.0 && vitals.spo2 < 92.0 {
        alerts.push(ALERT_SEVERE_HYPOXIA);
    } else if vitals.spo2 < 94.0 {
        // A non-positive SpO2 lands here, reported as the mild alert.
        alerts.push(ALERT_MILD_HYPOXIA);
    }

    if vitals.temp_c >= 39.0 {
        alerts.push(ALERT_SEVERE_FEVER);
    } else if vitals.temp_c > 38.0 {
        alerts.push(ALERT_MILD_FEVER);
    }

    if heat_index_c >= 40.0 {
        alerts.push(ALERT_SEVERE_HEAT);
    } else if heat_index_c > 35.0 {
        alerts.push(ALERT_ELEVATED_HEAT);
    }

    alerts
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
