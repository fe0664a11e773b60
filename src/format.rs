//! Display strings for drive figures.

/// Live stopwatch text: `M:SS`, or `H:MM:SS` from one hour on.
pub fn format_clock(seconds: u64) -> String {
    let hrs = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hrs > 0 {
        format!("{}:{:02}:{:02}", hrs, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Summary duration text: `Xm`, or `Xh Ym` from one hour on.
pub fn format_duration(seconds: u64) -> String {
    let hrs = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    if hrs > 0 {
        format!("{}h {}m", hrs, mins)
    } else {
        format!("{}m", mins)
    }
}

/// Distance text in km: one decimal below 10 km, whole kilometers above.
pub fn format_distance_km(meters: f64) -> String {
    let km = meters.max(0.0) / 1000.0;
    if km >= 10.0 {
        format!("{} km", km.round())
    } else {
        format!("{:.1} km", km)
    }
}
