use std::time;

pub fn time(start: time::Instant) -> f32 {
    let elapsed = time::Instant::now() - start;

    elapsed.as_secs() as f32 + elapsed.subsec_nanos() as f32 * 1e-9
}

/// Clamp a configured value into its allowed range, complaining if it was out of bounds
pub fn clamp_attr(name: &str, value: f32, min: f32, max: f32) -> f32 {
    let clamped = value.max(min).min(max);
    if clamped != value {
        log::warn!(
            "Attribute `{}` = {} is out of range [{}, {}], using {}",
            name,
            value,
            min,
            max,
            clamped,
        );
    }
    clamped
}
