/// Formats seconds as `HH:MM:SS.mmm`.
pub fn time_str(sec: f64) -> String {
    let ms = sec * 1000f64;
    let hours = (ms / 3600000f64) as u64;
    let minutes = ((ms % 3600000f64) / 60000f64) as u64;
    let seconds = ((ms % 60000f64) / 1000f64) as u64;
    let milliseconds = (ms % 1000f64) as u64;

    format!(
        "{hours:0width$}:{minutes:02}:{seconds:02}.{milliseconds:03}",
        width = if hours >= 100 { 0 } else { 2 }
    )
}

/// Playback length of `samples` per-channel samples.
pub fn duration_secs(samples: u64, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    samples as f64 / sample_rate as f64
}

#[test]
fn test_time_str() {
    assert_eq!(time_str(0.0), "00:00:00.000");
    assert_eq!(time_str(61.5), "00:01:01.500");
    assert_eq!(time_str(3723.25), "01:02:03.250");
    assert_eq!(time_str(360000.0), "100:00:00.000");
}

#[test]
fn test_duration_secs() {
    assert_eq!(duration_secs(88200, 44100), 2.0);
    assert_eq!(duration_secs(100, 0), 0.0);
}
