//! CLI argument validators.
//!
//! Shared value parsers so bad numbers are rejected by clap, before any
//! configuration is loaded.

/// Parse a strictly positive duration in seconds.
pub fn parse_seconds(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(value.is_finite() && value > 0.0) {
        return Err(format!("duration must be positive, got {value}"));
    }

    Ok(value)
}

/// Parse a strictly positive integer count.
pub fn parse_positive(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid non-negative integer"))?;

    if value == 0 {
        return Err("value must be at least 1".to_string());
    }

    Ok(value)
}

/// Parse a sample rate in Hz.
pub fn parse_sample_rate(s: &str) -> Result<u32, String> {
    let value: u32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid sample rate"))?;

    if value == 0 {
        return Err("sample rate must be positive".to_string());
    }

    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("1.5").ok(), Some(1.5));
        assert_eq!(parse_seconds("3").ok(), Some(3.0));
        assert!(parse_seconds("0").is_err());
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("inf").is_err());
        assert!(parse_seconds("abc").is_err());
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("128").ok(), Some(128));
        assert!(parse_positive("0").is_err());
        assert!(parse_positive("-3").is_err());
    }

    #[test]
    fn test_parse_sample_rate() {
        assert_eq!(parse_sample_rate("22050").ok(), Some(22_050));
        assert!(parse_sample_rate("0").is_err());
        assert!(parse_sample_rate("fast").is_err());
    }
}
