pub mod anonymize;
pub mod filter;
pub mod match_time;
pub mod run;
pub mod validate;

/// Parse `--noise`: a strictly positive E7 offset.
pub fn parse_noise(value: &str) -> Result<i64, String> {
    match value.parse::<i64>() {
        Ok(noise) if noise > 0 => Ok(noise),
        Ok(_) => Err("noise must be greater than zero".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Parse `--buffer-hours`: a finite, non-negative hour count.
pub fn parse_buffer_hours(value: &str) -> Result<f64, String> {
    match value.parse::<f64>() {
        Ok(hours) if hours.is_finite() && hours >= 0.0 => Ok(hours),
        Ok(_) => Err("buffer hours must be a finite number of at least zero".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_must_be_positive() {
        assert_eq!(parse_noise("30000"), Ok(30_000));
        assert!(parse_noise("0").is_err());
        assert!(parse_noise("-10000").is_err());
        assert!(parse_noise("lots").is_err());
    }

    #[test]
    fn test_buffer_hours_must_be_finite_and_non_negative() {
        assert_eq!(parse_buffer_hours("1.5"), Ok(1.5));
        assert_eq!(parse_buffer_hours("0"), Ok(0.0));
        assert!(parse_buffer_hours("-1").is_err());
        assert!(parse_buffer_hours("inf").is_err());
        assert!(parse_buffer_hours("NaN").is_err());
    }
}
