use jiff::{SignedDuration, Span, SpanRelativeTo};

/// Accepts "PT1M30S", friendly spans such as "5m" or "1h 30m", and plain seconds.
pub fn parse_duration(input: &str) -> Result<SignedDuration, String> {
    let duration = if let Ok(duration) = input.parse::<SignedDuration>() {
        duration
    } else if let Ok(duration) = input
        .parse::<Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        duration
    } else if let Ok(seconds) = input.parse::<i64>() {
        SignedDuration::from_secs(seconds)
    } else {
        return Err(format!("invalid duration: {input}"));
    };

    if duration.is_negative() {
        return Err(format!("duration must be positive: {input}"));
    }

    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("PT1M"), Ok(SignedDuration::from_secs(60)));
        assert_eq!(parse_duration("5m"), Ok(SignedDuration::from_mins(5)));
        assert_eq!(parse_duration("45"), Ok(SignedDuration::from_secs(45)));
        assert!(parse_duration("-45").is_err());
        assert!(parse_duration("soon").is_err());
    }
}
