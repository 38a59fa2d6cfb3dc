//! Input validation boundary
//!
//! Everything arriving from the user is checked here before it can reach
//! the store or the estimator: positive actual weight, magnitude sanity
//! bound, a strict 6-char alphanumeric build tag, and a real image
//! attachment. The predicted weight is also clamped away from zero for
//! downstream consumers that divide by it.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::BotError;
use crate::render::round2;

/// Upper sanity bound on any submitted weight or pump-zero value.
pub const MAX_INPUT_VALUE: f64 = 150.0;

/// Minimum magnitude for the predicted weight.
pub const MIN_PREDICTED_MAGNITUDE: f64 = 0.005;

/// First 6-char alphanumeric token anywhere in the submitted build string.
static BUILD_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9]{6}").expect("build tag pattern is valid")
});

/// Raw `/log` inputs as they arrive from the platform.
#[derive(Debug, Clone)]
pub struct LogInput {
    pub predicted: f64,
    pub actual: f64,
    pub pump_zero: f64,
    pub build: Option<String>,
    pub attachment: Option<AttachmentInfo>,
    pub comments: Option<String>,
}

/// Attachment metadata reported by the platform.
#[derive(Debug, Clone)]
pub struct AttachmentInfo {
    pub url: String,
    pub content_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Inputs that passed the boundary.
#[derive(Debug, Clone)]
pub struct ValidatedLog {
    /// Predicted weight, clamped to at least `MIN_PREDICTED_MAGNITUDE`
    pub predicted: f64,
    pub actual: f64,
    pub pump_zero: f64,
    pub build: String,
    /// Image URL shown in the reply embed; absent only outside production
    pub image_url: Option<String>,
    pub comments: Option<String>,
}

/// Validate a `/log` submission.
///
/// Outside production the build defaults to `aaaaaa` and the photo check is
/// skipped, so `/log` stays usable without a firmware build or a scale photo.
pub fn validate_log(input: &LogInput, production: bool) -> Result<ValidatedLog, BotError> {
    if production {
        match &input.attachment {
            Some(a) if a.width.unwrap_or(0) > 0 && a.height.unwrap_or(0) > 0 => {}
            other => {
                let mime = other
                    .as_ref()
                    .and_then(|a| a.content_type.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                return Err(BotError::Validation(format!(
                    "Unable to upload response with mime-type: **{}**",
                    mime
                )));
            }
        }
    }

    if input.actual <= 0.0 {
        return Err(BotError::Validation(
            "You cannot pull a shot with zero or negative weight!".to_string(),
        ));
    }

    let max_val = input.predicted.max(input.actual).max(input.pump_zero);
    if max_val > MAX_INPUT_VALUE {
        return Err(BotError::Validation(format!(
            "Input of, \"{}\" is too large, are you sure you entered the values in the correct format?",
            round2(max_val)
        )));
    }

    let raw_build = match (&input.build, production) {
        (Some(b), _) => b.clone(),
        (None, false) => "aaaaaa".to_string(),
        (None, true) => String::new(),
    };
    let build = BUILD_TAG
        .find(&raw_build)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            BotError::Validation(
                "Invalid build format, expected group 6 of alpha-numeric characters.".to_string(),
            )
        })?;

    let predicted = if input.predicted.abs() < MIN_PREDICTED_MAGNITUDE {
        MIN_PREDICTED_MAGNITUDE
    } else {
        input.predicted
    };

    Ok(ValidatedLog {
        predicted,
        actual: input.actual,
        pump_zero: input.pump_zero,
        build,
        image_url: input.attachment.as_ref().map(|a| a.url.clone()),
        comments: input.comments.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment() -> AttachmentInfo {
        AttachmentInfo {
            url: "https://cdn.example/shot.jpeg".to_string(),
            content_type: Some("image/jpeg".to_string()),
            width: Some(100),
            height: Some(100),
        }
    }

    fn input() -> LogInput {
        LogInput {
            predicted: 36.0,
            actual: 35.5,
            pump_zero: 0.15,
            build: Some("abc123".to_string()),
            attachment: Some(attachment()),
            comments: None,
        }
    }

    #[test]
    fn test_accepts_valid_submission() {
        let v = validate_log(&input(), true).unwrap();
        assert_eq!(v.build, "abc123");
        assert_eq!(v.image_url.as_deref(), Some("https://cdn.example/shot.jpeg"));
    }

    #[test]
    fn test_rejects_non_positive_actual() {
        let mut i = input();
        i.actual = -1.0;
        let err = validate_log(&i, true).unwrap_err();
        assert!(matches!(err, BotError::Validation(_)));
        i.actual = 0.0;
        assert!(validate_log(&i, true).is_err());
    }

    #[test]
    fn test_rejects_values_over_sanity_bound() {
        let mut i = input();
        i.pump_zero = 150.5;
        let err = validate_log(&i, true).unwrap_err();
        assert!(err.user_message().contains("150.50"));
    }

    #[test]
    fn test_extracts_embedded_build_tag() {
        let mut i = input();
        i.build = Some("  deadb3 - latest main".to_string());
        let v = validate_log(&i, true).unwrap();
        assert_eq!(v.build, "deadb3");
    }

    #[test]
    fn test_rejects_short_build_tag() {
        let mut i = input();
        i.build = Some("ab1-2".to_string());
        assert!(validate_log(&i, true).is_err());
    }

    #[test]
    fn test_rejects_dimensionless_attachment() {
        let mut i = input();
        i.attachment = Some(AttachmentInfo {
            width: Some(0),
            ..attachment()
        });
        let err = validate_log(&i, true).unwrap_err();
        assert!(err.user_message().contains("image/jpeg"));
    }

    #[test]
    fn test_dev_mode_defaults() {
        let mut i = input();
        i.build = None;
        i.attachment = None;
        let v = validate_log(&i, false).unwrap();
        assert_eq!(v.build, "aaaaaa");
        assert!(v.image_url.is_none());
    }

    #[test]
    fn test_clamps_predicted_away_from_zero() {
        let mut i = input();
        i.predicted = 0.0001;
        let v = validate_log(&i, true).unwrap();
        assert!((v.predicted - MIN_PREDICTED_MAGNITUDE).abs() < 1e-12);
    }
}
