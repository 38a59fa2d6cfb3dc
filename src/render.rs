//! Presentation
//!
//! Turns core results into what the user sees: the shot embed, the history
//! table, and the noisy-data warning. This is the single place values are
//! rounded for display; the core always hands over full-precision numbers.

use chrono::Utc;

use crate::discord::{Embed, EmbedAuthor, EmbedField, EmbedImage, User};
use crate::estimator::Estimate;
use crate::model::MeasurementRecord;
use crate::validation::ValidatedLog;

/// Embed accent color
const EMBED_COLOR: u32 = 0xef4e2b;

/// Calibration advice pinned in the support channel
const CALIBRATION_ADVICE_URL: &str =
    "https://discord.com/channels/890339612441063494/989599042277343273/1052665282054864908";

/// Round to two decimal places for display, always showing both digits.
pub fn round2(x: f64) -> String {
    format!("{:.2}", (x * 100.0).round() / 100.0)
}

/// Embed summarizing a logged shot and the suggested next pump-zero.
pub fn log_embed(
    user: &User,
    log: &ValidatedLog,
    sample_count: usize,
    estimate: &Estimate,
) -> Embed {
    let mut embed = Embed {
        title: Some("Predictive Scale Test".to_string()),
        color: Some(EMBED_COLOR),
        author: Some(EmbedAuthor {
            name: format!("@{}", user.username),
            icon_url: user.avatar_url(),
        }),
        fields: vec![
            field("Predicted", round2(log.predicted)),
            field("Actual", round2(log.actual)),
            field("Pump-Zero", round2(log.pump_zero)),
            field("Build", log.build.clone()),
            field("Submission", format!("#{}", sample_count)),
            field(
                "Next Pump-Zero",
                format!("{} ({})", round2(estimate.next), estimate.quality),
            ),
        ],
        timestamp: Some(Utc::now().to_rfc3339()),
        ..Embed::default()
    };
    if let Some(url) = &log.image_url {
        embed.image = Some(EmbedImage { url: url.clone() });
    }
    if let Some(comments) = &log.comments {
        if !comments.is_empty() {
            embed.description = Some(comments.clone());
        }
    }
    embed
}

fn field(name: &str, value: String) -> EmbedField {
    EmbedField {
        name: name.to_string(),
        value,
        inline: true,
    }
}

/// Ephemeral warning sent when history exists but correlates weakly.
pub fn bad_data_warning(sample_count: usize) -> String {
    format!(
        "With \"{}\" samples we noticed your entries have weak correlation, \
**please ensure you're following the calibration advice in the [pinned post]({})**.\n\n\
*After reading the post consider dropping some of your bad data with `/log-history`.*",
        sample_count, CALIBRATION_ADVICE_URL
    )
}

/// Monospace history table, ready to be wrapped in a code block.
///
/// Same columns as the hosted grid: ID, Predicted, Actual, Pump Zero, Build.
pub fn history_table(title: &str, records: &[&MeasurementRecord]) -> String {
    const HEADERS: [&str; 5] = ["ID", "Predicted", "Actual", "Pump Zero", "Build"];

    let rows: Vec<[String; 5]> = records
        .iter()
        .map(|r| {
            [
                r.id.to_string(),
                round2(r.predicted),
                round2(r.actual),
                round2(r.pump_zero),
                r.build.clone(),
            ]
        })
        .collect();

    let widths: Vec<usize> = HEADERS
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|row| row[i].len())
                .max()
                .unwrap_or(0)
                .max(h.len())
        })
        .collect();

    let separator = {
        let mut s = String::from("+");
        for w in &widths {
            s.push_str(&"-".repeat(w + 2));
            s.push('+');
        }
        s
    };

    let format_row = |cells: &[String; 5]| {
        let mut line = String::from("|");
        for (i, cell) in cells.iter().enumerate() {
            // Build is left-aligned text, everything else is numeric
            if i == 4 {
                line.push_str(&format!(" {:<width$} |", cell, width = widths[i]));
            } else {
                line.push_str(&format!(" {:>width$} |", cell, width = widths[i]));
            }
        }
        line
    };

    let header_cells: [String; 5] = HEADERS.map(String::from);
    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    out.push_str(&format_row(&header_cells));
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    for row in &rows {
        out.push_str(&format_row(row));
        out.push('\n');
    }
    out.push_str(&separator);
    out
}

/// Wrap a table in a code block for the reply content.
pub fn code_block(table: &str) -> String {
    format!("```\n{}\n```", table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Quality;
    use chrono::Utc;

    fn user() -> User {
        serde_json::from_value(serde_json::json!({
            "id": "7",
            "username": "barista",
            "discriminator": "0",
            "avatar": "a1b2"
        }))
        .unwrap()
    }

    fn validated() -> ValidatedLog {
        ValidatedLog {
            predicted: 36.505,
            actual: 35.9,
            pump_zero: 0.15,
            build: "abc123".to_string(),
            image_url: Some("https://cdn/x.jpeg".to_string()),
            comments: Some("channeling on the left".to_string()),
        }
    }

    fn record(id: u64) -> MeasurementRecord {
        MeasurementRecord {
            record_id: format!("rec{}", id),
            id,
            user: "barista".to_string(),
            predicted: 36.0,
            actual: 35.5,
            pump_zero: 0.15,
            build: "abc123".to_string(),
            created_at: Utc::now(),
            exclude_from_calculations: false,
        }
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(4.0), "4.00");
        assert_eq!(round2(0.005), "0.01");
        assert_eq!(round2(-1.2345), "-1.23");
        assert_eq!(round2(150.499), "150.50");
    }

    #[test]
    fn test_log_embed_fields() {
        let estimate = Estimate {
            next: 0.525,
            quality: Quality::Good,
            likely_bad_data: false,
        };
        let embed = log_embed(&user(), &validated(), 5, &estimate);
        assert_eq!(embed.fields.len(), 6);
        assert_eq!(embed.fields[4].value, "#5");
        assert_eq!(embed.fields[5].value, "0.53 (good)");
        assert_eq!(embed.author.as_ref().unwrap().name, "@barista");
        assert_eq!(embed.description.as_deref(), Some("channeling on the left"));
        assert!(embed.image.is_some());
    }

    #[test]
    fn test_history_table_layout() {
        let r1 = record(1);
        let r2 = record(12);
        let table = history_table("Predictive Scale Test Log", &[&r2, &r1]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "Predictive Scale Test Log");
        assert!(lines[2].contains("ID"));
        assert!(lines[2].contains("Predicted"));
        assert!(lines[2].contains("Build"));
        // Every table line after the title has equal width
        let width = lines[1].len();
        for line in &lines[1..] {
            assert_eq!(line.len(), width);
        }
        assert!(table.contains("abc123"));
        assert!(table.contains("36.00"));
    }

    #[test]
    fn test_bad_data_warning_mentions_history_command() {
        let warning = bad_data_warning(6);
        assert!(warning.contains("\"6\" samples"));
        assert!(warning.contains("/log-history"));
    }

    #[test]
    fn test_code_block_wraps() {
        assert_eq!(code_block("x"), "```\nx\n```");
    }
}
