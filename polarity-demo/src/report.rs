//! Console rendering of classification results.

use polarity_pipelines::Sentiment;

const HEADERS: [&str; 3] = ["Text", "Label", "Confidence"];

/// Renders the result for a single text, one field per line, with the
/// confidence formatted to 4 decimal places.
pub fn single(text: &str, sentiment: &Sentiment) -> String {
    format!(
        "Text: {text}\nSentiment: {}\nConfidence: {:.4}\n",
        sentiment.label, sentiment.score
    )
}

/// Renders a batch as an aligned table with one row per input text, in input
/// order. `texts` and `results` must be parallel; a mismatch is a programming
/// error, not a runtime condition.
pub fn table(texts: &[String], results: &[Sentiment]) -> String {
    assert_eq!(
        texts.len(),
        results.len(),
        "every text needs exactly one classification result"
    );

    let rows: Vec<[String; 3]> = texts
        .iter()
        .zip(results)
        .map(|(text, result)| {
            [
                text.clone(),
                result.label.clone(),
                format!("{:.4}", result.score),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|header| header.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render_row = |cells: [&str; 3]| {
        let mut line = String::new();
        for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
            if i > 0 {
                line.push_str("  ");
            }
            line.push_str(&format!("{cell:<width$}"));
        }
        line.trim_end().to_string()
    };

    let mut out = render_row(HEADERS);
    out.push('\n');
    for row in &rows {
        out.push_str(&render_row([&row[0], &row[1], &row[2]]));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentiment(label: &str, score: f32) -> Sentiment {
        Sentiment {
            label: label.to_string(),
            score,
        }
    }

    #[test]
    fn single_formats_confidence_to_four_decimals() {
        let rendered = single("I love it", &sentiment("positive", 0.98765));
        assert!(rendered.contains("Text: I love it"));
        assert!(rendered.contains("Sentiment: positive"));
        assert!(rendered.contains("Confidence: 0.9877"));
    }

    #[test]
    fn table_keeps_rows_in_input_order() {
        let texts = vec!["first".to_string(), "second".to_string()];
        let results = vec![sentiment("positive", 0.9), sentiment("negative", 0.8)];
        let rendered = table(&texts, &results);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Text"));
        assert!(lines[1].starts_with("first"));
        assert!(lines[1].contains("positive"));
        assert!(lines[1].contains("0.9000"));
        assert!(lines[2].starts_with("second"));
        assert!(lines[2].contains("negative"));
    }

    #[test]
    fn table_columns_are_aligned() {
        let texts = vec!["tiny".to_string(), "a much longer input".to_string()];
        let results = vec![sentiment("positive", 1.0), sentiment("negative", 0.5)];
        let rendered = table(&texts, &results);
        let lines: Vec<&str> = rendered.lines().collect();
        let label_col = lines[2].find("negative").unwrap();
        assert_eq!(lines[1].find("positive").unwrap(), label_col);
        assert_eq!(lines[0].find("Label").unwrap(), label_col);
    }

    #[test]
    #[should_panic(expected = "every text needs exactly one classification result")]
    fn table_panics_on_length_mismatch() {
        let texts = vec!["one".to_string()];
        table(&texts, &[]);
    }
}
