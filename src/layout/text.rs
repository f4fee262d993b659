use super::ops::FontWeight;

/// Text metrics provided by the rendering backend.
///
/// The layout engine only needs widths to know how many lines a wrapped
/// block will take; the backend breaks lines with the same metrics.
pub trait TextMeasure {
    fn text_width(&self, text: &str, weight: FontWeight, size: f32) -> f32;
}

/// Greedy word wrap. Explicit newlines are kept, words wider than
/// `max_width` are split between characters.
pub fn wrap_lines(
    measure: &dyn TextMeasure,
    text: &str,
    weight: FontWeight,
    size: f32,
    max_width: f32,
) -> Vec<String> {
    let fits = |s: &str| measure.text_width(s, weight, size) <= max_width;
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if !current.is_empty() {
                let candidate = format!("{current} {word}");
                if fits(&candidate) {
                    current = candidate;
                    continue;
                }
                lines.push(std::mem::take(&mut current));
            }
            if fits(word) {
                current = word.to_string();
            } else {
                let mut pieces = split_word(&fits, word);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        lines.push(current);
    }

    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

fn split_word(fits: &dyn Fn(&str) -> bool, word: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if !fits(&piece) && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Cuts `text` to one line of at most `max_width`, ending in `...` when
/// anything was removed.
pub fn truncate_to_width(
    measure: &dyn TextMeasure,
    text: &str,
    weight: FontWeight,
    size: f32,
    max_width: f32,
) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if measure.text_width(&single_line, weight, size) <= max_width {
        return single_line;
    }

    let mut cut = single_line;
    while cut.pop().is_some() {
        let candidate = format!("{}...", cut.trim_end());
        if measure.text_width(&candidate, weight, size) <= max_width {
            return candidate;
        }
    }
    "...".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is 5pt wide at any size.
    struct Mono;

    impl TextMeasure for Mono {
        fn text_width(&self, text: &str, _: FontWeight, _: f32) -> f32 {
            text.chars().count() as f32 * 5.0
        }
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_lines(&Mono, "one two three four", FontWeight::Regular, 10.0, 45.0);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn keeps_explicit_newlines_and_splits_long_words() {
        let lines = wrap_lines(&Mono, "ab\nabcdefghij", FontWeight::Regular, 10.0, 20.0);
        assert_eq!(lines, vec!["ab", "abcd", "efgh", "ij"]);
    }

    #[test]
    fn truncates_with_ellipsis() {
        let cut = truncate_to_width(&Mono, "abcdefghij", FontWeight::Regular, 10.0, 35.0);
        assert_eq!(cut, "abcd...");
        let kept = truncate_to_width(&Mono, "abc", FontWeight::Regular, 10.0, 35.0);
        assert_eq!(kept, "abc");
    }
}
