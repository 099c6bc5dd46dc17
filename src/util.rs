//! Small text and time helpers shared by the collector and consumers.

use chrono::Local;

/// Formats the current local time as `HH:MM:SS.mmm`.
///
/// Shared by the table and CSV writers so that one iteration carries one
/// timestamp across all sinks.
pub fn iso_time_ms() -> String {
    Local::now().format("%H:%M:%S%.3f").to_string()
}

/// Skips `count` whitespace-delimited words and returns the remainder of
/// the string, starting at the first character of the following word.
///
/// Assumes `s` points at the start of a word. Returns an empty string when
/// the input runs out of words. Used for positional parsing of
/// `/proc/<pid>/stat`, where fields must be located by counting words from
/// the line start.
pub fn nth_word(s: &str, count: usize) -> &str {
    let mut rest = s;
    for _ in 0..count {
        // Find the end of the current word, then the start of the next one.
        match rest.find(char::is_whitespace) {
            Some(end) => rest = rest[end..].trim_start(),
            None => return "",
        }
        if rest.is_empty() {
            return "";
        }
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nth_word_skips_single_word() {
        assert_eq!(nth_word("one two three", 1), "two three");
    }

    #[test]
    fn test_nth_word_skips_multiple_words() {
        assert_eq!(nth_word("a b c d", 2), "c d");
        assert_eq!(nth_word("a b c d", 3), "d");
    }

    #[test]
    fn test_nth_word_zero_returns_input() {
        assert_eq!(nth_word("a b", 0), "a b");
    }

    #[test]
    fn test_nth_word_handles_runs_of_whitespace() {
        assert_eq!(nth_word("a   b\t c", 2), "c");
    }

    #[test]
    fn test_nth_word_past_end_is_empty() {
        assert_eq!(nth_word("a b", 2), "");
        assert_eq!(nth_word("a b", 5), "");
        assert_eq!(nth_word("", 1), "");
    }

    #[test]
    fn test_iso_time_ms_has_millisecond_precision() {
        let ts = iso_time_ms();
        // HH:MM:SS.mmm
        assert_eq!(ts.len(), 12);
        assert_eq!(&ts[8..9], ".");
    }
}
