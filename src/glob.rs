//! Path-aware glob matching
//!
//! `*` and `?` never cross a `/`. A `**` that fills a whole segment does; a
//! `**/` segment also matches zero directories, so `**/y.txt` matches a
//! top-level `y.txt`. Anywhere else `**` behaves like `*`. Character classes
//! (`[abc]`, `[!abc]`) and backslash escapes are supported.

use crate::{Error, Result};
use regex::Regex;
use std::fmt;

/// Pattern used when a caller lists without one
pub const DEFAULT_PATTERN: &str = "**/*";

/// A compiled glob pattern
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a glob pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let expr = translate(pattern);
        let regex = Regex::new(&expr).map_err(|_| Error::InvalidPattern(pattern.to_string()))?;
        Ok(Pattern {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Check a bucket-relative key against the pattern
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// The original glob text
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                let run_end = chars[i..]
                    .iter()
                    .position(|&c| c != '*')
                    .map_or(chars.len(), |n| i + n);
                let whole_segment = run_end - i >= 2
                    && (i == 0 || chars[i - 1] == '/')
                    && matches!(chars.get(run_end), None | Some('/'));

                if !whole_segment {
                    out.push_str("[^/]*");
                    i = run_end;
                } else if run_end < chars.len() {
                    // zero or more whole directories
                    out.push_str("(?:[^/]*/)*");
                    i = run_end + 1;
                } else {
                    out.push_str(".*");
                    i = run_end;
                }
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push_str(&translate_class(&chars[i + 1..end]));
                    i = end + 1;
                }
                None => {
                    out.push_str(r"\[");
                    i += 1;
                }
            },
            '\\' if i + 1 < chars.len() => {
                out.push_str(&regex::escape(&chars[i + 1].to_string()));
                i += 2;
            }
            c => {
                out.push_str(&regex::escape(&c.to_string()));
                i += 1;
            }
        }
    }

    out.push('$');
    out
}

/// Index of the `]` closing the class opened at `start`
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if matches!(chars.get(i), Some('!') | Some('^')) {
        i += 1;
    }
    // a leading `]` is literal
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    while i < chars.len() {
        if chars[i] == ']' {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn translate_class(body: &[char]) -> String {
    let mut out = String::from("[");
    let mut rest = body;
    if let Some(('!' | '^', tail)) = rest.split_first() {
        out.push('^');
        // negated classes still stop at segment boundaries
        out.push('/');
        rest = tail;
    }
    for &c in rest {
        match c {
            '\\' | '[' | ']' | '&' | '~' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matching<'a>(pattern: &str, keys: &[&'a str]) -> Vec<&'a str> {
        let pattern = Pattern::new(pattern).unwrap();
        keys.iter().copied().filter(|k| pattern.matches(k)).collect()
    }

    const KEYS: &[&str] = &["x/y.txt", "x/z/y.txt", "y.txt"];

    #[test]
    fn test_single_star_stays_in_segment() {
        assert_eq!(matching("*.txt", KEYS), vec!["y.txt"]);
        assert_eq!(matching("x/*.txt", KEYS), vec!["x/y.txt"]);
    }

    #[test]
    fn test_double_star_crosses_segments() {
        assert_eq!(matching("**/y.txt", KEYS), KEYS.to_vec());
        assert_eq!(matching(DEFAULT_PATTERN, KEYS), KEYS.to_vec());
        assert_eq!(matching("x/**", KEYS), vec!["x/y.txt", "x/z/y.txt"]);
    }

    #[test]
    fn test_double_star_inside_segment_is_single_star() {
        assert_eq!(matching("x**", KEYS), Vec::<&str>::new());
        assert_eq!(matching("x/**.txt", KEYS), vec!["x/y.txt"]);
        assert_eq!(matching("**y.txt", KEYS), vec!["y.txt"]);
        assert_eq!(matching("x/z**/y.txt", KEYS), vec!["x/z/y.txt"]);
    }

    #[test]
    fn test_question_mark_and_classes() {
        let keys = ["a1.log", "b2.log", "ab.log", "a/b.log"];
        assert_eq!(matching("??.log", &keys), vec!["a1.log", "b2.log", "ab.log"]);
        assert_eq!(matching("[ab][0-9].log", &keys), vec!["a1.log", "b2.log"]);
        assert_eq!(matching("[!a]*.log", &keys), vec!["b2.log"]);
        assert_eq!(matching("a?b.log", &keys), Vec::<&str>::new());
    }

    #[test]
    fn test_literals_are_escaped() {
        let keys = ["a+b(1).txt", "aab1.txt"];
        assert_eq!(matching("a+b(1).txt", &keys), vec!["a+b(1).txt"]);
        assert_eq!(matching(r"a\*", &["a*", "ab"]), vec!["a*"]);
        assert_eq!(matching("a[b", &["a[b"]), vec!["a[b"]);
    }
}
