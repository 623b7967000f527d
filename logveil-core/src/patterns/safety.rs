//! safety.rs - Backtracking-hazard scan for user-supplied patterns.
//!
//! The scan walks the pattern source once, tracking group nesting, and rejects
//! the constructs that make backtracking engines explode: an unbounded
//! quantifier applied to a group that already repeats, the same applied to an
//! alternation with repeating branches, and repetition bounds large enough to
//! blow up the compiled program.
//!
//! License: MIT OR APACHE 2.0

use crate::config::MAX_REPETITION_BOUND;
use crate::errors::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantifier {
    /// `?` or `{0,1}`-like bounds that cannot repeat.
    Optional,
    /// `{n}` / `{n,m}` with a finite upper bound.
    Bounded,
    /// `*`, `+`, `{n,}`.
    Unbounded,
}

impl Quantifier {
    fn repeats(self) -> bool {
        !matches!(self, Quantifier::Optional)
    }
}

#[derive(Debug, Default)]
struct GroupFrame {
    repeats_inside: bool,
    alternation: bool,
}

fn reject(pattern: &str, reason: &str) -> FilterError {
    FilterError::ReDoSPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    }
}

/// Parses a quantifier starting at `i`, returning it with the number of chars
/// consumed (including a trailing lazy `?`).
fn parse_quantifier(chars: &[char], i: usize, pattern: &str) -> Result<Option<(Quantifier, usize)>, FilterError> {
    let Some(&c) = chars.get(i) else { return Ok(None) };
    let (quantifier, mut len) = match c {
        '*' | '+' => (Quantifier::Unbounded, 1),
        '?' => (Quantifier::Optional, 1),
        '{' => match parse_braces(chars, i) {
            Some((min, max, consumed)) => {
                let largest = max.unwrap_or(min);
                if largest > MAX_REPETITION_BOUND || min > MAX_REPETITION_BOUND {
                    return Err(reject(pattern, "pattern contains excessive repetition bounds"));
                }
                let q = match max {
                    None => Quantifier::Unbounded,
                    Some(m) if m <= 1 => Quantifier::Optional,
                    Some(_) => Quantifier::Bounded,
                };
                (q, consumed)
            }
            None => return Ok(None),
        },
        _ => return Ok(None),
    };
    if chars.get(i + len) == Some(&'?') {
        len += 1;
    }
    Ok(Some((quantifier, len)))
}

/// Parses `{n}`, `{n,}` or `{n,m}`. Returns `(min, max, consumed)`; `max` is
/// `None` for an open upper bound. Anything else is a literal brace.
fn parse_braces(chars: &[char], start: usize) -> Option<(u64, Option<u64>, usize)> {
    let mut j = start + 1;
    let mut min = String::new();
    while let Some(c) = chars.get(j).filter(|c| c.is_ascii_digit()) {
        min.push(*c);
        j += 1;
    }
    if min.is_empty() {
        return None;
    }
    let min_val = min.parse::<u64>().unwrap_or(u64::MAX);
    match chars.get(j) {
        Some('}') => Some((min_val, Some(min_val), j + 1 - start)),
        Some(',') => {
            j += 1;
            let mut max = String::new();
            while let Some(c) = chars.get(j).filter(|c| c.is_ascii_digit()) {
                max.push(*c);
                j += 1;
            }
            if chars.get(j) != Some(&'}') {
                return None;
            }
            let max_val = if max.is_empty() {
                None
            } else {
                Some(max.parse::<u64>().unwrap_or(u64::MAX))
            };
            Some((min_val, max_val, j + 1 - start))
        }
        _ => None,
    }
}

/// Skips a bracketed character class starting at `start` (which holds `[`).
/// Returns the index just past the closing bracket, or the end of input.
fn skip_class(chars: &[char], start: usize) -> usize {
    let mut j = start + 1;
    if chars.get(j) == Some(&'^') {
        j += 1;
    }
    // A leading ']' is literal.
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    let mut depth = 1usize;
    while let Some(&c) = chars.get(j) {
        match c {
            '\\' => j += 1,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return j + 1;
                }
            }
            _ => {}
        }
        j += 1;
    }
    chars.len()
}

/// Rejects patterns with nested unbounded quantifiers, quantified alternations
/// over repeating branches, or repetition bounds above `MAX_REPETITION_BOUND`.
///
/// Malformed syntax is left for the regex compiler to report.
pub fn check_backtracking_hazards(pattern: &str) -> Result<(), FilterError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut stack: Vec<GroupFrame> = vec![GroupFrame::default()];
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                if let Some((q, len)) = parse_quantifier(&chars, i, pattern)? {
                    mark_repeat(&mut stack, q);
                    i += len;
                }
            }
            '[' => {
                i = skip_class(&chars, i);
                if let Some((q, len)) = parse_quantifier(&chars, i, pattern)? {
                    mark_repeat(&mut stack, q);
                    i += len;
                }
            }
            '(' => {
                stack.push(GroupFrame::default());
                i += 1;
            }
            '|' => {
                if let Some(top) = stack.last_mut() {
                    top.alternation = true;
                }
                i += 1;
            }
            ')' => {
                i += 1;
                let closed = if stack.len() > 1 { stack.pop() } else { None };
                let quantifier = parse_quantifier(&chars, i, pattern)?;
                let Some(frame) = closed else {
                    if let Some((_, len)) = quantifier {
                        i += len;
                    }
                    continue;
                };
                if let Some((q, len)) = quantifier {
                    if q == Quantifier::Unbounded && frame.repeats_inside {
                        let reason = if frame.alternation {
                            "pattern contains a quantified alternation with repeating branches"
                        } else {
                            "pattern contains dangerous nested quantifiers"
                        };
                        return Err(reject(pattern, reason));
                    }
                    i += len;
                    mark_repeat(&mut stack, q);
                }
                if frame.repeats_inside {
                    if let Some(parent) = stack.last_mut() {
                        parent.repeats_inside = true;
                    }
                }
            }
            _ => {
                i += 1;
                if let Some((q, len)) = parse_quantifier(&chars, i, pattern)? {
                    mark_repeat(&mut stack, q);
                    i += len;
                }
            }
        }
    }
    Ok(())
}

fn mark_repeat(stack: &mut [GroupFrame], q: Quantifier) {
    if q.repeats() {
        if let Some(top) = stack.last_mut() {
            top.repeats_inside = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(p: &str) -> bool {
        matches!(check_backtracking_hazards(p), Err(FilterError::ReDoSPattern { .. }))
    }

    #[test]
    fn test_nested_quantifiers_rejected() {
        assert!(rejected("(a+)+b"));
        assert!(rejected("(a*)*"));
        assert!(rejected("((ab+))+"));
        assert!(rejected("(?:\\d+)*x"));
        assert!(rejected("([a-z]+)+$"));
    }

    #[test]
    fn test_quantified_alternation_rejected() {
        let err = check_backtracking_hazards("(a+|b)+").unwrap_err();
        assert!(err.to_string().contains("alternation"));
    }

    #[test]
    fn test_excessive_repetition_rejected() {
        assert!(rejected("a{1,10000}"));
        assert!(rejected("a{5000}"));
        assert!(rejected("x{2000,}"));
    }

    #[test]
    fn test_safe_patterns_accepted() {
        for p in [
            "a+b",
            "\\d{3}-\\d{2}-\\d{4}",
            "(a|b)+",
            "cat|dog",
            "a{1,1000}",
            "(?:\\d{4}[- ]?){3}\\d{4}",
            "(?i)password=(\\w+)",
            "[(+)]+",
            "(ab)?",
            "\\(a+\\)+",
            "x{,5}",
        ] {
            assert!(check_backtracking_hazards(p).is_ok(), "expected '{}' to be accepted", p);
        }
    }
}
