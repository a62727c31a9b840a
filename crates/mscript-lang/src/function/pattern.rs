use std::{
    borrow::Cow,
    sync::{Arc, LazyLock, Mutex},
};

use regex_lite::{Captures, Regex, RegexBuilder};
use rustc_hash::FxHashMap;

use crate::{
    Target,
    error::runtime::Exception,
    value::{Array, Key, Value},
};

const MAX_CACHED_PATTERNS: usize = 512;

/// Characters that make a pattern more than a plain substring.
const METACHARACTERS: &[char] = &['[', '\\', '^', '$', '.', '|', '?', '*', '+', '(', ')', '{'];

const QUOTE_START: &str = "\\Q";
const QUOTE_END: &str = "\\E";

static PATTERN_CACHE: LazyLock<PatternCache> = LazyLock::new(PatternCache::default);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Flags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_all: bool,
}

impl Flags {
    pub fn parse(flags: &str, target: &Target) -> Result<Self, Exception> {
        flags.chars().try_fold(Flags::default(), |mut acc, c| {
            match c.to_ascii_lowercase() {
                'i' => acc.case_insensitive = true,
                'm' => acc.multi_line = true,
                's' => acc.dot_all = true,
                _ => {
                    return Err(Exception::format(
                        format!("Unrecognized flag: {}", c),
                        target,
                    ));
                }
            }
            Ok(acc)
        })
    }
}

#[derive(Debug)]
pub struct CompiledPattern {
    pub source: String,
    pub flags: Flags,
    pub regex: Regex,
}

impl CompiledPattern {
    pub fn new(source: &str, flags: Flags, target: &Target) -> Result<Self, Exception> {
        let regex = RegexBuilder::new(&expand_quotes(source))
            .case_insensitive(flags.case_insensitive)
            .multi_line(flags.multi_line)
            .dot_matches_new_line(flags.dot_all)
            .build()
            .map_err(|e| {
                Exception::format(
                    format!("Invalid regular expression \"{}\": {}", source, e),
                    target,
                )
            })?;

        Ok(Self {
            source: source.to_string(),
            flags,
            regex,
        })
    }

    /// Number of capture groups, not counting the whole match.
    pub fn group_count(&self) -> usize {
        self.regex.captures_len().saturating_sub(1)
    }

    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.regex
            .capture_names()
            .position(|n| n.is_some_and(|n| n == name))
    }

    /// The whole match at `0`, every group at its index (`Null` when it did not
    /// participate) and every named group under its name.
    pub fn captures_to_array(&self, captures: &Captures<'_>) -> Array {
        let mut array = Array::associative();

        for i in 0..captures.len() {
            array.set(i, captures.get(i).map(|m| m.as_str()));
        }

        for name in self.regex.capture_names().flatten() {
            array.set(Key::name(name), captures.name(name).map(|m| m.as_str()));
        }

        array
    }
}

/// Process-wide cache of compiled patterns.
#[derive(Debug, Default)]
pub struct PatternCache {
    patterns: Mutex<FxHashMap<(String, Flags), Arc<CompiledPattern>>>,
}

impl PatternCache {
    pub fn get_or_compile(
        &self,
        source: &str,
        flags: Flags,
        target: &Target,
    ) -> Result<Arc<CompiledPattern>, Exception> {
        let Ok(mut patterns) = self.patterns.lock() else {
            return CompiledPattern::new(source, flags, target).map(Arc::new);
        };

        if let Some(pattern) = patterns.get(&(source.to_string(), flags)) {
            return Ok(Arc::clone(pattern));
        }

        let pattern = Arc::new(CompiledPattern::new(source, flags, target)?);

        if patterns.len() >= MAX_CACHED_PATTERNS {
            tracing::trace!(size = patterns.len(), "clearing pattern cache");
            patterns.clear();
        }
        patterns.insert((source.to_string(), flags), Arc::clone(&pattern));

        Ok(pattern)
    }

    pub fn len(&self) -> usize {
        self.patterns.lock().map_or(0, |patterns| patterns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compiles a pattern argument: either a string, or an array of `[pattern, flags]`.
pub fn compile_pattern(value: &Value, target: &Target) -> Result<Arc<CompiledPattern>, Exception> {
    match value {
        Value::Array(array) => {
            let source = array
                .get(&Key::Index(0))
                .ok_or_else(|| Exception::format("Missing pattern in pattern array", target))?;
            let flags = match array.get(&Key::Index(1)) {
                Some(flags) if !flags.is_null() => Flags::parse(&flags.to_text(), target)?,
                _ => Flags::default(),
            };

            PATTERN_CACHE.get_or_compile(&source.to_text(), flags, target)
        }
        other => PATTERN_CACHE.get_or_compile(&other.to_text(), Flags::default(), target),
    }
}

/// Rewrites `\Q...\E` sections into escaped text. An unterminated `\Q` quotes
/// to the end of the pattern.
fn expand_quotes(pattern: &str) -> Cow<'_, str> {
    if !pattern.contains(QUOTE_START) {
        return Cow::Borrowed(pattern);
    }

    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let escaped = &rest[pos..];

        if let Some(quoted) = escaped.strip_prefix(QUOTE_START) {
            let (literal, after) = match quoted.find(QUOTE_END) {
                Some(end) => (&quoted[..end], &quoted[end + QUOTE_END.len()..]),
                None => (quoted, ""),
            };
            out.push_str(&regex_lite::escape(literal));
            rest = after;
        } else {
            let len = escaped
                .chars()
                .nth(1)
                .map_or(1, |c| 1 + c.len_utf8());
            out.push_str(&escaped[..len]);
            rest = &escaped[len..];
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

/// Returns the plain text a pattern matches when it has no live metacharacters.
///
/// Either the whole pattern is one `\Q...\E` section, or it contains none of
/// `[ \ ^ $ . | ? * + ( ) {`. Anything else is `None`, even when it would
/// in fact match literally.
pub fn literal_regex(pattern: &str) -> Option<Cow<'_, str>> {
    if let Some(inner) = pattern
        .strip_prefix(QUOTE_START)
        .and_then(|p| p.strip_suffix(QUOTE_END))
    {
        if !inner.contains(QUOTE_START) && !inner.contains(QUOTE_END) {
            return Some(Cow::Borrowed(inner));
        }
        return None;
    }

    if pattern.contains(METACHARACTERS) {
        None
    } else {
        Some(Cow::Borrowed(pattern))
    }
}

pub fn is_literal_regex(pattern: &str) -> bool {
    literal_regex(pattern).is_some()
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Group(usize),
}

/// A parsed replacement string: `$n` and `${name}` refer to groups, `\x` is a
/// literal `x`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replacement {
    segments: Vec<Segment>,
}

impl Replacement {
    pub fn parse(text: &str, pattern: &CompiledPattern, target: &Target) -> Result<Self, Exception> {
        parse_segments(
            text,
            pattern.group_count(),
            |name| pattern.group_index(name),
            target,
        )
        .map(|segments| Self { segments })
    }

    pub fn append(&self, captures: &Captures<'_>, out: &mut String) {
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Group(i) => {
                    if let Some(m) = captures.get(*i) {
                        out.push_str(m.as_str());
                    }
                }
            }
        }
    }

    /// Replaces every match of `pattern` in `subject`.
    pub fn replace_all(&self, pattern: &CompiledPattern, subject: &str) -> String {
        let mut out = String::with_capacity(subject.len());
        let mut last = 0;

        for captures in pattern.regex.captures_iter(subject) {
            let Some(m) = captures.get(0) else {
                continue;
            };
            out.push_str(&subject[last..m.start()]);
            self.append(&captures, &mut out);
            last = m.end();
        }

        out.push_str(&subject[last..]);
        out
    }
}

/// Evaluates a replacement string against a pattern that is the plain text
/// `literal`, so that `$0` is the only valid group reference.
pub fn expand_literal_replacement(
    text: &str,
    literal: &str,
    target: &Target,
) -> Result<String, Exception> {
    let segments = parse_segments(text, 0, |_| None, target)?;

    Ok(segments
        .into_iter()
        .fold(String::with_capacity(text.len()), |mut out, segment| {
            match segment {
                Segment::Literal(s) => out.push_str(&s),
                Segment::Group(_) => out.push_str(literal),
            }
            out
        }))
}

fn parse_segments(
    text: &str,
    group_count: usize,
    group_index: impl Fn(&str) -> Option<usize>,
    target: &Target,
) -> Result<Vec<Segment>, Exception> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next().ok_or_else(|| {
                    Exception::format("Character to be escaped is missing", target)
                })?;
                literal.push(escaped);
            }
            '$' => {
                let group = match chars.next() {
                    Some('{') => {
                        let mut name = String::new();
                        loop {
                            match chars.next() {
                                Some('}') => break,
                                Some(c) => name.push(c),
                                None => {
                                    return Err(Exception::format(
                                        "Named capturing group is missing trailing '}'",
                                        target,
                                    ));
                                }
                            }
                        }
                        group_index(&name).ok_or_else(|| {
                            Exception::format(format!("No group with name {{{}}}", name), target)
                        })?
                    }
                    Some(d) if d.is_ascii_digit() => {
                        let mut group = d.to_digit(10).map_or(0, |d| d as usize);
                        if group > group_count {
                            return Err(Exception::format(format!("No group {}", group), target));
                        }

                        while let Some(next) = chars.peek().and_then(|c| c.to_digit(10)) {
                            let candidate = group * 10 + next as usize;
                            if candidate > group_count {
                                break;
                            }
                            group = candidate;
                            chars.next();
                        }
                        group
                    }
                    _ => {
                        return Err(Exception::format("Illegal group reference", target));
                    }
                };

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Group(group));
            }
            c => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}
