use std::fmt::{self, Display, Formatter};

use nom_locate::LocatedSpan;
use smol_str::SmolStr;

pub type Span<'a> = LocatedSpan<&'a str, Option<&'a SmolStr>>;

/// Where a node came from. Every compile and runtime error carries one.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Hash)]
pub struct Target {
    pub file: Option<SmolStr>,
    pub line: u32,
    pub column: usize,
}

impl Default for Target {
    fn default() -> Self {
        Target {
            file: None,
            line: 1,
            column: 1,
        }
    }
}

impl Target {
    pub fn new(line: u32, column: usize) -> Self {
        Target {
            file: None,
            line,
            column,
        }
    }

    pub fn with_file(file: impl Into<SmolStr>, line: u32, column: usize) -> Self {
        Target {
            file: Some(file.into()),
            line,
            column,
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

impl<'a> From<Span<'a>> for Target {
    fn from(span: Span<'a>) -> Self {
        Target {
            file: span.extra.cloned(),
            line: span.location_line(),
            column: span.get_utf8_column(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::without_file(Target::new(3, 7), "3:7")]
    #[case::with_file(Target::with_file("main.ms", 1, 12), "main.ms:1:12")]
    fn test_display(#[case] target: Target, #[case] expected: &str) {
        assert_eq!(target.to_string(), expected);
    }

    #[test]
    fn test_from_span() {
        let file = SmolStr::new("a.ms");
        let span = Span::new_extra("abc", Some(&file));
        let target = Target::from(span);
        assert_eq!(target, Target::with_file("a.ms", 1, 1));
    }
}
