//! Maven version parsing and ordering.
//!
//! Versions come in two shapes:
//! - [`VersionNumber`]: the common `major.minor.revision[-qualifier]` form,
//!   compared field by field. A version without a qualifier ranks above any
//!   qualified version with the same numbers (`1.0-beta` < `1.0`).
//! - [`VersionGeneric`]: anything else (`1.0a1`, `r09`, `2.0rc1.Final`),
//!   tokenized into numbers and qualifiers with Maven's qualifier ranking:
//!   `alpha` < `beta` < `milestone` < `rc` = `cr` < `snapshot` < `""` = `ga`
//!   = `final` = `release` < `sp` < any unknown text.
//!
//! Range expressions (`[1.0,2.0)`) are not supported and parse to
//! [`Version::UNKNOWN`].

use std::cmp::Ordering;
use std::fmt;

/// Item count at or above which a numeric token is kept as a digit string.
const BIG_NUMBER_DIGITS: usize = 10;

/// A parsed version, either semantic or generic.
#[derive(Debug, Clone)]
pub enum Version {
    Number(VersionNumber),
    Generic(VersionGeneric),
}

impl Version {
    /// Sentinel for "unspecified, needs resolution".
    pub const UNKNOWN: Version = Version::Number(VersionNumber::UNKNOWN);

    pub fn parse(input: &str) -> Self {
        let s = input.trim();
        if s.is_empty() {
            return Self::UNKNOWN;
        }
        if let Some(number) = VersionNumber::parse(s) {
            return Version::Number(number);
        }
        if s.starts_with('[') || s.starts_with('(') {
            tracing::debug!("version range {s} is not supported, treating as unknown");
            return Self::UNKNOWN;
        }
        Version::Generic(VersionGeneric::parse(s))
    }

    /// Whether this is the [`Version::UNKNOWN`] sentinel.
    pub fn is_unknown(&self) -> bool {
        match self {
            Version::Number(n) => n.is_unknown(),
            Version::Generic(g) => g.original.is_empty(),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        match self {
            Version::Number(n) => n.is_snapshot(),
            Version::Generic(g) => g.original.to_ascii_uppercase().contains("SNAPSHOT"),
        }
    }

    /// The semantic form, if this version has one.
    pub fn as_number(&self) -> Option<&VersionNumber> {
        match self {
            Version::Number(n) => Some(n),
            Version::Generic(_) => None,
        }
    }

    /// The token form of this version.
    ///
    /// Token ordering is total across both shapes, unlike [`Version`]'s own
    /// `Ord`, which compares two semantic versions field by field.
    pub fn to_generic(&self) -> VersionGeneric {
        match self {
            Version::Number(n) => VersionGeneric::parse(&n.to_string()),
            Version::Generic(g) => g.clone(),
        }
    }
}

/// Sort a list that may mix semantic and generic versions, ascending by
/// tokens. Token-equal spellings (`2.0-GA`, `2.0.Final`) fall back to text.
pub fn sort_versions(versions: &mut [Version]) {
    versions.sort_by_cached_key(|v| (v.to_generic(), v.to_string()));
}

impl Default for Version {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Number(n) => n.fmt(f),
            Version::Generic(g) => g.fmt(f),
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Version::Number(a), Version::Number(b)) => a.cmp(b),
            (Version::Generic(a), Version::Generic(b)) => a.cmp(b),
            // Mixed shapes fall back to the token comparison on both sides.
            _ => self.to_generic().cmp(&other.to_generic()),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

/// `major(.minor(.revision)?)?([.-]qualifier)?`
#[derive(Debug, Clone)]
pub struct VersionNumber {
    pub major: u64,
    pub minor: Option<u64>,
    pub revision: Option<u64>,
    pub qualifier: String,
    /// The character that separated the qualifier (`-` or `.`).
    pub separator: String,
}

impl VersionNumber {
    pub const UNKNOWN: VersionNumber = VersionNumber {
        major: 0,
        minor: Some(0),
        revision: Some(0),
        qualifier: String::new(),
        separator: String::new(),
    };

    /// Parse the semantic grammar, returning `None` when the input does not match.
    pub fn parse(s: &str) -> Option<Self> {
        let (major, mut rest) = take_number(s)?;
        let mut minor = None;
        let mut revision = None;

        if let Some((n, tail)) = rest.strip_prefix('.').and_then(take_number) {
            minor = Some(n);
            rest = tail;
            if let Some((n, tail)) = rest.strip_prefix('.').and_then(take_number) {
                revision = Some(n);
                rest = tail;
            }
        }

        if rest.is_empty() {
            return Some(Self {
                major,
                minor,
                revision,
                qualifier: String::new(),
                separator: String::new(),
            });
        }

        let separator = rest.chars().next().filter(|c| *c == '.' || *c == '-')?;
        let qualifier = &rest[1..];
        if qualifier.is_empty() {
            return None;
        }
        Some(Self {
            major,
            minor,
            revision,
            qualifier: qualifier.to_string(),
            separator: separator.to_string(),
        })
    }

    /// Whether this has the exact shape of [`VersionNumber::UNKNOWN`]; an
    /// explicit `0` or `0.0` is a real version.
    pub fn is_unknown(&self) -> bool {
        self.major == 0
            && self.minor == Some(0)
            && self.revision == Some(0)
            && self.qualifier.is_empty()
    }

    pub fn is_snapshot(&self) -> bool {
        self.qualifier.to_ascii_uppercase().contains("SNAPSHOT")
    }

    /// `major.minor.revision` with absent parts rendered as `0`.
    pub fn base(&self) -> String {
        format!(
            "{}.{}.{}",
            self.major,
            self.minor.unwrap_or(0),
            self.revision.unwrap_or(0)
        )
    }

    /// The same numbers with a different qualifier.
    pub fn with_qualifier(&self, qualifier: &str) -> Self {
        Self {
            major: self.major,
            minor: self.minor,
            revision: self.revision,
            qualifier: qualifier.to_string(),
            separator: if qualifier.is_empty() {
                String::new()
            } else if self.separator.is_empty() {
                "-".to_string()
            } else {
                self.separator.clone()
            },
        }
    }
}

/// Split a leading run of ASCII digits off `s` and parse it.
fn take_number(s: &str) -> Option<(u64, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let n = s[..end].parse().ok()?;
    Some((n, &s[end..]))
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{minor}")?;
        }
        if let Some(revision) = self.revision {
            write!(f, ".{revision}")?;
        }
        if !self.qualifier.is_empty() {
            write!(f, "{}{}", self.separator, self.qualifier)?;
        }
        Ok(())
    }
}

/// Numbers first, then qualifiers: none ranks highest, the rest compare
/// case-insensitively as text. So `1.0-sp` < `1.0` here, while the token
/// ordering of [`VersionGeneric`] puts `sp` above the release.
impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.unwrap_or(0).cmp(&other.minor.unwrap_or(0)))
            .then_with(|| self.revision.unwrap_or(0).cmp(&other.revision.unwrap_or(0)))
            .then_with(|| compare_qualifiers(&self.qualifier, &other.qualifier))
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionNumber {}

fn compare_qualifiers(a: &str, b: &str) -> Ordering {
    if a.eq_ignore_ascii_case(b) {
        return Ordering::Equal;
    }
    match (a.is_empty(), b.is_empty()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()),
    }
}

/// A version that does not fit the semantic grammar, kept as a token list.
#[derive(Debug, Clone)]
pub struct VersionGeneric {
    original: String,
    items: Vec<Item>,
}

impl VersionGeneric {
    pub fn parse(s: &str) -> Self {
        Self {
            original: s.to_string(),
            items: tokenize(s),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

impl fmt::Display for VersionGeneric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Ord for VersionGeneric {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_items(&self.items, &other.items)
    }
}

impl PartialOrd for VersionGeneric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionGeneric {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionGeneric {}

/// One token of a [`VersionGeneric`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Number(Numeric),
    /// A well-known qualifier, by rank (`alpha` = -5 ... `sp` = 1).
    Qualifier(i32),
    /// Unrecognized text, lower-cased.
    Text(String),
    Min,
    Max,
}

/// A numeric token; runs of ten or more digits are kept as a digit string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Numeric {
    Int(u64),
    Big(String),
}

impl Numeric {
    fn parse(digits: &str) -> Self {
        let stripped = digits.trim_start_matches('0');
        if stripped.len() >= BIG_NUMBER_DIGITS {
            return Numeric::Big(stripped.to_string());
        }
        Numeric::Int(stripped.parse().unwrap_or(0))
    }

    fn is_zero(&self) -> bool {
        matches!(self, Numeric::Int(0))
    }
}

impl Ord for Numeric {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => a.cmp(b),
            (Numeric::Big(a), Numeric::Big(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Numeric::Int(_), Numeric::Big(_)) => Ordering::Less,
            (Numeric::Big(_), Numeric::Int(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Numeric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn qualifier_rank(token: &str) -> Option<i32> {
    match token {
        "alpha" => Some(-5),
        "beta" => Some(-4),
        "milestone" => Some(-3),
        "cr" | "rc" => Some(-2),
        "snapshot" => Some(-1),
        "" | "ga" | "final" | "release" => Some(0),
        "sp" => Some(1),
        _ => None,
    }
}

impl Item {
    fn is_numeric(&self) -> bool {
        matches!(self, Item::Number(_))
    }

    fn is_sentinel(&self) -> bool {
        matches!(self, Item::Min | Item::Max)
    }

    /// Whether this item equals the implicit value used to pad a shorter list.
    fn is_padding(&self) -> bool {
        match self {
            Item::Number(n) => n.is_zero(),
            Item::Qualifier(rank) => *rank == 0,
            _ => false,
        }
    }

    fn compare_to_padding(&self) -> Ordering {
        match self {
            Item::Number(n) => {
                if n.is_zero() {
                    Ordering::Equal
                } else {
                    Ordering::Greater
                }
            }
            Item::Qualifier(rank) => rank.cmp(&0),
            Item::Text(_) | Item::Max => Ordering::Greater,
            Item::Min => Ordering::Less,
        }
    }

    fn compare(&self, other: &Item) -> Ordering {
        match (self, other) {
            (Item::Min, Item::Min) | (Item::Max, Item::Max) => Ordering::Equal,
            (Item::Min, _) | (_, Item::Max) => Ordering::Less,
            (Item::Max, _) | (_, Item::Min) => Ordering::Greater,
            (Item::Number(a), Item::Number(b)) => a.cmp(b),
            (Item::Number(_), _) => Ordering::Greater,
            (_, Item::Number(_)) => Ordering::Less,
            (Item::Qualifier(a), Item::Qualifier(b)) => a.cmp(b),
            (Item::Text(a), Item::Text(b)) => a.cmp(b),
            (Item::Qualifier(_), Item::Text(_)) => Ordering::Less,
            (Item::Text(_), Item::Qualifier(_)) => Ordering::Greater,
        }
    }
}

#[derive(Debug)]
enum Token {
    Digits(String),
    Word(String),
}

fn tokenize(s: &str) -> Vec<Item> {
    // (token, directly followed by the next token without a separator)
    let mut tokens: Vec<(Token, bool)> = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    for ch in s.chars() {
        if matches!(ch, '.' | '-' | '_') {
            if !current.is_empty() {
                tokens.push((make_token(&current, in_digits), false));
                current.clear();
            }
            continue;
        }
        let digit = ch.is_ascii_digit();
        if !current.is_empty() && digit != in_digits {
            tokens.push((make_token(&current, in_digits), true));
            current.clear();
        }
        in_digits = digit;
        current.push(ch);
    }
    if !current.is_empty() {
        tokens.push((make_token(&current, in_digits), false));
    }

    let last = tokens.len().saturating_sub(1);
    let mut items = Vec::with_capacity(tokens.len());
    for (i, (token, adjacent)) in tokens.iter().enumerate() {
        let item = match token {
            Token::Digits(d) => Item::Number(Numeric::parse(d)),
            Token::Word(w) => {
                let next_is_digits = matches!(tokens.get(i + 1), Some((Token::Digits(_), _)));
                if *adjacent && next_is_digits && w.chars().count() == 1 {
                    match w.as_str() {
                        "a" => Item::Qualifier(-5),
                        "b" => Item::Qualifier(-4),
                        "m" => Item::Qualifier(-3),
                        _ => word_item(w, i == last),
                    }
                } else {
                    word_item(w, i == last)
                }
            }
        };
        items.push(item);
    }

    trim_padding(items)
}

fn make_token(text: &str, digits: bool) -> Token {
    if digits {
        Token::Digits(text.to_string())
    } else {
        Token::Word(text.to_lowercase())
    }
}

fn word_item(word: &str, terminal: bool) -> Item {
    if terminal {
        match word {
            "min" => return Item::Min,
            "max" => return Item::Max,
            _ => {}
        }
    }
    match qualifier_rank(word) {
        Some(rank) => Item::Qualifier(rank),
        None => Item::Text(word.to_string()),
    }
}

/// Drop padding-equivalent items at the end of every numeric / non-numeric run,
/// so `1.0.0` tokenizes like `1` and `1.0-alpha` like `1-alpha`.
fn trim_padding(items: Vec<Item>) -> Vec<Item> {
    let mut out = Vec::with_capacity(items.len());
    let mut run: Vec<Item> = Vec::new();
    for item in items {
        if run.last().is_some_and(|last| last.is_numeric() != item.is_numeric()) {
            flush_run(&mut run, &mut out);
        }
        run.push(item);
    }
    flush_run(&mut run, &mut out);
    out
}

fn flush_run(run: &mut Vec<Item>, out: &mut Vec<Item>) {
    while run.last().is_some_and(Item::is_padding) {
        run.pop();
    }
    out.append(run);
}

fn compare_items(a: &[Item], b: &[Item]) -> Ordering {
    // Kind of the run the comparison is currently walking through.
    let mut numeric = true;
    for i in 0..a.len().max(b.len()) {
        let (ord, kind) = match (a.get(i), b.get(i)) {
            (Some(x), Some(y)) => {
                if i == 0
                    || x.is_numeric() == y.is_numeric()
                    || x.is_sentinel()
                    || y.is_sentinel()
                {
                    (x.compare(y), x.is_numeric())
                } else if x.is_numeric() == numeric {
                    // `y` left the run `x` continues: `x` is measured against padding first.
                    let ord = x
                        .compare_to_padding()
                        .then_with(|| y.compare_to_padding().reverse());
                    (ord, numeric)
                } else {
                    let ord = y
                        .compare_to_padding()
                        .reverse()
                        .then_with(|| x.compare_to_padding());
                    (ord, numeric)
                }
            }
            (Some(x), None) => (x.compare_to_padding(), x.is_numeric()),
            (None, Some(y)) => (y.compare_to_padding().reverse(), y.is_numeric()),
            (None, None) => (Ordering::Equal, numeric),
        };
        if ord != Ordering::Equal {
            return ord;
        }
        numeric = kind;
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s)
    }

    fn g(s: &str) -> VersionGeneric {
        VersionGeneric::parse(s)
    }

    #[test]
    fn empty_is_unknown() {
        assert!(v("").is_unknown());
        assert!(v("   ").is_unknown());
        assert_eq!(v("").to_string(), "0.0.0");
    }

    #[test]
    fn ranges_are_unknown() {
        assert!(v("[1.0,2.0)").is_unknown());
        assert!(v("(,1.5]").is_unknown());
    }

    #[test]
    fn semantic_fields() {
        let n = VersionNumber::parse("1.2.3-SNAPSHOT").unwrap();
        assert_eq!(n.major, 1);
        assert_eq!(n.minor, Some(2));
        assert_eq!(n.revision, Some(3));
        assert_eq!(n.qualifier, "SNAPSHOT");
        assert_eq!(n.separator, "-");
        assert!(n.is_snapshot());
    }

    #[test]
    fn semantic_dot_qualifier() {
        let n = VersionNumber::parse("5.4.2.Final").unwrap();
        assert_eq!(n.revision, Some(2));
        assert_eq!(n.qualifier, "Final");
        assert_eq!(n.separator, ".");
        assert_eq!(n.to_string(), "5.4.2.Final");
    }

    #[test]
    fn non_semantic_falls_back_to_generic() {
        assert!(matches!(v("1.0a1"), Version::Generic(_)));
        assert!(matches!(v("r09"), Version::Generic(_)));
        assert!(matches!(v("1.2.3-"), Version::Generic(_)));
    }

    #[test]
    fn semantic_ordering() {
        assert!(v("1.2.3") < v("1.2.4"));
        assert!(v("1.2") < v("1.2.1"));
        assert!(v("1.10") > v("1.9"));
        assert_eq!(v("1.2"), v("1.2.0"));
    }

    #[test]
    fn empty_qualifier_ranks_highest() {
        assert!(v("1.0-alpha") < v("1.0"));
        assert!(v("1.0-SNAPSHOT") < v("1.0"));
        assert!(v("1.0-rc1") < v("1.0-rc2"));
        assert_eq!(v("1.0-JRE"), v("1.0-jre"));
    }

    #[test]
    fn generic_padding_equivalence() {
        assert_eq!(g("1.0.0"), g("1"));
        assert_eq!(g("1.0.0.ga"), g("1"));
        assert_eq!(g("1.0-final"), g("1"));
        assert_eq!(g("1.0.0-alpha"), g("1-alpha"));
    }

    #[test]
    fn generic_qualifier_ranking() {
        assert!(g("1.0-alpha") < g("1.0"));
        assert!(g("1.0") < g("1.0-sp"));
        assert!(g("1.0-alpha") < g("1.0-beta"));
        assert!(g("1.0-beta") < g("1.0-milestone"));
        assert!(g("1.0-milestone") < g("1.0-rc"));
        assert_eq!(g("1.0-rc"), g("1.0-cr"));
        assert!(g("1.0-rc") < g("1.0-snapshot"));
        assert!(g("1.0-snapshot") < g("1.0"));
        assert!(g("1.0-sp") < g("1.0-xyz"));
    }

    #[test]
    fn single_letter_shorthand() {
        assert_eq!(g("1.0a1"), g("1.0-alpha-1"));
        assert_eq!(g("1.0b2"), g("1.0-beta-2"));
        assert_eq!(g("1.0m3"), g("1.0-milestone-3"));
        // Not followed by digits: plain text.
        assert!(matches!(g("1.0-a").items().last(), Some(Item::Text(t)) if t == "a"));
    }

    #[test]
    fn numeric_beats_qualifier_after_number_run() {
        assert!(g("1.1") > g("1-alpha"));
        assert!(g("1-sp") < g("1.1"));
        assert!(g("1.0a1") < g("1.0.1"));
    }

    #[test]
    fn big_numbers() {
        let items = g("20240615143022").items().to_vec();
        assert_eq!(items, vec![Item::Number(Numeric::Big("20240615143022".into()))]);
        assert!(g("1.20240615143022") > g("1.999999999"));
        assert_eq!(g("1.0000000000042"), g("1.42"));
    }

    #[test]
    fn min_max_sentinels() {
        assert!(g("1.min") < g("1.0-alpha"));
        assert!(g("1.max") > g("1.99999"));
        // Only a terminal token is a sentinel.
        assert!(matches!(g("max-1").items().first(), Some(Item::Text(_))));
    }

    #[test]
    fn mixed_shapes_compare_by_tokens() {
        assert!(v("1.0a1") < v("1.0"));
        assert!(v("1.0.1") > v("1.0b2"));
        assert_eq!(v("1.0.0"), v("1.0ga"));
    }

    #[test]
    fn with_qualifier_keeps_numbers() {
        let n = VersionNumber::parse("1.0-SNAPSHOT").unwrap();
        let ts = n.with_qualifier("20240615.143022-42");
        assert_eq!(ts.to_string(), "1.0-20240615.143022-42");
        assert_eq!(n.with_qualifier("").to_string(), "1.0");
    }
}
