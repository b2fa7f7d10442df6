use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::FreezeError;
use crate::version::Version;

/// Normalize a distribution name per PEP 503: case-fold and collapse runs
/// of `-`, `_` and `.` into a single hyphen, leading and trailing runs
/// included. Idempotent.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.trim().chars() {
        if ch == '-' || ch == '_' || ch == '.' {
            pending_sep = true;
        } else {
            if pending_sep {
                out.push('-');
                pending_sep = false;
            }
            out.extend(ch.to_lowercase());
        }
    }
    if pending_sep {
        out.push('-');
    }
    out
}

/// Version comparison operators allowed in a specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `~=` (compatible release)
    Compatible,
    /// `===` (arbitrary equality)
    Arbitrary,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessEqual => "<=",
            Operator::GreaterEqual => ">=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::Compatible => "~=",
            Operator::Arbitrary => "===",
        }
    }

    /// Match an operator at the start of `s`. Longest match first so `===`
    /// is not read as `==`.
    fn strip(s: &str) -> Option<(Operator, &str)> {
        const TABLE: [(&str, Operator); 8] = [
            ("===", Operator::Arbitrary),
            ("==", Operator::Equal),
            ("!=", Operator::NotEqual),
            ("<=", Operator::LessEqual),
            (">=", Operator::GreaterEqual),
            ("~=", Operator::Compatible),
            ("<", Operator::Less),
            (">", Operator::Greater),
        ];
        TABLE
            .iter()
            .find_map(|(tok, op)| s.strip_prefix(tok).map(|rest| (*op, rest)))
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Operator::strip(s) {
            Some((op, "")) => Ok(op),
            _ => Err(format!("unknown version operator: {s:?}")),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operator/version constraint, e.g. `>=1.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub op: Operator,
    pub version: String,
}

impl Specifier {
    pub fn new(op: Operator, version: impl Into<String>) -> Self {
        Self {
            op,
            version: version.into(),
        }
    }

    /// The parsed version, when the text is a plain version (wildcards and
    /// arbitrary-equality operands are not).
    pub fn parsed_version(&self) -> Option<Version> {
        if self.version.contains('*') {
            return None;
        }
        Version::from_str(&self.version).ok()
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// Render a specifier list the way we write it back: comma-separated, no
/// spaces.
pub fn render_specifiers(specs: &[Specifier]) -> String {
    specs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// What sort of declaration a requirement is. Only `Versioned` requirements
/// take part in resolution and freezing; the rest round-trip untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementKind {
    Versioned,
    /// `-e ./pkg` or a bare local path
    EditablePath { path: String },
    /// `name @ https://...` or a bare URL
    DirectUrl { url: String },
    /// `git+https://...` and friends
    Vcs { reference: String },
}

/// One dependency declaration with its exact source location.
#[derive(Debug, Clone)]
pub struct Requirement {
    /// Original spelling, used when writing back
    pub raw_name: String,
    /// Normalized name, used for comparison and resolver lookups
    pub name: String,
    pub extras: Vec<String>,
    /// Environment marker expression, round-tripped verbatim
    pub markers: Option<String>,
    pub specifiers: Vec<Specifier>,
    pub kind: RequirementKind,
    /// Exact original substring covered by `span`
    pub raw_text: String,
    /// Byte range of `raw_text` within the owning document
    pub span: Range<usize>,
    /// Byte range *within* `raw_text` holding the specifier list. Empty
    /// range at the insertion point when the requirement is unconstrained.
    pub spec_span: Range<usize>,
}

impl Requirement {
    /// The raw specifier text as it appears in the source.
    pub fn spec_text(&self) -> &str {
        &self.raw_text[self.spec_span.clone()]
    }

    /// Splice a new specifier list into the original text, leaving the name
    /// spelling, extras, markers and surrounding spacing untouched.
    pub fn render_with_specifiers(&self, specs: &[Specifier]) -> String {
        let mut out = String::with_capacity(self.raw_text.len() + 16);
        out.push_str(&self.raw_text[..self.spec_span.start]);
        out.push_str(&render_specifiers(specs));
        out.push_str(&self.raw_text[self.spec_span.end..]);
        out
    }
}

const VCS_SCHEMES: [&str; 4] = ["git+", "hg+", "svn+", "bzr+"];

/// Parse one requirement string through the shared specifier grammar.
///
/// `raw` is the exact source substring; `offset` is its byte position in
/// the owning document (used for spans and error locations).
pub fn parse_requirement_string(raw: &str, offset: usize) -> Result<Requirement, FreezeError> {
    let span = offset..offset + raw.len();
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(FreezeError::parse(raw, offset));
    }

    if VCS_SCHEMES.iter().any(|s| trimmed.starts_with(s)) {
        return Ok(non_versioned(
            raw,
            span,
            RequirementKind::Vcs {
                reference: trimmed.to_string(),
            },
        ));
    }

    if trimmed.contains("://") && !trimmed.contains('@') {
        return Ok(non_versioned(
            raw,
            span,
            RequirementKind::DirectUrl {
                url: trimmed.to_string(),
            },
        ));
    }

    if looks_like_path(trimmed) {
        return Ok(non_versioned(
            raw,
            span,
            RequirementKind::EditablePath {
                path: trimmed.to_string(),
            },
        ));
    }

    // Marker clause: everything after the first top-level semicolon.
    let semi = raw.find(';');
    let head = &raw[..semi.unwrap_or(raw.len())];
    let markers = semi.map(|idx| raw[idx + 1..].trim().to_string());

    // Direct reference: `name @ url`
    if let Some(at) = head.find('@') {
        if head[at + 1..].contains("://") {
            let (raw_name, extras) = parse_name_extras(head[..at].trim_end(), raw, offset)?;
            return Ok(Requirement {
                name: normalize_name(&raw_name),
                raw_name,
                extras,
                markers,
                specifiers: Vec::new(),
                kind: RequirementKind::DirectUrl {
                    url: head[at + 1..].trim().to_string(),
                },
                raw_text: raw.to_string(),
                span,
                spec_span: 0..0,
            });
        }
    }

    // Name, then optional extras in brackets.
    let name_start = head.len() - head.trim_start().len();
    let name_end = head[name_start..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'))
        .map_or(head.len(), |i| name_start + i);
    if name_end == name_start {
        return Err(FreezeError::parse(raw, offset));
    }
    let raw_name = head[name_start..name_end].to_string();

    let mut cursor = name_end;
    let mut extras = Vec::new();
    let after_name = head[cursor..].trim_start();
    if after_name.starts_with('[') {
        let bracket_open = cursor + (head[cursor..].len() - after_name.len());
        let Some(rel_close) = head[bracket_open..].find(']') else {
            return Err(FreezeError::parse(raw, offset + bracket_open));
        };
        let inner = &head[bracket_open + 1..bracket_open + rel_close];
        extras = inner
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();
        cursor = bracket_open + rel_close + 1;
    }

    // Specifier region: whatever remains before the marker.
    let region = &head[cursor..];
    let region_trim = region.trim();
    let (specifiers, spec_span) = if region_trim.is_empty() {
        (Vec::new(), cursor..cursor)
    } else {
        let start = cursor + (region.len() - region.trim_start().len());
        let end = start + region_trim.len();
        // PEP 508 allows the list to be parenthesized.
        let inner = region_trim
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .unwrap_or(region_trim);
        (parse_specifier_list(inner, offset + start)?, start..end)
    };

    Ok(Requirement {
        name: normalize_name(&raw_name),
        raw_name,
        extras,
        markers,
        specifiers,
        kind: RequirementKind::Versioned,
        raw_text: raw.to_string(),
        span,
        spec_span,
    })
}

fn non_versioned(raw: &str, span: Range<usize>, kind: RequirementKind) -> Requirement {
    Requirement {
        raw_name: String::new(),
        name: String::new(),
        extras: Vec::new(),
        markers: None,
        specifiers: Vec::new(),
        kind,
        raw_text: raw.to_string(),
        span,
        spec_span: 0..0,
    }
}

fn looks_like_path(s: &str) -> bool {
    s == "."
        || s.starts_with("./")
        || s.starts_with("../")
        || s.starts_with('/')
        || s.starts_with("~/")
        // `.[extras]` / `..[extras]`
        || ((s.starts_with('.') || s.starts_with("..")) && s.contains('['))
}

fn parse_name_extras(
    s: &str,
    raw: &str,
    offset: usize,
) -> Result<(String, Vec<String>), FreezeError> {
    if let Some(open) = s.find('[') {
        let Some(close) = s.rfind(']') else {
            return Err(FreezeError::parse(raw, offset + open));
        };
        let extras = s[open + 1..close]
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();
        Ok((s[..open].trim().to_string(), extras))
    } else {
        Ok((s.to_string(), Vec::new()))
    }
}

fn parse_specifier_list(s: &str, offset: usize) -> Result<Vec<Specifier>, FreezeError> {
    let mut specs = Vec::new();
    let mut pos = 0;
    for part in s.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            return Err(FreezeError::parse(s, offset + pos));
        }
        let Some((op, version)) = Operator::strip(trimmed) else {
            return Err(FreezeError::parse(trimmed, offset + pos));
        };
        let version = version.trim();
        if version.is_empty() || !is_version_text(version) {
            return Err(FreezeError::parse(trimmed, offset + pos));
        }
        specs.push(Specifier::new(op, version));
        pos += part.len() + 1;
    }
    Ok(specs)
}

fn is_version_text(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '*' | '+' | '!' | '-' | '_'))
}

/// Check that a specifier set is internally satisfiable: no pair of
/// constraints whose version sets are provably disjoint. Wildcards and
/// arbitrary-equality operands are not comparable and are left alone.
pub fn specifiers_satisfiable(specs: &[Specifier]) -> bool {
    let mut pin: Option<Version> = None;
    // (bound, inclusive)
    let mut lower: Option<(Version, bool)> = None;
    let mut upper: Option<(Version, bool)> = None;
    let mut exclusions: Vec<Version> = Vec::new();

    for spec in specs {
        let Some(v) = spec.parsed_version() else {
            continue;
        };
        match spec.op {
            Operator::Equal | Operator::Arbitrary => {
                if let Some(existing) = &pin {
                    if *existing != v {
                        return false;
                    }
                }
                pin = Some(v);
            }
            Operator::NotEqual => exclusions.push(v),
            Operator::GreaterEqual => raise_lower(&mut lower, v, true),
            Operator::Greater => raise_lower(&mut lower, v, false),
            Operator::LessEqual => drop_upper(&mut upper, v, true),
            Operator::Less => drop_upper(&mut upper, v, false),
            Operator::Compatible => {
                // ~=X.Y(.Z) is >=X.Y(.Z) with an implied upper bound one
                // release segment up.
                let cap = compatible_upper_bound(&v);
                raise_lower(&mut lower, v, true);
                drop_upper(&mut upper, cap, false);
            }
        }
    }

    if let (Some((lo, lo_inc)), Some((hi, hi_inc))) = (&lower, &upper) {
        match lo.cmp(hi) {
            std::cmp::Ordering::Greater => return false,
            std::cmp::Ordering::Equal if !(*lo_inc && *hi_inc) => return false,
            _ => {}
        }
    }

    if let Some(p) = &pin {
        if exclusions.iter().any(|x| x == p) {
            return false;
        }
        if let Some((lo, inc)) = &lower {
            if p < lo || (p == lo && !inc) {
                return false;
            }
        }
        if let Some((hi, inc)) = &upper {
            if p > hi || (p == hi && !inc) {
                return false;
            }
        }
    }

    true
}

fn raise_lower(lower: &mut Option<(Version, bool)>, v: Version, inclusive: bool) {
    let replace = match lower {
        Some((cur, cur_inc)) => v > *cur || (v == *cur && *cur_inc && !inclusive),
        None => true,
    };
    if replace {
        *lower = Some((v, inclusive));
    }
}

fn drop_upper(upper: &mut Option<(Version, bool)>, v: Version, inclusive: bool) {
    let replace = match upper {
        Some((cur, cur_inc)) => v < *cur || (v == *cur && *cur_inc && !inclusive),
        None => true,
    };
    if replace {
        *upper = Some((v, inclusive));
    }
}

fn compatible_upper_bound(v: &Version) -> Version {
    // ~=1.4 caps at 2.0; ~=1.4.5 caps at 1.5.0. A bare major behaves like
    // a two-segment release.
    let segments = v.original.split('.').count();
    if segments >= 3 {
        Version::new(v.major, v.minor + 1, 0)
    } else {
        Version::new(v.major + 1, 0, 0)
    }
}
