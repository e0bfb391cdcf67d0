//! Detection of the Zod major version from a dependency range.

/// Call-name dialect of the generated validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ZodMajor {
    V3,
    V4,
}

impl ZodMajor {
    /// Dialect for a declared dependency range. Without a range, v3 names are used.
    pub fn detect(range: Option<&str>) -> Self {
        match range {
            Some(range) if satisfies_minimum(range, (4, 0, 0)) => ZodMajor::V4,
            _ => ZodMajor::V3,
        }
    }
}

/// Lowest version a dependency range admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFloor {
    /// Admits anything, including the newest release.
    Any,
    At(u64, u64, u64),
    /// Only upper bounds, so no minimum is guaranteed.
    Unbounded,
}

/// Whether `range` guarantees at least `minimum`.
///
/// `latest`, `*`, an empty range and `workspace:*` / `catalog:` references count as
/// satisfying every minimum. Only the first `||` alternative of the range is considered.
pub fn satisfies_minimum(range: &str, minimum: (u64, u64, u64)) -> bool {
    match parse_floor(range) {
        VersionFloor::Any => true,
        VersionFloor::At(major, minor, patch) => (major, minor, patch) >= minimum,
        VersionFloor::Unbounded => false,
    }
}

pub fn parse_floor(range: &str) -> VersionFloor {
    let mut range = range.trim();
    if range.starts_with("catalog:") {
        return VersionFloor::Any;
    }
    if let Some(rest) = range.strip_prefix("workspace:") {
        range = rest.trim();
    }

    let first = range.split("||").next().unwrap_or_default();
    let mut comparators = first.split_whitespace().peekable();
    if comparators.peek().is_none() {
        return VersionFloor::Any;
    }
    for comparator in comparators {
        if matches!(comparator, "*" | "latest" | "^" | "~") {
            return VersionFloor::Any;
        }
        // `<4.0.0` caps the range without raising its floor.
        if comparator.starts_with('<') {
            continue;
        }
        return comparator_floor(comparator);
    }
    VersionFloor::Unbounded
}

fn comparator_floor(comparator: &str) -> VersionFloor {
    let version = comparator.trim_start_matches(['>', '=', '^', '~']);
    let version = version.strip_prefix('v').unwrap_or(version);
    let mut parts = version.split('.').map(part);
    match parts.next().flatten() {
        Some(major) => VersionFloor::At(
            major,
            parts.next().flatten().unwrap_or(0),
            parts.next().flatten().unwrap_or(0),
        ),
        None => VersionFloor::Any,
    }
}

/// A numeric component, or `None` for `x`/`*` wildcards and anything unparsable.
fn part(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
