use super::Heuristic;
use crate::core::{Category, Violation};
use once_cell::sync::Lazy;
use regex::Regex;

/// Fallback-data anti-pattern scan.
///
/// Flags five ways of silently substituting placeholder data for
/// missing data: bare null/undefined returns, logical-OR defaults,
/// optional chaining with a fallback, ternary defaults, and catch
/// blocks that swallow the error and return a value.
///
/// Each exemption below is a tunable heuristic rule, not a semantic
/// guarantee; ambiguous lines are suppressed in favor of fewer false
/// positives.
pub struct FallbackScan;

static BARE_NULL_RETURN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*return\s+(null|undefined)\s*;?\s*$").unwrap());

static OR_DEFAULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\|\|\s*(\[\s*\]|\{\s*\}|''|""|``|0\b|false\b|null\b|undefined\b)"#).unwrap()
});

static OPTIONAL_CHAIN_FALLBACK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\?\.[^|?\n]*(\?\?|\|\|)").unwrap());

static TERNARY_DEFAULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\?[^:?\n]+:\s*(\[\s*\]|\{\s*\}|''|""|``|null\b|undefined\b)"#).unwrap()
});

static CATCH_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bcatch\s*[({]").unwrap());

static RETURN_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*return\s+\S").unwrap());

static THROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bthrow\b").unwrap());

/// Exemption: enclosing signature already declares a nullable return.
static NULLABLE_SIGNATURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\)\s*:\s*[^={]*\b(null|undefined)\b").unwrap());

/// Exemption: a guarded not-found path around cache/expiry lookups.
static NOT_FOUND_CONTEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(cache|cached|expired|expiry|not\s?found|miss)\b").unwrap());

/// Exemption: boolean-logic OR (both sides predicates, not data).
static BOOLEAN_OR_CONTEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(if|while|\}\s*else\s+if)\b").unwrap());

/// Exemption: ternary inside a JSX attribute value.
static ATTRIBUTE_TERNARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+=\{[^}]*\?").unwrap());

/// Exemption: conditional-render ternary whose truthy branch is JSX.
static RENDER_TERNARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?\s*\(?\s*<[A-Za-z]").unwrap());

impl FallbackScan {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FallbackScan {
    fn default() -> Self {
        Self::new()
    }
}

impl Heuristic for FallbackScan {
    fn category(&self) -> Category {
        Category::Fallback
    }

    fn analyze(&self, content: &str) -> Vec<Violation> {
        let lines: Vec<&str> = content.lines().collect();
        let mut violations = Vec::new();
        let mut catch_state: Option<CatchState> = None;

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;

            if let Some(state) = catch_state.as_mut() {
                state.depth += brace_delta(line);
                if THROW.is_match(line) {
                    state.rethrows = true;
                }
                if !state.rethrows && RETURN_VALUE.is_match(line) {
                    violations.push(
                        Violation::new(line_no, "catch block swallows the error and returns a fallback value")
                            .with_rule("catch-swallow")
                            .with_advice("rethrow, or convert the error into an explicit failure result"),
                    );
                    state.rethrows = true;
                }
                if state.depth <= 0 {
                    catch_state = None;
                }
                continue;
            }

            if CATCH_OPEN.is_match(line) {
                catch_state = Some(CatchState {
                    depth: brace_delta(line).max(1),
                    rethrows: THROW.is_match(line),
                });
                continue;
            }

            if BARE_NULL_RETURN.is_match(line)
                && !has_nullable_signature(&lines, idx)
                && !has_not_found_context(&lines, idx)
            {
                violations.push(
                    Violation::new(line_no, "returns bare null/undefined as fallback data")
                        .with_rule("bare-null-return")
                        .with_advice("surface an explicit empty state or a typed error instead"),
                );
                continue;
            }

            if OR_DEFAULT.is_match(line) && !BOOLEAN_OR_CONTEXT.is_match(line) {
                violations.push(
                    Violation::new(line_no, "logical-OR default masks missing data")
                        .with_rule("or-default")
                        .with_advice("handle the absent case explicitly instead of defaulting"),
                );
                continue;
            }

            if OPTIONAL_CHAIN_FALLBACK.is_match(line) {
                violations.push(
                    Violation::new(line_no, "optional chaining with a fallback hides absent data")
                        .with_rule("optional-chain-fallback")
                        .with_advice("check the intermediate value and fail loudly when it is missing"),
                );
                continue;
            }

            if TERNARY_DEFAULT.is_match(line)
                && !ATTRIBUTE_TERNARY.is_match(line)
                && !RENDER_TERNARY.is_match(line)
            {
                violations.push(
                    Violation::new(line_no, "ternary default substitutes placeholder data")
                        .with_rule("ternary-default")
                        .with_advice("model the empty case explicitly rather than faking a value"),
                );
            }
        }

        violations
    }
}

struct CatchState {
    depth: i32,
    rethrows: bool,
}

fn brace_delta(line: &str) -> i32 {
    let opens = line.matches('{').count() as i32;
    let closes = line.matches('}').count() as i32;
    opens - closes
}

fn has_nullable_signature(lines: &[&str], idx: usize) -> bool {
    lines[idx.saturating_sub(20)..=idx]
        .iter()
        .any(|l| NULLABLE_SIGNATURE.is_match(l))
}

fn has_not_found_context(lines: &[&str], idx: usize) -> bool {
    lines[idx.saturating_sub(3)..=idx]
        .iter()
        .any(|l| NOT_FOUND_CONTEXT.is_match(l))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn rules(content: &str) -> Vec<String> {
        FallbackScan::new()
            .analyze(content)
            .into_iter()
            .filter_map(|v| v.rule)
            .collect()
    }

    #[test]
    fn bare_null_return_is_flagged() {
        let content = indoc! {r#"
            function load(id: string): User {
              return null;
            }
        "#};
        assert_eq!(rules(content), vec!["bare-null-return"]);
    }

    #[test]
    fn nullable_signature_exempts_null_return() {
        let content = indoc! {r#"
            function find(id: string): User | null {
              return null;
            }
        "#};
        assert!(rules(content).is_empty());
    }

    #[test]
    fn cache_not_found_path_is_exempt() {
        let content = indoc! {r#"
            function lookup(key: string): Entry {
              if (cache.isExpired(key)) {
                return null;
              }
            }
        "#};
        assert!(rules(content).is_empty());
    }

    #[test]
    fn or_default_is_flagged_but_boolean_or_is_not() {
        assert_eq!(rules("const items = data.items || [];\n"), vec!["or-default"]);
        assert!(rules("if (isAdmin || 0) {\n").is_empty());
    }

    #[test]
    fn optional_chain_with_fallback_is_flagged() {
        let content = "const name = user?.profile?.name ?? \"anonymous\";\n";
        assert_eq!(rules(content), vec!["optional-chain-fallback"]);
    }

    #[test]
    fn ternary_default_is_flagged() {
        let content = "const rows = ready ? load(table) : [];\n";
        assert_eq!(rules(content), vec!["ternary-default"]);
    }

    #[test]
    fn attribute_and_render_ternaries_are_exempt() {
        assert!(rules("<div className={active ? 'on' : ''} />\n").is_empty());
        assert!(rules("return ready ? <Table rows={rows} /> : null;\n").is_empty());
    }

    #[test]
    fn catch_swallow_is_flagged() {
        let content = indoc! {r#"
            try {
              parse(raw);
            } catch (err) {
              return [];
            }
        "#};
        assert_eq!(rules(content), vec!["catch-swallow"]);
    }

    #[test]
    fn rethrowing_catch_is_exempt() {
        let content = indoc! {r#"
            try {
              parse(raw);
            } catch (err) {
              log(err);
              throw err;
            }
        "#};
        assert!(rules(content).is_empty());
    }
}
