use super::Heuristic;
use crate::core::{Category, Violation};
use once_cell::sync::Lazy;
use regex::Regex;

/// Missing-return-type heuristic.
///
/// Extracts function-like constructs line by line — named function
/// declarations, `const`-bound closures, and closures wrapped in a
/// higher-order call — then balances parentheses to find the end of
/// the parameter list and judges whether an explicit return type
/// follows. Constructors, accessors, and bodies that never return a
/// value are skipped, as are concise arrow bodies (their return type
/// is carried by the expression and judging them line-oriented is
/// noisy).
pub struct ReturnTypeScan;

static FUNCTION_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)\s*(?:<[^>]*>)?\s*\(")
        .unwrap()
});

static CONST_ARROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+)?const\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s*)?\(").unwrap()
});

static WRAPPED_ARROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:export\s+)?const\s+([A-Za-z_$][\w$]*)\s*=\s*[A-Za-z_$][\w$.]*\s*\(\s*(?:async\s*)?\(",
    )
    .unwrap()
});

/// `const f: Handler = ...` carries its contract on the binding.
static TYPED_BINDING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:export\s+)?const\s+[A-Za-z_$][\w$]*\s*:").unwrap());

static ACCESSOR_OR_CTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:get|set)\s+[\w$]+\s*\(|^\s*constructor\s*\(").unwrap());

static RETURNS_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\breturn\s+[^;\s]").unwrap());

impl ReturnTypeScan {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReturnTypeScan {
    fn default() -> Self {
        Self::new()
    }
}

impl Heuristic for ReturnTypeScan {
    fn category(&self) -> Category {
        Category::Annotations
    }

    fn analyze(&self, content: &str) -> Vec<Violation> {
        let lines: Vec<&str> = content.lines().collect();
        let mut violations = Vec::new();

        for idx in 0..lines.len() {
            let line = lines[idx];
            if ACCESSOR_OR_CTOR.is_match(line) || TYPED_BINDING.is_match(line) {
                continue;
            }

            let header = FUNCTION_DECL
                .captures(line)
                .or_else(|| WRAPPED_ARROW.captures(line))
                .or_else(|| CONST_ARROW.captures(line));
            let Some(captures) = header else { continue };

            let name = captures.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
            let open_paren = captures.get(0).unwrap().end() - 1;

            let Some((close_line, close_col)) = matching_paren(&lines, idx, open_paren) else {
                continue;
            };
            let Some((after_line, after_col, ch)) = next_nonspace(&lines, close_line, close_col + 1)
            else {
                continue;
            };

            if ch == ':' {
                continue;
            }

            let missing = match ch {
                '{' => body_returns_value(&lines, after_line, after_col),
                '=' => arrow_block_returns_value(&lines, after_line, after_col),
                _ => false,
            };

            if missing {
                violations.push(
                    Violation::new(idx + 1, format!("'{name}' is missing an explicit return type"))
                        .with_rule("explicit-return-type")
                        .with_advice("annotate the return type so the contract is visible at the signature"),
                );
            }
        }

        violations
    }
}

/// Position of the `)` matching the `(` at (line, col). Bails after 50
/// lines; a header that long is not worth judging.
fn matching_paren(lines: &[&str], line: usize, col: usize) -> Option<(usize, usize)> {
    let mut depth = 0i32;
    for (offset, text) in lines[line..].iter().take(50).enumerate() {
        let start = if offset == 0 { col } else { 0 };
        for (i, ch) in text.char_indices().skip_while(|(i, _)| *i < start) {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((line + offset, i));
                    }
                }
                _ => {}
            }
        }
    }
    None
}

fn next_nonspace(lines: &[&str], line: usize, col: usize) -> Option<(usize, usize, char)> {
    let mut current_col = col;
    for (offset, text) in lines[line..].iter().take(3).enumerate() {
        let start = if offset == 0 { current_col } else { 0 };
        for (i, ch) in text.char_indices().skip_while(|(i, _)| *i < start) {
            if !ch.is_whitespace() {
                return Some((line + offset, i, ch));
            }
        }
        current_col = 0;
    }
    None
}

/// True when a block body starting at `{` contains a value return.
fn body_returns_value(lines: &[&str], line: usize, col: usize) -> bool {
    let mut depth = 0i32;
    for (offset, text) in lines[line..].iter().take(300).enumerate() {
        let start = if offset == 0 { col } else { 0 };
        let slice = &text[start.min(text.len())..];
        if RETURNS_VALUE.is_match(slice) {
            return true;
        }
        for ch in slice.chars() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return false;
                    }
                }
                _ => {}
            }
        }
    }
    false
}

/// For `=> ...`: judge only block bodies; concise bodies are exempt.
fn arrow_block_returns_value(lines: &[&str], line: usize, col: usize) -> bool {
    let text = lines[line];
    if !text[col..].starts_with("=>") {
        return false;
    }
    match next_nonspace(lines, line, col + 2) {
        Some((body_line, body_col, '{')) => body_returns_value(lines, body_line, body_col),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn names(content: &str) -> Vec<String> {
        ReturnTypeScan::new()
            .analyze(content)
            .into_iter()
            .map(|v| v.message)
            .collect()
    }

    #[test]
    fn unannotated_function_declaration_is_flagged() {
        let content = indoc! {r#"
            export function total(items: Item[]) {
              return items.reduce((acc, i) => acc + i.price, 0);
            }
        "#};
        let messages = names(content);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("'total'"));
    }

    #[test]
    fn annotated_function_passes() {
        let content = indoc! {r#"
            export function total(items: Item[]): number {
              return items.reduce((acc, i) => acc + i.price, 0);
            }
        "#};
        assert!(names(content).is_empty());
    }

    #[test]
    fn multiline_header_is_balanced() {
        let content = indoc! {r#"
            function build(
              a: string,
              b: (x: number) => string,
            ) {
              return b(a.length);
            }
        "#};
        assert_eq!(names(content).len(), 1);
    }

    #[test]
    fn void_body_is_skipped() {
        let content = indoc! {r#"
            function log(entry: Entry) {
              sink.write(entry);
            }
        "#};
        assert!(names(content).is_empty());
    }

    #[test]
    fn const_arrow_with_block_body_is_flagged() {
        let content = indoc! {r#"
            const parse = (raw: string) => {
              return JSON.parse(raw);
            };
        "#};
        assert_eq!(names(content).len(), 1);
    }

    #[test]
    fn wrapped_closure_is_flagged() {
        let content = indoc! {r#"
            const onSave = useCallback((draft: Draft) => {
              return submit(draft);
            }, [submit]);
        "#};
        let messages = names(content);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("'onSave'"));
    }

    #[test]
    fn typed_binding_and_accessors_are_skipped() {
        let content = indoc! {r#"
            const handler: ClickHandler = (e) => {
              return dispatch(e);
            };
            class Box {
              constructor(size: number) {
                this.size = size;
              }
              get area() {
                return this.size * this.size;
              }
            }
        "#};
        assert!(names(content).is_empty());
    }

    #[test]
    fn concise_arrow_body_is_exempt() {
        assert!(names("const double = (n: number) => n * 2;\n").is_empty());
    }
}
