//! Human-readable error reports with a caret under the offending column

use crate::{Diagnostic, Report};

/// Renders `diagnostic` against the expression it was produced from.
///
/// ```text
/// error[DSL_DIVISION_BY_ZERO]: evaluation error at line 1, column 3: division by zero
///   |
/// 1 | 1 / 0
///   |   ^
/// ```
pub fn render_diagnostic(expression: &str, diagnostic: &Diagnostic) -> String {
    render_report(expression, &Report::new(diagnostic, expression))
}

pub fn render_report(expression: &str, report: &Report) -> String {
    let line_no = report.position.line;
    let line = expression.lines().nth(line_no.saturating_sub(1)).unwrap_or("");
    let gutter = " ".repeat(line_no.to_string().len());
    let caret_pad = " ".repeat(report.position.column.saturating_sub(1));

    format!(
        "error[{}]: {} error at {}: {}\n{gutter} |\n{line_no} | {line}\n{gutter} | {caret_pad}^",
        report.code, report.stage, report.position, report.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DiagnosticKind, Position};

    #[test]
    fn caret_points_at_column() {
        let diagnostic = Diagnostic::new(DiagnosticKind::DivisionByZero, Position::new(2, 1, 3));
        let rendered = render_diagnostic("1 / 0", &diagnostic);
        assert_eq!(
            rendered,
            "error[DSL_DIVISION_BY_ZERO]: evaluation error at line 1, column 3: division by zero\n  |\n1 | 1 / 0\n  |   ^"
        );
    }

    #[test]
    fn second_line_is_shown() {
        let diagnostic = Diagnostic::new(
            DiagnosticKind::UnboundIdentifier { name: "y".into() },
            Position::new(4, 2, 1),
        );
        let rendered = render_diagnostic("x +\ny", &diagnostic);
        assert!(rendered.ends_with("2 | y\n  | ^"));
    }

    #[test]
    fn gutter_widens_with_line_number() {
        let source = "a\n".repeat(9) + "b + c";
        let diagnostic = Diagnostic::new(
            DiagnosticKind::UnboundIdentifier { name: "c".into() },
            Position::new(22, 10, 5),
        );
        let rendered = render_diagnostic(&source, &diagnostic);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[1..], ["   |", "10 | b + c", "   |     ^"]);
    }
}
