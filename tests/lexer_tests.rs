// tests/lexer_tests.rs

use pretty_assertions::assert_eq;
use rule_dsl::ast::{Keyword, TokenKind};
use rule_dsl::lexer::{Lexer, lexical_errors};
use rule_dsl::{DiagnosticKind, Position};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::new(source)
        .map(|t| t.expect("unexpected lexical error").kind)
        .collect()
}

// ============================================================================
// Operators and Punctuation
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("+", TokenKind::Plus),
        ("-", TokenKind::Minus),
        ("*", TokenKind::Star),
        ("/", TokenKind::Slash),
        ("%", TokenKind::Percent),
        ("(", TokenKind::LParen),
        (")", TokenKind::RParen),
        ("[", TokenKind::LBracket),
        ("]", TokenKind::RBracket),
        (",", TokenKind::Comma),
        (".", TokenKind::Dot),
        ("<", TokenKind::Lt),
        (">", TokenKind::Gt),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, expected, "input: {}", input);
        assert!(lexer.next_token().unwrap().is_eof());
    }
}

#[test]
fn test_two_char_operators() {
    assert_eq!(
        kinds("== != <= >="),
        vec![
            TokenKind::EqEq,
            TokenKind::NotEq,
            TokenKind::LtEq,
            TokenKind::GtEq,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_maximal_munch() {
    assert_eq!(
        kinds("a>=b"),
        vec![
            TokenKind::Identifier("a".into()),
            TokenKind::GtEq,
            TokenKind::Identifier("b".into()),
            TokenKind::Eof,
        ]
    );
    // Separated by a space the pieces do not combine
    let items: Vec<_> = Lexer::new("> =").collect();
    assert_eq!(items[0].as_ref().unwrap().kind, TokenKind::Gt);
    assert!(items[1].is_err());
}

#[test]
fn test_lone_equals_and_bang_are_unrecognized() {
    for source in ["=", "!"] {
        let err = Lexer::new(source).next_token().unwrap_err();
        assert!(
            matches!(err.kind, DiagnosticKind::UnrecognizedCharacter { .. }),
            "source: {}",
            source
        );
    }
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numbers() {
    assert_eq!(
        kinds("0 42 2.5 007"),
        vec![
            TokenKind::Number(0.0),
            TokenKind::Number(42.0),
            TokenKind::Number(2.5),
            TokenKind::Number(7.0),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_number_too_large_for_f64() {
    let source = format!("x + {}", "9".repeat(400));
    let items: Vec<_> = Lexer::new(&source).collect();
    let err = items[2].as_ref().unwrap_err();
    assert_eq!(err.kind, DiagnosticKind::NumberOutOfRange { digits: 400 });
    assert_eq!(err.position, Position::new(4, 1, 5));
    // The whole literal is consumed before lexing resumes
    assert!(items[3].as_ref().unwrap().is_eof());
}

#[test]
fn test_number_followed_by_dot() {
    assert_eq!(
        kinds("1.x"),
        vec![
            TokenKind::Number(1.0),
            TokenKind::Dot,
            TokenKind::Identifier("x".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_strings_with_both_quotes() {
    assert_eq!(
        kinds(r#""hello" 'world'"#),
        vec![
            TokenKind::String("hello".into()),
            TokenKind::String("world".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        kinds(r#""a\tb\nc" 'it\'s' "say \"hi\"" "back\\slash""#),
        vec![
            TokenKind::String("a\tb\nc".into()),
            TokenKind::String("it's".into()),
            TokenKind::String("say \"hi\"".into()),
            TokenKind::String("back\\slash".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_string_lexeme_is_raw_text() {
    let token = Lexer::new(r#"'a\'b'"#).next_token().unwrap();
    assert_eq!(token.lexeme, r#"'a\'b'"#);
}

// ============================================================================
// Identifiers and Keywords
// ============================================================================

#[test]
fn test_keywords_are_distinct_from_identifiers() {
    assert_eq!(
        kinds("if iffy android and_more True null"),
        vec![
            TokenKind::Keyword(Keyword::If),
            TokenKind::Identifier("iffy".into()),
            TokenKind::Identifier("android".into()),
            TokenKind::Identifier("and_more".into()),
            TokenKind::Identifier("True".into()),
            TokenKind::Keyword(Keyword::Null),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_identifier_charset() {
    assert_eq!(
        kinds("_private user_2"),
        vec![
            TokenKind::Identifier("_private".into()),
            TokenKind::Identifier("user_2".into()),
            TokenKind::Eof,
        ]
    );
}

// ============================================================================
// Trivia and Positions
// ============================================================================

#[test]
fn test_comments_and_whitespace_are_skipped() {
    let tokens: Vec<_> = Lexer::new("a // the left side\n+ b")
        .map(Result::unwrap)
        .collect();
    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[1].kind, TokenKind::Plus);
    assert_eq!(tokens[1].position, Position::new(19, 2, 1));
}

#[test]
fn test_positions_track_lines_and_columns() {
    let tokens: Vec<_> = Lexer::new("a +\n  b").map(Result::unwrap).collect();
    assert_eq!(tokens[0].position, Position::new(0, 1, 1));
    assert_eq!(tokens[1].position, Position::new(2, 1, 3));
    assert_eq!(tokens[2].position, Position::new(6, 2, 3));
    assert_eq!(tokens[3].position, Position::new(7, 2, 4));
}

#[test]
fn test_eof_is_last_and_stream_ends() {
    let mut lexer = Lexer::new("x");
    assert!(lexer.next().unwrap().is_ok());
    assert!(lexer.next().unwrap().unwrap().is_eof());
    assert!(lexer.next().is_none());
}

#[test]
fn test_empty_source_yields_only_eof() {
    assert_eq!(kinds("   "), vec![TokenKind::Eof]);
}

// ============================================================================
// Restarting
// ============================================================================

#[test]
fn test_reset_restarts_from_the_beginning() {
    let mut lexer = Lexer::new("a + b");
    let first: Vec<_> = lexer.by_ref().collect();
    lexer.reset();
    let second: Vec<_> = lexer.collect();
    assert_eq!(first, second);
}

#[test]
fn test_clone_restarts_independently() {
    let lexer = Lexer::new("1 2 3");
    let a: Vec<_> = lexer.clone().collect();
    let b: Vec<_> = lexer.collect();
    assert_eq!(a, b);
}

// ============================================================================
// Lexical Errors
// ============================================================================

#[test]
fn test_unterminated_string_reports_opening_quote() {
    let items: Vec<_> = Lexer::new(r#"abc "xyz"#).collect();
    let err = items[1].as_ref().unwrap_err();
    assert_eq!(err.kind, DiagnosticKind::UnterminatedString);
    assert_eq!(err.position, Position::new(4, 1, 5));
}

#[test]
fn test_invalid_escape_reports_backslash() {
    let err = Lexer::new(r#""a\qb""#).next_token().unwrap_err();
    assert_eq!(err.kind, DiagnosticKind::InvalidEscape { escape: 'q' });
    assert_eq!(err.position, Position::new(2, 1, 3));
}

#[test]
fn test_lexing_continues_after_errors() {
    let items: Vec<_> = Lexer::new("a # b").collect();
    assert_eq!(items.len(), 4);
    assert_eq!(
        items[1].as_ref().unwrap_err().kind,
        DiagnosticKind::UnrecognizedCharacter { character: '#' }
    );
    assert_eq!(
        items[2].as_ref().unwrap().kind,
        TokenKind::Identifier("b".into())
    );
}

#[test]
fn test_all_lexical_errors_in_one_pass() {
    let errors = lexical_errors("# a @ \"x");
    let summary: Vec<_> = errors.iter().map(|e| (e.code(), e.position.column)).collect();
    assert_eq!(
        summary,
        vec![
            ("DSL_UNRECOGNIZED_CHARACTER", 1),
            ("DSL_UNRECOGNIZED_CHARACTER", 5),
            ("DSL_UNTERMINATED_STRING", 7),
        ]
    );
}

#[test]
fn test_clean_source_has_no_lexical_errors() {
    assert!(lexical_errors("len(name) > 3 // fine").is_empty());
}
