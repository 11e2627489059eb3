//! Argument string tokenizer
//!
//! Splits a user-supplied argument string the way a minimal shell would:
//! whitespace separates tokens, and a span enclosed in single or double
//! quotes is kept together with the quotes removed. Both quote characters
//! behave identically. There are no escape sequences.

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Between,
    Word,
    Quoted(char),
}

/// Split `input` into arguments.
///
/// - Quoted spans may join adjacent text: `a"b c"` is one token `ab c`.
/// - An unterminated quote runs to the end of the input.
/// - `""` and `''` produce an empty token.
///
/// ```
/// use ravensh_exec::split_args;
///
/// assert_eq!(
///     split_args(r#"arg1 "arg two" 'arg three'"#),
///     vec!["arg1", "arg two", "arg three"]
/// );
/// ```
pub fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut state = State::Between;

    for c in input.chars() {
        state = match state {
            State::Quoted(q) if c == q => State::Word,
            State::Quoted(q) => {
                current.push(c);
                State::Quoted(q)
            }
            _ if c == '"' || c == '\'' => State::Quoted(c),
            State::Word if c.is_whitespace() => {
                args.push(std::mem::take(&mut current));
                State::Between
            }
            State::Between if c.is_whitespace() => State::Between,
            _ => {
                current.push(c);
                State::Word
            }
        };
    }

    if state != State::Between {
        args.push(current);
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_words() {
        assert_eq!(split_args("a b  c"), vec!["a", "b", "c"]);
        assert_eq!(split_args("  leading and trailing  "), vec!["leading", "and", "trailing"]);
        assert_eq!(split_args("tab\tsep\nnl"), vec!["tab", "sep", "nl"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_args("").is_empty());
        assert!(split_args("   ").is_empty());
    }

    #[test]
    fn test_mixed_quotes() {
        assert_eq!(
            split_args(r#"arg1 "arg two" 'arg three'"#),
            vec!["arg1", "arg two", "arg three"]
        );
    }

    #[test]
    fn test_quotes_are_symmetric() {
        assert_eq!(split_args(r#""it's here""#), vec!["it's here"]);
        assert_eq!(split_args(r#"'say "hi"'"#), vec![r#"say "hi""#]);
    }

    #[test]
    fn test_quote_joins_adjacent_text() {
        assert_eq!(split_args(r#"a"b c"d e"#), vec!["ab cd", "e"]);
        assert_eq!(split_args(r#"--name='x y'"#), vec!["--name=x y"]);
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        assert_eq!(split_args(r#"one "two three"#), vec!["one", "two three"]);
        assert_eq!(split_args("one 'two  "), vec!["one", "two  "]);
    }

    #[test]
    fn test_empty_quoted_token() {
        assert_eq!(split_args(r#"a "" b"#), vec!["a", "", "b"]);
        assert_eq!(split_args("''"), vec![""]);
    }
}
