//! Argument tokenizer.
//!
//! Splits one raw input line into positional tokens, honoring single/double
//! quoting and backslash escaping. [`tokenize`] is pure and total: it never
//! fails, an unterminated quote simply runs to the end of the input.
//!
//! Each [`Token`] records the codepoint offset where it started in the
//! scanned string. The matcher uses that offset to slice the raw tail for
//! catch-all parameters, so offsets must survive leading whitespace intact.
//!
//! A token is flagged [`was_quoted`](Token::was_quoted) only when it *began*
//! with a quote character (the accumulator was empty when the quote opened).
//! The binder later uses this to keep quoted content from being re-read as
//! option syntax.

/// One positional token produced by [`tokenize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Codepoint index into the scanned string where this token started.
    pub offset: usize,
    /// The token content with quotes and escape characters removed.
    pub text: String,
    /// Whether the token started with an opening quote.
    pub was_quoted: bool,
}

/// Splits `input` into tokens.
///
/// Rules, scanning codepoint by codepoint:
///
/// - Whitespace outside quotes ends the current token (if any) and moves the
///   next token's start offset past itself.
/// - `'` or `"` outside quotes opens a quoted span; the same character closes
///   it; the other quote character inside the span is literal content.
/// - A backslash escapes the following character — including whitespace and
///   quote characters — and is itself dropped.
///
/// ```rust
/// use herald::tokenize;
///
/// let tokens = tokenize(r#"ban "Some User" --days=7"#);
/// let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
/// assert_eq!(texts, vec!["ban", "Some User", "--days=7"]);
/// assert!(tokens[1].was_quoted);
/// ```
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote: Option<char> = None;
    let mut escape_next = false;
    let mut was_quoted = false;
    let mut token_start = 0usize;

    for (index, ch) in input.chars().enumerate() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        match ch {
            '\\' => {
                escape_next = true;
            }
            quote if in_quote == Some(quote) => {
                in_quote = None;
            }
            _ if in_quote.is_some() => {
                current.push(ch);
            }
            '\'' | '"' => {
                if current.is_empty() {
                    was_quoted = true;
                }
                in_quote = Some(ch);
            }
            _ if ch.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(Token {
                        offset: token_start,
                        text: std::mem::take(&mut current),
                        was_quoted,
                    });
                }
                was_quoted = false;
                token_start = index + 1;
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        tokens.push(Token {
            offset: token_start,
            text: current,
            was_quoted,
        });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_simple() {
        let tokens = tokenize("echo hello world");
        assert_eq!(texts(&tokens), vec!["echo", "hello", "world"]);
        assert!(tokens.iter().all(|t| !t.was_quoted));
    }

    #[test]
    fn test_tokenize_empty_and_whitespace_only() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t  ").is_empty());
    }

    #[test]
    fn test_tokenize_double_quoted() {
        let tokens = tokenize(r#"say "a b" c"#);
        assert_eq!(texts(&tokens), vec!["say", "a b", "c"]);
        assert!(tokens[1].was_quoted);
        assert!(!tokens[2].was_quoted);
    }

    #[test]
    fn test_tokenize_single_quoted() {
        let tokens = tokenize("say 'a b'");
        assert_eq!(texts(&tokens), vec!["say", "a b"]);
        assert!(tokens[1].was_quoted);
    }

    #[test]
    fn test_tokenize_other_quote_is_literal() {
        let tokens = tokenize(r#"cmd "it's fine" 'say "hi"'"#);
        assert_eq!(texts(&tokens), vec!["cmd", "it's fine", r#"say "hi""#]);
    }

    #[test]
    fn test_tokenize_quote_mid_token_not_marked() {
        // The quote merges content but the token did not *start* quoted.
        let tokens = tokenize(r#"a"b c""#);
        assert_eq!(texts(&tokens), vec!["ab c"]);
        assert!(!tokens[0].was_quoted);
    }

    #[test]
    fn test_tokenize_offsets() {
        let tokens = tokenize("one two  three");
        assert_eq!(tokens[0].offset, 0);
        assert_eq!(tokens[1].offset, 4);
        assert_eq!(tokens[2].offset, 9);
    }

    #[test]
    fn test_tokenize_leading_whitespace_offset() {
        let tokens = tokenize("   first");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].offset, 3);
        assert_eq!(tokens[0].text, "first");
    }

    #[test]
    fn test_tokenize_offsets_are_codepoints() {
        // 'é' and '漢' are multi-byte but single codepoints.
        let tokens = tokenize("é 漢字 x");
        assert_eq!(tokens[0].offset, 0);
        assert_eq!(tokens[1].offset, 2);
        assert_eq!(tokens[2].offset, 5);
    }

    #[test]
    fn test_tokenize_escaped_space() {
        let tokens = tokenize(r"a\ b c");
        assert_eq!(texts(&tokens), vec!["a b", "c"]);
    }

    #[test]
    fn test_tokenize_escaped_quote_stays_literal() {
        // The escaped quote must not toggle quote state.
        let tokens = tokenize(r#"say \"hi there"#);
        assert_eq!(texts(&tokens), vec!["say", "\"hi", "there"]);
        assert!(!tokens[1].was_quoted);
    }

    #[test]
    fn test_tokenize_unterminated_quote_runs_to_end() {
        let tokens = tokenize(r#"say "never closed"#);
        assert_eq!(texts(&tokens), vec!["say", "never closed"]);
        assert!(tokens[1].was_quoted);
    }

    #[test]
    fn test_tokenize_reconstruction_is_a_fixpoint() {
        // Joining tokens with single spaces loses quoting, but from then on
        // tokenization must be stable: re-splitting the reconstruction and
        // joining again reproduces it exactly.
        let input = r#"cmd "a b" c\ d  'e'"#;
        let rebuilt = tokenize(input)
            .iter()
            .map(|t| t.text.clone())
            .collect::<Vec<_>>()
            .join(" ");
        let rebuilt_again = tokenize(&rebuilt)
            .iter()
            .map(|t| t.text.clone())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rebuilt_again, rebuilt);
    }
}
