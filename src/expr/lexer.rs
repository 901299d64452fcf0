//! Tokenizer for the expression grammar.

use super::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Str(String),
    Number(f64),
    True,
    False,
    Null,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Minus,
    Bang,
    AndAnd,
    OrOr,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    Le,
    Gt,
    Ge,
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '&' => {
                if chars.get(i + 1) == Some(&'&') {
                    tokens.push(Token::AndAnd);
                    i += 2;
                } else {
                    return Err(ExprError::ParseError("single '&' is not an operator".into()));
                }
            }
            '|' => {
                if chars.get(i + 1) == Some(&'|') {
                    tokens.push(Token::OrOr);
                    i += 2;
                } else {
                    return Err(ExprError::ParseError("single '|' is not an operator".into()));
                }
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    if chars.get(i + 2) == Some(&'=') {
                        tokens.push(Token::EqEqEq);
                        i += 3;
                    } else {
                        tokens.push(Token::EqEq);
                        i += 2;
                    }
                } else {
                    return Err(ExprError::ParseError(
                        "assignment is not supported; use '==' or '==='".into(),
                    ));
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    if chars.get(i + 2) == Some(&'=') {
                        tokens.push(Token::NotEqEq);
                        i += 3;
                    } else {
                        tokens.push(Token::NotEq);
                        i += 2;
                    }
                } else {
                    tokens.push(Token::Bang);
                    i += 1;
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '"' | '\'' => {
                let quote = c;
                let mut s = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(ExprError::ParseError("unterminated string".into()));
                        }
                        Some(&ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            let escaped = chars.get(i + 1).ok_or_else(|| {
                                ExprError::ParseError("unterminated escape".into())
                            })?;
                            s.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                'r' => '\r',
                                other => *other,
                            });
                            i += 2;
                        }
                        Some(&ch) => {
                            s.push(ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(s));
            }
            '0'..='9' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| ExprError::ParseError(format!("invalid number: {}", text)))?;
                tokens.push(Token::Number(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    _ => Token::Ident(word),
                });
            }
            other => {
                return Err(ExprError::ParseError(format!(
                    "unexpected character: '{}'",
                    other
                )));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_comparison() {
        let tokens = tokenize("stepOutputs.a.ok === true").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("stepOutputs".into()),
                Token::Dot,
                Token::Ident("a".into()),
                Token::Dot,
                Token::Ident("ok".into()),
                Token::EqEqEq,
                Token::True,
            ]
        );
    }

    #[test]
    fn test_tokenize_operators() {
        assert_eq!(tokenize("==").unwrap(), vec![Token::EqEq]);
        assert_eq!(tokenize("!=").unwrap(), vec![Token::NotEq]);
        assert_eq!(tokenize("!==").unwrap(), vec![Token::NotEqEq]);
        assert_eq!(tokenize("<=").unwrap(), vec![Token::Le]);
        assert_eq!(tokenize(">=").unwrap(), vec![Token::Ge]);
        assert_eq!(tokenize("&&").unwrap(), vec![Token::AndAnd]);
        assert_eq!(tokenize("||").unwrap(), vec![Token::OrOr]);
    }

    #[test]
    fn test_tokenize_strings() {
        assert_eq!(
            tokenize(r#""hi there""#).unwrap(),
            vec![Token::Str("hi there".into())]
        );
        assert_eq!(tokenize("'ok'").unwrap(), vec![Token::Str("ok".into())]);
        assert_eq!(
            tokenize(r#""a\"b""#).unwrap(),
            vec![Token::Str("a\"b".into())]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(tokenize("3.25").unwrap(), vec![Token::Number(3.25)]);
        assert_eq!(
            tokenize("-7").unwrap(),
            vec![Token::Minus, Token::Number(7.0)]
        );
    }

    #[test]
    fn test_tokenize_rejects_assignment() {
        assert!(tokenize("a = 1").is_err());
    }

    #[test]
    fn test_tokenize_rejects_unterminated_string() {
        assert!(tokenize("\"oops").is_err());
    }

    #[test]
    fn test_tokenize_rejects_unknown_char() {
        assert!(tokenize("a ; b").is_err());
    }
}
