use std::fmt;
use crate::parser::ParserError;
/// Field separator used to split a device line into channel tokens.
///
/// Always non-empty; construct through [`Delimiter::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delimiter(String);
impl Delimiter {
    pub fn new(text: impl Into<String>) -> Result<Self, ParserError> {
        let text = text.into();
        if text.is_empty() {
            return Err(ParserError::EmptyDelimiter);
        }
        Ok(Self(text))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
/// Parses a single token. `None` means the token is malformed and should be dropped.
///
/// Surrounding whitespace is ignored. Non-finite values are rejected so every
/// accepted reading survives a structured export.
pub fn parse_token(token: &str) -> Option<f64> {
    token
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
/// Splits `line` into numeric readings.
///
/// A token is only emitted once its terminating delimiter has been seen, so
/// anything after the last delimiter is discarded. Malformed and empty tokens
/// are skipped without disturbing the order of the remaining values.
pub fn tokenize(line: &str, delimiter: &Delimiter) -> Vec<f64> {
    let delim = delimiter.as_str();
    let mut values = Vec::new();
    let mut token = String::new();
    for ch in line.chars() {
        token.push(ch);
        if token.ends_with(delim) {
            token.truncate(token.len() - delim.len());
            if let Some(value) = parse_token(&token) {
                values.push(value);
            }
            token.clear();
        }
    }
    values
}
#[cfg(test)]
mod tests {
    use super::*;
    fn comma() -> Delimiter {
        Delimiter::new(",").unwrap()
    }
    #[test]
    fn empty_delimiter_is_rejected() {
        assert!(matches!(
            Delimiter::new(""),
            Err(ParserError::EmptyDelimiter)
        ));
    }
    #[test]
    fn well_formed_tokens_keep_order() {
        let values = tokenize("1.5,-2,3e2,0.25,", &comma());
        assert_eq!(values, vec![1.5, -2.0, 300.0, 0.25]);
    }
    #[test]
    fn malformed_tokens_are_dropped() {
        let values = tokenize("1.0,2.0,x,3.0,", &comma());
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        let values = tokenize("abc,4,NaN,5,inf,", &comma());
        assert_eq!(values, vec![4.0, 5.0]);
    }
    #[test]
    fn trailing_partial_token_is_discarded() {
        assert_eq!(tokenize("1,2,3", &comma()), vec![1.0, 2.0]);
        assert_eq!(tokenize("1,2,3\r", &comma()), vec![1.0, 2.0]);
        assert!(tokenize("42", &comma()).is_empty());
    }
    #[test]
    fn consecutive_delimiters_skip_empty_tokens() {
        assert_eq!(tokenize("1,,2,,,", &comma()), vec![1.0, 2.0]);
    }
    #[test]
    fn multi_char_delimiter() {
        let delim = Delimiter::new("::").unwrap();
        assert_eq!(tokenize("1.0::2:3::4::", &delim), vec![1.0, 4.0]);
        assert_eq!(tokenize("7::8::", &delim), vec![7.0, 8.0]);
    }
    #[test]
    fn whitespace_around_tokens_is_tolerated() {
        let delim = Delimiter::new(";").unwrap();
        assert_eq!(tokenize(" 1.0; 2.0 ;3;", &delim), vec![1.0, 2.0, 3.0]);
    }
}
