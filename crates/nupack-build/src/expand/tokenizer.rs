//! Splits a template into literal text and `|variable|` references
//!
//! `|` is the delimiter: it cannot appear in file names, is an operator on
//! most command lines and needs no escaping in XML. `||` is a literal `|`.
//! A delimiter with no closing partner is literal text to the end.

/// Opening and closing delimiter
pub const DELIMITER: char = '|';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Variable(&'a str),
}

/// A template ready to be scanned
///
/// Every call to [`Tokenizer::tokens`] starts a fresh scan from the
/// beginning of the input.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer<'a> {
    input: &'a str,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    pub fn tokens(&self) -> Tokens<'a> {
        Tokens {
            input: self.input,
            position: 0,
        }
    }
}

impl<'a> IntoIterator for Tokenizer<'a> {
    type Item = Token<'a>;
    type IntoIter = Tokens<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens()
    }
}

impl<'a> IntoIterator for &Tokenizer<'a> {
    type Item = Token<'a>;
    type IntoIter = Tokens<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens()
    }
}

/// Lazy token stream over one scan
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.input[self.position..];
        if rest.is_empty() {
            return None;
        }

        let Some(open) = rest.find(DELIMITER) else {
            self.position = self.input.len();
            return Some(Token::Text(rest));
        };

        if open > 0 {
            self.position += open;
            return Some(Token::Text(&rest[..open]));
        }

        let width = DELIMITER.len_utf8();
        let Some(close) = rest[width..].find(DELIMITER) else {
            self.position = self.input.len();
            return Some(Token::Text(rest));
        };

        self.position += width + close + width;
        if close == 0 {
            Some(Token::Text(&rest[..width]))
        } else {
            Some(Token::Variable(&rest[width..width + close]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        Tokenizer::new(input).tokens().collect()
    }

    #[rstest]
    #[case("", vec![])]
    #[case("plain", vec![Token::Text("plain")])]
    #[case("|A_Name|", vec![Token::Variable("A_Name")])]
    #[case(
        "|A_Name|, v|A_Version|",
        vec![Token::Variable("A_Name"), Token::Text(", v"), Token::Variable("A_Version")]
    )]
    #[case("a||b", vec![Token::Text("a"), Token::Text("|"), Token::Text("b")])]
    #[case("||||", vec![Token::Text("|"), Token::Text("|")])]
    #[case("tail |open", vec![Token::Text("tail "), Token::Text("|open")])]
    #[case("|", vec![Token::Text("|")])]
    #[case("é|ü|ß", vec![Token::Text("é"), Token::Variable("ü"), Token::Text("ß")])]
    fn test_tokenize(#[case] input: &str, #[case] expected: Vec<Token<'_>>) {
        assert_eq!(tokens(input), expected);
    }

    #[test]
    fn test_restartable() {
        let tokenizer = Tokenizer::new("x|y|z");
        let first: Vec<_> = tokenizer.tokens().collect();
        let second: Vec<_> = (&tokenizer).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}
