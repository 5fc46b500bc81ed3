use lazy_static::lazy_static;
use regex::Regex;

use crate::grammar::Grammar;
use crate::symbol::Symbol;
use crate::token::Token;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap();
    static ref NUMBER: Regex = Regex::new(r"^[0-9]+(\.[0-9]+)?").unwrap();
}

/// Lexer configured from a grammar's terminal set.
///
/// Terminals other than `id` and `num` are matched as literals, longest
/// first; `id` and `num`, when declared, turn the identifier and number
/// classes into real tokens. Anything unmatched becomes an `ERR` token, and
/// the stream always ends with exactly one `$` token.
pub struct Scanner<'text> {
    text: &'text str,
    pos: usize,
    line: usize,
    column: usize,
    literals: Vec<String>,
    has_id: bool,
    has_num: bool,
}

impl<'text> Scanner<'text> {
    pub fn new(text: &'text str, grammar: &Grammar) -> Self {
        let mut literals: Vec<String> = grammar
            .terminals()
            .iter()
            .filter(|terminal| *terminal != &"id" && *terminal != &"num")
            .map(|terminal| terminal.as_str().to_string())
            .collect();
        // Longest first so multi-character operators beat their prefixes.
        literals.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });

        Self {
            text,
            pos: 0,
            line: 1,
            column: 1,
            literals,
            has_id: grammar.terminals().contains("id"),
            has_num: grammar.terminals().contains("num"),
        }
    }

    /// Scans the whole input, ending with the `$` token.
    pub fn tokenize_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.is_end();
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_space();
        if self.pos >= self.text.len() {
            return Token::end(self.line, self.column);
        }

        if let Some(index) = self.match_literal() {
            let literal = self.literals[index].clone();
            let line = self.line;
            let column = self.column;
            let lexeme = self.advance(literal.len());
            return Token::new(Symbol::new(literal), lexeme, line, column);
        }

        let rest = &self.text[self.pos..];

        if let Some(found) = IDENTIFIER.find(rest) {
            let line = self.line;
            let column = self.column;
            let lexeme = self.advance(found.end());
            if self.literals.iter().any(|literal| *literal == lexeme) {
                return Token::new(Symbol::new(lexeme.clone()), lexeme, line, column);
            }
            if self.has_id {
                return Token::new(Symbol::new("id"), lexeme, line, column);
            }
            return Token::new(Symbol::error(), lexeme, line, column);
        }

        if let Some(found) = NUMBER.find(rest) {
            let line = self.line;
            let column = self.column;
            let lexeme = self.advance(found.end());
            if self.has_num {
                return Token::new(Symbol::new("num"), lexeme, line, column);
            }
            return Token::new(Symbol::error(), lexeme, line, column);
        }

        // No rule matched: consume a single character as an error token.
        let bad = rest.chars().next().expect("input is not exhausted");
        let line = self.line;
        let column = self.column;
        let lexeme = self.advance(bad.len_utf8());
        Token::new(Symbol::error(), lexeme, line, column)
    }

    fn skip_space(&mut self) {
        while let Some(c) = self.text[self.pos..].chars().next() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.pos += 1;
                    self.column += 1;
                }
                '\n' => {
                    self.pos += 1;
                    self.line += 1;
                    self.column = 1;
                }
                _ => break,
            }
        }
    }

    /// Index of the first (longest) literal matching at the cursor.
    ///
    /// Literals starting with an alphanumeric character only match on word
    /// boundaries, so the literal `if` does not split `iffy`.
    fn match_literal(&self) -> Option<usize> {
        let rest = &self.text[self.pos..];

        for (index, literal) in self.literals.iter().enumerate() {
            if literal.is_empty() || !rest.starts_with(literal.as_str()) {
                continue;
            }

            let head = literal.chars().next().expect("literal is not empty");
            if head.is_ascii_alphanumeric() {
                if let Some(before) = self.text[..self.pos].chars().next_back() {
                    if is_word_char(before) {
                        continue;
                    }
                }
                if let Some(after) = rest[literal.len()..].chars().next() {
                    if is_word_char(after) {
                        continue;
                    }
                }
            }
            return Some(index);
        }
        None
    }

    /// Consumes `len` bytes and returns them; tokens never span lines, so
    /// only the column moves.
    fn advance(&mut self, len: usize) -> String {
        let fragment = &self.text[self.pos..self.pos + len];
        self.column += fragment.chars().count();
        self.pos += len;
        fragment.to_string()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn kinds(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.symbol.as_str()).collect()
    }

    #[test]
    fn test_literals_and_final_end_token() {
        let grammar = fixtures::grammar(fixtures::EXPR_GRAMMAR);
        let tokens = Scanner::new("( id + id ) * id", &grammar).tokenize_all();
        assert_eq!(
            kinds(&tokens),
            vec!["(", "id", "+", "id", ")", "*", "id", "$"]
        );
    }

    #[test]
    fn test_longest_literal_wins() {
        let grammar = fixtures::grammar("S -> '=' | '=='\n");
        let tokens = Scanner::new("== =", &grammar).tokenize_all();
        assert_eq!(kinds(&tokens), vec!["==", "=", "$"]);
    }

    #[test]
    fn test_keyword_word_boundaries() {
        let grammar = fixtures::grammar(fixtures::DANGLING_ELSE_GRAMMAR);
        let tokens = Scanner::new("if iffy then x else y", &grammar).tokenize_all();
        // 'iffy' must not split into 'if' + 'fy'.
        assert_eq!(
            kinds(&tokens),
            vec!["if", "id", "then", "id", "else", "id", "$"]
        );
    }

    #[test]
    fn test_identifier_matching_a_literal_emits_the_literal() {
        let grammar = fixtures::grammar(fixtures::DANGLING_ELSE_GRAMMAR);
        let tokens = Scanner::new("else", &grammar).tokenize_all();
        assert_eq!(kinds(&tokens), vec!["else", "$"]);
        assert_eq!(tokens[0].lexeme, "else");
    }

    #[test]
    fn test_numbers_require_declared_num() {
        let with_num = fixtures::grammar("S -> num\n");
        let tokens = Scanner::new("3.14", &with_num).tokenize_all();
        assert_eq!(kinds(&tokens), vec!["num", "$"]);
        assert_eq!(tokens[0].lexeme, "3.14");

        let without = fixtures::grammar("S -> 'a'\n");
        let tokens = Scanner::new("42", &without).tokenize_all();
        assert_eq!(kinds(&tokens), vec!["ERR", "$"]);
    }

    #[test]
    fn test_unknown_character_becomes_err() {
        let grammar = fixtures::grammar(fixtures::EXPR_GRAMMAR);
        let tokens = Scanner::new("id @ id", &grammar).tokenize_all();
        assert_eq!(kinds(&tokens), vec!["id", "ERR", "id", "$"]);
        assert_eq!(tokens[1].lexeme, "@");
    }

    #[test]
    fn test_line_and_column_tracking() {
        let grammar = fixtures::grammar(fixtures::EXPR_GRAMMAR);
        let tokens = Scanner::new("id +\n  id", &grammar).tokenize_all();

        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 4));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
        // The $ token sits just past the last lexeme.
        assert_eq!((tokens[3].line, tokens[3].column), (2, 5));
    }
}
