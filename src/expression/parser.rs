use crate::expression::op::{Argument, Arguments, SelectorOp};
use crate::expression::{Callback, Expression, select};
use crate::types::duration::Duration;
use anyhow::{Result, anyhow, bail};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Str(String),
    Dot,
    Comma,
    Colon,
    Equals,
    Plus,
    Slash,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let column = i + 1;
        let single = match c {
            '.' => Some(Token::Dot),
            ',' => Some(Token::Comma),
            ':' => Some(Token::Colon),
            '=' => Some(Token::Equals),
            '+' => Some(Token::Plus),
            '/' => Some(Token::Slash),
            '(' => Some(Token::OpenParen),
            ')' => Some(Token::CloseParen),
            '[' => Some(Token::OpenBracket),
            ']' => Some(Token::CloseBracket),
            _ => None,
        };
        if let Some(token) = single {
            tokens.push((token, column));
            i += 1;
        } else if c.is_whitespace() {
            i += 1;
        } else if c == '"' {
            let mut text = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => bail!("Unterminated string starting at column {}", column),
                    Some('"') => break,
                    Some('\\') if chars.get(i + 1).is_some() => {
                        text.push(chars[i + 1]);
                        i += 2;
                    }
                    Some(ch) => {
                        text.push(*ch);
                        i += 1;
                    }
                }
            }
            i += 1;
            tokens.push((Token::Str(text), column));
        } else if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) {
            let start = i;
            i += 1;
            while chars.get(i).is_some_and(|d| d.is_ascii_digit()) {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let value = text
                .parse::<i64>()
                .map_err(|_| anyhow!("Invalid integer '{}' at column {}", text, column))?;
            tokens.push((Token::Int(value), column));
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while chars.get(i).is_some_and(|d| d.is_alphanumeric() || *d == '_') {
                i += 1;
            }
            tokens.push((Token::Ident(chars[start..i].iter().collect()), column));
        } else {
            bail!("Unexpected character '{}' at column {}", c, column);
        }
    }
    Ok(tokens)
}

struct PipelineParser {
    tokens: Vec<(Token, usize)>,
    position: usize,
    end: usize,
}

impl PipelineParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|(token, _)| token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens
            .get(self.position + offset)
            .map(|(token, _)| token)
    }

    fn column(&self) -> usize {
        self.tokens
            .get(self.position)
            .map_or(self.end, |(_, column)| *column)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).map(|(token, _)| token.clone());
        self.position += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        let column = self.column();
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => bail!(
                "Expected {:?} but found {:?} at column {}",
                expected,
                token,
                column
            ),
            None => bail!("Expected {:?} at end of input", expected),
        }
    }

    fn parse_sum(&mut self) -> Result<Expression> {
        let mut expression = self.parse_term()?;
        while self.peek() == Some(&Token::Plus) {
            self.next();
            let other = self.parse_term()?;
            expression = expression.concat(other);
        }
        Ok(expression)
    }

    fn parse_term(&mut self) -> Result<Expression> {
        let column = self.column();
        let mut expression = match self.next() {
            Some(Token::Ident(name)) if name == "select" => {
                self.expect(Token::OpenParen)?;
                self.expect(Token::CloseParen)?;
                select()
            }
            Some(Token::OpenParen) => {
                let inner = self.parse_sum()?;
                self.expect(Token::CloseParen)?;
                inner
            }
            Some(token) => bail!(
                "Expected select() but found {:?} at column {}",
                token,
                column
            ),
            None => bail!("Empty pipeline"),
        };
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.next();
                    let column = self.column();
                    let name = match self.next() {
                        Some(Token::Ident(name)) => name,
                        other => bail!("Expected method name but found {:?} at column {}", other, column),
                    };
                    self.expect(Token::OpenParen)?;
                    let args = self.parse_arguments()?;
                    expression = expression
                        .call_method(&name, &args)
                        .map_err(|e| anyhow!("{} (method at column {})", e, column))?;
                }
                Some(Token::OpenBracket) => {
                    self.next();
                    let op = self.parse_subscript()?;
                    expression = expression.append_callback(Callback::Op(op));
                }
                _ => break,
            }
        }
        Ok(expression)
    }

    /// `[n]`, `[start:stop]` with either bound optional.
    fn parse_subscript(&mut self) -> Result<SelectorOp> {
        let start = self.parse_optional_int();
        if self.peek() == Some(&Token::Colon) {
            self.next();
            let stop = self.parse_optional_int();
            self.expect(Token::CloseBracket)?;
            return Ok(SelectorOp::Slice(start, stop));
        }
        self.expect(Token::CloseBracket)?;
        match start {
            Some(n) => Ok(SelectorOp::Item(n)),
            None => bail!("Empty subscript at column {}", self.column()),
        }
    }

    fn parse_optional_int(&mut self) -> Option<isize> {
        match self.peek() {
            Some(Token::Int(n)) => {
                let n = *n as isize;
                self.next();
                Some(n)
            }
            _ => None,
        }
    }

    /// Arguments after the opening parenthesis, through the closing one.
    fn parse_arguments(&mut self) -> Result<Arguments> {
        let mut args = Arguments::new();
        if self.peek() == Some(&Token::CloseParen) {
            self.next();
            return Ok(args);
        }
        loop {
            if let Some(Token::Ident(name)) = self.peek()
                && self.peek_at(1) == Some(&Token::Equals)
            {
                let name = name.clone();
                self.position += 2;
                let value = self.parse_value()?;
                args = args.keyword(name, value);
            } else {
                if !args.keywords.is_empty() {
                    bail!(
                        "Positional argument after keyword argument at column {}",
                        self.column()
                    );
                }
                let value = self.parse_value()?;
                args = args.arg(value);
            }
            let column = self.column();
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::CloseParen) => return Ok(args),
                other => bail!("Expected ',' or ')' but found {:?} at column {}", other, column),
            }
        }
    }

    fn parse_value(&mut self) -> Result<Argument> {
        let column = self.column();
        let nested = match (self.peek(), self.peek_at(1)) {
            (Some(Token::Ident(name)), Some(Token::OpenParen)) => name == "select",
            (Some(Token::OpenParen), _) => true,
            _ => false,
        };
        if nested {
            return Ok(Argument::Expression(self.parse_sum()?));
        }
        match self.next() {
            Some(Token::Int(numerator)) => {
                if self.peek() == Some(&Token::Slash) {
                    self.next();
                    match self.next() {
                        Some(Token::Int(denominator)) if denominator != 0 => {
                            Ok(Argument::Fraction(Duration::new(numerator, denominator)))
                        }
                        _ => bail!("Invalid fraction at column {}", column),
                    }
                } else {
                    Ok(Argument::Int(numerator))
                }
            }
            Some(Token::Str(text)) => Ok(Argument::Str(text)),
            Some(Token::Ident(name)) => Ok(match name.as_str() {
                "true" => Argument::Bool(true),
                "false" => Argument::Bool(false),
                _ => Argument::Ident(name),
            }),
            Some(Token::OpenBracket) => {
                let mut items = Vec::new();
                if self.peek() == Some(&Token::CloseBracket) {
                    self.next();
                    return Ok(Argument::List(items));
                }
                loop {
                    items.push(self.parse_value()?);
                    let column = self.column();
                    match self.next() {
                        Some(Token::Comma) => continue,
                        Some(Token::CloseBracket) => return Ok(Argument::List(items)),
                        other => bail!("Expected ',' or ']' but found {:?} at column {}", other, column),
                    }
                }
            }
            other => bail!("Expected a value but found {:?} at column {}", other, column),
        }
    }
}

/// Parses the method-chain form produced by `Expression`'s `Display`,
/// e.g. `select().leaves(pitched=true).get([0], period=2)`.
pub fn parse_pipeline(source: &str) -> Result<Expression> {
    let tokens = tokenize(source)?;
    let mut parser = PipelineParser {
        tokens,
        position: 0,
        end: source.chars().count() + 1,
    };
    let expression = parser.parse_sum()?;
    if parser.position < parser.tokens.len() {
        bail!("Unexpected trailing input at column {}", parser.column());
    }
    Ok(expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inequality::Comparison;
    use crate::score::parser::parse_score;
    use crate::selection::{CountsOptions, DurationsOptions, Fill, LeafFilter, TieFilter};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_pipeline() {
        let expression = parse_pipeline("select().leaves(pitched=true).get([0], period=2)").unwrap();
        assert_eq!(expression, select().leaves(LeafFilter::pitched()).get([0], Some(2)));

        let expression = parse_pipeline("select().runs()[-1][1:]").unwrap();
        assert_eq!(expression, select().runs(None).item(-1).slice(Some(1), None));

        let expression = parse_pipeline(r#"select().leaves().filter_duration("<", 1/4)"#).unwrap();
        assert_eq!(
            expression,
            select()
                .leaves(LeafFilter::new())
                .filter_duration(Comparison::Lt, Duration::new(1, 4), false)
        );
    }

    #[test]
    fn test_round_trip() {
        let expressions = vec![
            select().leaves(LeafFilter::pitched()).get([0, -1], Some(3)),
            select().logical_ties(TieFilter::new().pitched(true).nontrivial(true)),
            select().tuplets(Some("ignore"), Some(-1)).slice(None, Some(-1)),
            select()
                .leaves(LeafFilter::new())
                .partition_by_counts(vec![2, -1], CountsOptions::cyclic().with_overhang(true)),
            select().leaves(LeafFilter::new()).partition_by_durations(
                vec![Duration::new(3, 8), Duration::new(1, 2)],
                DurationsOptions::default().with_fill(Fill::More).with_cyclic(true),
            ),
            select().leaves(LeafFilter::new()).item(0) + select().rests(Default::default()),
            select().runs(None).map(select().item(0)).group(),
            select().leaves(LeafFilter::new()).pipe(select().runs(None)),
        ];
        for expression in expressions {
            let text = expression.to_string();
            let parsed = parse_pipeline(&text)
                .unwrap_or_else(|e| panic!("failed to parse {}: {}", text, e));
            assert_eq!(parsed, expression, "round trip of {}", text);
        }
    }

    #[test]
    fn test_parsed_pipeline_evaluates() {
        let expression = parse_pipeline("select().runs().map(select()[-1])").unwrap();
        let score = parse_score("{ c'8 d'8 r8 e'8 f'8 r8 g'8 }").unwrap();
        assert_eq!(expression.call(score).unwrap().to_string(), "[d'8 f'8 g'8]");
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_pipeline("").is_err());
        assert!(parse_pipeline("leaves()").is_err());
        assert!(parse_pipeline("select().leaves(").is_err());
        assert!(parse_pipeline("select().leaves() extra").is_err());
        assert!(parse_pipeline("select().get(period=2, [0])").is_err());
        assert!(parse_pipeline(r#"select().leaves(exclude="open)"#).is_err());
        let error = parse_pipeline("select().sparkle()").unwrap_err();
        assert!(error.to_string().contains("sparkle"), "{}", error);
    }
}
