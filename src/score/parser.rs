use crate::score::component::{Component, ContainerKind};
use crate::types::duration::{Duration, Multiplier, parse_lilypond_duration};
use crate::types::indicator::{Indicator, MetronomeMark, TimeSignature};
use crate::types::pitch::Pitch;
use anyhow::{Result, anyhow, bail};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    OpenBrace,
    CloseBrace,
    OpenSimultaneous,
    CloseSimultaneous,
    OpenChord,
    CloseChord,
    Tie,
    Equals,
    Command(String),
    Str(String),
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::OpenBrace => write!(f, "{{"),
            Token::CloseBrace => write!(f, "}}"),
            Token::OpenSimultaneous => write!(f, "<<"),
            Token::CloseSimultaneous => write!(f, ">>"),
            Token::OpenChord => write!(f, "<"),
            Token::CloseChord => write!(f, ">"),
            Token::Tie => write!(f, "~"),
            Token::Equals => write!(f, "="),
            Token::Command(name) => write!(f, "\\{}", name),
            Token::Str(text) => write!(f, "\"{}\"", text),
            Token::Word(word) => write!(f, "{}", word),
        }
    }
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '{' | '}' | '<' | '>' | '~' | '=' | '"' | '\\')
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>> {
    let mut tokens = Vec::new();
    for (line_idx, line) in source.lines().enumerate() {
        let line_no = line_idx + 1;
        // `%` starts a comment
        let line = line.split('%').next().unwrap_or("");
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();
            let token = match c {
                _ if c.is_whitespace() => {
                    i += 1;
                    continue;
                }
                '{' => Token::OpenBrace,
                '}' => Token::CloseBrace,
                '<' if next == Some('<') => {
                    i += 1;
                    Token::OpenSimultaneous
                }
                '>' if next == Some('>') => {
                    i += 1;
                    Token::CloseSimultaneous
                }
                '<' => Token::OpenChord,
                '>' => Token::CloseChord,
                '~' => Token::Tie,
                '=' => Token::Equals,
                '"' => {
                    let start = i + 1;
                    let end = chars[start..]
                        .iter()
                        .position(|c| *c == '"')
                        .map(|p| start + p)
                        .ok_or_else(|| anyhow!("Line #{}: unterminated string", line_no))?;
                    i = end;
                    Token::Str(chars[start..end].iter().collect())
                }
                '\\' => {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && chars[end].is_ascii_alphabetic() {
                        end += 1;
                    }
                    if end == start {
                        bail!("Line #{}: empty command", line_no);
                    }
                    i = end - 1;
                    Token::Command(chars[start..end].iter().collect())
                }
                _ => {
                    let start = i;
                    let mut end = start;
                    while end < chars.len() && is_word_char(chars[end]) {
                        end += 1;
                    }
                    i = end - 1;
                    Token::Word(chars[start..end].iter().collect())
                }
            };
            tokens.push((token, line_no));
            i += 1;
        }
    }
    Ok(tokens)
}

/// Splits `c'4.*3/2` into the pitch part, duration part and multiplier.
fn split_leaf_word(word: &str) -> (&str, &str, Option<&str>) {
    let (body, multiplier) = match word.split_once('*') {
        Some((body, multiplier)) => (body, Some(multiplier)),
        None => (word, None),
    };
    let split = body.find(|c: char| c.is_ascii_digit()).unwrap_or(body.len());
    (&body[..split], &body[split..], multiplier)
}

fn parse_fraction(s: &str) -> Result<(i64, i64)> {
    let (numerator, denominator) = s
        .split_once('/')
        .ok_or_else(|| anyhow!("Invalid fraction: {}", s))?;
    let numerator: i64 = numerator
        .parse()
        .map_err(|_| anyhow!("Invalid fraction: {}", s))?;
    let denominator: i64 = denominator
        .parse()
        .map_err(|_| anyhow!("Invalid fraction: {}", s))?;
    if numerator <= 0 || denominator <= 0 {
        bail!("Invalid fraction: {}", s);
    }
    Ok((numerator, denominator))
}

struct ScoreParser {
    tokens: Vec<(Token, usize)>,
    position: usize,
    duration: Duration,
    pending: Vec<Indicator>,
    last_leaf: Option<Component>,
}

/// Parses a LilyPond subset into a component tree. A single top-level
/// container is returned as is; anything else is wrapped in a plain
/// container.
pub fn parse_score(source: &str) -> Result<Component> {
    let mut parser = ScoreParser::new(tokenize(source)?);
    let mut music = Vec::new();
    while parser.peek().is_some() {
        if let Some(component) = parser.parse_music()? {
            music.push(component);
        }
    }
    if music.len() == 1 && music[0].is_container() {
        return Ok(music.remove(0));
    }
    Ok(Component::container(music))
}

impl ScoreParser {
    fn new(tokens: Vec<(Token, usize)>) -> Self {
        Self {
            tokens,
            position: 0,
            duration: Duration::new(1, 4),
            pending: Vec::new(),
            last_leaf: None,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|(token, _)| token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.position.min(self.tokens.len().saturating_sub(1)))
            .map_or(0, |(_, line)| *line)
    }

    fn next(&mut self) -> Result<Token> {
        let line = self.line();
        let token = self
            .tokens
            .get(self.position)
            .map(|(token, _)| token.clone())
            .ok_or_else(|| anyhow!("Line #{}: unexpected end of input", line))?;
        self.position += 1;
        Ok(token)
    }

    fn expect_word(&mut self, what: &str) -> Result<String> {
        let line = self.line();
        match self.next()? {
            Token::Word(word) => Ok(word),
            other => bail!("Line #{}: expected {}, found {}", line, what, other),
        }
    }

    /// Returns `None` for tokens that attach to other music (`~`,
    /// `\time`, `\tempo`).
    fn parse_music(&mut self) -> Result<Option<Component>> {
        let line = self.line();
        match self.next()? {
            Token::OpenBrace => Ok(Some(self.parse_container(ContainerKind::Container, false)?)),
            Token::OpenSimultaneous => {
                Ok(Some(self.parse_container(ContainerKind::Container, true)?))
            }
            Token::Tie => {
                let leaf = self
                    .last_leaf
                    .as_ref()
                    .ok_or_else(|| anyhow!("Line #{}: tie without a leaf", line))?;
                leaf.attach(Indicator::Tie);
                Ok(None)
            }
            Token::OpenChord => Ok(Some(self.parse_chord()?)),
            Token::Word(word) => Ok(Some(self.parse_leaf(&word, line)?)),
            Token::Command(command) => self.parse_command(&command, line),
            other => bail!("Line #{}: unexpected {}", line, other),
        }
    }

    fn parse_command(&mut self, command: &str, line: usize) -> Result<Option<Component>> {
        match command {
            "tuplet" | "times" => {
                let (n, d) = parse_fraction(&self.expect_word("tuplet fraction")?)?;
                let multiplier = if command == "tuplet" {
                    Multiplier::new(d, n)
                } else {
                    Multiplier::new(n, d)
                };
                self.parse_bracketed(ContainerKind::Tuplet(multiplier), line)
                    .map(Some)
            }
            "grace" => self.parse_bracketed(ContainerKind::Grace, line).map(Some),
            "new" => {
                let kind = match self.expect_word("context name")?.as_str() {
                    "Voice" => ContainerKind::Voice,
                    "Staff" => ContainerKind::Staff,
                    "StaffGroup" => ContainerKind::StaffGroup,
                    "Score" => ContainerKind::Score,
                    other => bail!("Line #{}: unknown context {}", line, other),
                };
                let mut name = None;
                if self.peek() == Some(&Token::Equals) {
                    self.next()?;
                    match self.next()? {
                        Token::Str(text) | Token::Word(text) => name = Some(text),
                        other => bail!("Line #{}: expected context name, found {}", line, other),
                    }
                }
                let context = self.parse_bracketed(kind, line)?;
                Ok(Some(match name {
                    Some(name) => context.with_name(name),
                    None => context,
                }))
            }
            "time" => {
                let (n, d) = parse_fraction(&self.expect_word("time signature")?)?;
                self.pending
                    .push(Indicator::TimeSignature(TimeSignature::new(n as u32, d as u32)));
                Ok(None)
            }
            "tempo" => {
                let unit = parse_lilypond_duration(&self.expect_word("tempo unit")?)?;
                if self.next()? != Token::Equals {
                    bail!("Line #{}: expected = in tempo", line);
                }
                let bpm: i64 = self
                    .expect_word("beats per minute")?
                    .parse()
                    .map_err(|_| anyhow!("Line #{}: invalid tempo", line))?;
                if bpm <= 0 {
                    bail!("Line #{}: invalid tempo", line);
                }
                self.pending
                    .push(Indicator::MetronomeMark(MetronomeMark::new(unit, bpm)));
                Ok(None)
            }
            other => bail!("Line #{}: unsupported command \\{}", line, other),
        }
    }

    fn parse_bracketed(&mut self, kind: ContainerKind, line: usize) -> Result<Component> {
        match self.next()? {
            Token::OpenBrace => self.parse_container(kind, false),
            Token::OpenSimultaneous => self.parse_container(kind, true),
            other => bail!("Line #{}: expected {{ or <<, found {}", line, other),
        }
    }

    fn parse_container(&mut self, kind: ContainerKind, simultaneous: bool) -> Result<Component> {
        let close = if simultaneous {
            Token::CloseSimultaneous
        } else {
            Token::CloseBrace
        };
        let mut children = Vec::new();
        loop {
            match self.peek() {
                None => bail!("Line #{}: missing {}", self.line(), close),
                Some(token) if *token == close => {
                    self.next()?;
                    break;
                }
                Some(_) => {
                    if let Some(child) = self.parse_music()? {
                        children.push(child);
                    }
                }
            }
        }
        Ok(Component::new_container(kind, children).with_simultaneous(simultaneous))
    }

    /// Updates the running duration and returns the parsed multiplier.
    fn parse_duration(
        &mut self,
        text: &str,
        multiplier: Option<&str>,
        line: usize,
    ) -> Result<Option<Multiplier>> {
        if !text.is_empty() {
            self.duration =
                parse_lilypond_duration(text).map_err(|e| anyhow!("Line #{}: {}", line, e))?;
        }
        let Some(multiplier) = multiplier else {
            return Ok(None);
        };
        let (n, d) = match multiplier.parse::<i64>() {
            Ok(n) if n > 0 => (n, 1),
            _ => parse_fraction(multiplier).map_err(|e| anyhow!("Line #{}: {}", line, e))?,
        };
        Ok(Some(Multiplier::new(n, d)))
    }

    fn finish_leaf(&mut self, leaf: Component, multiplier: Option<Multiplier>) -> Component {
        if multiplier.is_some() {
            leaf.set_multiplier(multiplier);
        }
        for indicator in self.pending.drain(..) {
            leaf.attach(indicator);
        }
        self.last_leaf = Some(leaf.clone());
        leaf
    }

    fn parse_leaf(&mut self, word: &str, line: usize) -> Result<Component> {
        let (head, duration, multiplier) = split_leaf_word(word);
        let multiplier = self.parse_duration(duration, multiplier, line)?;
        let leaf = match head {
            "r" => Component::rest(self.duration),
            "s" => Component::skip(self.duration),
            "R" => Component::multimeasure_rest(self.duration),
            _ => {
                let pitch: Pitch = head
                    .parse()
                    .map_err(|e| anyhow!("Line #{}: {}", line, e))?;
                Component::note(pitch, self.duration)
            }
        };
        Ok(self.finish_leaf(leaf, multiplier))
    }

    fn parse_chord(&mut self) -> Result<Component> {
        let line = self.line();
        let mut pitches = Vec::new();
        loop {
            match self.next()? {
                Token::CloseChord => break,
                Token::Word(word) => pitches.push(
                    word.parse::<Pitch>()
                        .map_err(|e| anyhow!("Line #{}: {}", line, e))?,
                ),
                other => bail!("Line #{}: unexpected {} in chord", line, other),
            }
        }
        if pitches.is_empty() {
            bail!("Line #{}: empty chord", line);
        }
        let mut multiplier = None;
        if let Some(Token::Word(word)) = self.peek()
            && word.starts_with(|c: char| c.is_ascii_digit())
        {
            let word = word.clone();
            self.next()?;
            let (_, duration, mult) = split_leaf_word(&word);
            multiplier = self.parse_duration(duration, mult, line)?;
        }
        let chord = Component::chord(pitches, self.duration);
        Ok(self.finish_leaf(chord, multiplier))
    }
}
