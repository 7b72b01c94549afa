use anyhow::{Result, anyhow, bail};
use std::fmt;
use std::str::FromStr;

const LETTERS: [char; 7] = ['c', 'd', 'e', 'f', 'g', 'a', 'b'];
const LETTER_SEMITONES: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// A named pitch in LilyPond absolute notation.
///
/// `octave` counts LilyPond octave marks: `c` is 0, `c'` (middle C) is 1,
/// `c,` is -1.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    letter: u8,
    alteration: i8,
    octave: i8,
}

impl Pitch {
    pub fn new(letter: char, alteration: i8, octave: i8) -> Result<Self> {
        let index = LETTERS
            .iter()
            .position(|c| *c == letter)
            .ok_or_else(|| anyhow!("Invalid pitch letter: {}", letter))?;
        if !(-2..=2).contains(&alteration) {
            bail!("Invalid alteration: {}", alteration);
        }
        Ok(Self {
            letter: index as u8,
            alteration,
            octave,
        })
    }

    /// Semitones above middle C.
    pub fn number(&self) -> i32 {
        LETTER_SEMITONES[self.letter as usize]
            + self.alteration as i32
            + 12 * (self.octave as i32 - 1)
    }

    pub fn letter(&self) -> char {
        LETTERS[self.letter as usize]
    }

    pub fn alteration(&self) -> i8 {
        self.alteration
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }
}

impl PartialOrd for Pitch {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pitch {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.number()
            .cmp(&other.number())
            .then(self.letter.cmp(&other.letter))
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.alteration {
            -2 => "eses",
            -1 => "es",
            1 => "is",
            2 => "isis",
            _ => "",
        };
        let marks = if self.octave > 0 {
            "'".repeat(self.octave as usize)
        } else {
            ",".repeat(self.octave.unsigned_abs() as usize)
        };
        write!(f, "{}{}{}", self.letter(), suffix, marks)
    }
}

impl fmt::Debug for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pitch({})", self)
    }
}

impl FromStr for Pitch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars
            .next()
            .ok_or_else(|| anyhow!("Invalid pitch: {}", s))?;
        let mut rest = chars.as_str();
        let step = |count: i8, by: i8| {
            count
                .checked_add(by)
                .ok_or_else(|| anyhow!("Invalid pitch: {}", s))
        };

        let mut alteration: i8 = 0;
        loop {
            if let Some(tail) = rest.strip_prefix("is") {
                alteration = step(alteration, 1)?;
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix("es") {
                alteration = step(alteration, -1)?;
                rest = tail;
            } else if (letter == 'e' || letter == 'a') && alteration == 0 && rest.starts_with('s')
            {
                // es, as
                alteration = -1;
                rest = &rest[1..];
            } else {
                break;
            }
        }

        let mut octave: i8 = 0;
        for c in rest.chars() {
            octave = match c {
                '\'' => step(octave, 1)?,
                ',' => step(octave, -1)?,
                _ => bail!("Invalid pitch: {}", s),
            };
        }

        Pitch::new(letter, alteration, octave).map_err(|_| anyhow!("Invalid pitch: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parsing() {
        let pitch: Pitch = "c'".parse().unwrap();
        assert_eq!(pitch.number(), 0);
        assert_eq!(pitch.to_string(), "c'");

        assert_eq!("cis'".parse::<Pitch>().unwrap().number(), 1);
        assert_eq!("bes".parse::<Pitch>().unwrap().number(), -2);
        assert_eq!("ees''".parse::<Pitch>().unwrap().number(), 15);
        assert_eq!("es''".parse::<Pitch>().unwrap().number(), 15);
        assert_eq!("as,".parse::<Pitch>().unwrap().to_string(), "aes,");
        assert_eq!("fisis".parse::<Pitch>().unwrap().to_string(), "fisis");
        assert_eq!("g,,".parse::<Pitch>().unwrap().number(), -29);
    }

    #[test]
    fn test_parse_error() {
        assert!("".parse::<Pitch>().is_err());
        assert!("h".parse::<Pitch>().is_err());
        assert!("c'x".parse::<Pitch>().is_err());
        assert!("cisisis".parse::<Pitch>().is_err());
        assert!(format!("c{}", "'".repeat(130)).parse::<Pitch>().is_err());
        assert!(format!("c{}", ",".repeat(130)).parse::<Pitch>().is_err());
        assert!(format!("c{}", "is".repeat(130)).parse::<Pitch>().is_err());
    }

    #[test]
    fn test_ordering() {
        let low: Pitch = "b".parse().unwrap();
        let high: Pitch = "c'".parse().unwrap();
        assert!(low < high);
    }
}
