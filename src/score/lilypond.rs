use crate::score::component::{Component, Content, ContainerKind, LeafKind};
use crate::types::duration::{Duration, lilypond_duration};
use crate::types::indicator::Indicator;
use std::fmt;

fn format_written(written: &Duration) -> String {
    match lilypond_duration(written) {
        Some(text) => text,
        // not a single note value: spell it as a scaled whole note
        None => format!("1*{}", written),
    }
}

fn format_leaf(
    f: &mut fmt::Formatter<'_>,
    component: &Component,
    kind: &LeafKind,
    written: &Duration,
    multiplier: &Option<Duration>,
) -> fmt::Result {
    let indicators = component.indicators();
    for indicator in &indicators {
        if !matches!(indicator, Indicator::Tie) {
            write!(f, "{} ", indicator)?;
        }
    }

    let duration = format_written(written);
    match kind {
        LeafKind::Note(pitch) => write!(f, "{}{}", pitch, duration)?,
        LeafKind::Chord(pitches) => {
            let names: Vec<String> = pitches.iter().map(|p| p.to_string()).collect();
            write!(f, "<{}>{}", names.join(" "), duration)?
        }
        LeafKind::Rest => write!(f, "r{}", duration)?,
        LeafKind::Skip => write!(f, "s{}", duration)?,
        LeafKind::MultimeasureRest => write!(f, "R{}", duration)?,
    }
    if let Some(multiplier) = multiplier {
        write!(f, "*{}", multiplier)?;
    }
    if indicators.contains(&Indicator::Tie) {
        write!(f, " ~")?;
    }
    Ok(())
}

fn format_container(
    f: &mut fmt::Formatter<'_>,
    component: &Component,
    kind: &ContainerKind,
    simultaneous: bool,
    children: &[Component],
) -> fmt::Result {
    match kind {
        ContainerKind::Container => {}
        ContainerKind::Tuplet(multiplier) => {
            write!(f, "\\tuplet {}/{} ", multiplier.denom(), multiplier.numer())?
        }
        ContainerKind::Grace => write!(f, "\\grace ")?,
        ContainerKind::Voice
        | ContainerKind::Staff
        | ContainerKind::StaffGroup
        | ContainerKind::Score => {
            write!(f, "\\new {} ", kind.name())?;
            if let Some(name) = component.name() {
                write!(f, "= \"{}\" ", name)?;
            }
        }
    }

    let (open, close) = if simultaneous {
        ("<<", ">>")
    } else {
        ("{", "}")
    };
    write!(f, "{}", open)?;
    for child in children {
        write!(f, " {}", child)?;
    }
    write!(f, " {}", close)
}

/// Single-line LilyPond rendering of a component and its descendants.
impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let content = self.node().content.clone();
        match &content {
            Content::Leaf {
                kind,
                written,
                multiplier,
            } => format_leaf(f, self, kind, written, multiplier),
            Content::Container {
                kind,
                simultaneous,
                children,
            } => format_container(f, self, kind, *simultaneous, children),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::score::component::Component;
    use crate::score::parser::parse_score;
    use crate::types::duration::Duration;
    use crate::types::indicator::Indicator;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip() {
        let inputs = [
            "{ c'8 ~ c'8 r4 <c' e' g'>2 }",
            "\\new Staff { \\tuplet 3/2 { c'8 d'8 e'8 } s4 R1 }",
            "\\new Score << \\new Staff = \"top\" { c''1 } \\new Staff { c1 } >>",
            "{ \\time 3/4 \\tempo 4=60 c'2. \\grace { d'16 } e'4 }",
        ];
        for input in inputs {
            assert_eq!(parse_score(input).unwrap().to_string(), input);
        }
    }

    #[test]
    fn test_unassignable_duration() {
        let note = Component::note("c'".parse().unwrap(), Duration::new(5, 8));
        assert_eq!(note.to_string(), "c'1*5/8");
    }

    #[test]
    fn test_color() {
        let note = Component::note("d'".parse().unwrap(), Duration::new(1, 4));
        note.attach(Indicator::Color("red".to_string()));
        assert_eq!(note.to_string(), "\\once \\override NoteHead.color = #red d'4");
    }
}
