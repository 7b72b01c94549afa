use crate::error::{Error, Result};
use crate::expression::{Expression, Value};
use crate::inequality::{
    Comparison, DurationInequality, LengthInequality, PitchInequality, SetOperator,
};
use crate::pattern::Pattern;
use crate::selection::{
    ComponentFilter, CountsOptions, DurationsOptions, Fill, Item, LeafFilter, Prototype,
    Selection, TieFilter, Trim,
};
use crate::types::duration::Duration;
use crate::types::pitch::Pitch;
use crate::util::format_list;
use std::fmt;
use std::rc::Rc;

/// A literal argument of a recorded call.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Int(i64),
    Fraction(Duration),
    Bool(bool),
    Str(String),
    Ident(String),
    List(Vec<Argument>),
    Expression(Expression),
}

impl Argument {
    fn as_int(&self) -> Result<i64> {
        match self {
            Argument::Int(n) => Ok(*n),
            other => Err(Error::Value(format!("expected an integer, got {}", other))),
        }
    }

    fn as_usize(&self) -> Result<usize> {
        usize::try_from(self.as_int()?)
            .map_err(|_| Error::Value(format!("expected a non-negative integer, got {}", self)))
    }

    fn as_bool(&self) -> Result<bool> {
        match self {
            Argument::Bool(b) => Ok(*b),
            other => Err(Error::Value(format!("expected true or false, got {}", other))),
        }
    }

    fn as_text(&self) -> Result<&str> {
        match self {
            Argument::Str(s) | Argument::Ident(s) => Ok(s),
            other => Err(Error::Value(format!("expected a string, got {}", other))),
        }
    }

    fn as_duration(&self) -> Result<Duration> {
        match self {
            Argument::Int(n) => Ok(Duration::from_integer(*n)),
            Argument::Fraction(d) => Ok(*d),
            other => Err(Error::Value(format!("expected a duration, got {}", other))),
        }
    }

    /// A list argument; a bare scalar counts as a one-item list.
    fn as_list(&self) -> Vec<Argument> {
        match self {
            Argument::List(items) => items.clone(),
            other => vec![other.clone()],
        }
    }

    fn as_expression(&self) -> Result<Expression> {
        match self {
            Argument::Expression(expression) => Ok(expression.clone()),
            other => Err(Error::Value(format!("expected a pipeline, got {}", other))),
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Int(n) => write!(f, "{}", n),
            Argument::Fraction(d) => write!(f, "{}", d),
            Argument::Bool(b) => write!(f, "{}", b),
            Argument::Str(s) => write!(f, "\"{}\"", s),
            Argument::Ident(s) => write!(f, "{}", s),
            Argument::List(items) => write!(f, "{}", format_list(items)),
            Argument::Expression(expression) => write!(f, "{}", expression),
        }
    }
}

/// Positional and keyword arguments of one recorded call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    pub positional: Vec<Argument>,
    pub keywords: Vec<(String, Argument)>,
}

impl Arguments {
    pub fn new() -> Self {
        Arguments::default()
    }

    pub fn arg(mut self, argument: Argument) -> Self {
        self.positional.push(argument);
        self
    }

    pub fn keyword(mut self, name: impl Into<String>, argument: Argument) -> Self {
        self.keywords.push((name.into(), argument));
        self
    }

    /// The positional argument at `index`, or else the keyword `name`.
    fn get(&self, index: usize, name: &str) -> Option<&Argument> {
        self.positional
            .get(index)
            .or_else(|| self.keyword_value(name))
    }

    fn keyword_value(&self, name: &str) -> Option<&Argument> {
        self.keywords
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    fn require(&self, method: &str, index: usize, name: &str) -> Result<&Argument> {
        self.get(index, name)
            .ok_or_else(|| Error::Value(format!("{}() is missing argument `{}`", method, name)))
    }

    fn check(&self, method: &str, max_positional: usize, keywords: &[&str]) -> Result<()> {
        if self.positional.len() > max_positional {
            return Err(Error::Value(format!(
                "{}() takes at most {} positional arguments",
                method, max_positional
            )));
        }
        if let Some((name, _)) = self
            .keywords
            .iter()
            .find(|(name, _)| !keywords.contains(&name.as_str()))
        {
            return Err(Error::Value(format!(
                "{}() got an unexpected keyword `{}`",
                method, name
            )));
        }
        Ok(())
    }

    fn flag(&self, name: &str) -> Result<Option<bool>> {
        self.keyword_value(name).map(|a| a.as_bool()).transpose()
    }

    fn text(&self, name: &str) -> Result<Option<String>> {
        self.keyword_value(name)
            .map(|a| a.as_text().map(str::to_string))
            .transpose()
    }
}

/// Filter applied by [`SelectorOp::Filter`].
#[derive(Clone)]
pub enum Predicate {
    Duration(DurationInequality),
    Length(LengthInequality),
    Pitches(PitchInequality),
    Custom {
        name: String,
        test: Rc<dyn Fn(&Item) -> bool>,
    },
}

impl Predicate {
    pub fn custom(name: impl Into<String>, test: impl Fn(&Item) -> bool + 'static) -> Self {
        Predicate::Custom {
            name: name.into(),
            test: Rc::new(test),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Predicate::Duration(inequality) => inequality.matches(item),
            Predicate::Length(inequality) => inequality.matches(item),
            Predicate::Pitches(inequality) => inequality.matches(item),
            Predicate::Custom { test, .. } => test(item),
        }
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Predicate::Duration(a), Predicate::Duration(b)) => a == b,
            (Predicate::Length(a), Predicate::Length(b)) => a == b,
            (Predicate::Pitches(a), Predicate::Pitches(b)) => a == b,
            (
                Predicate::Custom { name: a, test: f },
                Predicate::Custom { name: b, test: g },
            ) => a == b && Rc::ptr_eq(f, g),
            _ => false,
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Duration(inequality) => write!(f, "{:?}", inequality),
            Predicate::Length(inequality) => write!(f, "{:?}", inequality),
            Predicate::Pitches(inequality) => write!(f, "{:?}", inequality),
            Predicate::Custom { name, .. } => write!(f, "Custom({})", name),
        }
    }
}

/// Key used by [`SelectorOp::GroupBy`].
#[derive(Clone)]
pub enum GroupKey {
    Duration,
    Length,
    Measure,
    Pitch,
    Custom {
        name: String,
        key: Rc<dyn Fn(&Item) -> String>,
    },
}

impl GroupKey {
    pub fn custom(name: impl Into<String>, key: impl Fn(&Item) -> String + 'static) -> Self {
        GroupKey::Custom {
            name: name.into(),
            key: Rc::new(key),
        }
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (GroupKey::Custom { name: a, key: f }, GroupKey::Custom { name: b, key: g }) => {
                a == b && Rc::ptr_eq(f, g)
            }
            (GroupKey::Duration, GroupKey::Duration)
            | (GroupKey::Length, GroupKey::Length)
            | (GroupKey::Measure, GroupKey::Measure)
            | (GroupKey::Pitch, GroupKey::Pitch) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Duration => write!(f, "Duration"),
            GroupKey::Length => write!(f, "Length"),
            GroupKey::Measure => write!(f, "Measure"),
            GroupKey::Pitch => write!(f, "Pitch"),
            GroupKey::Custom { name, .. } => write!(f, "Custom({})", name),
        }
    }
}

/// One recorded selection call. Every selection query has a variant, so
/// a pipeline is a plain list of these.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorOp {
    Item(isize),
    Slice(Option<isize>, Option<isize>),
    Components(ComponentFilter),
    Leaves(LeafFilter),
    Notes(ComponentFilter),
    Chords(ComponentFilter),
    Rests(ComponentFilter),
    LogicalTies(TieFilter),
    Tuplets {
        exclude: Option<String>,
        level: Option<isize>,
    },
    Top {
        exclude: Option<String>,
    },
    Runs {
        exclude: Option<String>,
    },
    Leaf(isize, LeafFilter),
    Note(isize, ComponentFilter),
    Chord(isize, ComponentFilter),
    Rest(isize, ComponentFilter),
    Tuplet(isize, Option<isize>),
    Run(isize, Option<String>),
    LogicalTie(isize, TieFilter),
    Get {
        pattern: Pattern,
        period: Option<usize>,
    },
    Exclude {
        pattern: Pattern,
        period: Option<usize>,
    },
    Filter(Option<Predicate>),
    Nontrivial,
    GroupBy(Option<GroupKey>),
    GroupByContiguity,
    Group,
    Flatten(isize),
    PartitionByCounts {
        counts: Vec<isize>,
        options: CountsOptions,
    },
    PartitionByDurations {
        durations: Vec<Duration>,
        options: DurationsOptions,
    },
    PartitionByRatio(Vec<i64>),
    WithNextLeaf,
    WithPreviousLeaf,
    Map(Box<Expression>),
}

fn keyword(name: &str, value: impl fmt::Display) -> String {
    format!("{}={}", name, value)
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value)
}

fn prototypes_argument(prototypes: &[Prototype]) -> Option<String> {
    match prototypes {
        [] => None,
        [one] => Some(keyword("prototype", one)),
        many => Some(keyword("prototype", format_list(many))),
    }
}

fn component_filter_arguments(filter: &ComponentFilter) -> Vec<String> {
    let mut args: Vec<String> = prototypes_argument(&filter.prototypes).into_iter().collect();
    if let Some(tag) = &filter.exclude {
        args.push(keyword("exclude", quoted(tag)));
    }
    if let Some(grace) = filter.grace {
        args.push(keyword("grace", grace));
    }
    if filter.reverse {
        args.push(keyword("reverse", true));
    }
    args
}

fn leaf_filter_arguments(filter: &LeafFilter) -> Vec<String> {
    let mut args: Vec<String> = prototypes_argument(&filter.prototypes).into_iter().collect();
    if let Some(tag) = &filter.exclude {
        args.push(keyword("exclude", quoted(tag)));
    }
    if let Some(grace) = filter.grace {
        args.push(keyword("grace", grace));
    }
    if let Some(head) = filter.head {
        args.push(keyword("head", head));
    }
    if let Some(tail) = filter.tail {
        args.push(keyword("tail", tail));
    }
    if let Some(pitched) = filter.pitched {
        args.push(keyword("pitched", pitched));
    }
    match filter.trim {
        Some(Trim::Both) => args.push(keyword("trim", true)),
        Some(Trim::Left) => args.push(keyword("trim", "left")),
        None => {}
    }
    if filter.reverse {
        args.push(keyword("reverse", true));
    }
    args
}

fn tie_filter_arguments(filter: &TieFilter) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(tag) = &filter.exclude {
        args.push(keyword("exclude", quoted(tag)));
    }
    if let Some(grace) = filter.grace {
        args.push(keyword("grace", grace));
    }
    if let Some(nontrivial) = filter.nontrivial {
        args.push(keyword("nontrivial", nontrivial));
    }
    if let Some(pitched) = filter.pitched {
        args.push(keyword("pitched", pitched));
    }
    if filter.reverse {
        args.push(keyword("reverse", true));
    }
    args
}

fn exclude_argument(exclude: &Option<String>) -> Vec<String> {
    exclude
        .iter()
        .map(|tag| keyword("exclude", quoted(tag)))
        .collect()
}

fn pattern_arguments(pattern: &Pattern, period: Option<usize>) -> Vec<String> {
    let mut args = vec![pattern.to_string()];
    if let Some(period) = period
        && pattern.period().is_none()
    {
        args.push(keyword("period", period));
    }
    args
}

fn prototypes_from(argument: &Argument) -> Result<Vec<Prototype>> {
    argument
        .as_list()
        .iter()
        .map(|a| {
            a.as_text()?
                .parse::<Prototype>()
                .map_err(|e| Error::Value(e.to_string()))
        })
        .collect()
}

fn component_filter_from(args: &Arguments) -> Result<ComponentFilter> {
    Ok(ComponentFilter {
        prototypes: match args.keyword_value("prototype") {
            Some(argument) => prototypes_from(argument)?,
            None => Vec::new(),
        },
        exclude: args.text("exclude")?,
        grace: args.flag("grace")?,
        reverse: args.flag("reverse")?.unwrap_or(false),
    })
}

fn leaf_filter_from(args: &Arguments) -> Result<LeafFilter> {
    let trim = match args.keyword_value("trim") {
        None | Some(Argument::Bool(false)) => None,
        Some(Argument::Bool(true)) => Some(Trim::Both),
        Some(other) if other.as_text()?.eq_ignore_ascii_case("left") => Some(Trim::Left),
        Some(other) => return Err(Error::Value(format!("invalid trim: {}", other))),
    };
    Ok(LeafFilter {
        prototypes: match args.keyword_value("prototype") {
            Some(argument) => prototypes_from(argument)?,
            None => Vec::new(),
        },
        exclude: args.text("exclude")?,
        grace: args.flag("grace")?,
        head: args.flag("head")?,
        tail: args.flag("tail")?,
        pitched: args.flag("pitched")?,
        trim,
        reverse: args.flag("reverse")?.unwrap_or(false),
    })
}

fn tie_filter_from(args: &Arguments) -> Result<TieFilter> {
    Ok(TieFilter {
        exclude: args.text("exclude")?,
        grace: args.flag("grace")?,
        nontrivial: args.flag("nontrivial")?,
        pitched: args.flag("pitched")?,
        reverse: args.flag("reverse")?.unwrap_or(false),
    })
}

fn level_from(args: &Arguments, index: usize) -> Result<Option<isize>> {
    args.get(index, "level")
        .map(|a| a.as_int().map(|n| n as isize))
        .transpose()
}

fn pattern_from(method: &str, args: &Arguments) -> Result<(Pattern, Option<usize>)> {
    let indices = args
        .require(method, 0, "indices")?
        .as_list()
        .iter()
        .map(|a| a.as_int().map(|n| n as isize))
        .collect::<Result<Vec<_>>>()?;
    let inverted = args.flag("inverted")?.unwrap_or(false);
    let period = args
        .get(1, "period")
        .map(|a| a.as_usize())
        .transpose()?;
    Ok((Pattern::new(indices).inverted(inverted), period))
}

fn comparison_from(argument: &Argument) -> Result<Comparison> {
    argument
        .as_text()?
        .parse()
        .map_err(|e: anyhow::Error| Error::Value(e.to_string()))
}

fn pitches_from(argument: &Argument) -> Result<Vec<Pitch>> {
    argument
        .as_text()?
        .split_whitespace()
        .map(|p| p.parse().map_err(|e: anyhow::Error| Error::Value(e.to_string())))
        .collect()
}

fn fill_from(argument: &Argument) -> Result<Fill> {
    match argument.as_text()?.to_ascii_lowercase().as_str() {
        "exact" => Ok(Fill::Exact),
        "less" => Ok(Fill::Less),
        "more" => Ok(Fill::More),
        other => Err(Error::Value(format!("invalid fill: {}", other))),
    }
}

fn index_from(method: &str, args: &Arguments, default: Option<isize>) -> Result<isize> {
    match (args.get(0, "n"), default) {
        (Some(argument), _) => Ok(argument.as_int()? as isize),
        (None, Some(default)) => Ok(default),
        (None, None) => Err(Error::Value(format!("{}() is missing argument `n`", method))),
    }
}

const COMPONENT_KEYWORDS: &[&str] = &["prototype", "exclude", "grace", "reverse"];
const LEAF_KEYWORDS: &[&str] = &[
    "prototype", "exclude", "grace", "head", "tail", "pitched", "trim", "reverse",
];
const TIE_KEYWORDS: &[&str] = &["exclude", "grace", "nontrivial", "pitched", "reverse"];

impl SelectorOp {
    pub fn name(&self) -> &'static str {
        match self {
            SelectorOp::Item(_) => "item",
            SelectorOp::Slice(..) => "slice",
            SelectorOp::Components(_) => "components",
            SelectorOp::Leaves(_) => "leaves",
            SelectorOp::Notes(_) => "notes",
            SelectorOp::Chords(_) => "chords",
            SelectorOp::Rests(_) => "rests",
            SelectorOp::LogicalTies(_) => "logical_ties",
            SelectorOp::Tuplets { .. } => "tuplets",
            SelectorOp::Top { .. } => "top",
            SelectorOp::Runs { .. } => "runs",
            SelectorOp::Leaf(..) => "leaf",
            SelectorOp::Note(..) => "note",
            SelectorOp::Chord(..) => "chord",
            SelectorOp::Rest(..) => "rest",
            SelectorOp::Tuplet(..) => "tuplet",
            SelectorOp::Run(..) => "run",
            SelectorOp::LogicalTie(..) => "logical_tie",
            SelectorOp::Get { .. } => "get",
            SelectorOp::Exclude { .. } => "exclude",
            SelectorOp::Filter(None) | SelectorOp::Filter(Some(Predicate::Custom { .. })) => {
                "filter"
            }
            SelectorOp::Filter(Some(Predicate::Duration(inequality))) => {
                if inequality.preprolated {
                    "filter_preprolated"
                } else {
                    "filter_duration"
                }
            }
            SelectorOp::Filter(Some(Predicate::Length(_))) => "filter_length",
            SelectorOp::Filter(Some(Predicate::Pitches(_))) => "filter_pitches",
            SelectorOp::Nontrivial => "nontrivial",
            SelectorOp::GroupBy(None) | SelectorOp::GroupBy(Some(GroupKey::Custom { .. })) => {
                "group_by"
            }
            SelectorOp::GroupBy(Some(GroupKey::Duration)) => "group_by_duration",
            SelectorOp::GroupBy(Some(GroupKey::Length)) => "group_by_length",
            SelectorOp::GroupBy(Some(GroupKey::Measure)) => "group_by_measure",
            SelectorOp::GroupBy(Some(GroupKey::Pitch)) => "group_by_pitch",
            SelectorOp::GroupByContiguity => "group_by_contiguity",
            SelectorOp::Group => "group",
            SelectorOp::Flatten(_) => "flatten",
            SelectorOp::PartitionByCounts { .. } => "partition_by_counts",
            SelectorOp::PartitionByDurations { .. } => "partition_by_durations",
            SelectorOp::PartitionByRatio(_) => "partition_by_ratio",
            SelectorOp::WithNextLeaf => "with_next_leaf",
            SelectorOp::WithPreviousLeaf => "with_previous_leaf",
            SelectorOp::Map(_) => "map",
        }
    }

    /// Rendered arguments, positional first.
    pub fn arguments(&self) -> Vec<String> {
        match self {
            SelectorOp::Item(n) => vec![n.to_string()],
            SelectorOp::Slice(start, stop) => vec![
                start.map_or(String::new(), |n| n.to_string()),
                stop.map_or(String::new(), |n| n.to_string()),
            ],
            SelectorOp::Components(filter)
            | SelectorOp::Notes(filter)
            | SelectorOp::Chords(filter)
            | SelectorOp::Rests(filter) => component_filter_arguments(filter),
            SelectorOp::Leaves(filter) => leaf_filter_arguments(filter),
            SelectorOp::LogicalTies(filter) => tie_filter_arguments(filter),
            SelectorOp::Tuplets { exclude, level } => {
                let mut args = exclude_argument(exclude);
                if let Some(level) = level {
                    args.push(keyword("level", level));
                }
                args
            }
            SelectorOp::Top { exclude } | SelectorOp::Runs { exclude } => {
                exclude_argument(exclude)
            }
            SelectorOp::Leaf(n, filter) => {
                let mut args = vec![n.to_string()];
                args.extend(leaf_filter_arguments(filter));
                args
            }
            SelectorOp::Note(n, filter)
            | SelectorOp::Chord(n, filter)
            | SelectorOp::Rest(n, filter) => {
                let mut args = vec![n.to_string()];
                args.extend(component_filter_arguments(filter));
                args
            }
            SelectorOp::Tuplet(n, level) => {
                let mut args = vec![n.to_string()];
                if let Some(level) = level {
                    args.push(keyword("level", level));
                }
                args
            }
            SelectorOp::Run(n, exclude) => {
                let mut args = vec![n.to_string()];
                args.extend(exclude_argument(exclude));
                args
            }
            SelectorOp::LogicalTie(n, filter) => {
                let mut args = vec![n.to_string()];
                args.extend(tie_filter_arguments(filter));
                args
            }
            SelectorOp::Get { pattern, period } | SelectorOp::Exclude { pattern, period } => {
                pattern_arguments(pattern, *period)
            }
            SelectorOp::Filter(None) => Vec::new(),
            SelectorOp::Filter(Some(predicate)) => match predicate {
                Predicate::Duration(inequality) => vec![
                    quoted(&inequality.comparison.to_string()),
                    inequality.duration.to_string(),
                ],
                Predicate::Length(inequality) => vec![
                    quoted(&inequality.comparison.to_string()),
                    inequality.length.to_string(),
                ],
                Predicate::Pitches(inequality) => {
                    let pitches: Vec<String> =
                        inequality.pitches.iter().map(|p| p.to_string()).collect();
                    vec![
                        quoted(&inequality.operator.to_string()),
                        quoted(&pitches.join(" ")),
                    ]
                }
                Predicate::Custom { name, .. } => vec![name.clone()],
            },
            SelectorOp::GroupBy(Some(GroupKey::Custom { name, .. })) => vec![name.clone()],
            SelectorOp::Flatten(depth) => vec![keyword("depth", depth)],
            SelectorOp::PartitionByCounts { counts, options } => {
                let mut args = vec![format_list(counts)];
                let flags = [
                    ("cyclic", options.cyclic),
                    ("enchain", options.enchain),
                    ("fuse_overhang", options.fuse_overhang),
                    ("nonempty", options.nonempty),
                    ("overhang", options.overhang),
                ];
                args.extend(
                    flags
                        .iter()
                        .filter(|(_, set)| *set)
                        .map(|(name, _)| keyword(name, true)),
                );
                args
            }
            SelectorOp::PartitionByDurations { durations, options } => {
                let mut args = vec![format_list(durations)];
                if options.cyclic {
                    args.push(keyword("cyclic", true));
                }
                match options.fill {
                    Fill::Exact => {}
                    Fill::Less => args.push(keyword("fill", "less")),
                    Fill::More => args.push(keyword("fill", "more")),
                }
                if options.in_seconds {
                    args.push(keyword("in_seconds", true));
                }
                if options.overhang {
                    args.push(keyword("overhang", true));
                }
                args
            }
            SelectorOp::PartitionByRatio(ratio) => vec![format_list(ratio)],
            SelectorOp::Map(expression) => vec![expression.to_string()],
            SelectorOp::Nontrivial
            | SelectorOp::GroupBy(_)
            | SelectorOp::GroupByContiguity
            | SelectorOp::Group
            | SelectorOp::WithNextLeaf
            | SelectorOp::WithPreviousLeaf => Vec::new(),
        }
    }

    /// Single items rather than selections.
    pub fn is_lone(&self) -> bool {
        matches!(
            self,
            SelectorOp::Item(_)
                | SelectorOp::Leaf(..)
                | SelectorOp::Note(..)
                | SelectorOp::Chord(..)
                | SelectorOp::Rest(..)
                | SelectorOp::Tuplet(..)
                | SelectorOp::Run(..)
                | SelectorOp::LogicalTie(..)
        )
    }

    /// Function-call form wrapped around `inner`: `leaves(X, pitched=true)`.
    pub fn function_string(&self, inner: &str) -> String {
        match self {
            SelectorOp::Item(n) => format!("{}[{}]", inner, n),
            SelectorOp::Slice(..) => format!("{}[{}]", inner, self.arguments().join(":")),
            _ => {
                let mut args = vec![inner.to_string()];
                args.extend(self.arguments());
                format!("{}({})", self.name(), args.join(", "))
            }
        }
    }

    /// Builds an op from a method name and literal arguments.
    pub fn from_call(name: &str, args: &Arguments) -> Result<SelectorOp> {
        let op = match name {
            "item" => {
                args.check(name, 1, &[])?;
                SelectorOp::Item(index_from(name, args, None)?)
            }
            "slice" => {
                args.check(name, 2, &[])?;
                let bound = |index: usize| -> Result<Option<isize>> {
                    args.positional
                        .get(index)
                        .map(|a| a.as_int().map(|n| n as isize))
                        .transpose()
                };
                SelectorOp::Slice(bound(0)?, bound(1)?)
            }
            "components" | "notes" | "chords" | "rests" => {
                args.check(name, 0, COMPONENT_KEYWORDS)?;
                let filter = component_filter_from(args)?;
                match name {
                    "components" => SelectorOp::Components(filter),
                    "notes" => SelectorOp::Notes(filter),
                    "chords" => SelectorOp::Chords(filter),
                    _ => SelectorOp::Rests(filter),
                }
            }
            "leaves" => {
                args.check(name, 0, LEAF_KEYWORDS)?;
                SelectorOp::Leaves(leaf_filter_from(args)?)
            }
            "logical_ties" => {
                args.check(name, 0, TIE_KEYWORDS)?;
                SelectorOp::LogicalTies(tie_filter_from(args)?)
            }
            "tuplets" => {
                args.check(name, 0, &["exclude", "level"])?;
                SelectorOp::Tuplets {
                    exclude: args.text("exclude")?,
                    level: level_from(args, usize::MAX)?,
                }
            }
            "top" | "runs" => {
                args.check(name, 0, &["exclude"])?;
                let exclude = args.text("exclude")?;
                if name == "top" {
                    SelectorOp::Top { exclude }
                } else {
                    SelectorOp::Runs { exclude }
                }
            }
            "leaf" => {
                args.check(name, 1, &[&["n"][..], LEAF_KEYWORDS].concat())?;
                SelectorOp::Leaf(index_from(name, args, None)?, leaf_filter_from(args)?)
            }
            "note" | "chord" | "rest" => {
                args.check(name, 1, &[&["n"][..], COMPONENT_KEYWORDS].concat())?;
                let n = index_from(name, args, None)?;
                let filter = component_filter_from(args)?;
                match name {
                    "note" => SelectorOp::Note(n, filter),
                    "chord" => SelectorOp::Chord(n, filter),
                    _ => SelectorOp::Rest(n, filter),
                }
            }
            "tuplet" => {
                args.check(name, 2, &["n", "level"])?;
                SelectorOp::Tuplet(index_from(name, args, None)?, level_from(args, 1)?)
            }
            "run" => {
                args.check(name, 1, &["n", "exclude"])?;
                SelectorOp::Run(index_from(name, args, None)?, args.text("exclude")?)
            }
            "logical_tie" => {
                args.check(name, 1, &[&["n"][..], TIE_KEYWORDS].concat())?;
                SelectorOp::LogicalTie(index_from(name, args, Some(0))?, tie_filter_from(args)?)
            }
            "get" | "exclude" => {
                args.check(name, 2, &["indices", "period", "inverted"])?;
                let (pattern, period) = pattern_from(name, args)?;
                if name == "get" {
                    SelectorOp::Get { pattern, period }
                } else {
                    SelectorOp::Exclude { pattern, period }
                }
            }
            "filter" => {
                args.check(name, 0, &[])?;
                SelectorOp::Filter(None)
            }
            "filter_duration" | "filter_preprolated" => {
                args.check(name, 2, &["operator", "duration", "preprolated"])?;
                let comparison = comparison_from(args.require(name, 0, "operator")?)?;
                let duration = args.require(name, 1, "duration")?.as_duration()?;
                let preprolated =
                    name == "filter_preprolated" || args.flag("preprolated")?.unwrap_or(false);
                SelectorOp::Filter(Some(Predicate::Duration(
                    DurationInequality::new(comparison, duration).preprolated(preprolated),
                )))
            }
            "filter_length" => {
                args.check(name, 2, &["operator", "length"])?;
                let comparison = comparison_from(args.require(name, 0, "operator")?)?;
                let length = args.require(name, 1, "length")?.as_usize()?;
                SelectorOp::Filter(Some(Predicate::Length(LengthInequality::new(
                    comparison, length,
                ))))
            }
            "filter_pitches" => {
                args.check(name, 2, &["operator", "pitches"])?;
                let operator: SetOperator = args
                    .require(name, 0, "operator")?
                    .as_text()?
                    .parse()
                    .map_err(|e: anyhow::Error| Error::Value(e.to_string()))?;
                let pitches = pitches_from(args.require(name, 1, "pitches")?)?;
                SelectorOp::Filter(Some(Predicate::Pitches(PitchInequality::new(
                    operator, pitches,
                ))))
            }
            "nontrivial" | "group_by" | "group_by_contiguity" | "group_by_duration"
            | "group_by_length" | "group_by_measure" | "group_by_pitch" | "group"
            | "with_next_leaf" | "with_previous_leaf" => {
                args.check(name, 0, &[])?;
                match name {
                    "nontrivial" => SelectorOp::Nontrivial,
                    "group_by" => SelectorOp::GroupBy(None),
                    "group_by_contiguity" => SelectorOp::GroupByContiguity,
                    "group_by_duration" => SelectorOp::GroupBy(Some(GroupKey::Duration)),
                    "group_by_length" => SelectorOp::GroupBy(Some(GroupKey::Length)),
                    "group_by_measure" => SelectorOp::GroupBy(Some(GroupKey::Measure)),
                    "group_by_pitch" => SelectorOp::GroupBy(Some(GroupKey::Pitch)),
                    "group" => SelectorOp::Group,
                    "with_next_leaf" => SelectorOp::WithNextLeaf,
                    _ => SelectorOp::WithPreviousLeaf,
                }
            }
            "flatten" => {
                args.check(name, 1, &["depth"])?;
                let depth = match args.get(0, "depth") {
                    Some(argument) => argument.as_int()? as isize,
                    None => 1,
                };
                SelectorOp::Flatten(depth)
            }
            "partition_by_counts" => {
                args.check(
                    name,
                    1,
                    &["counts", "cyclic", "enchain", "fuse_overhang", "nonempty", "overhang"],
                )?;
                let counts = args
                    .require(name, 0, "counts")?
                    .as_list()
                    .iter()
                    .map(|a| a.as_int().map(|n| n as isize))
                    .collect::<Result<Vec<_>>>()?;
                let options = CountsOptions {
                    cyclic: args.flag("cyclic")?.unwrap_or(false),
                    enchain: args.flag("enchain")?.unwrap_or(false),
                    fuse_overhang: args.flag("fuse_overhang")?.unwrap_or(false),
                    nonempty: args.flag("nonempty")?.unwrap_or(false),
                    overhang: args.flag("overhang")?.unwrap_or(false),
                };
                SelectorOp::PartitionByCounts { counts, options }
            }
            "partition_by_durations" => {
                args.check(
                    name,
                    1,
                    &["durations", "cyclic", "fill", "in_seconds", "overhang"],
                )?;
                let durations = args
                    .require(name, 0, "durations")?
                    .as_list()
                    .iter()
                    .map(|a| a.as_duration())
                    .collect::<Result<Vec<_>>>()?;
                let options = DurationsOptions {
                    cyclic: args.flag("cyclic")?.unwrap_or(false),
                    fill: match args.keyword_value("fill") {
                        Some(argument) => fill_from(argument)?,
                        None => Fill::Exact,
                    },
                    in_seconds: args.flag("in_seconds")?.unwrap_or(false),
                    overhang: args.flag("overhang")?.unwrap_or(false),
                };
                SelectorOp::PartitionByDurations { durations, options }
            }
            "partition_by_ratio" => {
                args.check(name, 1, &["ratio"])?;
                let ratio = args
                    .require(name, 0, "ratio")?
                    .as_list()
                    .iter()
                    .map(|a| a.as_int())
                    .collect::<Result<Vec<_>>>()?;
                SelectorOp::PartitionByRatio(ratio)
            }
            "map" => {
                args.check(name, 1, &["expression"])?;
                let expression = args.require(name, 0, "expression")?.as_expression()?;
                SelectorOp::Map(Box::new(expression))
            }
            _ => {
                return Err(Error::UnknownMethod {
                    class: "Selection".to_string(),
                    name: name.to_string(),
                });
            }
        };
        Ok(op)
    }

    /// Runs the call against `value`. Components are selected first.
    pub fn apply(&self, value: Value) -> Result<Value> {
        let selection = match value {
            Value::None => {
                return Err(Error::Type(format!("can not call {}() on nothing", self.name())));
            }
            Value::Component(component) => Selection::from(component),
            Value::Selection(selection) => selection,
        };
        let result = match self {
            SelectorOp::Item(n) => return Ok(Value::from(selection.item(*n)?)),
            SelectorOp::Slice(start, stop) => selection.slice_signed(*start, *stop),
            SelectorOp::Components(filter) => selection.components(filter.clone()),
            SelectorOp::Leaves(filter) => selection.leaves(filter.clone()),
            SelectorOp::Notes(filter) => selection.notes(filter.clone()),
            SelectorOp::Chords(filter) => selection.chords(filter.clone()),
            SelectorOp::Rests(filter) => selection.rests(filter.clone()),
            SelectorOp::LogicalTies(filter) => selection.logical_ties(filter.clone()),
            SelectorOp::Tuplets { exclude, level } => {
                selection.tuplets(exclude.as_deref(), *level)
            }
            SelectorOp::Top { exclude } => selection.top(exclude.as_deref()),
            SelectorOp::Runs { exclude } => selection.runs(exclude.as_deref()),
            SelectorOp::Leaf(n, filter) => {
                return Ok(Value::Component(selection.leaf(*n, filter.clone())?));
            }
            SelectorOp::Note(n, filter) => {
                return Ok(Value::Component(selection.note(*n, filter.clone())?));
            }
            SelectorOp::Chord(n, filter) => {
                return Ok(Value::Component(selection.chord(*n, filter.clone())?));
            }
            SelectorOp::Rest(n, filter) => {
                return Ok(Value::Component(selection.rest(*n, filter.clone())?));
            }
            SelectorOp::Tuplet(n, level) => {
                return Ok(Value::Component(selection.tuplet(*n, *level)?));
            }
            SelectorOp::Run(n, exclude) => selection.run(*n, exclude.as_deref())?,
            SelectorOp::LogicalTie(n, filter) => selection.logical_tie(*n, filter.clone())?,
            SelectorOp::Get { pattern, period } => selection.get(pattern.clone(), *period)?,
            SelectorOp::Exclude { pattern, period } => {
                selection.exclude(pattern.clone(), *period)?
            }
            SelectorOp::Filter(None) => selection.filter(|_| true),
            SelectorOp::Filter(Some(predicate)) => selection.filter(|item| predicate.matches(item)),
            SelectorOp::Nontrivial => selection.nontrivial(),
            SelectorOp::GroupBy(None) => selection.group(),
            SelectorOp::GroupBy(Some(GroupKey::Duration)) => selection.group_by_duration(),
            SelectorOp::GroupBy(Some(GroupKey::Length)) => selection.group_by_length(),
            SelectorOp::GroupBy(Some(GroupKey::Measure)) => selection.group_by_measure(),
            SelectorOp::GroupBy(Some(GroupKey::Pitch)) => selection.group_by_pitch(),
            SelectorOp::GroupBy(Some(GroupKey::Custom { key, .. })) => {
                selection.group_by(|item| key(item))
            }
            SelectorOp::GroupByContiguity => selection.group_by_contiguity(),
            SelectorOp::Group => selection.group(),
            SelectorOp::Flatten(depth) => selection.flatten(*depth),
            SelectorOp::PartitionByCounts { counts, options } => {
                selection.partition_by_counts(counts, *options)?
            }
            SelectorOp::PartitionByDurations { durations, options } => {
                selection.partition_by_durations(durations, *options)?
            }
            SelectorOp::PartitionByRatio(ratio) => selection.partition_by_ratio(ratio)?,
            SelectorOp::WithNextLeaf => selection.with_next_leaf(),
            SelectorOp::WithPreviousLeaf => selection.with_previous_leaf(),
            SelectorOp::Map(expression) => {
                let mut items = Vec::new();
                for item in selection.iter() {
                    match expression.call(Value::from(item.clone()))? {
                        Value::None => {}
                        Value::Component(component) => items.push(Item::Component(component)),
                        Value::Selection(selection) => items.push(Item::Selection(selection)),
                    }
                }
                Selection::new(items)
            }
        };
        Ok(Value::Selection(result))
    }
}

/// Method-call form: `get([0], period=2)`; items and slices render as
/// subscripts.
impl fmt::Display for SelectorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorOp::Item(n) => write!(f, "[{}]", n),
            SelectorOp::Slice(..) => write!(f, "[{}]", self.arguments().join(":")),
            _ => write!(f, "{}({})", self.name(), self.arguments().join(", ")),
        }
    }
}
