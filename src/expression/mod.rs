//! Deferred selection pipelines.
//!
//! An [`Expression`] records selection calls without running them and
//! replays them against any score later:
//!
//! ```
//! use stave::{parse_score, select, LeafFilter};
//!
//! let selector = select().leaves(LeafFilter::pitched()).get([0], Some(2));
//! let score = parse_score("{ c'4 d'4 r4 e'4 f'4 }").unwrap();
//! let result = selector.call(score).unwrap();
//! assert_eq!(result.to_string(), "[c'4 e'4]");
//! ```

pub mod op;
pub mod parser;

pub use op::{Argument, Arguments, GroupKey, Predicate, SelectorOp};
pub use parser::parse_pipeline;

use crate::error::{Error, Result};
use crate::inequality::{
    Comparison, DurationInequality, LengthInequality, PitchInequality, SetOperator,
};
use crate::pattern::Pattern;
use crate::score::component::Component;
use crate::selection::{
    ComponentFilter, CountsOptions, DurationsOptions, Item, LeafFilter, Selection, TieFilter,
};
use crate::types::duration::Duration;
use crate::types::indicator::{Indicator, IndicatorKind};
use crate::types::pitch::Pitch;
use std::fmt;
use std::ops::Add;
use tracing::trace;

/// What an expression consumes and produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    None,
    Component(Component),
    Selection(Selection),
}

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            Value::Component(component) => Some(component),
            _ => None,
        }
    }

    pub fn as_selection(&self) -> Option<&Selection> {
        match self {
            Value::Selection(selection) => Some(selection),
            _ => None,
        }
    }
}

impl From<Component> for Value {
    fn from(component: Component) -> Self {
        Value::Component(component)
    }
}

impl From<Selection> for Value {
    fn from(selection: Selection) -> Self {
        Value::Selection(selection)
    }
}

impl From<Item> for Value {
    fn from(item: Item) -> Self {
        match item {
            Item::Component(component) => Value::Component(component),
            Item::Selection(selection) => Value::Selection(selection),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Component(component) => write!(f, "{}", component),
            Value::Selection(selection) => write!(f, "{}", selection),
        }
    }
}

/// One step of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Callback {
    Op(SelectorOp),
    Expression(Box<Expression>),
}

impl Callback {
    fn apply(&self, value: Value) -> Result<Value> {
        match self {
            Callback::Op(op) => {
                trace!(op = %op, "applying callback");
                op.apply(value)
                    .map_err(|e| Error::evaluation(op.to_string(), e))
            }
            Callback::Expression(expression) => expression.call(value),
        }
    }
}

/// How subexpression results are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Concat,
}

/// Classes whose methods a proxy expression records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyClass {
    Selection,
}

impl ProxyClass {
    pub fn name(&self) -> &'static str {
        match self {
            ProxyClass::Selection => "Selection",
        }
    }
}

/// A lazily evaluated selection pipeline.
///
/// Builder methods never touch `self`'s recorded calls in place; each
/// returns a new expression with one more callback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    callbacks: Vec<Callback>,
    subexpressions: Vec<Expression>,
    combinator: Option<Combinator>,
    equivalence: Option<String>,
    proxy: Option<ProxyClass>,
}

/// An empty pipeline that records selection calls.
pub fn select() -> Expression {
    Expression::selection()
}

impl Expression {
    /// The identity expression.
    pub fn new() -> Self {
        Expression::default()
    }

    pub fn selection() -> Self {
        Expression {
            proxy: Some(ProxyClass::Selection),
            ..Expression::default()
        }
    }

    pub fn callbacks(&self) -> &[Callback] {
        &self.callbacks
    }

    pub fn subexpressions(&self) -> &[Expression] {
        &self.subexpressions
    }

    pub fn combinator(&self) -> Option<Combinator> {
        self.combinator
    }

    pub fn proxy(&self) -> Option<ProxyClass> {
        self.proxy
    }

    pub fn equivalence(&self) -> Option<&str> {
        self.equivalence.as_deref()
    }

    pub fn append_callback(&self, callback: Callback) -> Expression {
        let mut expression = self.clone();
        expression.callbacks.push(callback);
        expression
    }

    /// Records one selection call.
    pub fn append(&self, op: SelectorOp) -> Expression {
        self.append_callback(Callback::Op(op))
    }

    /// Records `name(args)` when the proxy class has such a method.
    pub fn call_method(&self, name: &str, args: &Arguments) -> Result<Expression> {
        let Some(proxy) = self.proxy else {
            return Err(Error::UnknownMethod {
                class: "Expression".to_string(),
                name: name.to_string(),
            });
        };
        if name == "pipe" {
            let other = args
                .positional
                .first()
                .and_then(|a| match a {
                    Argument::Expression(expression) => Some(expression.clone()),
                    _ => None,
                })
                .ok_or_else(|| Error::Value("pipe() expects a pipeline".to_string()))?;
            return Ok(self.clone().pipe(other));
        }
        let op = SelectorOp::from_call(name, args).map_err(|e| match e {
            Error::UnknownMethod { name, .. } => Error::UnknownMethod {
                class: proxy.name().to_string(),
                name,
            },
            other => other,
        })?;
        Ok(self.append(op))
    }

    /// Evaluates the pipeline against `argument`.
    ///
    /// Subexpressions see the original argument and their results are
    /// concatenated; the callbacks then run in order on that value.
    pub fn call(&self, argument: impl Into<Value>) -> Result<Value> {
        let argument = argument.into();
        // Parent links are weak; the argument owns the tree until the
        // result selection has taken its roots.
        let _anchor = argument.clone();
        let mut value = if self.subexpressions.is_empty() {
            argument
        } else {
            let mut items = Vec::new();
            for expression in &self.subexpressions {
                match expression.call(argument.clone())? {
                    Value::None => {}
                    Value::Component(component) => items.push(Item::Component(component)),
                    Value::Selection(selection) => items.extend(selection),
                }
            }
            Value::Selection(Selection::new(items))
        };
        for callback in &self.callbacks {
            value = callback.apply(value)?;
        }
        Ok(value)
    }

    /// A composite whose result concatenates both operands' results.
    pub fn concat(self, other: Expression) -> Expression {
        let proxy = self.proxy.or(other.proxy);
        let mut subexpressions = Vec::new();
        for expression in [self, other] {
            if expression.combinator == Some(Combinator::Concat)
                && expression.callbacks.is_empty()
                && expression.equivalence.is_none()
            {
                subexpressions.extend(expression.subexpressions);
            } else {
                subexpressions.push(expression);
            }
        }
        Expression {
            callbacks: Vec::new(),
            subexpressions,
            combinator: Some(Combinator::Concat),
            equivalence: None,
            proxy,
        }
    }

    /// Runs `other` on this expression's result.
    pub fn pipe(self, other: Expression) -> Expression {
        self.append_callback(Callback::Expression(Box::new(other)))
    }

    /// Names the expression for [`Expression::get_string`].
    pub fn establish_equivalence(mut self, name: impl Into<String>) -> Expression {
        self.equivalence = Some(name.into());
        self
    }

    /// True when the result is a single item rather than a selection.
    pub fn is_lone(&self) -> bool {
        match self.callbacks.last() {
            Some(Callback::Op(op)) => op.is_lone(),
            Some(Callback::Expression(expression)) => expression.is_lone(),
            None => false,
        }
    }

    fn formula(&self, name: &str) -> String {
        let mut formula = match self.subexpressions.as_slice() {
            [] => name.to_string(),
            subexpressions => {
                let parts: Vec<String> =
                    subexpressions.iter().map(|e| e.formula(name)).collect();
                if self.callbacks.is_empty() {
                    parts.join(" + ")
                } else {
                    format!("({})", parts.join(" + "))
                }
            }
        };
        for callback in &self.callbacks {
            formula = match callback {
                Callback::Op(op) => op.function_string(&formula),
                Callback::Expression(expression) => expression.formula(&formula),
            };
        }
        formula
    }

    /// Nested function form, `get(leaves(X, pitched=true), [0])`, with
    /// `name` (default `X`) standing for the argument.
    pub fn get_string(&self, name: Option<&str>) -> String {
        let formula = self.formula(name.unwrap_or("X"));
        match &self.equivalence {
            Some(equivalence) => format!("{} = {}", equivalence, formula),
            None => formula,
        }
    }

    /// [`Expression::get_string`] as a LilyPond markup.
    pub fn get_markup(&self, name: Option<&str>) -> String {
        let formula = self.formula(name.unwrap_or("X")).replace('"', "\\\"");
        match &self.equivalence {
            Some(equivalence) => format!(
                "\\markup \\concat {{ \\bold \"{}\" \" = \" \"{}\" }}",
                equivalence, formula
            ),
            None => format!("\\markup \\concat {{ \"{}\" }}", formula),
        }
    }

    /// Evaluates against `argument` and colors the leaves of each result
    /// item, cycling through `colors` (red and blue by default). A lone
    /// result is colored green.
    pub fn color(&self, argument: impl Into<Value>, colors: Option<&[&str]>) -> Result<Value> {
        let colors = colors.unwrap_or(&["red", "blue"]);
        if colors.is_empty() {
            return Err(Error::Value("at least one color is required".to_string()));
        }
        let result = self.call(argument)?;
        let paint = |leaves: Vec<Component>, color: &str| {
            for leaf in leaves {
                leaf.detach_indicators(IndicatorKind::Color);
                leaf.attach(Indicator::Color(color.to_string()));
            }
        };
        match &result {
            Value::None => {}
            Value::Component(component) => paint(Item::from(component.clone()).leaves(), "green"),
            Value::Selection(selection) if self.is_lone() => {
                paint(Item::from(selection.clone()).leaves(), "green")
            }
            Value::Selection(selection) => {
                for (index, item) in selection.iter().enumerate() {
                    paint(item.leaves(), colors[index % colors.len()]);
                }
            }
        }
        Ok(result)
    }

    pub fn item(self, n: isize) -> Expression {
        self.append(SelectorOp::Item(n))
    }

    pub fn slice(self, start: Option<isize>, stop: Option<isize>) -> Expression {
        self.append(SelectorOp::Slice(start, stop))
    }

    pub fn components(self, filter: ComponentFilter) -> Expression {
        self.append(SelectorOp::Components(filter))
    }

    pub fn leaves(self, filter: LeafFilter) -> Expression {
        self.append(SelectorOp::Leaves(filter))
    }

    pub fn notes(self, filter: ComponentFilter) -> Expression {
        self.append(SelectorOp::Notes(filter))
    }

    pub fn chords(self, filter: ComponentFilter) -> Expression {
        self.append(SelectorOp::Chords(filter))
    }

    pub fn rests(self, filter: ComponentFilter) -> Expression {
        self.append(SelectorOp::Rests(filter))
    }

    pub fn logical_ties(self, filter: TieFilter) -> Expression {
        self.append(SelectorOp::LogicalTies(filter))
    }

    pub fn tuplets(self, exclude: Option<&str>, level: Option<isize>) -> Expression {
        self.append(SelectorOp::Tuplets {
            exclude: exclude.map(str::to_string),
            level,
        })
    }

    pub fn top(self, exclude: Option<&str>) -> Expression {
        self.append(SelectorOp::Top {
            exclude: exclude.map(str::to_string),
        })
    }

    pub fn runs(self, exclude: Option<&str>) -> Expression {
        self.append(SelectorOp::Runs {
            exclude: exclude.map(str::to_string),
        })
    }

    pub fn leaf(self, n: isize, filter: LeafFilter) -> Expression {
        self.append(SelectorOp::Leaf(n, filter))
    }

    pub fn note(self, n: isize, filter: ComponentFilter) -> Expression {
        self.append(SelectorOp::Note(n, filter))
    }

    pub fn chord(self, n: isize, filter: ComponentFilter) -> Expression {
        self.append(SelectorOp::Chord(n, filter))
    }

    pub fn rest(self, n: isize, filter: ComponentFilter) -> Expression {
        self.append(SelectorOp::Rest(n, filter))
    }

    pub fn tuplet(self, n: isize, level: Option<isize>) -> Expression {
        self.append(SelectorOp::Tuplet(n, level))
    }

    pub fn run(self, n: isize, exclude: Option<&str>) -> Expression {
        self.append(SelectorOp::Run(n, exclude.map(str::to_string)))
    }

    pub fn logical_tie(self, n: isize, filter: TieFilter) -> Expression {
        self.append(SelectorOp::LogicalTie(n, filter))
    }

    pub fn get(self, indices: impl Into<Pattern>, period: Option<usize>) -> Expression {
        self.append(SelectorOp::Get {
            pattern: indices.into(),
            period,
        })
    }

    pub fn exclude(self, indices: impl Into<Pattern>, period: Option<usize>) -> Expression {
        self.append(SelectorOp::Exclude {
            pattern: indices.into(),
            period,
        })
    }

    pub fn filter(self, predicate: Option<Predicate>) -> Expression {
        self.append(SelectorOp::Filter(predicate))
    }

    pub fn filter_duration(
        self,
        comparison: Comparison,
        duration: Duration,
        preprolated: bool,
    ) -> Expression {
        let inequality = DurationInequality::new(comparison, duration).preprolated(preprolated);
        self.filter(Some(Predicate::Duration(inequality)))
    }

    pub fn filter_preprolated(self, comparison: Comparison, duration: Duration) -> Expression {
        self.filter_duration(comparison, duration, true)
    }

    pub fn filter_length(self, comparison: Comparison, length: usize) -> Expression {
        self.filter(Some(Predicate::Length(LengthInequality::new(
            comparison, length,
        ))))
    }

    pub fn filter_pitches(self, operator: SetOperator, pitches: Vec<Pitch>) -> Expression {
        self.filter(Some(Predicate::Pitches(PitchInequality::new(
            operator, pitches,
        ))))
    }

    pub fn nontrivial(self) -> Expression {
        self.append(SelectorOp::Nontrivial)
    }

    pub fn group_by(self, key: Option<GroupKey>) -> Expression {
        self.append(SelectorOp::GroupBy(key))
    }

    pub fn group_by_contiguity(self) -> Expression {
        self.append(SelectorOp::GroupByContiguity)
    }

    pub fn group_by_duration(self) -> Expression {
        self.group_by(Some(GroupKey::Duration))
    }

    pub fn group_by_length(self) -> Expression {
        self.group_by(Some(GroupKey::Length))
    }

    pub fn group_by_measure(self) -> Expression {
        self.group_by(Some(GroupKey::Measure))
    }

    pub fn group_by_pitch(self) -> Expression {
        self.group_by(Some(GroupKey::Pitch))
    }

    pub fn group(self) -> Expression {
        self.append(SelectorOp::Group)
    }

    pub fn flatten(self, depth: isize) -> Expression {
        self.append(SelectorOp::Flatten(depth))
    }

    pub fn partition_by_counts(self, counts: Vec<isize>, options: CountsOptions) -> Expression {
        self.append(SelectorOp::PartitionByCounts { counts, options })
    }

    pub fn partition_by_durations(
        self,
        durations: Vec<Duration>,
        options: DurationsOptions,
    ) -> Expression {
        self.append(SelectorOp::PartitionByDurations { durations, options })
    }

    pub fn partition_by_ratio(self, ratio: Vec<i64>) -> Expression {
        self.append(SelectorOp::PartitionByRatio(ratio))
    }

    pub fn with_next_leaf(self) -> Expression {
        self.append(SelectorOp::WithNextLeaf)
    }

    pub fn with_previous_leaf(self) -> Expression {
        self.append(SelectorOp::WithPreviousLeaf)
    }

    /// Applies `expression` to every item of the result.
    pub fn map(self, expression: Expression) -> Expression {
        self.append(SelectorOp::Map(Box::new(expression)))
    }
}

impl Add for Expression {
    type Output = Expression;

    fn add(self, other: Expression) -> Expression {
        self.concat(other)
    }
}

/// Method-chain form, `select().leaves(pitched=true).get([0], period=2)`,
/// as accepted by [`parse_pipeline`].
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subexpressions.as_slice() {
            [] => write!(f, "select()")?,
            subexpressions => {
                let parts: Vec<String> = subexpressions.iter().map(|e| e.to_string()).collect();
                write!(f, "({})", parts.join(" + "))?
            }
        }
        for callback in &self.callbacks {
            match callback {
                Callback::Op(op @ (SelectorOp::Item(_) | SelectorOp::Slice(..))) => {
                    write!(f, "{}", op)?
                }
                Callback::Op(op) => write!(f, ".{}", op)?,
                Callback::Expression(expression) => write!(f, ".pipe({})", expression)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::parser::parse_score;
    use crate::selection::Fill;
    use pretty_assertions::assert_eq;

    const MELODY: &str = "{ c'8 d'8 r8 e'8 ~ e'8 f'8 r8 g'8 }";

    #[test]
    fn test_identity() {
        let score = parse_score(MELODY).unwrap();
        let selection = Selection::from(score.clone());
        assert_eq!(
            Expression::new().call(selection.clone()).unwrap(),
            Value::Selection(selection)
        );
        assert_eq!(
            Expression::new().call(score.clone()).unwrap(),
            Value::Component(score)
        );
        assert_eq!(Expression::new().call(Value::None).unwrap(), Value::None);
    }

    #[test]
    fn test_replay() {
        let selector = select().leaves(LeafFilter::pitched()).get([0], Some(2));
        let score = parse_score(MELODY).unwrap();
        let direct = Selection::from(score.clone())
            .leaves(LeafFilter::pitched())
            .get([0], Some(2))
            .unwrap();
        let replayed = selector.call(score).unwrap();
        assert_eq!(replayed, Value::Selection(direct));
        assert_eq!(replayed.to_string(), "[c'8 e'8 ~ f'8]");

        let other = parse_score("{ a'4 b'4 c''4 }").unwrap();
        assert_eq!(selector.call(other).unwrap().to_string(), "[a'4 c''4]");
    }

    #[test]
    fn test_replay_owns_score() {
        let selector = select().leaves(LeafFilter::new()).runs(None);
        let score = parse_score("{ c'8 r8 d'8 e'8 r8 f'8 g'8 a'8 }").unwrap();
        assert_eq!(
            selector.call(score).unwrap().to_string(),
            "[[c'8] [d'8 e'8] [f'8 g'8 a'8]]"
        );

        let first = select().leaves(LeafFilter::new()).item(0);
        let concat = first.clone() + first;
        let score = parse_score("{ c'8 d'8 }").unwrap();
        let Value::Selection(selection) = concat.call(score).unwrap() else {
            panic!("expected a selection");
        };
        assert!(!selection.components_flat()[0].is_orphan());
    }

    #[test]
    fn test_builders_do_not_mutate() {
        let base = select().leaves(LeafFilter::new());
        let first = base.clone().item(0);
        assert_eq!(base.callbacks().len(), 1);
        assert_eq!(first.callbacks().len(), 2);
    }

    #[test]
    fn test_display() {
        let selector = select().leaves(LeafFilter::pitched()).get([0], Some(2));
        assert_eq!(
            selector.to_string(),
            "select().leaves(pitched=true).get([0], period=2)"
        );
        assert_eq!(
            selector.get_string(None),
            "get(leaves(X, pitched=true), [0], period=2)"
        );
        let named = selector.establish_equivalence("Q");
        assert_eq!(
            named.get_string(Some("score")),
            "Q = get(leaves(score, pitched=true), [0], period=2)"
        );
        let selector = select().runs(None).item(-1).slice(Some(1), None);
        assert_eq!(selector.to_string(), "select().runs()[-1][1:]");
        assert_eq!(selector.get_string(None), "runs(X)[-1][1:]");
    }

    #[test]
    fn test_markup() {
        let selector = select()
            .leaves(LeafFilter::new())
            .filter_duration(Comparison::Lt, Duration::new(1, 4), false);
        assert_eq!(
            selector.get_markup(None),
            "\\markup \\concat { \"filter_duration(leaves(X), \\\"<\\\", 1/4)\" }"
        );
        assert_eq!(
            selector.establish_equivalence("S").get_markup(None),
            "\\markup \\concat { \\bold \"S\" \" = \" \"filter_duration(leaves(X), \\\"<\\\", 1/4)\" }"
        );
    }

    #[test]
    fn test_evaluation_error() {
        let selector = select().leaves(LeafFilter::new()).item(20);
        let score = parse_score(MELODY).unwrap();
        assert_eq!(
            selector.call(score),
            Err(Error::evaluation(
                "[20]",
                Error::IndexOutOfRange {
                    index: 20,
                    length: 8
                }
            ))
        );

        let selector = select().leaves(LeafFilter::new()).partition_by_durations(
            vec![Duration::new(3, 16)],
            DurationsOptions::default().with_fill(Fill::Exact),
        );
        let error = selector.call(parse_score(MELODY).unwrap()).unwrap_err();
        assert!(matches!(
            error,
            Error::Evaluation { ref source, .. } if matches!(**source, Error::Partition { .. })
        ));
    }

    #[test]
    fn test_call_method() {
        let args = Arguments::new().keyword("pitched", Argument::Bool(true));
        let selector = select().call_method("leaves", &args).unwrap();
        assert_eq!(selector, select().leaves(LeafFilter::pitched()));
        let args = Arguments::new().arg(Argument::Expression(select().runs(None)));
        let piped = selector.call_method("pipe", &args).unwrap();
        assert_eq!(piped, selector.clone().pipe(select().runs(None)));
        assert_eq!(selector.callbacks().len(), 1);
        assert_eq!(
            select().call_method("colour", &Arguments::new()),
            Err(Error::UnknownMethod {
                class: "Selection".to_string(),
                name: "colour".to_string()
            })
        );
        assert_eq!(
            Expression::new().call_method("leaves", &Arguments::new()),
            Err(Error::UnknownMethod {
                class: "Expression".to_string(),
                name: "leaves".to_string()
            })
        );
    }

    #[test]
    fn test_concat() {
        let first = select().leaves(LeafFilter::pitched()).item(0);
        let last = select().leaves(LeafFilter::pitched()).item(-1);
        let both = first + last;
        assert_eq!(both.subexpressions().len(), 2);
        let score = parse_score(MELODY).unwrap();
        assert_eq!(both.call(score.clone()).unwrap().to_string(), "[c'8 g'8]");
        assert_eq!(
            both.to_string(),
            "(select().leaves(pitched=true)[0] + select().leaves(pitched=true)[-1])"
        );

        let grouped = both.clone().group();
        assert_eq!(grouped.call(score).unwrap().to_string(), "[[c'8 g'8]]");
        assert_eq!(
            grouped.get_string(None),
            "group((leaves(X, pitched=true)[0] + leaves(X, pitched=true)[-1]))"
        );

        let three = both + select().rests(ComponentFilter::new());
        assert_eq!(three.subexpressions().len(), 3);
    }

    #[test]
    fn test_pipe() {
        let runs = select().runs(None);
        let selector = select().leaves(LeafFilter::new()).pipe(runs.clone().item(1));
        let score = parse_score(MELODY).unwrap();
        assert_eq!(selector.call(score).unwrap().to_string(), "[e'8 ~ e'8 f'8]");
        assert_eq!(selector.to_string(), "select().leaves().pipe(select().runs()[1])");
        assert_eq!(selector.get_string(None), "runs(leaves(X))[1]");
        assert!(selector.is_lone());
    }

    #[test]
    fn test_color() {
        let score = parse_score("{ c'8 d'8 r8 e'8 f'8 }").unwrap();
        select().runs(None).color(score.clone(), None).unwrap();
        assert_eq!(
            score.to_string(),
            "{ \\once \\override NoteHead.color = #red c'8 \
             \\once \\override NoteHead.color = #red d'8 r8 \
             \\once \\override NoteHead.color = #blue e'8 \
             \\once \\override NoteHead.color = #blue f'8 }"
        );

        select()
            .leaves(LeafFilter::pitched())
            .item(0)
            .color(score.clone(), None)
            .unwrap();
        let first = Selection::from(score).leaf(0, LeafFilter::new()).unwrap();
        assert_eq!(
            first.indicators(),
            vec![Indicator::Color("green".to_string())]
        );
    }
}
