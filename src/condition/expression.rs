// src/condition/expression.rs

use serde_json::Value;
use tracing::trace;

use crate::condition::condition::Condition;
use crate::engine::accumulator::Accumulator;
use crate::errors::DefinitionError;
use crate::types::LogicalOperator;

/// A boolean tree of [`Condition`]s.
///
/// Every child of a node is evaluated, left to right, before the operator
/// combines them:
///
/// | operator | result                    | no children |
/// |----------|---------------------------|-------------|
/// | `and`    | all children true         | `true`      |
/// | `or`     | at least one child true   | `false`     |
/// | `xor`    | exactly one child true    | `false`     |
///
/// A negated node inverts the combined result.
#[derive(Debug, Clone)]
pub enum ConditionExpression {
    Leaf(Condition),
    Node {
        operator: LogicalOperator,
        negated: bool,
        children: Vec<ConditionExpression>,
    },
}

impl From<Condition> for ConditionExpression {
    fn from(condition: Condition) -> Self {
        ConditionExpression::Leaf(condition)
    }
}

impl ConditionExpression {
    pub fn node(operator: LogicalOperator, children: Vec<ConditionExpression>) -> Self {
        ConditionExpression::Node {
            operator,
            negated: false,
            children,
        }
    }

    pub fn and(children: Vec<ConditionExpression>) -> Self {
        Self::node(LogicalOperator::And, children)
    }

    pub fn or(children: Vec<ConditionExpression>) -> Self {
        Self::node(LogicalOperator::Or, children)
    }

    pub fn xor(children: Vec<ConditionExpression>) -> Self {
        Self::node(LogicalOperator::Xor, children)
    }

    /// Invert this expression. A leaf is wrapped in a negated single-child
    /// `and` node; the leaf's own negation flag is left alone.
    pub fn negate(self) -> Self {
        match self {
            ConditionExpression::Node {
                operator,
                negated,
                children,
            } => ConditionExpression::Node {
                operator,
                negated: !negated,
                children,
            },
            leaf @ ConditionExpression::Leaf(_) => ConditionExpression::Node {
                operator: LogicalOperator::And,
                negated: true,
                children: vec![leaf],
            },
        }
    }

    pub fn evaluate(&self, input: &Value, accumulator: &Accumulator) -> bool {
        match self {
            ConditionExpression::Leaf(condition) => condition.evaluate(input, accumulator),
            ConditionExpression::Node {
                operator,
                negated,
                children,
            } => {
                let outcomes: Vec<bool> = children
                    .iter()
                    .map(|child| child.evaluate(input, accumulator))
                    .collect();
                let combined = combine(*operator, &outcomes);
                trace!(%operator, negated, ?outcomes, combined, "expression node evaluated");
                combined != *negated
            }
        }
    }

    /// All leaf conditions, depth-first.
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect_conditions(&mut out);
        out
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            ConditionExpression::Leaf(condition) => out.push(condition),
            ConditionExpression::Node { children, .. } => {
                for child in children {
                    child.collect_conditions(out);
                }
            }
        }
    }

    /// Construction problems anywhere in the tree.
    pub fn errors(&self) -> Vec<&DefinitionError> {
        self.conditions()
            .into_iter()
            .flat_map(|c| c.errors())
            .collect()
    }
}

/// Combine already-evaluated child outcomes with `operator`.
pub fn combine(operator: LogicalOperator, outcomes: &[bool]) -> bool {
    match operator {
        LogicalOperator::And => outcomes.iter().all(|b| *b),
        LogicalOperator::Or => outcomes.iter().any(|b| *b),
        LogicalOperator::Xor => outcomes.iter().filter(|b| **b).count() == 1,
    }
}
