//! Tree-walking evaluation over JSON values.

use super::parser::{Accessor, BinaryOp, Node, Target};
use super::EvaluationContext;
use crate::key::render;
use serde_json::{Number, Value};
use std::cmp::Ordering;

static NULL: Value = Value::Null;

pub(crate) fn evaluate(node: &Node, ctx: &EvaluationContext<'_>) -> Value {
    match node {
        Node::Literal(value) => value.clone(),
        Node::Reference { target, path } => lookup(target, path, ctx),
        Node::Not(inner) => Value::Bool(!truthy(&evaluate(inner, ctx))),
        Node::Binary { op: BinaryOp::And, lhs, rhs } => {
            Value::Bool(truthy(&evaluate(lhs, ctx)) && truthy(&evaluate(rhs, ctx)))
        }
        Node::Binary { op: BinaryOp::Or, lhs, rhs } => {
            Value::Bool(truthy(&evaluate(lhs, ctx)) || truthy(&evaluate(rhs, ctx)))
        }
        Node::Binary { op, lhs, rhs } => {
            let lhs = evaluate(lhs, ctx);
            let rhs = evaluate(rhs, ctx);
            match op {
                BinaryOp::Add => add(&lhs, &rhs),
                BinaryOp::Eq => Value::Bool(loose_eq(&lhs, &rhs)),
                BinaryOp::Ne => Value::Bool(!loose_eq(&lhs, &rhs)),
                BinaryOp::Gt => Value::Bool(compare(&lhs, &rhs) == Some(Ordering::Greater)),
                BinaryOp::Ge => Value::Bool(matches!(
                    compare(&lhs, &rhs),
                    Some(Ordering::Greater | Ordering::Equal)
                )),
                BinaryOp::Lt => Value::Bool(compare(&lhs, &rhs) == Some(Ordering::Less)),
                BinaryOp::Le => Value::Bool(matches!(
                    compare(&lhs, &rhs),
                    Some(Ordering::Less | Ordering::Equal)
                )),
                BinaryOp::And => Value::Bool(truthy(&lhs) && truthy(&rhs)),
                BinaryOp::Or => Value::Bool(truthy(&lhs) || truthy(&rhs)),
            }
        }
    }
}

fn lookup(target: &Target, path: &[Accessor], ctx: &EvaluationContext<'_>) -> Value {
    let base = match target {
        Target::Positional(index) => ctx.args.get(*index).unwrap_or(&NULL),
        Target::Result => ctx.result.unwrap_or(&NULL),
        Target::MethodName => return walk(&Value::from(ctx.method_name), path).clone(),
        // unresolved names never survive compilation
        Target::Variable(_) => &NULL,
    };
    walk(base, path).clone()
}

fn walk<'v>(base: &'v Value, path: &[Accessor]) -> &'v Value {
    path.iter().fold(base, |current, accessor| {
        let next = match accessor {
            Accessor::Field(field) => current.get(field.as_str()),
            Accessor::Index(index) => current.get(*index),
        };
        next.unwrap_or(&NULL)
    })
}

/// `false` and `null` are false; everything else is true.
pub(crate) fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

fn add(lhs: &Value, rhs: &Value) -> Value {
    if let (Value::Number(l), Value::Number(r)) = (lhs, rhs) {
        if let (Some(l), Some(r)) = (l.as_i64(), r.as_i64()) {
            if let Some(sum) = l.checked_add(r) {
                return Value::from(sum);
            }
        }
        if let (Some(l), Some(r)) = (l.as_f64(), r.as_f64()) {
            return Number::from_f64(l + r).map_or(Value::Null, Value::Number);
        }
    }
    Value::String(render(lhs) + &render(rhs))
}

fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => l == r,
            _ => l.as_f64() == r.as_f64(),
        },
        _ => lhs == rhs,
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => Some(l.cmp(&r)),
            _ => l.as_f64()?.partial_cmp(&r.as_f64()?),
        },
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}
