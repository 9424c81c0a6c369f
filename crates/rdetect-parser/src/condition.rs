//! Condition expression compiler using a pest PEG grammar + Pratt parser.
//!
//! Compiles condition strings like:
//! - `"unique_ips > 5 and in_set(region, ['EU', 'US'])"`
//! - `"jaccard_distance(known_devices, seen_devices) >= 0.7"`
//! - `"len(privileged_roles - expected_roles) > 0"`
//!
//! Compilation enforces the whitelist: the grammar parses a slight superset
//! of the permitted language (other arithmetic operators, dotted names,
//! `not`, unary minus), and lowering rejects those constructs with
//! [`CompileError::UnsupportedOperation`]. Nothing outside the eight
//! expression-tree node kinds can survive a successful compile, regardless
//! of what the event context later contains.

use pest::Parser;
use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

use crate::ast::{BoolOp, CmpOp, Expr, FUNCTION_WHITELIST};
use crate::error::CompileError;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Pest parser (generated from condition.pest grammar)
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[grammar = "src/condition.pest"]
struct ConditionParser;

type Result<T> = std::result::Result<T, CompileError>;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compile a condition string into an expression tree.
///
/// # Examples
///
/// ```
/// use rdetect_parser::condition::compile;
///
/// let expr = compile("unique_ips > 5 and in_set(region, ['EU', 'US'])").unwrap();
/// println!("{expr}");
/// ```
pub fn compile(input: &str) -> Result<Expr> {
    let pairs = ConditionParser::parse(Rule::condition, input)
        .map_err(|e| CompileError::Syntax(e.to_string()))?;

    let pratt = PrattParser::new()
        .op(Op::infix(Rule::or_kw, Assoc::Left))
        .op(Op::infix(Rule::and_kw, Assoc::Left))
        .op(Op::infix(Rule::gt, Assoc::Left)
            | Op::infix(Rule::ge, Assoc::Left)
            | Op::infix(Rule::lt, Assoc::Left)
            | Op::infix(Rule::le, Assoc::Left)
            | Op::infix(Rule::eq, Assoc::Left)
            | Op::infix(Rule::ne, Assoc::Left))
        .op(Op::infix(Rule::sub, Assoc::Left) | Op::infix(Rule::add, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left)
            | Op::infix(Rule::div, Assoc::Left)
            | Op::infix(Rule::rem, Assoc::Left))
        .op(Op::prefix(Rule::not_kw) | Op::prefix(Rule::neg));

    // condition = { SOI ~ expr ~ EOI }
    let condition_pair = pairs.into_iter().next().unwrap();
    let expr_pair = condition_pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .unwrap();

    parse_expr(expr_pair, &pratt)
}

// ---------------------------------------------------------------------------
// Lowering: parse tree → expression tree (whitelist enforcement)
// ---------------------------------------------------------------------------

fn parse_expr(pair: Pair<'_, Rule>, pratt: &PrattParser<Rule>) -> Result<Expr> {
    pratt
        .map_primary(|primary| match primary.as_rule() {
            Rule::call => parse_call(primary, pratt),
            Rule::list => Ok(Expr::List(parse_elements(primary, pratt)?)),
            Rule::set => Ok(Expr::Set(parse_elements(primary, pratt)?)),
            Rule::var => parse_var(primary),
            Rule::number => parse_number(primary),
            Rule::string => Ok(Expr::Constant(Value::String(unescape_string(
                primary.as_str(),
            )))),
            Rule::boolean => Ok(Expr::Constant(Value::Bool(primary.as_str() == "true"))),
            Rule::null => Ok(Expr::Constant(Value::Null)),
            Rule::expr => parse_expr(primary, pratt),
            other => unreachable!("unexpected primary rule: {other:?}"),
        })
        .map_prefix(|op, rhs| match op.as_rule() {
            Rule::neg => negate_literal(rhs?),
            Rule::not_kw => Err(CompileError::UnsupportedOperation(
                "operator 'not' is not allowed".into(),
            )),
            other => unreachable!("unexpected prefix rule: {other:?}"),
        })
        .map_infix(|lhs, op, rhs| {
            let rule = op.as_rule();
            let (lhs, rhs) = (lhs?, rhs?);
            match rule {
                Rule::and_kw => Ok(merge_boolean(BoolOp::And, lhs, rhs)),
                Rule::or_kw => Ok(merge_boolean(BoolOp::Or, lhs, rhs)),
                Rule::gt | Rule::ge | Rule::lt | Rule::le | Rule::eq | Rule::ne => {
                    Ok(Expr::Compare {
                        op: cmp_op(rule),
                        left: Box::new(lhs),
                        right: Box::new(rhs),
                    })
                }
                Rule::sub => Ok(Expr::Diff {
                    left: Box::new(lhs),
                    right: Box::new(rhs),
                }),
                Rule::add | Rule::mul | Rule::div | Rule::rem => {
                    Err(CompileError::UnsupportedOperation(format!(
                        "binary operator '{}' is not allowed; '-' (set difference) is the only permitted binary operator",
                        op.as_str()
                    )))
                }
                other => unreachable!("unexpected infix rule: {other:?}"),
            }
        })
        .parse(pair.into_inner())
}

/// Flatten nested boolean operators of the same kind.
/// `a and (b and c)` → `and(a, b, c)` instead of `and(a, and(b, c))`.
fn merge_boolean(op: BoolOp, lhs: Expr, rhs: Expr) -> Expr {
    let mut operands = Vec::new();
    for side in [lhs, rhs] {
        match side {
            Expr::BoolOp {
                op: child_op,
                operands: children,
            } if child_op == op => operands.extend(children),
            other => operands.push(other),
        }
    }
    Expr::BoolOp { op, operands }
}

fn cmp_op(rule: Rule) -> CmpOp {
    match rule {
        Rule::gt => CmpOp::Gt,
        Rule::ge => CmpOp::Ge,
        Rule::lt => CmpOp::Lt,
        Rule::le => CmpOp::Le,
        Rule::eq => CmpOp::Eq,
        Rule::ne => CmpOp::Ne,
        other => unreachable!("not a comparison rule: {other:?}"),
    }
}

fn parse_call(pair: Pair<'_, Rule>, pratt: &PrattParser<Rule>) -> Result<Expr> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .expect("call must have a function name")
        .as_str()
        .to_string();

    if !FUNCTION_WHITELIST.contains(&name.as_str()) {
        return Err(CompileError::UnsupportedOperation(format!(
            "function '{name}' is not in the registry"
        )));
    }

    let args = inner
        .map(|p| parse_expr(p, pratt))
        .collect::<Result<Vec<_>>>()?;
    Ok(Expr::Call { name, args })
}

fn parse_elements(pair: Pair<'_, Rule>, pratt: &PrattParser<Rule>) -> Result<Vec<Expr>> {
    pair.into_inner().map(|p| parse_expr(p, pratt)).collect()
}

fn parse_var(pair: Pair<'_, Rule>) -> Result<Expr> {
    let text = pair.as_str().to_string();
    let mut idents = pair.into_inner();
    let first = idents.next().expect("variable must have a name");
    if idents.next().is_some() {
        return Err(CompileError::UnsupportedOperation(format!(
            "attribute access is not allowed: '{text}'"
        )));
    }
    Ok(Expr::Var(first.as_str().to_string()))
}

fn parse_number(pair: Pair<'_, Rule>) -> Result<Expr> {
    let s = pair.as_str();
    let value = if s.contains(['.', 'e', 'E']) {
        Value::Float(
            s.parse::<f64>()
                .map_err(|_| CompileError::Syntax(format!("invalid number literal '{s}'")))?,
        )
    } else {
        match s.parse::<i64>() {
            Ok(n) => Value::Integer(n),
            // Out of i64 range: fall back to float
            Err(_) => Value::Float(
                s.parse::<f64>()
                    .map_err(|_| CompileError::Syntax(format!("invalid number literal '{s}'")))?,
            ),
        }
    };
    Ok(Expr::Constant(value))
}

/// Unary minus folds into numeric literals; the tree has no negation node,
/// so anything else is rejected.
fn negate_literal(expr: Expr) -> Result<Expr> {
    match expr {
        Expr::Constant(Value::Integer(n)) => Ok(Expr::Constant(Value::Integer(-n))),
        Expr::Constant(Value::Float(x)) => Ok(Expr::Constant(Value::Float(-x))),
        _ => Err(CompileError::UnsupportedOperation(
            "unary minus is only allowed on numeric literals".into(),
        )),
    }
}

fn unescape_string(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('\\') => out.push('\\'),
                Some('\'') => out.push('\''),
                Some('"') => out.push('"'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
