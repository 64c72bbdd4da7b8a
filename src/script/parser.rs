// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pest parser producing the script AST

use super::{Result, ScriptError};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use serde::Serialize;

#[derive(Parser)]
#[grammar = "script/poc.pest"]
struct PocParser;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// `name = expr;`
    Assign { name: String, value: Expr, line: usize },
    /// `name(args);`
    Call { call: Call, line: usize },
    /// `name(args) { ... }` or `name { ... }`
    Block {
        call: Call,
        body: Vec<Statement>,
        line: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call {
    pub name: String,
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arg {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Expr {
    Number(f64),
    Bool(bool),
    Str(String),
    Vector(Vec<Expr>),
    Var(String),
    Call(Call),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// `list[index]`
    Index(Box<Expr>, Box<Expr>),
}

/// Parse a script into its AST
pub fn parse_script(source: &str) -> Result<Program> {
    let mut pairs = PocParser::parse(Rule::program, source)
        .map_err(|e| ScriptError::Parse(e.to_string()))?;
    let program = next(&mut pairs, "program")?;

    let statements = program
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::statement)
        .map(build_statement)
        .collect::<Result<Vec<_>>>()?;

    Ok(Program { statements })
}

fn next<'i>(pairs: &mut Pairs<'i, Rule>, what: &str) -> Result<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| ScriptError::Parse(format!("malformed parse tree: missing {what}")))
}

fn unexpected(pair: &Pair<'_, Rule>) -> ScriptError {
    ScriptError::Parse(format!(
        "unexpected {:?} at line {}",
        pair.as_rule(),
        line_of(pair)
    ))
}

fn line_of(pair: &Pair<'_, Rule>) -> usize {
    pair.as_span().start_pos().line_col().0
}

fn build_statement(pair: Pair<Rule>) -> Result<Statement> {
    let line = line_of(&pair);
    let mut inner = pair.into_inner();
    let statement = next(&mut inner, "statement")?;

    match statement.as_rule() {
        Rule::assignment => {
            let mut parts = statement.into_inner();
            let name = next(&mut parts, "name")?.as_str().to_string();
            let value = build_expr(next(&mut parts, "value")?)?;
            Ok(Statement::Assign { name, value, line })
        }
        Rule::call_stmt => {
            let call = build_call(next(&mut statement.into_inner(), "call")?)?;
            Ok(Statement::Call { call, line })
        }
        Rule::block_call => {
            let mut parts = statement.into_inner();
            let head = next(&mut parts, "block head")?;
            let call = match head.as_rule() {
                Rule::call => build_call(head)?,
                Rule::ident => Call {
                    name: head.as_str().to_string(),
                    args: Vec::new(),
                },
                _ => return Err(unexpected(&head)),
            };
            let body = next(&mut parts, "block")?
                .into_inner()
                .map(build_statement)
                .collect::<Result<Vec<_>>>()?;
            Ok(Statement::Block { call, body, line })
        }
        _ => Err(unexpected(&statement)),
    }
}

fn build_call(pair: Pair<Rule>) -> Result<Call> {
    let mut parts = pair.into_inner();
    let name = next(&mut parts, "function name")?.as_str().to_string();

    let mut args = Vec::new();
    if let Some(list) = parts.next() {
        for arg in list.into_inner() {
            let inner = next(&mut arg.into_inner(), "argument")?;
            args.push(match inner.as_rule() {
                Rule::named_arg => {
                    let mut named = inner.into_inner();
                    let name = next(&mut named, "argument name")?.as_str().to_string();
                    let value = build_expr(next(&mut named, "argument value")?)?;
                    Arg {
                        name: Some(name),
                        value,
                    }
                }
                _ => Arg {
                    name: None,
                    value: build_expr(inner)?,
                },
            });
        }
    }

    Ok(Call { name, args })
}

/// Left-associative fold of `operand (op operand)*`
fn build_chain(
    pair: Pair<Rule>,
    operand: fn(Pair<Rule>) -> Result<Expr>,
) -> Result<Expr> {
    let mut parts = pair.into_inner();
    let mut expr = operand(next(&mut parts, "operand")?)?;

    while let Some(op) = parts.next() {
        let op = match op.as_str() {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            _ => return Err(unexpected(&op)),
        };
        let rhs = operand(next(&mut parts, "operand")?)?;
        expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
    }

    Ok(expr)
}

fn build_expr(pair: Pair<Rule>) -> Result<Expr> {
    build_chain(pair, build_product)
}

fn build_product(pair: Pair<Rule>) -> Result<Expr> {
    build_chain(pair, build_unary)
}

fn build_unary(pair: Pair<Rule>) -> Result<Expr> {
    let mut negations = 0;
    let mut operand = None;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::neg => negations += 1,
            _ => operand = Some(part),
        }
    }

    let operand =
        operand.ok_or_else(|| ScriptError::Parse("malformed parse tree: missing operand".into()))?;
    let mut expr = build_indexed(operand)?;
    for _ in 0..negations {
        expr = Expr::Neg(Box::new(expr));
    }
    Ok(expr)
}

fn build_indexed(pair: Pair<Rule>) -> Result<Expr> {
    let mut parts = pair.into_inner();
    let mut expr = build_primary(next(&mut parts, "operand")?)?;
    for index in parts {
        let position = build_expr(next(&mut index.into_inner(), "index")?)?;
        expr = Expr::Index(Box::new(expr), Box::new(position));
    }
    Ok(expr)
}

fn build_primary(pair: Pair<Rule>) -> Result<Expr> {
    let inner = next(&mut pair.into_inner(), "primary")?;

    match inner.as_rule() {
        Rule::number => inner
            .as_str()
            .parse::<f64>()
            .map(Expr::Number)
            .map_err(|e| ScriptError::Parse(format!("line {}: {e}", line_of(&inner)))),
        Rule::string => {
            let text = next(&mut inner.into_inner(), "string body")?;
            Ok(Expr::Str(text.as_str().to_string()))
        }
        Rule::boolean => Ok(Expr::Bool(inner.as_str() == "true")),
        Rule::vector => inner
            .into_inner()
            .map(build_expr)
            .collect::<Result<Vec<_>>>()
            .map(Expr::Vector),
        Rule::call => build_call(inner).map(Expr::Call),
        Rule::ident => Ok(Expr::Var(inner.as_str().to_string())),
        Rule::expr => build_expr(inner),
        _ => Err(unexpected(&inner)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(n: f64) -> Expr {
        Expr::Number(n)
    }

    #[test]
    fn test_parse_call_statement() {
        let program = parse_script("box([0, 0, 0], [1, 1, 1]);").unwrap();
        assert_eq!(program.statements.len(), 1);
        let Statement::Call { call, line } = &program.statements[0] else {
            panic!("expected call");
        };
        assert_eq!(*line, 1);
        assert_eq!(call.name, "box");
        assert_eq!(call.args.len(), 2);
        assert_eq!(
            call.args[1].value,
            Expr::Vector(vec![number(1.0), number(1.0), number(1.0)])
        );
    }

    #[test]
    fn test_precedence_and_negation() {
        let program = parse_script("x = 1 + 2 * -3;").unwrap();
        let Statement::Assign { value, .. } = &program.statements[0] else {
            panic!("expected assignment");
        };
        assert_eq!(
            *value,
            Expr::Binary(
                BinaryOp::Add,
                Box::new(number(1.0)),
                Box::new(Expr::Binary(
                    BinaryOp::Mul,
                    Box::new(number(2.0)),
                    Box::new(Expr::Neg(Box::new(number(3.0))))
                ))
            )
        );
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        let program = parse_script("x = 8 - 4 - 2;").unwrap();
        let Statement::Assign { value, .. } = &program.statements[0] else {
            panic!("expected assignment");
        };
        let Expr::Binary(BinaryOp::Sub, lhs, rhs) = value else {
            panic!("expected subtraction");
        };
        assert_eq!(**rhs, number(2.0));
        assert!(matches!(**lhs, Expr::Binary(BinaryOp::Sub, _, _)));
    }

    #[test]
    fn test_blocks_nest() {
        let source = r#"
            union {
                box([0,0,0], [1,1,1]);
                op("rotate", pi / 2, [0, 0, 1]) {
                    cylinder([0,0,0], [0,0,1], 0.5);
                }
            }
        "#;
        let program = parse_script(source).unwrap();
        let Statement::Block { call, body, line } = &program.statements[0] else {
            panic!("expected block");
        };
        assert_eq!(call.name, "union");
        assert!(call.args.is_empty());
        assert_eq!(*line, 2);
        assert_eq!(body.len(), 2);
        let Statement::Block { call, body, .. } = &body[1] else {
            panic!("expected nested block");
        };
        assert_eq!(call.name, "op");
        assert_eq!(call.args[0].value, Expr::Str("rotate".into()));
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_named_arguments_and_comments() {
        let source = "# shell\nloft(profiles, ruled = false); // smooth\n/* done */";
        let program = parse_script(source).unwrap();
        let Statement::Call { call, line } = &program.statements[0] else {
            panic!("expected call");
        };
        assert_eq!(*line, 2);
        assert_eq!(call.args[1].name.as_deref(), Some("ruled"));
        assert_eq!(call.args[1].value, Expr::Bool(false));
    }

    #[test]
    fn test_identifiers_may_start_with_keywords() {
        let program = parse_script("trueness = 1;").unwrap();
        assert!(matches!(
            &program.statements[0],
            Statement::Assign { name, .. } if name == "trueness"
        ));
    }

    #[test]
    fn test_indexing_binds_tighter_than_negation() {
        let program = parse_script("x = -bbox()[1][0];").unwrap();
        let Statement::Assign { value, .. } = &program.statements[0] else {
            panic!("expected assignment");
        };
        let Expr::Neg(inner) = value else {
            panic!("expected negation");
        };
        let Expr::Index(list, position) = &**inner else {
            panic!("expected index");
        };
        assert_eq!(**position, number(0.0));
        assert!(matches!(&**list, Expr::Index(_, _)));
    }

    #[test]
    fn test_scientific_numbers() {
        let program = parse_script("x = 1.5e-3 + .25;").unwrap();
        let Statement::Assign { value, .. } = &program.statements[0] else {
            panic!("expected assignment");
        };
        assert_eq!(
            *value,
            Expr::Binary(BinaryOp::Add, Box::new(number(1.5e-3)), Box::new(number(0.25)))
        );
    }

    #[test]
    fn test_parse_error_reports_position() {
        let err = parse_script("box([0,0,0], [1,1,1])\nsphere();").unwrap_err();
        assert!(matches!(err, ScriptError::Parse(_)));
        assert!(err.to_string().contains("2:"), "{err}");
    }

    #[test]
    fn test_ast_serializes() {
        let program = parse_script("x = -1;").unwrap();
        let json = serde_json::to_value(&program).unwrap();
        assert_eq!(json["statements"][0]["kind"], "assign");
        assert_eq!(json["statements"][0]["value"]["kind"], "neg");
    }
}
