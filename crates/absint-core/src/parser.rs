//! Parser for the `.abir` text format.
//!
//! The format is line oriented. `;` starts a comment, blank lines are
//! ignored, and a function looks like:
//!
//! ```text
//! fn @count(%n) {
//! entry:
//!   br %loop
//! loop:
//!   %i = phi [ 0, %entry ], [ %j, %loop ]
//!   %j = add %i, 1
//!   %c = icmp slt %j, %n
//!   br %c, %loop, %done
//! done:
//!   ret %i
//! }
//! ```
//!
//! Opcodes outside the modeled set parse into [`Inst::Unknown`] so that an
//! unanalyzable instruction never fails the front end.

use crate::cfg::{CfgError, FunctionBuilder};
use crate::ir::{Inst, Module, Operand, Predicate, Terminator};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: {msg}")]
    Syntax { line: usize, msg: String },
    #[error("line {line}: {source}")]
    Cfg {
        line: usize,
        #[source]
        source: CfgError,
    },
    #[error("function @{function}: {source}")]
    InvalidCfg {
        function: String,
        #[source]
        source: CfgError,
    },
    #[error("duplicate function @{0}")]
    DuplicateFunction(String),
}

fn syntax(line: usize, msg: impl Into<String>) -> ParseError {
    ParseError::Syntax {
        line,
        msg: msg.into(),
    }
}

/// Parse a whole source file into a [`Module`].
pub fn parse_module(src: &str) -> Result<Module, ParseError> {
    let mut functions = Vec::new();
    let mut seen = HashSet::new();
    let mut builder: Option<FunctionBuilder> = None;
    let mut open_line = 0;

    for (idx, raw) in src.lines().enumerate() {
        let line = idx + 1;
        let text = raw.split(';').next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }

        if let Some(header) = text.strip_prefix("fn ") {
            if builder.is_some() {
                return Err(syntax(line, "nested function definition"));
            }
            builder = Some(parse_header(header, line)?);
            open_line = line;
            continue;
        }

        if text == "}" {
            let b = builder
                .take()
                .ok_or_else(|| syntax(line, "unmatched `}`"))?;
            let name = b_name(&b);
            let func = b.finish().map_err(|source| ParseError::InvalidCfg {
                function: name.clone(),
                source,
            })?;
            if !seen.insert(func.name().to_string()) {
                return Err(ParseError::DuplicateFunction(func.name().to_string()));
            }
            debug!(function = func.name(), blocks = func.block_ids().count(), "parsed function");
            functions.push(func);
            continue;
        }

        let b = builder
            .as_mut()
            .ok_or_else(|| syntax(line, "statement outside any function"))?;

        if let Some(label) = block_label(text) {
            b.start_block(label)
                .map_err(|source| ParseError::Cfg { line, source })?;
        } else {
            parse_stmt(b, text, line)?;
        }
    }

    if builder.is_some() {
        return Err(syntax(open_line, "function body is never closed"));
    }
    Ok(Module { functions })
}

fn b_name(b: &FunctionBuilder) -> String {
    b.name().to_string()
}

/// `@name(%a, %b) {` after the `fn ` prefix has been stripped.
fn parse_header(header: &str, line: usize) -> Result<FunctionBuilder, ParseError> {
    let header = header.trim();
    let rest = header
        .strip_prefix('@')
        .ok_or_else(|| syntax(line, "function name must start with `@`"))?;
    let open = rest
        .find('(')
        .ok_or_else(|| syntax(line, "expected `(` after function name"))?;
    let close = rest
        .find(')')
        .ok_or_else(|| syntax(line, "expected `)` closing the parameter list"))?;
    if close < open || !rest[close + 1..].trim().eq("{") {
        return Err(syntax(line, "malformed function header"));
    }
    let name = rest[..open].trim();
    if name.is_empty() {
        return Err(syntax(line, "empty function name"));
    }

    let mut params = Vec::new();
    let list = rest[open + 1..close].trim();
    if !list.is_empty() {
        for p in list.split(',') {
            let p = p.trim();
            let ident = p
                .strip_prefix('%')
                .filter(|s| !s.is_empty())
                .ok_or_else(|| syntax(line, format!("malformed parameter `{p}`")))?;
            params.push(ident.to_string());
        }
    }
    Ok(FunctionBuilder::new(name, params))
}

/// A line of the shape `label:` introduces a new block.
fn block_label(text: &str) -> Option<&str> {
    let label = text.strip_suffix(':')?;
    (!label.is_empty() && !label.contains(char::is_whitespace)).then_some(label)
}

fn parse_stmt(b: &mut FunctionBuilder, text: &str, line: usize) -> Result<(), ParseError> {
    if let Some(args) = text.strip_prefix("br ") {
        return parse_br(b, args, line);
    }
    if text == "ret" {
        return b
            .terminate(Terminator::Ret(None))
            .map_err(|source| ParseError::Cfg { line, source });
    }
    if let Some(arg) = text.strip_prefix("ret ") {
        let op = parse_operand(arg.trim(), line)?;
        return b
            .terminate(Terminator::Ret(Some(op)))
            .map_err(|source| ParseError::Cfg { line, source });
    }

    let inst = if let Some((lhs, rhs)) = text.split_once('=') {
        let dest = lhs
            .trim()
            .strip_prefix('%')
            .filter(|s| !s.is_empty())
            .ok_or_else(|| syntax(line, format!("malformed destination `{}`", lhs.trim())))?
            .to_string();
        parse_assignment(b, dest, rhs.trim(), line)?
    } else {
        // Bare statement with an opcode we do not model, e.g. `store %x`.
        let mnemonic = text.split_whitespace().next().unwrap_or(text).to_string();
        Inst::Unknown {
            dest: None,
            mnemonic,
        }
    };
    b.push(inst).map_err(|source| ParseError::Cfg { line, source })
}

fn parse_br(b: &mut FunctionBuilder, args: &str, line: usize) -> Result<(), ParseError> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let term = match parts.as_slice() {
        [target] => Terminator::Br(label_ref(b, target, line)?),
        [cond, then_label, else_label] => Terminator::CondBr {
            cond: parse_operand(cond, line)?,
            then_dest: label_ref(b, then_label, line)?,
            else_dest: label_ref(b, else_label, line)?,
        },
        _ => return Err(syntax(line, "`br` takes one label or a condition and two labels")),
    };
    b.terminate(term)
        .map_err(|source| ParseError::Cfg { line, source })
}

fn parse_assignment(
    b: &mut FunctionBuilder,
    dest: String,
    rhs: &str,
    line: usize,
) -> Result<Inst, ParseError> {
    let (opcode, args) = match rhs.split_once(char::is_whitespace) {
        Some((op, rest)) => (op, rest.trim()),
        None => (rhs, ""),
    };
    match opcode {
        "add" | "sub" | "mul" => {
            let (lhs, rhs) = binary_args(args, line)?;
            Ok(match opcode {
                "add" => Inst::Add { dest, lhs, rhs },
                "sub" => Inst::Sub { dest, lhs, rhs },
                _ => Inst::Mul { dest, lhs, rhs },
            })
        }
        "icmp" => {
            let (pred_tok, rest) = args
                .split_once(char::is_whitespace)
                .ok_or_else(|| syntax(line, "`icmp` needs a predicate and two operands"))?;
            let pred = parse_predicate(pred_tok, line)?;
            let (lhs, rhs) = binary_args(rest.trim(), line)?;
            Ok(Inst::ICmp {
                dest,
                pred,
                lhs,
                rhs,
            })
        }
        "phi" => parse_phi(b, dest, args, line),
        other => Ok(Inst::Unknown {
            dest: Some(dest),
            mnemonic: other.to_string(),
        }),
    }
}

fn binary_args(args: &str, line: usize) -> Result<(Operand, Operand), ParseError> {
    let (l, r) = args
        .split_once(',')
        .ok_or_else(|| syntax(line, "expected two comma-separated operands"))?;
    Ok((parse_operand(l.trim(), line)?, parse_operand(r.trim(), line)?))
}

fn parse_predicate(tok: &str, line: usize) -> Result<Predicate, ParseError> {
    match tok {
        "eq" => Ok(Predicate::Eq),
        "ne" => Ok(Predicate::Ne),
        "slt" => Ok(Predicate::Slt),
        "sle" => Ok(Predicate::Sle),
        "sgt" => Ok(Predicate::Sgt),
        "sge" => Ok(Predicate::Sge),
        other => Err(syntax(line, format!("unknown icmp predicate `{other}`"))),
    }
}

/// `[ value, %label ], [ value, %label ], ...`
fn parse_phi(
    b: &mut FunctionBuilder,
    dest: String,
    args: &str,
    line: usize,
) -> Result<Inst, ParseError> {
    let mut incomings = Vec::new();
    let mut rest = args.trim();
    while !rest.is_empty() {
        let body = rest
            .strip_prefix('[')
            .ok_or_else(|| syntax(line, "expected `[` starting a phi incoming"))?;
        let end = body
            .find(']')
            .ok_or_else(|| syntax(line, "unclosed phi incoming"))?;
        let (val, label) = body[..end]
            .split_once(',')
            .ok_or_else(|| syntax(line, "phi incoming needs a value and a label"))?;
        let value = parse_operand(val.trim(), line)?;
        let block = label_ref(b, label.trim(), line)?;
        incomings.push((value, block));

        rest = body[end + 1..].trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after.trim_start();
            if rest.is_empty() {
                return Err(syntax(line, "trailing comma in phi incoming list"));
            }
        } else if !rest.is_empty() {
            return Err(syntax(line, "expected `,` between phi incomings"));
        }
    }
    if incomings.is_empty() {
        return Err(syntax(line, "phi needs at least one incoming"));
    }
    Ok(Inst::Phi { dest, incomings })
}

fn parse_operand(tok: &str, line: usize) -> Result<Operand, ParseError> {
    if let Some(name) = tok.strip_prefix('%') {
        if name.is_empty() {
            return Err(syntax(line, "empty variable name"));
        }
        return Ok(Operand::Var(name.to_string()));
    }
    tok.parse::<i64>()
        .map(Operand::Const)
        .map_err(|_| syntax(line, format!("malformed operand `{tok}`")))
}

fn label_ref(b: &mut FunctionBuilder, tok: &str, line: usize) -> Result<crate::ir::BlockId, ParseError> {
    let label = tok
        .strip_prefix('%')
        .filter(|s| !s.is_empty())
        .ok_or_else(|| syntax(line, format!("malformed label reference `{tok}`")))?;
    Ok(b.block_id(label))
}
