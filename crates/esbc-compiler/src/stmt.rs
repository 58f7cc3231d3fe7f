//! Texte → `Vec<Stmt>`.
//!
//! Une seule passe de dispatch par instruction, dans l'ordre : `for`, `while`,
//! chaîne `if`, `el` orphelin (`el`, `el if`, `el {`), `return`, `break`,
//! `continue`, `:=`, affectation composée, `=`, puis expression.

use esbc_ast::{BinOp, Else, Expr, IfChain, Stmt};

use crate::{scan, Ctx, EncodeResult};

impl Ctx<'_> {
    /// Compile un bloc (texte entre accolades, accolades exclues).
    pub(crate) fn block(&mut self, body: &str) -> EncodeResult<Vec<Stmt>> {
        self.enter()?;
        let out = self.block_at_depth(body);
        self.leave(out)
    }

    fn block_at_depth(&mut self, body: &str) -> EncodeResult<Vec<Stmt>> {
        let mut out = Vec::new();
        for s in scan::split_statements(body) {
            if let Some(stmt) = self.stmt(&s)? {
                out.push(stmt);
            }
        }
        Ok(out)
    }

    fn stmt(&mut self, s: &str) -> EncodeResult<Option<Stmt>> {
        if let Some(rest) = scan::after_keyword(s, "for") {
            if let Some(stmt) = self.for_loop(rest)? {
                return Ok(Some(stmt));
            }
            self.warn(format!("malformed for loop `{}`", first_line(s)));
        } else if let Some(rest) = scan::after_keyword(s, "while") {
            return self.while_loop(rest).map(Some);
        } else if let Some(rest) = scan::after_keyword(s, "if") {
            return Ok(Some(Stmt::If(self.if_chain(rest)?)));
        } else if scan::is_else_branch(s) {
            self.warn(format!("`el` branch without a preceding `if`: `{}`", first_line(s)));
            return Ok(None);
        } else if let Some(rest) = scan::after_keyword(s, "return") {
            if rest.is_empty() {
                self.warn("bare return; returning 0");
                return Ok(Some(Stmt::Return(Expr::Int(0))));
            }
            return Ok(Some(Stmt::Return(self.expr(rest)?)));
        } else if s == "break" {
            return Ok(Some(Stmt::Break));
        } else if s == "continue" {
            return Ok(Some(Stmt::Continue));
        }

        if let Some(at) = scan::find_top(s, ":=") {
            let name = s[..at].trim();
            if scan::is_identifier(name) {
                let value = self.expr(&s[at + 2..])?;
                let slot = self.declare(name)?;
                return Ok(Some(Stmt::Declare { slot, value }));
            }
        }

        if let Some((at, op)) = scan::find_compound(s) {
            let name = s[..at].trim();
            if scan::is_identifier(name) {
                let value = self.expr(&s[at + 2..])?;
                let slot = match self.locals.get(name).copied() {
                    Some(slot) => slot,
                    None => {
                        self.warn(format!("compound assignment to undeclared `{name}`; declaring it"));
                        self.declare(name)?
                    }
                };
                return Ok(Some(match op {
                    BinOp::Add => Stmt::AddAssign { slot, value },
                    _ => Stmt::Assign { slot, value: Expr::binary(op, Expr::Local(slot), value) },
                }));
            }
        }

        if let Some(at) = scan::find_assign(s) {
            let name = s[..at].trim();
            if scan::is_identifier(name) {
                let value = self.expr(&s[at + 1..])?;
                return Ok(Some(match self.locals.get(name).copied() {
                    Some(slot) => Stmt::Assign { slot, value },
                    None => {
                        self.warn(format!("assignment to undeclared `{name}`; declaring it"));
                        Stmt::Declare { slot: self.declare(name)?, value }
                    }
                }));
            }
        }

        Ok(Some(Stmt::Expr(self.expr(s)?)))
    }

    /// `v := a..=b { … }` ou `v := a..b { … }` ; `None` si l'en-tête est illisible.
    fn for_loop(&mut self, rest: &str) -> EncodeResult<Option<Stmt>> {
        let Some((head, body, tail)) = scan::split_head_block(rest) else {
            return Ok(None);
        };
        let Some(at) = head.find(":=") else {
            return Ok(None);
        };
        let var = head[..at].trim();
        let Some((start, end, inclusive)) = scan::split_range(&head[at + 2..]) else {
            return Ok(None);
        };
        if !scan::is_identifier(var) {
            return Ok(None);
        }

        let start = self.expr(start)?;
        let end = self.expr(end)?;
        let end = if inclusive { end } else { Expr::binary(BinOp::Sub, end, Expr::Int(1)) };

        self.loops.push(var.to_owned());
        let body = self.block(body);
        self.loops.pop();
        self.ignore_tail("for", tail);
        Ok(Some(Stmt::For { start, end, body: body? }))
    }

    fn while_loop(&mut self, rest: &str) -> EncodeResult<Stmt> {
        match scan::split_head_block(rest) {
            Some((cond, body, tail)) => {
                let cond = self.expr(cond)?;
                let body = self.block(body)?;
                self.ignore_tail("while", tail);
                Ok(Stmt::While { cond, body })
            }
            None => {
                self.warn("while without a body");
                Ok(Stmt::While { cond: self.expr(rest)?, body: Vec::new() })
            }
        }
    }

    /// Texte après `if` : `cond { … }` suivi éventuellement de `el if …` ou `el { … }`.
    fn if_chain(&mut self, rest: &str) -> EncodeResult<IfChain> {
        self.enter()?;
        let out = self.if_chain_at_depth(rest);
        self.leave(out)
    }

    fn if_chain_at_depth(&mut self, rest: &str) -> EncodeResult<IfChain> {
        let Some((cond, body, tail)) = scan::split_head_block(rest) else {
            self.warn("if without a body");
            return Ok(IfChain { cond: self.expr(rest)?, then: Vec::new(), otherwise: Else::None });
        };
        let cond = self.expr(cond)?;
        let then = self.block(body)?;

        let otherwise = match scan::else_branch(tail) {
            None => {
                self.ignore_tail("if", tail);
                Else::None
            }
            Some(alt) => {
                if let Some(next) = scan::after_keyword(alt, "if") {
                    Else::Chain(Box::new(self.if_chain(next)?))
                } else if let Some((_, body, after)) = scan::split_head_block(alt).filter(|(head, ..)| head.is_empty()) {
                    let block = self.block(body)?;
                    self.ignore_tail("el", after);
                    Else::Block(block)
                } else {
                    self.warn("`el` without a block");
                    Else::None
                }
            }
        };
        Ok(IfChain { cond, then, otherwise })
    }

    fn ignore_tail(&mut self, what: &str, tail: &str) {
        if !tail.is_empty() {
            self.warn(format!("text after {what} block ignored: `{}`", first_line(tail)));
        }
    }
}

fn first_line(s: &str) -> &str { s.lines().next().unwrap_or(s).trim() }
