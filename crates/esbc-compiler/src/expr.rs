//! Texte → `Expr`.
//!
//! Ordre d'essai : ternaire, opérateurs binaires (du groupe le moins
//! prioritaire au plus prioritaire, occurrence la plus à droite), parenthèses
//! englobantes, appel, `$N`, entier, chaîne, préfixe unaire, identifiant.
//! Ce qui ne correspond à rien devient le paramètre 0, avec un warning.
//! Chaque appel récursif compte pour un niveau d'imbrication.

use esbc_ast::{Aggregate, BinOp, Expr};
use esbc_core::{Format, FUNC_MAIN};

use crate::{scan, Ctx, EncodeError, EncodeResult};

impl Ctx<'_> {
    /// Compile une expression.
    pub(crate) fn expr(&mut self, text: &str) -> EncodeResult<Expr> {
        self.enter()?;
        let out = self.expr_at_depth(text);
        self.leave(out)
    }

    fn expr_at_depth(&mut self, text: &str) -> EncodeResult<Expr> {
        let e = text.trim();
        if e.is_empty() {
            return Ok(self.fallback("empty expression"));
        }

        if let Some((c, t, o)) = scan::find_ternary(e) {
            return Ok(Expr::ternary(self.expr(c)?, self.expr(t)?, self.expr(o)?));
        }

        for group in BinOp::GROUPS {
            if let Some((at, op)) = scan::find_binop(e, group) {
                let lhs = self.expr(&e[..at])?;
                let rhs = self.expr(&e[at + op.symbol().len()..])?;
                return Ok(Expr::binary(op, lhs, rhs));
            }
        }

        if let Some(inner) = scan::strip_outer(e, '(', ')') {
            return self.expr(inner);
        }

        if let Some((name, args)) = scan::parse_call(e) {
            return self.call(name, &args);
        }

        if let Some(n) = e.strip_prefix('$').filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())) {
            return Ok(match n.parse::<u8>() {
                Ok(i) => Expr::Param(i),
                Err(_) => self.fallback(format!("parameter reference `{e}` out of range")),
            });
        }

        if let Ok(v) = e.parse::<i64>() {
            return Ok(self.int(v));
        }

        if let Some(s) = scan::string_literal(e) {
            return Ok(Expr::Str(s.to_owned()));
        }

        if let Some(rest) = e.strip_prefix('-') {
            return Ok(Expr::binary(BinOp::Sub, Expr::Int(0), self.expr(rest)?));
        }
        if let Some(rest) = e.strip_prefix('!') {
            return Ok(Expr::binary(BinOp::Eq, self.expr(rest)?, Expr::Int(0)));
        }

        if scan::is_identifier(e) {
            if let Some(v) = self.resolve(e) {
                return Ok(v);
            }
            return Ok(self.fallback(format!("unknown identifier `{e}`")));
        }

        Ok(self.fallback(format!("cannot parse expression `{e}`")))
    }

    fn fallback(&mut self, why: impl core::fmt::Display) -> Expr {
        self.warn(format!("{why}; using parameter 0"));
        Expr::Param(0)
    }

    fn int(&mut self, v: i64) -> Expr {
        match i16::try_from(v) {
            Ok(v) => Expr::Int(v),
            Err(_) => {
                #[allow(clippy::cast_possible_truncation)]
                let wrapped = v as i16;
                self.warn(format!("integer {v} does not fit in 16 bits; wrapped to {wrapped}"));
                Expr::Int(wrapped)
            }
        }
    }

    /// Variable de boucle (la plus interne d'abord), puis local, puis paramètre.
    fn resolve(&self, name: &str) -> Option<Expr> {
        if let Some(up) = self.loops.iter().rev().position(|v| v == name) {
            return u8::try_from(up).ok().map(|up| Expr::LoopVar { up });
        }
        if let Some(&slot) = self.locals.get(name) {
            return Some(Expr::Local(slot));
        }
        self.params.iter().position(|p| p == name).and_then(|i| u8::try_from(i).ok()).map(Expr::Param)
    }

    fn call(&mut self, name: &str, args: &[&str]) -> EncodeResult<Expr> {
        if let Some(kind) = Aggregate::from_name(name) {
            return self.aggregate(kind, args);
        }
        match name {
            "print" => {
                if args.len() != 1 {
                    self.warn(format!("print expects 1 argument, got {}", args.len()));
                }
                let value = match args.first() {
                    Some(a) => self.expr(a)?,
                    None => Expr::Int(0),
                };
                Ok(Expr::Print(Box::new(value)))
            }
            "printf" => self.printf(args),
            _ => {
                let func = if name == "main" {
                    FUNC_MAIN
                } else if let Some(id) = self.funcs.get(name) {
                    id
                } else {
                    let id = self.funcs.register(name)?;
                    self.warn(format!("call to undeclared function `{name}`; assigned id {id}"));
                    id
                };
                let args = self.args(name, args)?;
                Ok(Expr::Call { func, args })
            }
        }
    }

    fn args(&mut self, callee: &str, args: &[&str]) -> EncodeResult<Vec<Expr>> {
        if args.len() > usize::from(u8::MAX) {
            return Err(EncodeError::TooManyArgs { callee: callee.to_owned(), count: args.len() });
        }
        args.iter().map(|a| self.expr(a)).collect()
    }

    fn aggregate(&mut self, kind: Aggregate, args: &[&str]) -> EncodeResult<Expr> {
        if args.len() > 1 {
            self.warn(format!("{} takes a single range; extra arguments ignored", kind.name()));
        }
        let Some(arg) = args.first() else {
            self.warn(format!("{}() without a range; using 1..=parameter 0", kind.name()));
            return Ok(Expr::aggregate(kind, Expr::Int(1), Expr::Param(0)));
        };
        Ok(match scan::split_range(arg) {
            Some((start, end, inclusive)) => {
                let start = self.expr(start)?;
                let end = self.expr(end)?;
                let end = if inclusive { end } else { Expr::binary(BinOp::Sub, end, Expr::Int(1)) };
                Expr::aggregate(kind, start, end)
            }
            None => {
                let end = self.expr(arg)?;
                Expr::aggregate(kind, Expr::Int(1), end)
            }
        })
    }

    fn printf(&mut self, args: &[&str]) -> EncodeResult<Expr> {
        let Some((fmt, rest)) = args.split_first() else {
            self.warn("printf without a format; using \"%s\\n\"");
            return Ok(Expr::Printf { format: Format::StrNl, args: Vec::new() });
        };
        let format = match scan::string_literal(fmt).map(|s| (s, Format::parse(s))) {
            Some((_, Some(f))) => f,
            Some((s, None)) => {
                self.warn(format!("unsupported printf format \"{s}\"; using \"%s\\n\""));
                Format::StrNl
            }
            None => {
                self.warn(format!("printf format `{fmt}` is not a string literal; using \"%s\\n\""));
                Format::StrNl
            }
        };
        let args = self.args("printf", rest)?;
        Ok(Expr::Printf { format, args })
    }
}
