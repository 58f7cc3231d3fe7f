//! Octets → `Program`, en lecture stricte : tout écart de structure est une
//! erreur datée à l'octet près. L'imbrication est bornée par
//! [`MAX_NESTING`] : un flux plus profond est refusé avant d'épuiser la pile.

use esbc_ast::{Aggregate, BinOp, Body, Else, Expr, Function, IfChain, Program, Stmt};
use esbc_core::{ByteReader, DecodeError, DecodeResult, Format, Op, StringTable, MAX_NESTING};
use log::trace;

/// Décodeur d'un flux esbc.
pub struct Decoder<'a> {
    r: ByteReader<'a>,
    strings: StringTable,
    loop_depth: usize,
    /// Instructions et expressions en cours de lecture.
    nesting: usize,
}

impl<'a> Decoder<'a> {
    /// Lit l'en-tête de chaînes (s'il est présent) et se place sur la
    /// première fonction.
    pub fn new(bytes: &'a [u8]) -> DecodeResult<Self> {
        let mut r = ByteReader::new(bytes);
        let strings = StringTable::read_header(&mut r)?;
        Ok(Self { r, strings, loop_depth: 0, nesting: 0 })
    }

    /// Table de chaînes lue en tête.
    pub fn strings(&self) -> &StringTable { &self.strings }

    /// Décode toutes les fonctions jusqu'à la fin du flux.
    pub fn program(mut self) -> DecodeResult<Program> {
        let mut program = Program::default();
        while !self.r.is_at_end() {
            program.functions.push(self.function()?);
        }
        Ok(program)
    }

    fn function(&mut self) -> DecodeResult<Function> {
        let at = self.r.offset();
        let op = self.r.read_op()?;
        if !matches!(op, Op::Def | Op::DefX) {
            return Err(unexpected(at, op, "top-level"));
        }
        let id = self.r.read_u8()?;
        let params = self.r.read_u8()?;
        self.loop_depth = 0;
        let body = if op == Op::Def {
            let stmts = self.block()?;
            Body::Block(stmts)
        } else {
            Body::Expr(self.expr()?)
        };
        self.expect_end("function")?;
        trace!("decoded function {id:#04x} ({params} param(s)) at offset {at}");
        Ok(Function { id, params, body })
    }

    fn expect_end(&mut self, context: &'static str) -> DecodeResult<()> {
        let at = self.r.offset();
        match self.r.read_op()? {
            Op::End => Ok(()),
            op => Err(unexpected(at, op, context)),
        }
    }

    /// Instructions jusqu'à `END` ou `ELSE` (non consommés).
    fn block(&mut self) -> DecodeResult<Vec<Stmt>> {
        let mut out = Vec::new();
        loop {
            match self.r.peek_u8() {
                None => return Err(DecodeError::UnexpectedEof { offset: self.r.offset(), needed: 1 }),
                Some(b) if b == Op::End.byte() || b == Op::Else.byte() => return Ok(out),
                Some(_) => out.push(self.stmt()?),
            }
        }
    }

    fn enter(&mut self, at: usize) -> DecodeResult<()> {
        if self.nesting >= MAX_NESTING {
            return Err(DecodeError::TooDeep { offset: at, max: MAX_NESTING });
        }
        self.nesting += 1;
        Ok(())
    }

    fn stmt(&mut self) -> DecodeResult<Stmt> {
        let at = self.r.offset();
        self.enter(at)?;
        let stmt = self.r.read_op().and_then(|op| self.stmt_from(op, at));
        self.nesting -= 1;
        stmt
    }

    fn stmt_from(&mut self, op: Op, at: usize) -> DecodeResult<Stmt> {
        Ok(match op {
            Op::For => {
                let start = self.expr()?;
                let end = self.expr()?;
                self.loop_depth += 1;
                let body = self.block();
                self.loop_depth -= 1;
                let body = body?;
                self.expect_end("for")?;
                Stmt::For { start, end, body }
            }
            Op::While => {
                let cond = self.expr()?;
                let body = self.block()?;
                self.expect_end("while")?;
                Stmt::While { cond, body }
            }
            Op::If => Stmt::If(self.if_chain(at)?),
            Op::Ret => Stmt::Return(self.expr()?),
            Op::Brk => Stmt::Break,
            Op::Cont => Stmt::Continue,
            Op::Decl => Stmt::Declare { slot: self.r.read_u8()?, value: self.expr()? },
            Op::Asgn => Stmt::Assign { slot: self.r.read_u8()?, value: self.expr()? },
            Op::AAdd => Stmt::AddAssign { slot: self.r.read_u8()?, value: self.expr()? },
            Op::StrTab | Op::Def | Op::DefX | Op::End | Op::Else => return Err(unexpected(at, op, "statement")),
            _ => Stmt::Expr(self.expr_from(op, at)?),
        })
    }

    /// Après `IF` : `c B END`, `c B ELSE B2 END` ou `c B ELSE IF … END END`.
    ///
    /// Un `IF` juste après `ELSE` est lu comme une chaîne ; si la chaîne est
    /// suivie d'autre chose que `END`, c'était en fait le début d'un bloc
    /// `el { … }` et la lecture du bloc continue.
    fn if_chain(&mut self, at: usize) -> DecodeResult<IfChain> {
        self.enter(at)?;
        let chain = self.if_chain_body();
        self.nesting -= 1;
        chain
    }

    fn if_chain_body(&mut self) -> DecodeResult<IfChain> {
        let cond = self.expr()?;
        let then = self.block()?;
        let at = self.r.offset();
        let otherwise = match self.r.read_op()? {
            Op::End => return Ok(IfChain { cond, then, otherwise: Else::None }),
            Op::Else if self.r.peek_u8() == Some(Op::If.byte()) => {
                let if_at = self.r.offset();
                self.r.read_u8()?;
                let nested = self.if_chain(if_at)?;
                if self.r.peek_u8() == Some(Op::End.byte()) {
                    Else::Chain(Box::new(nested))
                } else {
                    let mut stmts = vec![Stmt::If(nested)];
                    stmts.extend(self.block()?);
                    Else::Block(stmts)
                }
            }
            Op::Else => Else::Block(self.block()?),
            op => return Err(unexpected(at, op, "if")),
        };
        self.expect_end("if")?;
        Ok(IfChain { cond, then, otherwise })
    }

    fn expr(&mut self) -> DecodeResult<Expr> {
        let at = self.r.offset();
        self.enter(at)?;
        let expr = self.r.read_op().and_then(|op| self.expr_from(op, at));
        self.nesting -= 1;
        expr
    }

    fn exprs(&mut self, n: u8) -> DecodeResult<Vec<Expr>> { (0..n).map(|_| self.expr()).collect() }

    fn expr_from(&mut self, op: Op, at: usize) -> DecodeResult<Expr> {
        if let Some(bin) = BinOp::from_op(op) {
            let lhs = self.expr()?;
            let rhs = self.expr()?;
            return Ok(Expr::binary(bin, lhs, rhs));
        }
        Ok(match op {
            Op::Int => Expr::Int(i16::from(self.r.read_u8()?)),
            Op::Int16 => Expr::Int(self.r.read_i16_be()?),
            Op::Param => Expr::Param(self.r.read_u8()?),
            Op::Local => Expr::Local(self.r.read_u8()?),
            Op::LVar => self.loop_var(at, 0)?,
            Op::LVarUp => {
                let up = self.r.read_u8()?;
                self.loop_var(at, up)?
            }
            Op::SRef => {
                let id = self.r.read_u8()?;
                match self.strings.get(id) {
                    Some(s) => Expr::Str(s.to_owned()),
                    None => return Err(DecodeError::StringOutOfRange { offset: at, id, len: self.strings.len() }),
                }
            }
            Op::Str => Expr::Str(self.r.read_str8()?.to_owned()),
            Op::Call => {
                let func = self.r.read_u8()?;
                let argc = self.r.read_u8()?;
                Expr::Call { func, args: self.exprs(argc)? }
            }
            Op::Prod | Op::Sum => {
                let kind = if op == Op::Prod { Aggregate::Product } else { Aggregate::Sum };
                let start = self.expr()?;
                let end = self.expr()?;
                Expr::aggregate(kind, start, end)
            }
            Op::Tern => {
                let cond = self.expr()?;
                let then = self.expr()?;
                let otherwise = self.expr()?;
                Expr::ternary(cond, then, otherwise)
            }
            Op::Print => Expr::Print(Box::new(self.expr()?)),
            Op::Printf => {
                let fmt_at = self.r.offset();
                let id = self.r.read_u8()?;
                let format = Format::from_id(id).ok_or(DecodeError::UnknownFormat { offset: fmt_at, id })?;
                let argc = self.r.read_u8()?;
                Expr::Printf { format, args: self.exprs(argc)? }
            }
            _ => return Err(unexpected(at, op, "expression")),
        })
    }

    fn loop_var(&self, at: usize, up: u8) -> DecodeResult<Expr> {
        if usize::from(up) < self.loop_depth {
            Ok(Expr::LoopVar { up })
        } else {
            Err(DecodeError::LoopVarOutsideLoop { offset: at, up, depth: self.loop_depth })
        }
    }
}

const fn unexpected(offset: usize, op: Op, context: &'static str) -> DecodeError {
    DecodeError::UnexpectedOpcode { offset, byte: op.byte(), context }
}
