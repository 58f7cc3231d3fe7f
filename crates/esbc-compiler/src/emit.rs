//! `Program` → octets.
//!
//! Les chaînes littérales sont internées dans la table (opcode `SREF`) et la
//! table est placée en tête du flux ; en mode `string_table = false` elles sont
//! écrites en ligne (`STR`).

use esbc_ast::{Body, Else, Expr, Function, IfChain, Program, Stmt};
use esbc_core::{ByteWriter, Bytecode, Op, StringTable, TableError, MAX_STR_LEN};

use crate::{EncodeError, EncodeResult};

/// Backend d'émission.
pub trait Emitter {
    /// Émet un programme complet.
    fn emit(&mut self, program: &Program) -> EncodeResult<Bytecode>;
}

/// Émetteur par défaut : format préfixe esbc.
#[derive(Debug, Default)]
pub struct ByteEmitter {
    inline_strings: bool,
    strings: StringTable,
    code: ByteWriter,
}

impl ByteEmitter {
    /// `inline_strings` : `STR` en ligne au lieu de `SREF` + table.
    pub fn new(inline_strings: bool) -> Self { Self { inline_strings, ..Self::default() } }

    fn function(&mut self, f: &Function) -> EncodeResult<()> {
        match &f.body {
            Body::Expr(e) => {
                self.code.write_op(Op::DefX);
                self.code.write_u8(f.id);
                self.code.write_u8(f.params);
                self.expr(e)?;
            }
            Body::Block(stmts) => {
                self.code.write_op(Op::Def);
                self.code.write_u8(f.id);
                self.code.write_u8(f.params);
                self.stmts(stmts)?;
            }
        }
        self.code.write_op(Op::End);
        Ok(())
    }

    fn stmts(&mut self, stmts: &[Stmt]) -> EncodeResult<()> { stmts.iter().try_for_each(|s| self.stmt(s)) }

    fn stmt(&mut self, s: &Stmt) -> EncodeResult<()> {
        match s {
            Stmt::For { start, end, body } => {
                self.code.write_op(Op::For);
                self.expr(start)?;
                self.expr(end)?;
                self.stmts(body)?;
                self.code.write_op(Op::End);
            }
            Stmt::While { cond, body } => {
                self.code.write_op(Op::While);
                self.expr(cond)?;
                self.stmts(body)?;
                self.code.write_op(Op::End);
            }
            Stmt::If(chain) => self.if_chain(chain)?,
            Stmt::Return(e) => {
                self.code.write_op(Op::Ret);
                self.expr(e)?;
            }
            Stmt::Break => self.code.write_op(Op::Brk),
            Stmt::Continue => self.code.write_op(Op::Cont),
            Stmt::Declare { slot, value } => self.slot_op(Op::Decl, *slot, value)?,
            Stmt::Assign { slot, value } => self.slot_op(Op::Asgn, *slot, value)?,
            Stmt::AddAssign { slot, value } => self.slot_op(Op::AAdd, *slot, value)?,
            Stmt::Expr(e) => self.expr(e)?,
        }
        Ok(())
    }

    fn slot_op(&mut self, op: Op, slot: u8, value: &Expr) -> EncodeResult<()> {
        self.code.write_op_u8(op, slot);
        self.expr(value)
    }

    // IF c B END | IF c B ELSE B2 END | IF c B ELSE IF … END END
    fn if_chain(&mut self, chain: &IfChain) -> EncodeResult<()> {
        self.code.write_op(Op::If);
        self.expr(&chain.cond)?;
        self.stmts(&chain.then)?;
        match &chain.otherwise {
            Else::None => {}
            Else::Chain(next) => {
                self.code.write_op(Op::Else);
                self.if_chain(next)?;
            }
            Else::Block(stmts) => {
                self.code.write_op(Op::Else);
                self.stmts(stmts)?;
            }
        }
        self.code.write_op(Op::End);
        Ok(())
    }

    fn expr(&mut self, e: &Expr) -> EncodeResult<()> {
        match e {
            Expr::Int(v) => match u8::try_from(*v) {
                Ok(b) => self.code.write_op_u8(Op::Int, b),
                Err(_) => {
                    self.code.write_op(Op::Int16);
                    self.code.write_i16_be(*v);
                }
            },
            Expr::Str(s) if self.inline_strings => {
                if s.len() > MAX_STR_LEN {
                    return Err(TableError::TooLong { len: s.len() }.into());
                }
                self.code.write_op(Op::Str);
                self.code.write_str8(s.as_bytes());
            }
            Expr::Str(s) => {
                let id = self.strings.intern(s)?;
                self.code.write_op_u8(Op::SRef, id);
            }
            Expr::Param(i) => self.code.write_op_u8(Op::Param, *i),
            Expr::Local(i) => self.code.write_op_u8(Op::Local, *i),
            Expr::LoopVar { up: 0 } => self.code.write_op(Op::LVar),
            Expr::LoopVar { up } => self.code.write_op_u8(Op::LVarUp, *up),
            Expr::Binary { op, lhs, rhs } => {
                self.code.write_op(op.op());
                self.expr(lhs)?;
                self.expr(rhs)?;
            }
            Expr::Ternary { cond, then, otherwise } => {
                self.code.write_op(Op::Tern);
                self.expr(cond)?;
                self.expr(then)?;
                self.expr(otherwise)?;
            }
            Expr::Call { func, args } => {
                self.code.write_op(Op::Call);
                self.code.write_u8(*func);
                self.args(&format!("f{func}"), args)?;
            }
            Expr::Aggregate { kind, start, end } => {
                self.code.write_op(kind.op());
                self.expr(start)?;
                self.expr(end)?;
            }
            Expr::Print(v) => {
                self.code.write_op(Op::Print);
                self.expr(v)?;
            }
            Expr::Printf { format, args } => {
                self.code.write_op(Op::Printf);
                self.code.write_u8(format.id());
                self.args("printf", args)?;
            }
        }
        Ok(())
    }

    fn args(&mut self, callee: &str, args: &[Expr]) -> EncodeResult<()> {
        let argc = u8::try_from(args.len())
            .map_err(|_| EncodeError::TooManyArgs { callee: callee.to_owned(), count: args.len() })?;
        self.code.write_u8(argc);
        args.iter().try_for_each(|a| self.expr(a))
    }
}

impl Emitter for ByteEmitter {
    fn emit(&mut self, program: &Program) -> EncodeResult<Bytecode> {
        self.strings = StringTable::new();
        self.code = ByteWriter::new();
        for f in &program.functions {
            self.function(f)?;
        }
        let mut out = ByteWriter::new();
        self.strings.write_header(&mut out);
        out.append(&self.code);
        Ok(Bytecode::new(out.into_vec()))
    }
}
