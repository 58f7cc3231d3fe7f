//! `Program` → texte source lisible.
//!
//! ```text
//! f0(n) = product(1..=n)
//!
//! fn main() {
//!   for i := 1..=12 {
//!     print(f0(i))
//!   }
//! }
//! ```
//!
//! Parenthèses minimales : un opérande gauche en prend si sa précédence est
//! plus faible que celle du parent, un opérande droit si elle est plus faible
//! ou égale (les opérateurs sont associatifs à gauche), et un ternaire en
//! prend toujours lorsqu'il est imbriqué.

use core::fmt::Write;

use esbc_ast::{Body, Else, Expr, Function, IfChain, Program, Stmt};

use crate::names;

const INDENT: &str = "  ";

/// Rend un programme ; le texte se termine par exactement un `\n`.
pub fn program(p: &Program) -> String {
    let text = p.functions.iter().map(function).collect::<Vec<_>>().join("\n\n");
    format!("{}\n", text.trim_end())
}

/// Rend une fonction (sans `\n` final).
pub fn function(f: &Function) -> String {
    let name = names::function(f.id);
    let params = (0..f.params).map(names::param).collect::<Vec<_>>().join(", ");
    match &f.body {
        Body::Expr(e) => format!("{name}({params}) = {}", expr(e, 0)),
        Body::Block(stmts) => {
            let mut r = Renderer::default();
            if f.is_main() {
                r.line(0, "fn main() {");
            } else {
                r.line(0, &format!("fn {name}({params}) {{"));
            }
            r.stmts(stmts, 1, 0);
            r.out.push('}');
            r.out
        }
    }
}

#[derive(Default)]
struct Renderer {
    out: String,
}

impl Renderer {
    fn line(&mut self, indent: usize, text: &str) {
        for _ in 0..indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// `depth` : nombre de boucles `for` englobantes.
    fn stmts(&mut self, stmts: &[Stmt], indent: usize, depth: usize) {
        for s in stmts {
            self.stmt(s, indent, depth);
        }
    }

    fn stmt(&mut self, s: &Stmt, indent: usize, depth: usize) {
        match s {
            Stmt::For { start, end, body } => {
                let v = names::loop_var(depth);
                self.line(indent, &format!("for {v} := {}..={} {{", expr(start, depth), expr(end, depth)));
                self.stmts(body, indent + 1, depth + 1);
                self.line(indent, "}");
            }
            Stmt::While { cond, body } => {
                self.line(indent, &format!("while {} {{", expr(cond, depth)));
                self.stmts(body, indent + 1, depth);
                self.line(indent, "}");
            }
            Stmt::If(chain) => self.if_chain(chain, indent, depth),
            Stmt::Return(e) => self.line(indent, &format!("return {}", expr(e, depth))),
            Stmt::Break => self.line(indent, "break"),
            Stmt::Continue => self.line(indent, "continue"),
            Stmt::Declare { slot, value } => self.line(indent, &format!("{} := {}", names::local(*slot), expr(value, depth))),
            Stmt::Assign { slot, value } => self.line(indent, &format!("{} = {}", names::local(*slot), expr(value, depth))),
            Stmt::AddAssign { slot, value } => {
                self.line(indent, &format!("{} += {}", names::local(*slot), expr(value, depth)));
            }
            Stmt::Expr(e) => self.line(indent, &expr(e, depth)),
        }
    }

    fn if_chain(&mut self, chain: &IfChain, indent: usize, depth: usize) {
        let mut cur = chain;
        let mut head = "if";
        loop {
            let prefix = if head == "if" { String::new() } else { "} ".to_owned() };
            self.line(indent, &format!("{prefix}{head} {} {{", expr(&cur.cond, depth)));
            self.stmts(&cur.then, indent + 1, depth);
            match &cur.otherwise {
                Else::None => break,
                Else::Chain(next) => {
                    head = "el if";
                    cur = next;
                }
                Else::Block(stmts) => {
                    self.line(indent, "} el {");
                    self.stmts(stmts, indent + 1, depth);
                    break;
                }
            }
        }
        self.line(indent, "}");
    }
}

/// Rend une expression ; `depth` = nombre de boucles englobantes.
pub fn expr(e: &Expr, depth: usize) -> String {
    match e {
        Expr::Int(v) => v.to_string(),
        Expr::Str(s) => format!("\"{s}\""),
        Expr::Param(i) => names::param(*i).into_owned(),
        Expr::Local(i) => names::local(*i).into_owned(),
        Expr::LoopVar { up } => names::loop_var(depth.saturating_sub(usize::from(*up) + 1)).into_owned(),
        Expr::Binary { op, lhs, rhs } => {
            let p = op.precedence();
            let l = operand(lhs, depth, |cp| cp < p);
            let r = operand(rhs, depth, |cp| cp <= p);
            format!("{l} {} {r}", op.symbol())
        }
        Expr::Ternary { cond, then, otherwise } => {
            let nested = |x: &Expr| operand(x, depth, |cp| cp == 0);
            format!("{} ? {} : {}", nested(cond), nested(then), nested(otherwise))
        }
        Expr::Call { func, args } => format!("{}({})", names::function(*func), list(args, depth)),
        Expr::Aggregate { kind, start, end } => {
            format!("{}({}..={})", kind.name(), expr(start, depth), expr(end, depth))
        }
        Expr::Print(v) => format!("print({})", expr(v, depth)),
        Expr::Printf { format, args } => {
            let mut s = format!("printf(\"{}\"", format.literal());
            for a in args {
                let _ = write!(s, ", {}", expr(a, depth));
            }
            s.push(')');
            s
        }
    }
}

fn operand(e: &Expr, depth: usize, wrap: impl Fn(u8) -> bool) -> String {
    let text = expr(e, depth);
    match e.precedence() {
        Some(cp) if wrap(cp) => format!("({text})"),
        _ => text,
    }
}

fn list(args: &[Expr], depth: usize) -> String { args.iter().map(|a| expr(a, depth)).collect::<Vec<_>>().join(", ") }
