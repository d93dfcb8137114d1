//! XML diagnostic dump
//!
//! Renders a finalized program tree as depth-indented tagged markup,
//! one tag pair per node kind, with operators and types as quoted
//! attributes. Pass-through grammar levels (an `Expr` with no operator
//! tail, and so on down to the factor) are collapsed, so only nodes
//! that carry information appear in the dump. Read-only over the AST.

use crate::frontend::ast::*;

pub struct XmlWriter {
    buf: String,
    depth: usize,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            depth: 0,
        }
    }

    /// Render a whole program and return the document.
    pub fn render(mut self, program: &Program) -> String {
        self.open("Program");
        for stmt in &program.stmts {
            self.write_stmt(stmt);
        }
        self.close("Program");
        self.buf
    }

    // ==================== Line plumbing ====================

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buf.push_str("  ");
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn open(&mut self, tag: &str) {
        self.line(&format!("<{}>", tag));
        self.depth += 1;
    }

    fn open_with(&mut self, tag: &str, attr: &str, value: &str) {
        self.line(&format!("<{} {}=\"{}\">", tag, attr, value));
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth -= 1;
        self.line(&format!("</{}>", tag));
    }

    fn leaf(&mut self, tag: &str, text: &str) {
        self.line(&format!("<{}>{}</{}>", tag, text, tag));
    }

    // ==================== Nodes ====================

    fn write_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => self.write_block(block),
            Stmt::Assign(assign) => self.write_assign(assign),
            Stmt::VarDecl(decl) => self.write_var_decl(decl),
            Stmt::Print(expr) => {
                self.open("Print");
                self.write_expr(expr);
                self.close("Print");
            }
            Stmt::Return(expr) => {
                self.open("Return");
                self.write_expr(expr);
                self.close("Return");
            }
            Stmt::If {
                cond,
                then_block,
                else_block,
            } => {
                self.open("If");
                self.write_expr(cond);
                self.write_block(then_block);
                if let Some(block) = else_block {
                    self.open("Else");
                    self.write_block(block);
                    self.close("Else");
                }
                self.close("If");
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                self.open("For");
                if let Some(decl) = init {
                    self.write_var_decl(decl);
                }
                self.write_expr(cond);
                if let Some(assign) = step {
                    self.write_assign(assign);
                }
                self.write_block(body);
                self.close("For");
            }
            Stmt::While { cond, body } => {
                self.open("While");
                self.write_expr(cond);
                self.write_block(body);
                self.close("While");
            }
            Stmt::FuncDecl(func) => {
                self.open_with("FuncDecl", "type", &func.ret.to_string());
                self.leaf("Id", &func.id);
                for param in &func.params {
                    self.line(&format!(
                        "<Param type=\"{}\">{}</Param>",
                        param.ty, param.id
                    ));
                }
                self.write_block(&func.body);
                self.close("FuncDecl");
            }
        }
    }

    fn write_block(&mut self, block: &Block) {
        self.open("Block");
        for stmt in &block.stmts {
            self.write_stmt(stmt);
        }
        self.close("Block");
    }

    fn write_var_decl(&mut self, decl: &VarDecl) {
        self.open_with("VarDecl", "type", &decl.ty.to_string());
        self.leaf("Id", &decl.id);
        self.write_expr(&decl.init);
        self.close("VarDecl");
    }

    fn write_assign(&mut self, assign: &Assign) {
        self.open("Assign");
        self.leaf("Id", &assign.id);
        self.write_expr(&assign.expr);
        self.close("Assign");
    }

    fn write_expr(&mut self, expr: &Expr) {
        match &expr.rest {
            Some((op, rest)) => {
                self.open_with("BinOp", "op", &op.to_string());
                self.write_simple_expr(&expr.left);
                self.write_expr(rest);
                self.close("BinOp");
            }
            None => self.write_simple_expr(&expr.left),
        }
    }

    fn write_simple_expr(&mut self, simple: &SimpleExpr) {
        match &simple.rest {
            Some((op, rest)) => {
                self.open_with("BinOp", "op", &op.to_string());
                self.write_term(&simple.left);
                self.write_simple_expr(rest);
                self.close("BinOp");
            }
            None => self.write_term(&simple.left),
        }
    }

    fn write_term(&mut self, term: &Term) {
        match &term.rest {
            Some((op, rest)) => {
                self.open_with("BinOp", "op", &op.to_string());
                self.write_factor(&term.left);
                self.write_term(rest);
                self.close("BinOp");
            }
            None => self.write_factor(&term.left),
        }
    }

    fn write_factor(&mut self, factor: &Factor) {
        match factor {
            Factor::Id(id) => self.leaf("Id", id),
            Factor::Call { id, args } => {
                self.open("Call");
                self.leaf("Id", id);
                for arg in args {
                    self.write_expr(arg);
                }
                self.close("Call");
            }
            Factor::Sub(expr) => {
                self.open("SubExpr");
                self.write_expr(expr);
                self.close("SubExpr");
            }
            Factor::Unary { op, expr } => {
                self.open_with("UnaryOp", "op", &op.to_string());
                self.write_expr(expr);
                self.close("UnaryOp");
            }
            Factor::Lit(lit) => match lit {
                Literal::Bool(b) => self.leaf("Bool", &b.to_string()),
                Literal::Int(i) => self.leaf("Int", &i.to_string()),
                Literal::Float(x) => self.leaf("Float", &x.to_string()),
                Literal::Char(c) => self.leaf("Char", &c.to_string()),
            },
        }
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;
    use pretty_assertions::assert_eq;

    fn render(source: &str) -> String {
        let program = Parser::new(Lexer::new(source)).parse_program().unwrap();
        XmlWriter::new().render(&program)
    }

    #[test]
    fn test_var_decl_with_binop() {
        assert_eq!(
            render("let x : int = 1 + 2;"),
            "<Program>\n\
             \x20 <VarDecl type=\"int\">\n\
             \x20   <Id>x</Id>\n\
             \x20   <BinOp op=\"+\">\n\
             \x20     <Int>1</Int>\n\
             \x20     <Int>2</Int>\n\
             \x20   </BinOp>\n\
             \x20 </VarDecl>\n\
             </Program>\n"
        );
    }

    #[test]
    fn test_func_decl_and_call() {
        assert_eq!(
            render("ff neg(a: int) : int { return -a; } print neg(1);"),
            "<Program>\n\
             \x20 <FuncDecl type=\"int\">\n\
             \x20   <Id>neg</Id>\n\
             \x20   <Param type=\"int\">a</Param>\n\
             \x20   <Block>\n\
             \x20     <Return>\n\
             \x20       <UnaryOp op=\"-\">\n\
             \x20         <Id>a</Id>\n\
             \x20       </UnaryOp>\n\
             \x20     </Return>\n\
             \x20   </Block>\n\
             \x20 </FuncDecl>\n\
             \x20 <Print>\n\
             \x20   <Call>\n\
             \x20     <Id>neg</Id>\n\
             \x20     <Int>1</Int>\n\
             \x20   </Call>\n\
             \x20 </Print>\n\
             </Program>\n"
        );
    }

    #[test]
    fn test_if_else_shape() {
        let doc = render("if (true) { print 1; } else { print 2; }");
        assert!(doc.contains("<If>\n"));
        assert!(doc.contains("  <Else>\n"));
        assert!(doc.contains("<Bool>true</Bool>"));
    }
}
