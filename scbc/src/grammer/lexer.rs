use super::ast::{
    AddressOf, ArrayAccess, ArrayInit, BinOp, BinOpAssign, Branch, BssDef, Call, CallAssign, Cmp,
    DataDef, Deref, ElemAssign, EnumDef, Field, FuncDef, Operand, Ret, StrDecl, StructDef,
    StructInit, Type, VarDecl,
};
use super::token::{Pos, Token, TokenKind};
use crate::error::Error;
use arch::Jump;

pub struct Lexer<'a> {
    code: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(code: &'a str) -> Self {
        Self { code }
    }

    /// Tokenize the whole source, stopping at the first malformed line.
    pub fn parse(self) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();
        let mut lines = self.code.lines().enumerate();
        while let Some((row, raw)) = lines.next() {
            let line = strip_comment(raw).trim();
            if line.is_empty() || line == "}" {
                continue;
            }

            // structdef / enumdef run until the closing brace
            let kind = match block_keyword(line) {
                Some(keyword) if !line.contains('}') => {
                    let mut block = line.to_string();
                    while !block.contains('}') {
                        match lines.next() {
                            Some((_, next)) => {
                                block.push(' ');
                                block.push_str(strip_comment(next).trim());
                            }
                            None => return Err(Error::Unterminated(keyword, row)),
                        }
                    }
                    LineLexer::new(&block, row).parse()?
                }
                _ => LineLexer::new(line, row).parse()?,
            };
            tokens.push(Token::new(kind, Pos { row }));
        }
        Ok(tokens)
    }
}

fn block_keyword(line: &str) -> Option<&'static str> {
    let word = line.split_whitespace().next()?;
    match word {
        "structdef" => Some("structdef"),
        "enumdef" => Some("enumdef"),
        _ => None,
    }
}

/// Cut a trailing `//` comment that is not inside a string literal.
fn strip_comment(line: &str) -> &str {
    let mut in_text = false;
    let mut escape = false;
    let mut prev = None;
    for (idx, ch) in line.char_indices() {
        if in_text {
            match (escape, ch) {
                (true, _) => escape = false,
                (false, '\\') => escape = true,
                (false, '"') => in_text = false,
                _ => {}
            }
        } else if ch == '"' {
            in_text = true;
        } else if ch == '/' && prev == Some('/') {
            return &line[..idx - 1];
        }
        prev = Some(ch);
    }
    line
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

// ----------------------------------------------------------------------------
// Line lexer

pub struct LineLexer<'a> {
    src: &'a str,
    pos: usize,
    row: usize,
    construct: &'static str,
}

impl<'a> LineLexer<'a> {
    pub fn new(src: &'a str, row: usize) -> Self {
        Self {
            src,
            pos: 0,
            row,
            construct: "statement",
        }
    }

    pub fn parse(mut self) -> Result<TokenKind, Error> {
        match self.statement() {
            Some(kind) => Ok(kind),
            None => Err(Error::Syntax {
                construct: self.construct,
                row: self.row,
                line: self.src.to_string(),
            }),
        }
    }
}

// ----------------------------------------------------------------------------
// Helpers

impl<'a> LineLexer<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.rest().chars().next()
    }

    /// Consume `s` if the remaining input starts with it
    fn eat(&mut self, s: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consume the keyword `w` only when it is a whole word
    fn eat_word(&mut self, w: &str) -> bool {
        self.skip_ws();
        let rest = self.rest();
        if !rest.starts_with(w) {
            return false;
        }
        if rest[w.len()..].chars().next().map_or(true, |ch| !is_ident_char(ch)) {
            self.pos += w.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, s: &str) -> Option<()> {
        self.eat(s).then_some(())
    }

    /// Statement terminator followed by nothing
    fn end(&mut self) -> Option<()> {
        self.expect(";")?;
        self.finish()
    }

    fn finish(&mut self) -> Option<()> {
        self.skip_ws();
        self.rest().is_empty().then_some(())
    }

    fn ident(&mut self) -> Option<String> {
        self.skip_ws();
        let rest = self.rest();
        match rest.chars().next() {
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {}
            _ => return None,
        }
        let len = rest.find(|ch: char| !is_ident_char(ch)).unwrap_or(rest.len());
        self.pos += len;
        Some(rest[..len].to_string())
    }

    fn peek_ident(&mut self) -> Option<String> {
        let save = self.pos;
        let ident = self.ident();
        self.pos = save;
        ident
    }

    // Number: 123, -45, 0x1f, 1_000
    fn number(&mut self) -> Option<i64> {
        self.skip_ws();
        let rest = self.rest();
        let sign = usize::from(rest.starts_with('-'));
        let body = &rest[sign..];
        let (radix, prefix) = if body.starts_with("0x") || body.starts_with("0X") {
            (16, 2)
        } else {
            (10, 0)
        };
        let digits = &body[prefix..];
        let len = digits
            .find(|ch: char| !(ch.is_digit(radix) || ch == '_'))
            .unwrap_or(digits.len());
        if len == 0 || digits[len..].starts_with(is_ident_char) {
            return None;
        }
        let value = i64::from_str_radix(&digits[..len].replace('_', ""), radix).ok()?;
        self.pos += sign + prefix + len;
        Some(if sign == 1 { -value } else { value })
    }

    fn index(&mut self) -> Option<usize> {
        usize::try_from(self.number()?).ok()
    }

    // Text: "hoge\nfuga" (escapes are kept verbatim)
    fn text(&mut self) -> Option<String> {
        self.skip_ws();
        let rest = self.rest();
        if !rest.starts_with('"') {
            return None;
        }
        let mut escape = false;
        for (idx, ch) in rest.char_indices().skip(1) {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' => escape = true,
                '"' => {
                    self.pos += idx + 1;
                    return Some(rest[1..idx].to_string());
                }
                _ => {}
            }
        }
        None
    }

    /// type = ( "int" | "bytes" | "void" | ident | "*" type ) { "[" num "]" }
    fn ty(&mut self) -> Option<Type> {
        let mut ty = if self.eat("*") {
            Type::Ptr(Box::new(self.ty()?))
        } else {
            match self.ident()?.as_str() {
                "int" => Type::Int,
                "bytes" => Type::Bytes,
                "void" => Type::Void,
                name => Type::Named(name.to_string()),
            }
        };
        while self.eat("[") {
            let len = self.index()?;
            self.expect("]")?;
            ty = Type::Array(Box::new(ty), len);
        }
        Some(ty)
    }

    fn operand(&mut self) -> Option<Operand> {
        match self.peek()? {
            '"' => Some(Operand::Str(self.text()?)),
            '&' => {
                self.expect("&")?;
                self.eat("$");
                Some(Operand::AddrOf(self.ident()?))
            }
            '$' => {
                self.expect("$")?;
                let name = self.ident()?;
                if self.eat("->") {
                    let mut chain = vec![self.ident()?];
                    while self.eat("->") {
                        chain.push(self.ident()?);
                    }
                    Some(Operand::Field(name, chain))
                } else if self.eat("[") {
                    let index = self.index()?;
                    self.expect("]")?;
                    Some(Operand::Index(name, index))
                } else if self.eat("<") {
                    let index = if self.eat(">") {
                        None
                    } else {
                        let index = self.index()?;
                        self.expect(">")?;
                        Some(index)
                    };
                    Some(Operand::Deref(name, index))
                } else {
                    Some(Operand::Var(name))
                }
            }
            '-' | '0'..='9' => Some(Operand::Int(self.number()?)),
            _ => {
                let name = self.ident()?;
                if self.eat("::") {
                    Some(Operand::Enum(name, self.ident()?))
                } else {
                    Some(Operand::Global(name))
                }
            }
        }
    }

    /// "%" ident "(" [ arg { "," arg } ] ")"  where arg = operand [ ":" type ]
    fn call(&mut self) -> Option<Call> {
        self.expect("%")?;
        let func = self.ident()?;
        self.expect("(")?;
        let mut args = Vec::new();
        if !self.eat(")") {
            loop {
                args.push(self.operand()?);
                if self.eat(":") {
                    self.ty()?;
                }
                if self.eat(")") {
                    break;
                }
                self.expect(",")?;
            }
        }
        Some(Call { func, args })
    }
}

// ----------------------------------------------------------------------------
// Statements

impl<'a> LineLexer<'a> {
    fn statement(&mut self) -> Option<TokenKind> {
        match self.peek()? {
            '.' => {
                self.construct = "label";
                self.label()
            }
            '$' => {
                self.construct = "declaration";
                self.dollar()
            }
            _ => {
                let word = self.ident()?;
                match word.as_str() {
                    "datadef" => {
                        self.construct = "datadef";
                        self.datadef()
                    }
                    "bssdef" => {
                        self.construct = "bssdef";
                        self.bssdef()
                    }
                    "extern" => {
                        self.construct = "extern";
                        self.expect("%")?;
                        let name = self.ident()?;
                        self.end()?;
                        Some(TokenKind::Extern(name))
                    }
                    "use" => {
                        self.construct = "use directive";
                        (self.eat_word("runtime") && self.end().is_some())
                            .then_some(TokenKind::UseRuntime)
                    }
                    "structdef" => {
                        self.construct = "structdef";
                        self.structdef()
                    }
                    "enumdef" => {
                        self.construct = "enumdef";
                        self.enumdef()
                    }
                    "funcdef" => {
                        self.construct = "funcdef";
                        self.funcdef()
                    }
                    "call" => {
                        self.construct = "call";
                        let call = self.call()?;
                        self.end()?;
                        Some(TokenKind::Call(call))
                    }
                    "ret" => {
                        self.construct = "return";
                        self.ret()
                    }
                    "cmp" => {
                        self.construct = "cmp";
                        let lhs = self.operand()?;
                        self.expect(",")?;
                        let rhs = self.operand()?;
                        self.end()?;
                        Some(TokenKind::Cmp(Cmp { lhs, rhs }))
                    }
                    "push" => {
                        self.construct = "push";
                        let value = self.operand()?;
                        self.end()?;
                        Some(TokenKind::Push(value))
                    }
                    "pop" => {
                        self.construct = "pop";
                        self.expect("$")?;
                        let name = self.ident()?;
                        self.end()?;
                        Some(TokenKind::Pop(name))
                    }
                    word => {
                        let jump = word.parse::<Jump>().ok()?;
                        self.construct = "jump";
                        self.expect(".")?;
                        let label = self.ident()?;
                        self.end()?;
                        Some(TokenKind::Jump(Branch { jump, label }))
                    }
                }
            }
        }
    }

    // .name:
    fn label(&mut self) -> Option<TokenKind> {
        self.expect(".")?;
        let name = self.ident()?;
        self.expect(":")?;
        self.finish()?;
        Some(TokenKind::Label(name))
    }

    // datadef name: bytes = "value";
    fn datadef(&mut self) -> Option<TokenKind> {
        let name = self.ident()?;
        self.expect(":")?;
        self.eat_word("bytes").then_some(())?;
        self.expect("=")?;
        let value = self.text()?;
        self.end()?;
        Some(TokenKind::DataDef(DataDef { name, value }))
    }

    // bssdef name: size;
    fn bssdef(&mut self) -> Option<TokenKind> {
        let name = self.ident()?;
        self.expect(":")?;
        let size = self.index()?;
        self.end()?;
        Some(TokenKind::BssDef(BssDef { name, size }))
    }

    // structdef Name { field: type; ... }
    fn structdef(&mut self) -> Option<TokenKind> {
        let name = self.ident()?;
        self.expect("{")?;
        let mut fields = Vec::new();
        while !self.eat("}") {
            let field = self.ident()?;
            self.expect(":")?;
            let ty = self.ty()?;
            fields.push(Field { name: field, ty });
            if !(self.eat(";") || self.eat(",")) {
                self.expect("}")?;
                break;
            }
        }
        self.eat(";");
        self.finish()?;
        Some(TokenKind::StructDef(StructDef { name, fields }))
    }

    // enumdef Name { A, B, C }
    fn enumdef(&mut self) -> Option<TokenKind> {
        let name = self.ident()?;
        self.expect("{")?;
        let mut variants = Vec::new();
        while !self.eat("}") {
            variants.push(self.ident()?);
            if !(self.eat(",") || self.eat(";")) {
                self.expect("}")?;
                break;
            }
        }
        self.eat(";");
        self.finish()?;
        Some(TokenKind::EnumDef(EnumDef { name, variants }))
    }

    // funcdef %name(a: int, b: bytes) -> int {
    fn funcdef(&mut self) -> Option<TokenKind> {
        self.expect("%")?;
        let name = self.ident()?;
        self.expect("(")?;
        let mut params = Vec::new();
        if !self.eat(")") {
            loop {
                self.eat("$");
                let param = self.ident()?;
                self.expect(":")?;
                let ty = self.ty()?;
                params.push(Field { name: param, ty });
                if self.eat(")") {
                    break;
                }
                self.expect(",")?;
            }
        }
        self.expect("->")?;
        let ret = self.ty()?;
        self.expect("{")?;
        self.finish()?;
        Some(TokenKind::FuncDef(FuncDef { name, params, ret }))
    }

    // ret void; | ret type value;
    fn ret(&mut self) -> Option<TokenKind> {
        if self.eat_word("void") {
            self.end()?;
            return Some(TokenKind::Ret(Ret {
                ty: Type::Void,
                value: None,
            }));
        }
        let ty = self.ty()?;
        let value = self.operand()?;
        self.end()?;
        Some(TokenKind::Ret(Ret {
            ty,
            value: Some(value),
        }))
    }

    // $name ...
    fn dollar(&mut self) -> Option<TokenKind> {
        self.expect("$")?;
        let name = self.ident()?;

        // $array[index] = value;
        if self.eat("[") {
            self.construct = "array element assignment";
            let index = self.index()?;
            self.expect("]")?;
            self.expect("=")?;
            let value = self.operand()?;
            self.end()?;
            return Some(TokenKind::ElemAssign(ElemAssign {
                array: name,
                index,
                value,
            }));
        }

        let ty = if self.eat(":") { Some(self.ty()?) } else { None };
        self.expect("=")?;

        // Forms where the slot may already exist
        if self.eat_word("call") {
            self.construct = "function call assignment";
            let call = self.call()?;
            self.end()?;
            return Some(TokenKind::CallAssign(CallAssign {
                dst: name,
                ty,
                call,
            }));
        }
        if let Some(op) = self.peek_ident().and_then(|w| w.parse::<BinOp>().ok()) {
            self.construct = "binary operation";
            self.ident()?;
            let lhs = self.operand()?;
            self.expect(",")?;
            let rhs = self.operand()?;
            self.end()?;
            return Some(TokenKind::BinOp(BinOpAssign {
                op,
                dst: name,
                ty,
                lhs,
                rhs,
            }));
        }

        // Everything else is a typed declaration
        let ty = ty?;
        if self.eat_word("array") {
            self.construct = "array literal";
            let Type::Array(elem, len) = ty else {
                return None;
            };
            let mut values = vec![self.operand()?];
            while self.eat(",") {
                values.push(self.operand()?);
            }
            self.end()?;
            return Some(TokenKind::ArrayInit(ArrayInit {
                name,
                elem: *elem,
                len,
                values,
            }));
        }

        match self.peek()? {
            '"' => {
                self.construct = "string declaration";
                if ty != Type::Bytes {
                    return None;
                }
                let value = self.text()?;
                self.end()?;
                Some(TokenKind::StrDecl(StrDecl { name, value }))
            }
            '&' => {
                self.construct = "address-of";
                if !matches!(ty, Type::Ptr(_)) {
                    return None;
                }
                let Operand::AddrOf(target) = self.operand()? else {
                    return None;
                };
                self.end()?;
                Some(TokenKind::AddressOf(AddressOf { name, ty, target }))
            }
            _ => {
                if let Some(kind) = self.struct_literal(&name, &ty) {
                    return kind;
                }
                let value = self.operand()?;
                self.end()?;
                Some(match value {
                    Operand::Deref(ptr, index) => TokenKind::Deref(Deref {
                        name,
                        ty,
                        ptr,
                        index,
                    }),
                    Operand::Index(array, index) => TokenKind::ArrayAccess(ArrayAccess {
                        name,
                        ty,
                        array,
                        index,
                    }),
                    value => TokenKind::VarDecl(VarDecl { name, ty, value }),
                })
            }
        }
    }

    /// Name { field: value, ... }
    ///
    /// Returns `None` when the input is not a struct literal at all, leaving the
    /// cursor untouched, and `Some(None)` when it is one but malformed.
    fn struct_literal(&mut self, name: &str, ty: &Type) -> Option<Option<TokenKind>> {
        let save = self.pos;
        let Some(sname) = self.ident() else {
            self.pos = save;
            return None;
        };
        if !self.eat("{") {
            self.pos = save;
            return None;
        }
        self.construct = "struct literal";
        if *ty != Type::Named(sname.clone()) {
            return Some(None);
        }
        let mut fields = Vec::new();
        while !self.eat("}") {
            let Some(field) = self.ident() else {
                return Some(None);
            };
            if !self.eat(":") {
                return Some(None);
            }
            let Some(value) = self.operand() else {
                return Some(None);
            };
            fields.push((field, value));
            if !self.eat(",") {
                if !self.eat("}") {
                    return Some(None);
                }
                break;
            }
        }
        Some(self.end().map(|_| {
            TokenKind::StructInit(StructInit {
                name: name.to_string(),
                ty: sname,
                fields,
            })
        }))
    }
}
