use super::ast::{Ast, Node};
use super::token::{Token, TokenKind};

pub struct Parser<I: Iterator<Item = Token>> {
    tokens: I,
}

impl<I: Iterator<Item = Token>> Parser<I> {
    pub fn new(tokens: I) -> Self {
        Parser { tokens }
    }

    /// One node per token, in source order.
    pub fn parse(self) -> Ast {
        Ast(self
            .tokens
            .map(|token| (token.pos.row, Node::from(token.kind)))
            .collect())
    }
}

impl From<TokenKind> for Node {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::DataDef(def) => Node::DataDef(def),
            TokenKind::BssDef(def) => Node::BssDef(def),
            TokenKind::Extern(name) => Node::Extern(name),
            TokenKind::UseRuntime => Node::UseRuntime,
            TokenKind::StructDef(def) => Node::StructDef(def),
            TokenKind::EnumDef(def) => Node::EnumDef(def),
            TokenKind::FuncDef(def) => Node::FuncDef(def),
            TokenKind::Call(call) => Node::Call(call),
            TokenKind::Ret(ret) => Node::Ret(ret),
            TokenKind::Cmp(cmp) => Node::Cmp(cmp),
            TokenKind::Jump(branch) => Node::Jump(branch),
            TokenKind::Label(name) => Node::Label(name),
            TokenKind::Push(value) => Node::Push(value),
            TokenKind::Pop(name) => Node::Pop(name),
            TokenKind::VarDecl(decl) => Node::VarDecl(decl),
            TokenKind::StrDecl(decl) => Node::StrDecl(decl),
            TokenKind::StructInit(init) => Node::StructInit(init),
            TokenKind::ArrayInit(init) => Node::ArrayInit(init),
            TokenKind::ArrayAccess(access) => Node::ArrayAccess(access),
            TokenKind::AddressOf(addr) => Node::AddressOf(addr),
            TokenKind::Deref(deref) => Node::Deref(deref),
            TokenKind::BinOp(binop) => Node::BinOp(binop),
            TokenKind::CallAssign(assign) => Node::CallAssign(assign),
            TokenKind::ElemAssign(assign) => Node::ElemAssign(assign),
        }
    }
}
