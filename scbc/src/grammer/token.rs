use super::ast::{
    AddressOf, ArrayAccess, ArrayInit, BinOpAssign, Branch, BssDef, Call, CallAssign, Cmp,
    DataDef, Deref, ElemAssign, EnumDef, FuncDef, Operand, Ret, StrDecl, StructDef, StructInit,
    VarDecl,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Pos) -> Self {
        Token { kind, pos }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Definitions
    DataDef(DataDef),     // "datadef"
    BssDef(BssDef),       // "bssdef"
    Extern(String),       // "extern"
    UseRuntime,           // "use runtime;"
    StructDef(StructDef), // "structdef" block
    EnumDef(EnumDef),     // "enumdef" block
    FuncDef(FuncDef),     // "funcdef"

    // Control
    Call(Call),     // "call"
    Ret(Ret),       // "ret"
    Cmp(Cmp),       // "cmp"
    Jump(Branch),   // "jmp" | "je" | ...
    Label(String),  // ".name:"
    Push(Operand),  // "push"
    Pop(String),    // "pop"

    // "$" statements
    VarDecl(VarDecl),
    StrDecl(StrDecl),
    StructInit(StructInit),
    ArrayInit(ArrayInit),
    ArrayAccess(ArrayAccess),
    AddressOf(AddressOf),
    Deref(Deref),
    BinOp(BinOpAssign),
    CallAssign(CallAssign),
    ElemAssign(ElemAssign),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub row: usize,
}
