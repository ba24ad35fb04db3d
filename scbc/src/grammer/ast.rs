use arch::Jump;
use std::fmt;
use strum::{Display, EnumString};

#[derive(Debug, Clone, PartialEq)]
pub struct Ast(pub Vec<(usize, Node)>); // (row, node) in source order

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int,                      // "int"
    Bytes,                    // "bytes"
    Void,                     // "void"
    Ptr(Box<Type>),           // "*" type
    Named(String),            // ident (struct or enum)
    Array(Box<Type>, usize),  // type "[" num "]"
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bytes => write!(f, "bytes"),
            Type::Void => write!(f, "void"),
            Type::Ptr(ty) => write!(f, "*{}", ty),
            Type::Named(name) => write!(f, "{}", name),
            Type::Array(ty, len) => write!(f, "{}[{}]", ty, len),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(i64),                    // num
    Str(String),                 // "..."
    Global(String),              // ident
    Var(String),                 // "$" ident
    Enum(String, String),        // ident "::" ident
    Field(String, Vec<String>),  // "$" ident { "->" ident }
    Index(String, usize),        // "$" ident "[" num "]"
    Deref(String, Option<usize>), // "$" ident "<" [ num ] ">"
    AddrOf(String),              // "&" [ "$" ] ident
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

// ----------------------------------------------------------------------------
// Node records

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

/// datadef name: bytes = "value";
#[derive(Debug, Clone, PartialEq)]
pub struct DataDef {
    pub name: String,
    pub value: String,
}

/// bssdef name: size;
#[derive(Debug, Clone, PartialEq)]
pub struct BssDef {
    pub name: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    pub variants: Vec<String>,
}

/// funcdef %name(params) -> ret {
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<Field>,
    pub ret: Type,
}

/// call %func(args);
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub func: String,
    pub args: Vec<Operand>,
}

/// ret void; | ret type value;
#[derive(Debug, Clone, PartialEq)]
pub struct Ret {
    pub ty: Type,
    pub value: Option<Operand>,
}

/// $name: type = value;
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    pub value: Operand,
}

/// $name: bytes = "value";
#[derive(Debug, Clone, PartialEq)]
pub struct StrDecl {
    pub name: String,
    pub value: String,
}

/// $name: Struct = Struct { field: value, ... };
#[derive(Debug, Clone, PartialEq)]
pub struct StructInit {
    pub name: String,
    pub ty: String,
    pub fields: Vec<(String, Operand)>,
}

/// $name: elem[len] = array v0, v1, ...;
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayInit {
    pub name: String,
    pub elem: Type,
    pub len: usize,
    pub values: Vec<Operand>,
}

/// $name: type = $array[index];
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayAccess {
    pub name: String,
    pub ty: Type,
    pub array: String,
    pub index: usize,
}

/// $name: *type = &var;
#[derive(Debug, Clone, PartialEq)]
pub struct AddressOf {
    pub name: String,
    pub ty: Type,
    pub target: String,
}

/// $name: type = $ptr<index>;
#[derive(Debug, Clone, PartialEq)]
pub struct Deref {
    pub name: String,
    pub ty: Type,
    pub ptr: String,
    pub index: Option<usize>,
}

/// $dst[: type] = op lhs, rhs;
#[derive(Debug, Clone, PartialEq)]
pub struct BinOpAssign {
    pub op: BinOp,
    pub dst: String,
    pub ty: Option<Type>,
    pub lhs: Operand,
    pub rhs: Operand,
}

/// $dst[: type] = call %func(args);
#[derive(Debug, Clone, PartialEq)]
pub struct CallAssign {
    pub dst: String,
    pub ty: Option<Type>,
    pub call: Call,
}

/// $array[index] = value;
#[derive(Debug, Clone, PartialEq)]
pub struct ElemAssign {
    pub array: String,
    pub index: usize,
    pub value: Operand,
}

/// cmp lhs, rhs;
#[derive(Debug, Clone, PartialEq)]
pub struct Cmp {
    pub lhs: Operand,
    pub rhs: Operand,
}

/// jcc .label;
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub jump: Jump,
    pub label: String,
}

// ----------------------------------------------------------------------------
// Node

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    DataDef(DataDef),
    BssDef(BssDef),
    Extern(String),
    UseRuntime,
    StructDef(StructDef),
    EnumDef(EnumDef),
    FuncDef(FuncDef),
    Call(Call),
    Ret(Ret),
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
    Cmp(Cmp),
    Jump(Branch),
    Label(String),
    Push(Operand),
    Pop(String),
}
