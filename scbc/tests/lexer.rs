use arch::Jump;
use scbc::grammer::ast::*;
use scbc::grammer::lexer::LineLexer;
use scbc::grammer::token::TokenKind;
use scbc::{Error, Lexer};

fn lex(code: &str) -> TokenKind {
    println!(" {code}");
    let kind = LineLexer::new(code, 0).parse();
    println!("  {:?}", kind);
    kind.unwrap()
}

macro_rules! case {
    ($name:ident, $code:expr, $expect:expr) => {
        #[test]
        fn $name() {
            assert_eq!(lex($code), $expect);
        }
    };
}

macro_rules! fails {
    ($name:ident, $code:expr, $construct:expr) => {
        #[test]
        fn $name() {
            match LineLexer::new($code, 0).parse() {
                Err(Error::Syntax { construct, .. }) => assert_eq!(construct, $construct),
                other => panic!("expected syntax error, got {:?}", other),
            }
        }
    };
}

fn var(name: &str) -> Operand {
    Operand::Var(name.into())
}

case!(
    datadef,
    r#"datadef msg: bytes = "hi\n";"#,
    TokenKind::DataDef(DataDef { name: "msg".into(), value: r"hi\n".into() })
);

case!(
    bssdef,
    "bssdef buf: 256;",
    TokenKind::BssDef(BssDef { name: "buf".into(), size: 256 })
);

case!(extern_decl, "extern %printf;", TokenKind::Extern("printf".into()));
case!(use_runtime, "use runtime;", TokenKind::UseRuntime);

case!(
    structdef,
    "structdef Point { x: int; y: int; }",
    TokenKind::StructDef(StructDef {
        name: "Point".into(),
        fields: vec![
            Field { name: "x".into(), ty: Type::Int },
            Field { name: "y".into(), ty: Type::Int },
        ],
    })
);

case!(
    enumdef,
    "enumdef Color { Red, Green, Blue }",
    TokenKind::EnumDef(EnumDef {
        name: "Color".into(),
        variants: vec!["Red".into(), "Green".into(), "Blue".into()],
    })
);

case!(
    funcdef,
    "funcdef %add($a: int, b: *bytes) -> int {",
    TokenKind::FuncDef(FuncDef {
        name: "add".into(),
        params: vec![
            Field { name: "a".into(), ty: Type::Int },
            Field { name: "b".into(), ty: Type::Ptr(Box::new(Type::Bytes)) },
        ],
        ret: Type::Int,
    })
);

case!(
    call_with_types,
    r#"call %printf("%d\n": bytes, $x: int);"#,
    TokenKind::Call(Call {
        func: "printf".into(),
        args: vec![Operand::Str(r"%d\n".into()), var("x")],
    })
);

case!(
    ret_void,
    "ret void;",
    TokenKind::Ret(Ret { ty: Type::Void, value: None })
);

case!(
    ret_value,
    "ret int $x;",
    TokenKind::Ret(Ret { ty: Type::Int, value: Some(var("x")) })
);

case!(
    cmp,
    "cmp $i, 10;",
    TokenKind::Cmp(Cmp { lhs: var("i"), rhs: Operand::Int(10) })
);

case!(
    jump,
    "jge .end;",
    TokenKind::Jump(Branch { jump: Jump::JGE, label: "end".into() })
);

case!(label, ".loop:", TokenKind::Label("loop".into()));
case!(push_int, "push 5;", TokenKind::Push(Operand::Int(5)));
case!(pop, "pop $x;", TokenKind::Pop("x".into()));

case!(
    int_decl,
    "$x: int = -42;",
    TokenKind::VarDecl(VarDecl { name: "x".into(), ty: Type::Int, value: Operand::Int(-42) })
);

case!(
    enum_decl,
    "$c: Color = Color::Green;",
    TokenKind::VarDecl(VarDecl {
        name: "c".into(),
        ty: Type::Named("Color".into()),
        value: Operand::Enum("Color".into(), "Green".into()),
    })
);

case!(
    field_decl,
    "$v: int = $o->b->q;",
    TokenKind::VarDecl(VarDecl {
        name: "v".into(),
        ty: Type::Int,
        value: Operand::Field("o".into(), vec!["b".into(), "q".into()]),
    })
);

case!(
    str_decl,
    r#"$s: bytes = "a \"quoted\" word";"#,
    TokenKind::StrDecl(StrDecl { name: "s".into(), value: r#"a \"quoted\" word"#.into() })
);

case!(
    struct_init,
    "$p: Point = Point { x: 1, y: $y };",
    TokenKind::StructInit(StructInit {
        name: "p".into(),
        ty: "Point".into(),
        fields: vec![("x".into(), Operand::Int(1)), ("y".into(), var("y"))],
    })
);

case!(
    array_init,
    "$a: int[3] = array 1, 2, 3;",
    TokenKind::ArrayInit(ArrayInit {
        name: "a".into(),
        elem: Type::Int,
        len: 3,
        values: vec![Operand::Int(1), Operand::Int(2), Operand::Int(3)],
    })
);

case!(
    array_access,
    "$e: int = $a[2];",
    TokenKind::ArrayAccess(ArrayAccess {
        name: "e".into(),
        ty: Type::Int,
        array: "a".into(),
        index: 2,
    })
);

case!(
    address_of,
    "$p: *int = &$x;",
    TokenKind::AddressOf(AddressOf {
        name: "p".into(),
        ty: Type::Ptr(Box::new(Type::Int)),
        target: "x".into(),
    })
);

case!(
    deref,
    "$v: int = $p<1>;",
    TokenKind::Deref(Deref { name: "v".into(), ty: Type::Int, ptr: "p".into(), index: Some(1) })
);

case!(
    binop_untyped,
    "$sum = add $a, 1;",
    TokenKind::BinOp(BinOpAssign {
        op: BinOp::Add,
        dst: "sum".into(),
        ty: None,
        lhs: var("a"),
        rhs: Operand::Int(1),
    })
);

case!(
    call_assign,
    "$r: int = call %f($x);",
    TokenKind::CallAssign(CallAssign {
        dst: "r".into(),
        ty: Some(Type::Int),
        call: Call { func: "f".into(), args: vec![var("x")] },
    })
);

case!(
    elem_assign,
    "$a[0] = 9;",
    TokenKind::ElemAssign(ElemAssign { array: "a".into(), index: 0, value: Operand::Int(9) })
);

fails!(unknown_keyword, "frobnicate 1;", "statement");
fails!(missing_semicolon, "pop $x", "pop");
fails!(string_into_int, r#"$s: int = "x";"#, "string declaration");
fails!(array_without_array_type, "$a: int = array 1, 2;", "array literal");
fails!(struct_name_mismatch, "$p: Point = Line { x: 1 };", "struct literal");
fails!(address_into_int, "$p: int = &x;", "address-of");
fails!(untyped_declaration, "$x = 5;", "declaration");

#[test]
fn multiline_blocks_and_comments() {
    let code = "\
// header comment
structdef Pair {
    a: int;   // first
    b: int;
}

funcdef %main() -> int {
    ret int 0;
}
";
    let tokens = Lexer::new(code).parse().unwrap();
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0].pos.row, 1);
    assert!(matches!(&tokens[0].kind, TokenKind::StructDef(def) if def.fields.len() == 2));
    assert_eq!(tokens[1].pos.row, 6);
    assert_eq!(tokens[2].pos.row, 7);
}

#[test]
fn unterminated_block() {
    let code = "enumdef Color {\n  Red,\n  Green\n";
    assert_eq!(
        Lexer::new(code).parse(),
        Err(Error::Unterminated("enumdef", 0))
    );
}

#[test]
fn first_error_stops_lexing() {
    let code = "extern %puts;\nbogus line\nalso bogus";
    match Lexer::new(code).parse() {
        Err(Error::Syntax { row, line, .. }) => {
            assert_eq!(row, 1);
            assert_eq!(line, "bogus line");
        }
        other => panic!("unexpected: {:?}", other),
    }
}
