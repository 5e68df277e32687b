// Copyright (c) 2019-2021 The pisim developers

//! The core-form serializer composed with tokenize + parse is the identity
//! on core-only programs.

#[macro_use]
extern crate indoc;

use pisim::{parse, procs_to_string, Lexer, Loc};

macro_rules! roundtrip {
    ($input:tt) => {
        let lexer = Lexer::new();
        let input = indoc!($input);
        let (procs, errors) = parse(&lexer.tokenize(input, &Loc::internal(), true));
        assert!(errors.is_empty(), "parse errors:\n{}", errors);
        let written = procs_to_string(&procs);
        let (reparsed, errors) = parse(&lexer.tokenize(&written, &Loc::internal(), true));
        assert!(errors.is_empty(), "reparse errors:\n{}", errors);
        assert_eq!(procs_to_string(&reparsed), written);
    };
}

#[test]
fn chains() {
    roundtrip! {"
        +x;m<-x;m->x.
    "};
}

#[test]
fn groups() {
    roundtrip! {"
        +x;(
            m<-x;m->m.
            n<<x;n->x.
            +y;y->x.
        )
    "};
}

#[test]
fn raw_references() {
    roundtrip! {"
        m<-stdin__A;m->stdout_41.
        ->stdin_read.
        <-stdin_EOF.
    "};
}

#[test]
fn desugared_forms() {
    roundtrip! {"
        +srv;(
            r<<srv;->r.
            <>srv;->stdout__R.
            a,b<-srv;a->b.
        )
    "};
}

#[test]
fn serialized_shape() {
    let lexer = Lexer::new();
    let (procs, errors) = parse(&lexer.tokenize("+x;(m<-x. x->stdout__A.)", &Loc::internal(), true));
    assert!(errors.is_empty(), "{}", errors);
    assert_eq!(
        procs_to_string(&procs),
        "+515;(516<-515. 515->stdout_41.)\n"
    );
}
