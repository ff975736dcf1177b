//! Snapshot of the tree layout for a declaration command

use shsyntax::parse;

#[test]
fn export_scalar_tree() {
    let parse = parse("export a=1").unwrap();
    insta::assert_snapshot!(parse.tree().debug_dump(), @r#"
    File@0..10
      VarDefCommand@0..10
        Word@0..6
          Word@0..6 "export"
        Whitespace@6..7 " "
        VarDef@7..10
          AssignmentWord@7..8 "a"
          Eq@8..9 "="
          Word@9..10
            Number@9..10 "1"
    "#);
}
