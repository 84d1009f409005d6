mod common;

use common::{command_at, compile, jump_of, syntax, verify_messages};
use msci_compiler::{detect_array_initializer, expand_macros, verify_structure};
use msci_core::{cmd, BranchLogic, CommandNode, GameVersion, ParameterValue, ScriptFile};
use msci_parser::ScriptParser;

#[test]
fn if_chain_jumps_to_the_next_alternate_or_past_the_chain() {
    let compiled = compile(&[
        "$x = 1",
        "if $x == 1",
        "inc $x",
        "else if $x == 2",
        "dec $x",
        "else",
        "$x = 5",
        "end",
        "return $x",
    ]);
    let script = &compiled.script;
    assert_eq!(jump_of(command_at(script, 2)), command_at(script, 4).address);
    assert_eq!(jump_of(command_at(script, 4)), command_at(script, 7).address);

    let after_chain = command_at(script, 9).address;
    let skips: Vec<&ParameterValue> = script
        .commands
        .iter()
        .filter(|command| command.id == cmd::JUMP)
        .map(|command| &command.parameters[0].value)
        .collect();
    assert_eq!(skips.len(), 2);
    for skip in skips {
        assert_eq!(Some(skip), after_chain.map(ParameterValue::Address).as_ref());
    }

    let compiled = compile(&["$x = 1", "if $x == 1", "inc $x", "end", "return $x"]);
    assert_eq!(
        jump_of(command_at(&compiled.script, 2)),
        command_at(&compiled.script, 5).address
    );
}

#[test]
fn while_closes_with_a_jump_to_itself_and_exits_to_the_next_command() {
    let compiled = compile(&["$i = 3", "while $i", "dec $i", "end", "return $i"]);
    let tree = &compiled.tree;
    let while_id = tree
        .nodes()
        .into_iter()
        .find(|id| tree.node(*id).branch_logic() == BranchLogic::While)
        .expect("while node");
    let back_edge = *tree.children(while_id).last().expect("loop body");
    let back_edge = tree.node(back_edge);
    assert!(back_edge.synthetic);
    assert!(back_edge.is(cmd::JUMP));
    assert_eq!(back_edge.jump_target, Some(while_id));

    let script = &compiled.script;
    let while_address = command_at(script, 2).address.expect("while address");
    let jump = script
        .commands
        .iter()
        .find(|command| command.id == cmd::JUMP)
        .expect("back edge command");
    assert_eq!(jump.parameters[0].value, ParameterValue::Address(while_address));
    assert_eq!(jump_of(command_at(script, 2)), command_at(script, 5).address);
}

#[test]
fn skip_if_holds_exactly_one_plain_command() {
    let parser = ScriptParser::new(syntax(), GameVersion::TerranConflict);
    let mut tree = parser
        .parse_script(&["skip if $a", "inc $b", "dec $b", "return null"])
        .tree;
    assert!(verify_structure(&tree).is_empty());

    let root = tree.root();
    let skip = tree.children(root)[0];
    let second = tree.children(root)[1];
    tree.append_child(skip, second);
    let errors = verify_structure(&tree);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("must contain single command"));
    assert_eq!(errors[0].line_number, 1);
}

#[test]
fn break_and_continue_require_a_loop() {
    assert_eq!(
        verify_messages(&["break", "return null"]),
        vec!["1: 'break' cannot appear outside 'while'"]
    );
    assert_eq!(
        verify_messages(&["if $a", "continue", "end", "return null"]),
        vec!["2: 'continue' cannot appear outside 'while'"]
    );
    assert!(verify_messages(&["while $a", "break", "end", "return null"]).is_empty());
}

#[test]
fn if_without_else_cannot_guarantee_return() {
    let lines = ["$x = 1", "if $x == 1", "return 1", "end"];
    assert_eq!(
        verify_messages(&lines),
        vec!["4: Not every control path ends with 'return'"]
    );
    assert!(verify_messages(&["$x = 1", "if $x == 1", "return 1", "else", "return 2", "end"]).is_empty());
}

#[test]
fn dim_expansion_and_detection_are_inverse() {
    let parser = ScriptParser::new(syntax(), GameVersion::TerranConflict);
    let mut tree = parser.parse_script(&["dim $a = 1, 2, 3"]).tree;
    let mut script = ScriptFile::new("test", GameVersion::TerranConflict, Vec::new());
    assert!(expand_macros(&mut tree, &mut script, &parser).is_empty());

    let nodes: Vec<&CommandNode> = tree
        .children(tree.root())
        .iter()
        .map(|id| tree.node(*id))
        .collect();
    assert_eq!(nodes.len(), 4);
    assert!(nodes[0].is(cmd::ARRAY_ALLOC));
    assert_eq!(nodes[0].parameters[1].value, ParameterValue::Number(3));
    for (index, node) in nodes[1..].iter().enumerate() {
        assert!(node.is(cmd::ARRAY_SET));
        assert_eq!(node.parameters[0].value, ParameterValue::Variable("a".to_string()));
        assert_eq!(node.parameters[1].value, ParameterValue::Number(index as i32));
    }

    let detected = detect_array_initializer(&nodes).expect("dim shape");
    assert_eq!(detected.text(), "dim $a = 1, 2, 3");
    let mut rebuilt = parser.parse_script(&[detected.text()]).tree;
    let mut script = ScriptFile::new("test", GameVersion::TerranConflict, Vec::new());
    assert!(expand_macros(&mut rebuilt, &mut script, &parser).is_empty());
    let rebuilt_texts: Vec<&str> = rebuilt
        .children(rebuilt.root())
        .iter()
        .map(|id| rebuilt.node(*id).line_text.as_str())
        .collect();
    let texts: Vec<&str> = nodes.iter().map(|node| node.line_text.as_str()).collect();
    assert_eq!(rebuilt_texts, texts);
}

#[test]
fn duplicate_labels_point_at_the_first_definition() {
    let messages = verify_messages(&[
        "$a = 0",
        "",
        "lab1:",
        "inc $a",
        "",
        "",
        "",
        "",
        "lab1:",
        "return $a",
    ]);
    assert_eq!(messages, vec!["9: Label 'lab1' already defined on line 3"]);
}

#[test]
fn if_else_example_compiles_to_five_commands() {
    let compiled = compile(&[
        "$x = 1",
        "if $x == 1",
        "return null",
        "else",
        "return null",
        "end",
    ]);
    let script = &compiled.script;
    assert_eq!(script.commands.len(), 5);
    let lines: Vec<usize> = script.commands.iter().map(|command| command.line_number).collect();
    assert_eq!(lines, vec![1, 2, 3, 4, 5]);
    assert_eq!(jump_of(command_at(script, 2)), command_at(script, 5).address);
    assert!(script.commands.iter().all(|command| command.id != cmd::JUMP));
}
