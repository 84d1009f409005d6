use msci_core::{
    CommandNode, CommandSyntax, CommandTree, Conditional, ErrorToken, ExecutionType,
    GameObjectKind, NodeKind, ObjectCatalog, Parameter, ParameterType, ParameterUsage,
    ParameterValue, ScriptCallInfo, ScriptFile, Token,
};
use tracing::debug;

/// A parameter that failed verification. Command-comments recover from it by
/// demotion; real commands report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterFault {
    pub message: String,
    pub token: Option<Token>,
}

impl ParameterFault {
    fn new(message: impl Into<String>, token: Option<&Token>) -> Self {
        Self {
            message: message.into(),
            token: token.cloned(),
        }
    }

    fn into_error(self, node: &CommandNode) -> ErrorToken {
        match &self.token {
            Some(token) => ErrorToken::for_token(self.message, node.line_number, token),
            None => ErrorToken::for_line(self.message, node.line_number, &node.line_text),
        }
    }
}

/// Verifies every command and command-comment parameter. Commented commands
/// with faults become plain comments; other faults are returned.
pub fn verify_parameters(
    tree: &mut CommandTree,
    script: &ScriptFile,
    objects: &dyn ObjectCatalog,
) -> Vec<ErrorToken> {
    let mut errors = Vec::new();
    for id in tree.nodes() {
        let faults = node_faults(tree.node(id), script, objects);
        if faults.is_empty() {
            continue;
        }
        let node = tree.node_mut(id);
        if node.commented {
            debug!(
                line = node.line_number,
                reason = %faults[0].message,
                "command comment demoted"
            );
            demote_to_comment(node);
        } else {
            errors.extend(faults.into_iter().map(|fault| fault.into_error(node)));
        }
    }
    errors
}

/// Checks one parameter against its declared type and the catalogs.
pub fn check_parameter(
    param: &Parameter,
    script: &ScriptFile,
    objects: &dyn ObjectCatalog,
) -> Result<(), ParameterFault> {
    let value = match &param.value {
        ParameterValue::Named { value, .. } => value.as_ref(),
        value => value,
    };
    check_value(value, param.syntax.ptype, param.token.as_ref(), script, objects)
}

fn node_faults(node: &CommandNode, script: &ScriptFile, objects: &dyn ObjectCatalog) -> Vec<ParameterFault> {
    if !matches!(node.kind, NodeKind::Command | NodeKind::Expression { .. }) {
        return Vec::new();
    }
    let mut faults = Vec::new();
    if let Err(fault) = check_execution(node) {
        faults.push(fault);
    }

    let call = called_script(node, script);
    let mut last_position = None;
    for param in node.all_parameters() {
        let result = match (&param.value, call) {
            (ParameterValue::Named { name, value }, Some(info))
                if param.syntax.usage == ParameterUsage::VarArg =>
            {
                check_script_argument(name, param.token.as_ref(), info, &mut last_position)
                    .and_then(|ptype| check_value(value, ptype, param.token.as_ref(), script, objects))
            }
            _ => check_parameter(param, script, objects),
        };
        if let Err(fault) = result {
            faults.push(fault);
        }
    }
    faults
}

fn check_execution(node: &CommandNode) -> Result<(), ParameterFault> {
    match (node.syntax.execution, node.conditional) {
        (ExecutionType::Serial, Conditional::Start) => Err(ParameterFault::new(
            format!("'{}' cannot be started asynchronously", node.syntax.text),
            None,
        )),
        (ExecutionType::Concurrent, conditional) if conditional != Conditional::Start => {
            Err(ParameterFault::new(
                format!("'{}' must be started with 'start'", node.syntax.text),
                None,
            ))
        }
        _ => Ok(()),
    }
}

fn called_script<'s>(node: &CommandNode, script: &'s ScriptFile) -> Option<&'s ScriptCallInfo> {
    if !node.syntax.is_script_call() {
        return None;
    }
    node.parameters.iter().find_map(|param| match &param.value {
        ParameterValue::String(name) if param.syntax.ptype == ParameterType::ScriptName => {
            script.script_calls.get(name)
        }
        _ => None,
    })
}

/// Looks up a `name=value` argument in the called script's declaration and
/// returns the declared type.
fn check_script_argument(
    name: &str,
    token: Option<&Token>,
    info: &ScriptCallInfo,
    last_position: &mut Option<usize>,
) -> Result<ParameterType, ParameterFault> {
    let Some(position) = info.argument_position(name) else {
        return Err(ParameterFault::new(
            format!("Script '{}' has no argument '{}'", info.name, name),
            token,
        ));
    };
    if last_position.is_some_and(|last| position <= last) {
        return Err(ParameterFault::new(
            format!("Argument '{}' is out of order", name),
            token,
        ));
    }
    *last_position = Some(position);
    Ok(info.arguments[position].ptype)
}

fn check_value(
    value: &ParameterValue,
    ptype: ParameterType,
    token: Option<&Token>,
    script: &ScriptFile,
    objects: &dyn ObjectCatalog,
) -> Result<(), ParameterFault> {
    let mut game_kind = None;
    match value {
        ParameterValue::GameObject(name) => match objects.find_game_object(name) {
            Some(object) => game_kind = Some(object.kind),
            None => {
                return Err(ParameterFault::new(
                    format!("Unknown game object '{}'", value),
                    token,
                ))
            }
        },
        ParameterValue::ScriptObject(name) if objects.find_script_object(name).is_none() => {
            return Err(ParameterFault::new(
                format!("Unknown script object '{}'", value),
                token,
            ));
        }
        ParameterValue::Label(name) if ptype.is_label() && !script.labels.contains_key(name) => {
            return Err(ParameterFault::new(
                format!("Label '{}' is not defined", name),
                token,
            ));
        }
        _ => {}
    }

    if admits(ptype, value, game_kind) {
        Ok(())
    } else {
        Err(ParameterFault::new(
            format!("Expected {} but found {} {}", ptype, value.kind_name(), value),
            token,
        ))
    }
}

fn object_kinds(ptype: ParameterType) -> &'static [GameObjectKind] {
    match ptype {
        ParameterType::VarShip => &[GameObjectKind::Ship],
        ParameterType::VarStation => &[GameObjectKind::Station],
        ParameterType::VarShipStation => &[GameObjectKind::Ship, GameObjectKind::Station],
        ParameterType::VarSector => &[GameObjectKind::Sector],
        ParameterType::VarWare => &[GameObjectKind::Ware],
        ParameterType::VarRace => &[GameObjectKind::Race],
        _ => &[],
    }
}

fn admits(ptype: ParameterType, value: &ParameterValue, game_kind: Option<GameObjectKind>) -> bool {
    use ParameterType as T;
    use ParameterValue as V;

    match ptype {
        T::Value => matches!(
            value,
            V::Null | V::Number(_) | V::String(_) | V::Variable(_) | V::GameObject(_) | V::ScriptObject(_)
        ),
        T::Variable => matches!(value, V::Variable(_)),
        T::RetVar | T::RetVarIf | T::RetVarIfStart => {
            matches!(value, V::Variable(_) | V::Conditional { .. })
        }
        T::VarNumber => matches!(
            value,
            V::Variable(_) | V::Number(_) | V::Null | V::ScriptObject(_)
        ),
        T::VarString => matches!(value, V::Variable(_) | V::String(_) | V::Null),
        T::VarBoolean => matches!(
            value,
            V::Variable(_) | V::Number(_) | V::ScriptObject(_) | V::Null
        ),
        T::VarArray => matches!(value, V::Variable(_) | V::Null),
        T::VarShip
        | T::VarStation
        | T::VarShipStation
        | T::VarSector
        | T::VarWare
        | T::VarRace => match value {
            V::Variable(_) | V::Null | V::ScriptObject(_) => true,
            V::GameObject(_) => game_kind.is_some_and(|kind| object_kinds(ptype).contains(&kind)),
            _ => false,
        },
        T::VarConstant => matches!(value, V::Variable(_) | V::ScriptObject(_) | V::Number(_)),
        T::Number => matches!(value, V::Number(_)),
        T::String => matches!(value, V::String(_)),
        T::LabelName => matches!(value, V::Label(_)),
        T::LabelNumber => matches!(value, V::Address(_) | V::Number(_)),
        T::ScriptName => matches!(value, V::String(_) | V::Variable(_)),
        T::Comment => true,
        T::Expression => matches!(value, V::Operator(_)),
    }
}

fn demote_to_comment(node: &mut CommandNode) {
    let text = node
        .line_text
        .trim_start()
        .strip_prefix('*')
        .unwrap_or(&node.line_text)
        .trim()
        .to_string();
    node.kind = NodeKind::Comment { text };
    node.syntax = CommandSyntax::comment();
    node.conditional = Conditional::None;
    node.parameters.clear();
    node.commented = false;
}

#[cfg(test)]
mod parameters_tests {
    use super::*;
    use crate::symbols::identify_symbols;
    use msci_core::{GameVersion, ScriptArgument};
    use msci_parser::{ObjectLibrary, ScriptParser, SyntaxLibrary};

    fn verify(lines: &[&str], prepare: impl FnOnce(&mut ScriptFile)) -> (CommandTree, Vec<String>) {
        let library = SyntaxLibrary::standard();
        let objects = ObjectLibrary::standard();
        let outcome = ScriptParser::new(&library, GameVersion::TerranConflict).parse_script(lines);
        assert!(outcome.errors.is_empty(), "parse errors: {:?}", outcome.errors);
        let mut tree = outcome.tree;
        let mut script = ScriptFile::new("test", GameVersion::TerranConflict, Vec::new());
        assert!(identify_symbols(&tree, &mut script).is_empty());
        prepare(&mut script);
        let errors = verify_parameters(&mut tree, &script, &objects)
            .into_iter()
            .map(|error| format!("{}: {}", error.line_number, error.message))
            .collect();
        (tree, errors)
    }

    #[test]
    fn labels_must_be_defined() {
        let (_, errors) = verify(&["lab1:", "goto label lab1", "gosub nowhere:"], |_| {});
        assert_eq!(errors, vec!["3: Label 'nowhere' is not defined"]);
    }

    #[test]
    fn game_objects_must_exist_and_match_the_parameter_kind() {
        let (_, errors) = verify(
            &[
                "$a = {Argon Buster} -> get sector",
                "$b = [PLAYERSHIP] -> get sector",
                "$c = {Argon Prime} -> get sector",
                "$d = {Nowhere} -> get sector",
                "$e = [NOTHING] -> get sector",
            ],
            |_| {},
        );
        assert_eq!(
            errors,
            vec![
                "3: Expected Var/Ship/Station but found game object {Argon Prime}",
                "4: Unknown game object '{Nowhere}'",
                "5: Unknown script object '[NOTHING]'",
            ]
        );
    }

    #[test]
    fn values_are_checked_against_static_types() {
        let (_, errors) = verify(&["inc 'text'", "inc $count", "$x = size of array 4"], |_| {});
        assert_eq!(
            errors,
            vec![
                "1: Expected Var/Number but found string 'text'",
                "3: Expected Var/Array but found number 4",
            ]
        );
    }

    #[test]
    fn faulty_command_comments_become_plain_comments() {
        let (tree, errors) = verify(&["* goto label nowhere", "* inc $count"], |_| {});
        assert!(errors.is_empty());
        let root = tree.root();
        let first = tree.node(tree.children(root)[0]);
        assert_eq!(
            first.kind,
            NodeKind::Comment {
                text: "goto label nowhere".to_string()
            }
        );
        assert!(!first.commented);
        assert!(first.parameters.is_empty());
        let second = tree.node(tree.children(root)[1]);
        assert!(second.commented);
        assert_eq!(second.kind, NodeKind::Command);
    }

    #[test]
    fn named_arguments_follow_the_called_script_declaration() {
        let declare = |script: &mut ScriptFile| {
            script.script_calls.insert(
                "lib.fly".to_string(),
                ScriptCallInfo {
                    name: "lib.fly".to_string(),
                    arguments: vec![
                        ScriptArgument {
                            name: "ship".to_string(),
                            ptype: ParameterType::VarShip,
                            description: String::new(),
                        },
                        ScriptArgument {
                            name: "count".to_string(),
                            ptype: ParameterType::VarNumber,
                            description: String::new(),
                        },
                    ],
                },
            );
        };
        let (_, errors) = verify(
            &[
                "$r = [THIS] -> call script 'lib.fly' : ship=$s count=1",
                "$r = [THIS] -> call script 'lib.fly' : count=1 ship=$s",
                "$r = [THIS] -> call script 'lib.fly' : speed=1",
                "$r = [THIS] -> call script 'lib.fly' : count='x'",
                "$r = [THIS] -> call script 'lib.other' : speed='x'",
            ],
            declare,
        );
        assert_eq!(
            errors,
            vec![
                "2: Argument 'ship' is out of order",
                "3: Script 'lib.fly' has no argument 'speed'",
                "4: Expected Var/Number but found string 'x'",
            ]
        );
    }

    #[test]
    fn concurrent_commands_need_start() {
        let (_, errors) = verify(
            &[
                "[THIS] -> begin task 1 with script 'lib.task'",
                "start [THIS] -> begin task 1 with script 'lib.task'",
            ],
            |_| {},
        );
        assert_eq!(
            errors,
            vec!["1: 'begin task $0 with script $1' must be started with 'start'"]
        );
    }
}
