use std::sync::Arc;

use msci_core::{
    cmd, CommandNode, CommandSyntax, Conditional, ErrorToken, GameVersion, Parameter,
    ParameterSyntax, ParameterUsage, ParameterValue, SyntaxCatalog, SyntaxMatch, Token, TokenType,
    VarArgStyle,
};

use crate::expression::parse_expression;
use crate::lexer::tokenize_significant;
use crate::literal::token_value;

/// One classified source line.
#[derive(Debug, Clone)]
pub struct LineOutcome {
    pub node: CommandNode,
    pub error: Option<ErrorToken>,
    /// Why a `*` line did not read as a commented command. Informational.
    pub comment_error: Option<ErrorToken>,
}

impl LineOutcome {
    fn ok(node: CommandNode) -> Self {
        Self {
            node,
            error: None,
            comment_error: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Prefix {
    conditional: Conditional,
    assignment: Option<Token>,
    consumed: usize,
}

impl Prefix {
    fn is_empty(&self) -> bool {
        self.consumed == 0
    }
}

struct Failure {
    error: ErrorToken,
    conditional: Conditional,
}

const CONDITIONAL_PREFIXES: &[(&[&str], Conditional)] = &[
    (&["else", "if", "not"], Conditional::ElseIfNot),
    (&["else", "if"], Conditional::ElseIf),
    (&["skip", "if", "not"], Conditional::SkipIfNot),
    (&["skip", "if"], Conditional::SkipIf),
    (&["if", "not"], Conditional::IfNot),
    (&["if"], Conditional::If),
    (&["while", "not"], Conditional::WhileNot),
    (&["while"], Conditional::While),
    (&["start"], Conditional::Start),
];

/// Classifies single lines against a syntax catalog.
pub struct LineParser<'a> {
    catalog: &'a dyn SyntaxCatalog,
    version: GameVersion,
}

impl<'a> LineParser<'a> {
    pub fn new(catalog: &'a dyn SyntaxCatalog, version: GameVersion) -> Self {
        Self { catalog, version }
    }

    pub fn parse(&self, line_number: usize, text: &str) -> LineOutcome {
        if text.trim().is_empty() {
            return LineOutcome::ok(CommandNode::nop(line_number, text));
        }

        let trimmed = text.trim_start();
        if let Some(rest) = trimmed.strip_prefix('*') {
            let offset = text.chars().count() - rest.chars().count();
            return match self.parse_code(line_number, text, rest, offset) {
                Ok(mut node) => {
                    node.commented = true;
                    LineOutcome::ok(node)
                }
                Err(failure) => LineOutcome {
                    node: CommandNode::comment(line_number, text, rest.trim()),
                    error: None,
                    comment_error: (!rest.trim().is_empty()).then_some(failure.error),
                },
            };
        }

        match self.parse_code(line_number, text, text, 0) {
            Ok(node) => LineOutcome::ok(node),
            Err(failure) => LineOutcome {
                node: CommandNode::unrecognised(failure.conditional, line_number, text),
                error: Some(failure.error),
                comment_error: None,
            },
        }
    }

    fn parse_code(
        &self,
        line_number: usize,
        line_text: &str,
        fragment: &str,
        offset: usize,
    ) -> Result<CommandNode, Failure> {
        let tokens = tokenize_significant(fragment, offset);
        let Some(first) = tokens.first() else {
            return Err(Failure {
                error: ErrorToken::for_line("Empty command", line_number, line_text),
                conditional: Conditional::None,
            });
        };
        if first.ttype == TokenType::Label {
            return self.parse_label(line_number, line_text, first);
        }

        let prefix = read_prefix(&tokens);
        let branching = if prefix.conditional.is_branching() {
            prefix.conditional
        } else {
            Conditional::None
        };

        let mut attempts = vec![prefix.clone()];
        if !prefix.is_empty() {
            attempts.push(Prefix::default());
        }
        let mut mismatch = None;
        for attempt in &attempts {
            match self.parse_command(line_number, line_text, &tokens, attempt) {
                Ok(node) => return Ok(node),
                Err(Some(error)) if mismatch.is_none() => mismatch = Some(error),
                Err(_) => {}
            }
        }

        if !prefix.is_empty() {
            match parse_expression_line(line_number, line_text, &tokens, &prefix) {
                Ok(node) => return Ok(node),
                Err(error) if mismatch.is_none() => mismatch = Some(error),
                Err(_) => {}
            }
        }

        let error = mismatch.unwrap_or_else(|| {
            ErrorToken::for_line(
                format!("Unrecognised command '{}'", fragment.trim()),
                line_number,
                line_text,
            )
        });
        Err(Failure {
            error,
            conditional: branching,
        })
    }

    fn parse_label(
        &self,
        line_number: usize,
        line_text: &str,
        token: &Token,
    ) -> Result<CommandNode, Failure> {
        let Some(syntax) = self.catalog.find(cmd::DEFINE_LABEL, self.version) else {
            return Err(Failure {
                error: ErrorToken::for_token("Label definitions are not supported", line_number, token),
                conditional: Conditional::None,
            });
        };
        let params = syntax
            .parameters
            .first()
            .map(|param| {
                vec![Parameter::new(
                    param.clone(),
                    ParameterValue::Label(token.text.clone()),
                    Some(token.clone()),
                )]
            })
            .unwrap_or_default();
        Ok(CommandNode::command(
            syntax,
            Conditional::None,
            params,
            line_number,
            line_text,
        ))
    }

    /// `Err(None)` means no catalog entry matched at all; `Err(Some(_))`
    /// carries the reason the best match was rejected.
    fn parse_command(
        &self,
        line_number: usize,
        line_text: &str,
        tokens: &[Token],
        prefix: &Prefix,
    ) -> Result<CommandNode, Option<ErrorToken>> {
        let mut start = prefix.consumed;
        let ref_object = match (tokens.get(start), tokens.get(start + 1)) {
            (Some(value), Some(arrow)) if value.is_value() && arrow.is_operator("->") => {
                start += 2;
                Some(value.clone())
            }
            _ => None,
        };

        let mut first_error = None;
        for candidate in self.catalog.identify(&tokens[start..], self.version) {
            match build_command(line_number, line_text, prefix, ref_object.as_ref(), candidate) {
                Ok(node) => return Ok(node),
                Err(error) => {
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }
        Err(first_error)
    }
}

fn read_prefix(tokens: &[Token]) -> Prefix {
    for (words, conditional) in CONDITIONAL_PREFIXES {
        let matched = words.len() <= tokens.len()
            && words
                .iter()
                .zip(tokens)
                .all(|(word, token)| token.is_keyword(word));
        if matched {
            return Prefix {
                conditional: *conditional,
                assignment: None,
                consumed: words.len(),
            };
        }
    }
    match tokens {
        [variable, equals, ..]
            if variable.ttype == TokenType::Variable && equals.is_operator("=") =>
        {
            Prefix {
                conditional: Conditional::None,
                assignment: Some(variable.clone()),
                consumed: 2,
            }
        }
        _ => Prefix::default(),
    }
}

fn build_command(
    line_number: usize,
    line_text: &str,
    prefix: &Prefix,
    ref_object: Option<&Token>,
    candidate: SyntaxMatch,
) -> Result<CommandNode, ErrorToken> {
    let syntax = candidate.syntax;
    let line_error = |message: String| ErrorToken::for_line(message, line_number, line_text);
    let mut slots: Vec<Option<Parameter>> = vec![None; syntax.parameters.len()];

    let return_param = syntax.return_parameter();
    let conditional = match (&prefix.assignment, prefix.is_empty(), return_param) {
        (Some(_), _, None) | (None, false, None) => {
            return Err(line_error(format!(
                "'{}' does not return a value",
                syntax.text
            )));
        }
        (_, true, None) => Conditional::None,
        (_, true, Some(_)) => Conditional::Discard,
        (_, false, Some((_, param))) => {
            if !param.ptype.admits(prefix.conditional) {
                return Err(line_error(format!(
                    "'{}' cannot be used with '{}'",
                    syntax.text,
                    prefix.conditional.keyword()
                )));
            }
            prefix.conditional
        }
    };
    if let Some((index, param)) = return_param {
        let value = match &prefix.assignment {
            Some(variable) => Parameter::new(
                param.clone(),
                ParameterValue::Variable(variable.variable_name().unwrap_or_default().to_string()),
                Some(variable.clone()),
            ),
            None => Parameter::new(
                param.clone(),
                ParameterValue::Conditional {
                    conditional,
                    jump: None,
                },
                None,
            ),
        };
        slots[index] = Some(value);
    }

    match (syntax.ref_object_parameter(), ref_object) {
        (Some((index, param)), Some(token)) => {
            slots[index] = Some(bind(param, token, line_number)?);
        }
        (None, None) => {}
        (Some(_), None) => {
            return Err(line_error(format!(
                "'{}' requires a reference object",
                syntax.text
            )));
        }
        (None, Some(token)) => {
            return Err(ErrorToken::for_token(
                format!("'{}' does not take a reference object", syntax.text),
                line_number,
                token,
            ));
        }
    }

    for (index, token) in &candidate.bindings {
        slots[*index] = Some(bind(&syntax.parameters[*index], token, line_number)?);
    }

    let Some(mut parameters) = slots.into_iter().collect::<Option<Vec<Parameter>>>() else {
        return Err(line_error(format!("'{}' is missing parameters", syntax.text)));
    };
    parameters.extend(parse_varargs(&syntax, &candidate.residual, line_number)?);

    Ok(CommandNode::command(
        syntax.clone(),
        conditional,
        parameters,
        line_number,
        line_text,
    ))
}

fn bind(param: &ParameterSyntax, token: &Token, line_number: usize) -> Result<Parameter, ErrorToken> {
    let value =
        token_value(token).map_err(|message| ErrorToken::for_token(message, line_number, token))?;
    Ok(Parameter::new(param.clone(), value, Some(token.clone())))
}

fn parse_varargs(
    syntax: &Arc<CommandSyntax>,
    residual: &[Token],
    line_number: usize,
) -> Result<Vec<Parameter>, ErrorToken> {
    let Some(varargs) = &syntax.varargs else {
        return Ok(Vec::new());
    };
    let base = syntax.parameters.len();
    let slot = |count: usize| ParameterSyntax::new(varargs.ptype, base + count, ParameterUsage::VarArg);
    let mut out = Vec::new();
    let mut rest = residual;

    while let Some(first) = rest.first() {
        match varargs.style {
            VarArgStyle::Delimited => {
                if !out.is_empty() {
                    if !first.is_operator(",") {
                        return Err(ErrorToken::for_token("Expected ','", line_number, first));
                    }
                    rest = &rest[1..];
                }
                let Some(token) = rest.first() else {
                    return Err(ErrorToken::for_token("Missing argument after ','", line_number, first));
                };
                if !token.is_value() {
                    return Err(ErrorToken::for_token(
                        format!("'{}' is not a value", token.text),
                        line_number,
                        token,
                    ));
                }
                out.push(bind(&slot(out.len()), token, line_number)?);
                rest = &rest[1..];
            }
            VarArgStyle::Named => {
                let (Some(name), Some(equals), Some(value)) = (rest.first(), rest.get(1), rest.get(2))
                else {
                    return Err(ErrorToken::for_token(
                        "Expected 'name=value' argument",
                        line_number,
                        first,
                    ));
                };
                let named = name.ttype == TokenType::Text && equals.is_operator("=") && value.is_value();
                if !named {
                    return Err(ErrorToken::for_token(
                        "Expected 'name=value' argument",
                        line_number,
                        name,
                    ));
                }
                let inner = token_value(value)
                    .map_err(|message| ErrorToken::for_token(message, line_number, value))?;
                out.push(Parameter::new(
                    slot(out.len()),
                    ParameterValue::Named {
                        name: name.text.clone(),
                        value: Box::new(inner),
                    },
                    Some(value.clone()),
                ));
                rest = &rest[3..];
            }
        }
        if out.len() > varargs.max {
            return Err(ErrorToken::for_token(
                format!("'{}' accepts at most {} arguments", syntax.text, varargs.max),
                line_number,
                first,
            ));
        }
    }
    Ok(out)
}

fn parse_expression_line(
    line_number: usize,
    line_text: &str,
    tokens: &[Token],
    prefix: &Prefix,
) -> Result<CommandNode, ErrorToken> {
    let syntax = CommandSyntax::expression();
    let Some((_, return_syntax)) = syntax.return_parameter() else {
        return Err(ErrorToken::for_line("Invalid expression", line_number, line_text));
    };
    if prefix.assignment.is_none() && !return_syntax.ptype.admits(prefix.conditional) {
        return Err(ErrorToken::for_line(
            format!("Expressions cannot be used with '{}'", prefix.conditional.keyword()),
            line_number,
            line_text,
        ));
    }
    let parsed = parse_expression(&tokens[prefix.consumed..], line_number)?;
    let return_value = match &prefix.assignment {
        Some(variable) => Parameter::new(
            return_syntax.clone(),
            ParameterValue::Variable(variable.variable_name().unwrap_or_default().to_string()),
            Some(variable.clone()),
        ),
        None => Parameter::new(
            return_syntax.clone(),
            ParameterValue::Conditional {
                conditional: prefix.conditional,
                jump: None,
            },
            None,
        ),
    };
    let conditional = match prefix.assignment {
        Some(_) => Conditional::None,
        None => prefix.conditional,
    };
    Ok(CommandNode::expression(
        conditional,
        vec![return_value],
        parsed.infix,
        parsed.postfix,
        line_number,
        line_text,
    ))
}

#[cfg(test)]
mod line_tests {
    use super::*;
    use crate::syntax_library::SyntaxLibrary;
    use msci_core::NodeKind;

    fn parse(text: &str) -> LineOutcome {
        let library = SyntaxLibrary::standard();
        LineParser::new(&library, GameVersion::TerranConflict).parse(7, text)
    }

    #[test]
    fn parse_classifies_blank_and_comment_lines() {
        assert_eq!(parse("   ").node.kind, NodeKind::Nop);

        let comment = parse("* fly home later");
        assert_eq!(
            comment.node.kind,
            NodeKind::Comment {
                text: "fly home later".to_string()
            }
        );
        assert!(comment.error.is_none());
        assert!(comment.comment_error.is_some());

        let commented = parse("* return null");
        assert!(commented.node.commented);
        assert!(commented.node.is(cmd::RETURN));
        assert!(commented.comment_error.is_none());
        let token = commented.node.parameters[0].token.clone().expect("null token");
        assert_eq!((token.start, token.end), (9, 13));
    }

    #[test]
    fn parse_reads_assignment_and_reference_object() {
        let outcome = parse("$sector = [THIS] -> get sector");
        assert!(outcome.error.is_none());
        let node = outcome.node;
        assert_eq!(node.id(), 201);
        assert_eq!(node.conditional, Conditional::None);
        assert_eq!(node.parameters[0].value, ParameterValue::Variable("sector".to_string()));
        assert_eq!(node.parameters[1].value, ParameterValue::ScriptObject("THIS".to_string()));
    }

    #[test]
    fn parse_reads_conditionals_and_discards() {
        let node = parse("skip if not $ship -> fly to sector {Argon Prime}").node;
        assert_eq!(node.conditional, Conditional::SkipIfNot);
        assert_eq!(node.parameters.len(), 3);

        let node = parse("get player money").node;
        assert_eq!(node.conditional, Conditional::Discard);

        let node = parse("write to player logbook 'hi'").node;
        assert_eq!(node.conditional, Conditional::None);
    }

    #[test]
    fn parse_rejects_conditionals_the_return_value_does_not_admit() {
        let outcome = parse("if get player ship");
        let error = outcome.error.expect("retvar admits no if");
        assert!(error.message.contains("cannot be used with 'if'"));
        assert_eq!(outcome.node.kind, NodeKind::Unrecognised);
        assert_eq!(outcome.node.conditional, Conditional::If);

        let error = parse("$x = write to player logbook 1").error.expect("no return value");
        assert!(error.message.contains("does not return a value"));
    }

    #[test]
    fn parse_requires_reference_objects_exactly_when_declared() {
        let error = parse("$s = get sector").error.expect("missing refobj");
        assert!(error.message.contains("requires a reference object"));
        let error = parse("$s = $ship -> get player money").error.expect("extra refobj");
        assert!(error.message.contains("does not take a reference object"));
    }

    #[test]
    fn parse_falls_back_to_expressions() {
        let node = parse("if $x == 1").node;
        assert_eq!(node.conditional, Conditional::If);
        let NodeKind::Expression { postfix, .. } = &node.kind else {
            panic!("expected expression");
        };
        assert_eq!(postfix.len(), 3);

        let node = parse("$x = 1").node;
        assert_eq!(node.id(), cmd::EXPRESSION);
        assert_eq!(node.parameters[0].value, ParameterValue::Variable("x".to_string()));

        let node = parse("$x = $a + 1").node;
        assert_eq!(node.id(), cmd::ADD);
    }

    #[test]
    fn parse_reads_labels_and_varargs() {
        let node = parse("lab1:").node;
        assert_eq!(node.label_name(), Some("lab1"));

        let node = parse("dim $list = 4, 'x', $y").node;
        assert_eq!(node.id(), cmd::DIM_ARRAY);
        assert_eq!(node.parameters.len(), 4);
        assert_eq!(node.parameters[3].syntax.usage, ParameterUsage::VarArg);

        let node = parse("$r = [THIS] -> call script 'lib.fly' : ship=$s count=3").node;
        assert_eq!(node.id(), cmd::CALL_SCRIPT);
        assert_eq!(
            node.parameters[4].value,
            ParameterValue::Named {
                name: "count".to_string(),
                value: Box::new(ParameterValue::Number(3)),
            }
        );

        let error = parse("dim $list = 4,").error.expect("dangling comma");
        assert_eq!(error.message, "Missing argument after ','");
    }

    #[test]
    fn parse_reports_unknown_lines_with_their_conditional() {
        let outcome = parse("while fly away");
        assert_eq!(outcome.node.kind, NodeKind::Unrecognised);
        assert_eq!(outcome.node.conditional, Conditional::While);
        assert!(outcome.error.is_some());

        let outcome = parse("fly away");
        let error = outcome.error.expect("unknown command");
        assert_eq!(error.message, "Unrecognised command 'fly away'");
        assert_eq!(error.line_number, 7);
    }
}
