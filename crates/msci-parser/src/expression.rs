use msci_core::{
    ErrorToken, Operator, Parameter, ParameterSyntax, ParameterType, ParameterUsage,
    ParameterValue, Token, TokenType,
};

use crate::literal::token_value;

/// An arithmetic expression in source order and in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExpression {
    pub infix: Vec<Parameter>,
    pub postfix: Vec<Parameter>,
}

enum Pending {
    Op(Operator, Parameter),
    Open,
}

/// Shunting-yard over the tokens right of the assignment or conditional.
pub fn parse_expression(tokens: &[Token], line_number: usize) -> Result<ParsedExpression, ErrorToken> {
    let mut infix = Vec::new();
    let mut postfix = Vec::new();
    let mut stack: Vec<Pending> = Vec::new();
    let mut expect_operand = true;
    let mut depth = 0usize;

    for token in tokens {
        let position = infix.len();
        if expect_operand {
            if token.is_value() {
                let value = token_value(token)
                    .map_err(|message| ErrorToken::for_token(message, line_number, token))?;
                let param = operand(position, value, token);
                infix.push(param.clone());
                postfix.push(param);
                expect_operand = false;
            } else if let Some(op) = unary_operator(token) {
                let param = operator(position, op, token);
                infix.push(param.clone());
                stack.push(Pending::Op(op, param));
            } else if token.is_operator("(") {
                infix.push(operator(position, Operator::OpenBracket, token));
                stack.push(Pending::Open);
                depth += 1;
            } else {
                return Err(unexpected(token, line_number));
            }
            continue;
        }

        if token.ttype == TokenType::BinaryOp {
            let Some(op) = Operator::from_binary(&token.text) else {
                return Err(unexpected(token, line_number));
            };
            while let Some(Pending::Op(top, _)) = stack.last() {
                if top.precedence() < op.precedence() {
                    break;
                }
                if let Some(Pending::Op(_, param)) = stack.pop() {
                    postfix.push(param);
                }
            }
            let param = operator(position, op, token);
            infix.push(param.clone());
            stack.push(Pending::Op(op, param));
            expect_operand = true;
        } else if token.is_operator(")") {
            if depth == 0 {
                return Err(ErrorToken::for_token("Unmatched ')'", line_number, token));
            }
            while let Some(pending) = stack.pop() {
                match pending {
                    Pending::Op(_, param) => postfix.push(param),
                    Pending::Open => break,
                }
            }
            depth -= 1;
            infix.push(operator(position, Operator::CloseBracket, token));
        } else {
            return Err(unexpected(token, line_number));
        }
    }

    if expect_operand {
        let message = if tokens.is_empty() {
            "Missing expression"
        } else {
            "Incomplete expression"
        };
        return Err(match tokens.last() {
            Some(token) => ErrorToken::for_token(message, line_number, token),
            None => ErrorToken::new(message, line_number, "", 0, 0),
        });
    }
    if depth > 0 {
        let last = tokens.last().cloned().unwrap_or_else(|| Token::new(TokenType::Text, "", 0, 0));
        return Err(ErrorToken::for_token("Missing ')'", line_number, &last));
    }
    while let Some(pending) = stack.pop() {
        if let Pending::Op(_, param) = pending {
            postfix.push(param);
        }
    }
    Ok(ParsedExpression { infix, postfix })
}

fn unary_operator(token: &Token) -> Option<Operator> {
    match token.ttype {
        TokenType::UnaryOp => Operator::from_unary(&token.text),
        TokenType::BinaryOp if token.text == "-" => Some(Operator::Negate),
        _ => None,
    }
}

fn operand(position: usize, value: ParameterValue, token: &Token) -> Parameter {
    Parameter::new(
        ParameterSyntax::new(ParameterType::Value, position, ParameterUsage::Normal),
        value,
        Some(token.clone()),
    )
}

fn operator(position: usize, op: Operator, token: &Token) -> Parameter {
    Parameter::new(
        ParameterSyntax::new(ParameterType::Expression, position, ParameterUsage::Normal),
        ParameterValue::Operator(op),
        Some(token.clone()),
    )
}

fn unexpected(token: &Token, line_number: usize) -> ErrorToken {
    ErrorToken::for_token(
        format!("Unexpected '{}' in expression", token.text),
        line_number,
        token,
    )
}
