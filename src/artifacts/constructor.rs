use ethabi::{
    token::{LenientTokenizer, Tokenizer},
    Contract, ParamType, Token,
};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructorError {
    #[error("invalid contract abi: {0}")]
    InvalidAbi(String),
    #[error("contract has no constructor, but {0} arguments were provided")]
    NoConstructor(usize),
    #[error("constructor expects {expected} arguments, but {actual} were provided")]
    ArgumentsCount { expected: usize, actual: usize },
    #[error("argument #{index} ({kind}): {error}")]
    InvalidArgument {
        index: usize,
        kind: ParamType,
        error: String,
    },
}

/// Abi encodes constructor arguments of the contract. Returns empty bytes
/// for contracts deployed without arguments.
pub fn encode_constructor_arguments(
    abi: &Value,
    arguments: &[Value],
) -> Result<Vec<u8>, ConstructorError> {
    let contract: Contract = serde_json::from_value(abi.clone())
        .map_err(|err| ConstructorError::InvalidAbi(err.to_string()))?;

    let inputs = match contract.constructor {
        Some(constructor) => constructor.inputs,
        None if arguments.is_empty() => return Ok(vec![]),
        None => return Err(ConstructorError::NoConstructor(arguments.len())),
    };
    if inputs.len() != arguments.len() {
        return Err(ConstructorError::ArgumentsCount {
            expected: inputs.len(),
            actual: arguments.len(),
        });
    }

    let tokens = inputs
        .iter()
        .zip(arguments)
        .enumerate()
        .map(|(index, (param, value))| {
            tokenize(&param.kind, value).map_err(|error| ConstructorError::InvalidArgument {
                index,
                kind: param.kind.clone(),
                error,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ethabi::encode(&tokens))
}

fn tokenize(kind: &ParamType, value: &Value) -> Result<Token, String> {
    let tokenize_all = |kind: &ParamType, values: &[Value]| {
        values
            .iter()
            .map(|value| tokenize(kind, value))
            .collect::<Result<Vec<_>, _>>()
    };

    match (kind, value) {
        (ParamType::Array(inner), Value::Array(values)) => {
            Ok(Token::Array(tokenize_all(inner, values)?))
        }
        (ParamType::FixedArray(inner, length), Value::Array(values)) => {
            if values.len() != *length {
                return Err(format!(
                    "expected {length} elements, got {}",
                    values.len()
                ));
            }
            Ok(Token::FixedArray(tokenize_all(inner, values)?))
        }
        (ParamType::Tuple(kinds), Value::Array(values)) => {
            if values.len() != kinds.len() {
                return Err(format!(
                    "expected {} tuple components, got {}",
                    kinds.len(),
                    values.len()
                ));
            }
            kinds
                .iter()
                .zip(values)
                .map(|(kind, value)| tokenize(kind, value))
                .collect::<Result<Vec<_>, _>>()
                .map(Token::Tuple)
        }
        (ParamType::Bool, Value::Bool(value)) => Ok(Token::Bool(*value)),
        (_, Value::String(value)) => {
            LenientTokenizer::tokenize(kind, value).map_err(|err| err.to_string())
        }
        (_, Value::Number(value)) => {
            LenientTokenizer::tokenize(kind, &value.to_string()).map_err(|err| err.to_string())
        }
        (_, value) => Err(format!("unexpected value: {value}")),
    }
}
