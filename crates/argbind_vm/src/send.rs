//! Built-in methods reachable through `send`.

use crate::error::RuntimeError;
use crate::value::Value;

/// Call `method` on `receiver`.
pub(crate) fn dispatch(receiver: &Value, method: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    if method == "nil?" {
        arity(args, 0)?;
        return Ok(Value::Bool(receiver.is_nil()));
    }

    match receiver {
        Value::Integer(n) => integer(*n, method, args),
        Value::Array(items) => {
            arity(args, 0)?;
            let items = items.borrow();
            match method {
                "size" | "length" => Ok(Value::Integer(items.len() as i64)),
                "first" => Ok(items.first().cloned().unwrap_or(Value::Nil)),
                "last" => Ok(items.last().cloned().unwrap_or(Value::Nil)),
                "empty?" => Ok(Value::Bool(items.is_empty())),
                _ => Err(no_method(receiver, method)),
            }
        }
        Value::Hash(entries) => {
            arity(args, 0)?;
            let entries = entries.borrow();
            match method {
                "size" | "length" => Ok(Value::Integer(entries.len() as i64)),
                "empty?" => Ok(Value::Bool(entries.is_empty())),
                _ => Err(no_method(receiver, method)),
            }
        }
        Value::String(s) => match method {
            "size" | "length" => {
                arity(args, 0)?;
                Ok(Value::Integer(s.chars().count() as i64))
            }
            _ => Err(no_method(receiver, method)),
        },
        Value::Object(object) => {
            if let Some(attr) = method.strip_suffix('=') {
                arity(args, 1)?;
                let value = args[0].clone();
                object
                    .borrow_mut()
                    .ivars
                    .insert(format!("@{}", attr), value.clone());
                return Ok(value);
            }
            arity(args, 0)?;
            let object = object.borrow();
            Ok(object
                .ivars
                .get(&format!("@{}", method))
                .cloned()
                .unwrap_or(Value::Nil))
        }
        Value::Nil | Value::Bool(_) | Value::Symbol(_) => Err(no_method(receiver, method)),
    }
}

fn integer(n: i64, method: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    let op = match method {
        "+" => i64::checked_add,
        "-" => i64::checked_sub,
        "*" => i64::checked_mul,
        _ => return Err(no_method(&Value::Integer(n), method)),
    };
    arity(args, 1)?;
    match &args[0] {
        Value::Integer(m) => op(n, *m).map(Value::Integer).ok_or(RuntimeError::IntegerOverflow),
        other => Err(RuntimeError::TypeError {
            message: format!("{} can't be coerced into Integer", other.class_name()),
        }),
    }
}

fn arity(args: &[Value], expected: usize) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::ArgumentCount {
            given: args.len(),
            expected,
        });
    }
    Ok(())
}

fn no_method(receiver: &Value, method: &str) -> RuntimeError {
    RuntimeError::NoMethod {
        method: method.to_string(),
        receiver: receiver.class_name(),
    }
}
