//! Defines the registry and built-in implementations for filter functions.
//!
//! Functions compose left-to-right: the matched property's value (or key)
//! threads through the chain as the implicit first input, and each call's
//! output feeds the next.

use crate::error::SiftError;
use crate::parser::ast::{FunctionArg, FunctionCall};
use serde_json::Value;
use std::collections::HashMap;

/// Everything a function implementation receives per invocation.
pub struct FunctionInput<'a> {
    /// The threaded value: the property value for value chains, the property
    /// key (as a string value) for key chains.
    pub value: Value,
    /// Evaluated arguments, in source order.
    pub args: Vec<Value>,
    /// The key of the property being transformed.
    pub key: &'a str,
    /// The value of the enclosing node, when there is one.
    pub parent: Option<&'a Value>,
}

type FilterFunction = Box<dyn Fn(FunctionInput<'_>) -> Result<Value, SiftError> + Send + Sync>;

/// Name-indexed function registry, immutable once the engine is built.
pub struct FunctionRegistry {
    functions: HashMap<String, FilterFunction>,
}

impl FunctionRegistry {
    /// An empty registry with no functions at all.
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: &str, function: F)
    where
        F: Fn(FunctionInput<'_>) -> Result<Value, SiftError> + Send + Sync + 'static,
    {
        self.functions.insert(name.to_string(), Box::new(function));
    }

    /// Threads `initial` through the calls left-to-right.
    pub fn invoke(
        &self,
        initial: Value,
        key: &str,
        parent: Option<&Value>,
        calls: &[FunctionCall],
    ) -> Result<Value, SiftError> {
        let mut current = initial;
        for call in calls {
            current = self.invoke_one(current, key, parent, call)?;
        }
        Ok(current)
    }

    fn invoke_one(
        &self,
        value: Value,
        key: &str,
        parent: Option<&Value>,
        call: &FunctionCall,
    ) -> Result<Value, SiftError> {
        let function = self
            .functions
            .get(&call.name)
            .ok_or_else(|| SiftError::function(&call.name, "unknown function"))?;

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval_arg(arg, &value, key, parent)?);
        }

        function(FunctionInput {
            value,
            args,
            key,
            parent,
        })
    }

    fn eval_arg(
        &self,
        arg: &FunctionArg,
        current: &Value,
        key: &str,
        parent: Option<&Value>,
    ) -> Result<Value, SiftError> {
        match arg {
            FunctionArg::Literal(value) => Ok(value.clone()),
            FunctionArg::Ref(name) => Ok(Value::String(name.clone())),
            FunctionArg::Call(call) => self.invoke_one(current.clone(), key, parent, call),
        }
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("limit", func_limit);
        registry.register("upper", func_upper);
        registry.register("lower", func_lower);
        registry.register("trim", func_trim);
        registry.register("default", func_default);
        registry.register("reverse", func_reverse);
        registry
    }
}

// --- Built-in functions ---

fn func_limit(mut input: FunctionInput<'_>) -> Result<Value, SiftError> {
    if input.args.len() != 1 {
        return Err(SiftError::function("limit", "expected 1 argument"));
    }
    let n = input.args[0]
        .as_u64()
        .ok_or_else(|| SiftError::function("limit", "argument must be a non-negative integer"))?
        as usize;

    match &mut input.value {
        Value::Array(items) => {
            items.truncate(n);
            Ok(input.value)
        }
        Value::String(s) => Ok(Value::String(s.chars().take(n).collect())),
        _ => Ok(input.value),
    }
}

fn func_upper(input: FunctionInput<'_>) -> Result<Value, SiftError> {
    match input.value {
        Value::String(s) => Ok(Value::String(s.to_uppercase())),
        other => Ok(other),
    }
}

fn func_lower(input: FunctionInput<'_>) -> Result<Value, SiftError> {
    match input.value {
        Value::String(s) => Ok(Value::String(s.to_lowercase())),
        other => Ok(other),
    }
}

fn func_trim(input: FunctionInput<'_>) -> Result<Value, SiftError> {
    match input.value {
        Value::String(s) => Ok(Value::String(s.trim().to_string())),
        other => Ok(other),
    }
}

fn func_default(mut input: FunctionInput<'_>) -> Result<Value, SiftError> {
    if input.args.len() != 1 {
        return Err(SiftError::function("default", "expected 1 argument"));
    }
    match input.value {
        Value::Null => Ok(input.args.remove(0)),
        other => Ok(other),
    }
}

fn func_reverse(mut input: FunctionInput<'_>) -> Result<Value, SiftError> {
    match &mut input.value {
        Value::Array(items) => {
            items.reverse();
            Ok(input.value)
        }
        Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
        _ => Ok(input.value),
    }
}
