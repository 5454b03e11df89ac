//! Named functions callable from `{{ ... }}` actions

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use std::cmp::Ordering;

use super::eval::{is_truthy, render_value, type_name};

/// A function callable from templates
pub type Function = Arc<dyn Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync>;

/// Failure reported by a template function
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{message}")]
pub struct FunctionError {
    message: String,
}

impl FunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wrong number of arguments
    pub fn arity(expected: usize, found: usize) -> Self {
        Self::new(format!("expected {} argument(s), got {}", expected, found))
    }
}

/// Mapping from function name to callable
///
/// A [`View`](crate::View) keeps one table for every render; callers can pass
/// a second table per render whose entries win on name collisions.
#[derive(Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, Function>,
}

impl std::fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionTable")
            .field("functions", &names)
            .finish()
    }
}

impl FunctionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the built-in helpers
    ///
    /// `print`, `len`, `index` and `json`, the logic functions `not`, `and`
    /// and `or`, and the comparisons `eq`, `ne`, `lt`, `le`, `gt` and `ge`.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        table.insert("print", builtin_print);
        table.insert("len", builtin_len);
        table.insert("index", builtin_index);
        table.insert("json", builtin_json);
        table.insert("not", builtin_not);
        table.insert("and", builtin_and);
        table.insert("or", builtin_or);
        table.insert("eq", |args: &[Value]| compare(args, "eq", Ordering::is_eq));
        table.insert("ne", |args: &[Value]| compare(args, "ne", Ordering::is_ne));
        table.insert("lt", |args: &[Value]| compare(args, "lt", Ordering::is_lt));
        table.insert("le", |args: &[Value]| compare(args, "le", Ordering::is_le));
        table.insert("gt", |args: &[Value]| compare(args, "gt", Ordering::is_gt));
        table.insert("ge", |args: &[Value]| compare(args, "ge", Ordering::is_ge));
        table
    }

    /// Add or replace a function
    pub fn insert<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(f));
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.insert(name, f);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Copy of this table with `overrides` merged on top
    pub fn merged(&self, overrides: &FunctionTable) -> FunctionTable {
        let mut functions = self.functions.clone();
        functions.extend(
            overrides
                .functions
                .iter()
                .map(|(name, f)| (name.clone(), Arc::clone(f))),
        );
        FunctionTable { functions }
    }
}

/// Concatenate rendered arguments, space-separating adjacent non-strings
fn builtin_print(args: &[Value]) -> Result<Value, FunctionError> {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 && !arg.is_string() && !args[i - 1].is_string() {
            out.push(' ');
        }
        out.push_str(&render_value(arg));
    }
    Ok(Value::String(out))
}

fn builtin_len(args: &[Value]) -> Result<Value, FunctionError> {
    let [value] = args else {
        return Err(FunctionError::arity(1, args.len()));
    };
    let len = match value {
        Value::String(s) => s.len(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(FunctionError::new(format!(
                "len of {} value",
                type_name(other)
            )))
        }
    };
    Ok(Value::from(len))
}

/// `index .Items 0 "key"` walks arrays by position and objects by key
fn builtin_index(args: &[Value]) -> Result<Value, FunctionError> {
    let Some((first, keys)) = args.split_first() else {
        return Err(FunctionError::arity(1, 0));
    };
    let mut current = first;
    for key in keys {
        current = match (current, key) {
            (Value::Array(items), Value::Number(n)) => n
                .as_u64()
                .and_then(|i| items.get(i as usize))
                .ok_or_else(|| FunctionError::new(format!("index {} out of range", n)))?,
            (Value::Object(map), Value::String(k)) => map
                .get(k)
                .ok_or_else(|| FunctionError::new(format!("key '{}' not found", k)))?,
            (container, key) => {
                return Err(FunctionError::new(format!(
                    "cannot index {} with {}",
                    type_name(container),
                    type_name(key)
                )))
            }
        };
    }
    Ok(current.clone())
}

fn builtin_json(args: &[Value]) -> Result<Value, FunctionError> {
    let [value] = args else {
        return Err(FunctionError::arity(1, args.len()));
    };
    serde_json::to_string(value)
        .map(Value::String)
        .map_err(|e| FunctionError::new(e.to_string()))
}

fn builtin_not(args: &[Value]) -> Result<Value, FunctionError> {
    let [value] = args else {
        return Err(FunctionError::arity(1, args.len()));
    };
    Ok(Value::Bool(!is_truthy(value)))
}

/// First empty argument, or the last one
fn builtin_and(args: &[Value]) -> Result<Value, FunctionError> {
    let Some(last) = args.last() else {
        return Err(FunctionError::arity(1, 0));
    };
    Ok(args.iter().find(|v| !is_truthy(v)).unwrap_or(last).clone())
}

/// First non-empty argument, or the last one
fn builtin_or(args: &[Value]) -> Result<Value, FunctionError> {
    let Some(last) = args.last() else {
        return Err(FunctionError::arity(1, 0));
    };
    Ok(args.iter().find(|v| is_truthy(v)).unwrap_or(last).clone())
}

fn compare(
    args: &[Value],
    name: &str,
    accept: fn(Ordering) -> bool,
) -> Result<Value, FunctionError> {
    let [left, right] = args else {
        return Err(FunctionError::arity(2, args.len()));
    };
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) if matches!(name, "eq" | "ne") => Some(a.cmp(b)),
        (Value::Null, Value::Null) if matches!(name, "eq" | "ne") => Some(Ordering::Equal),
        _ => None,
    };
    match ordering {
        Some(ordering) => Ok(Value::Bool(accept(ordering))),
        None => Err(FunctionError::new(format!(
            "{}: incompatible types {} and {}",
            name,
            type_name(left),
            type_name(right)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(table: &FunctionTable, name: &str, args: &[Value]) -> Result<Value, FunctionError> {
        let f = table.get(name).expect("function should exist");
        f(args)
    }

    #[test]
    fn test_merged_override_wins() {
        let global = FunctionTable::new()
            .with("greet", |_| Ok(json!("global")))
            .with("only_global", |_| Ok(json!(1)));
        let local = FunctionTable::new().with("greet", |_| Ok(json!("local")));

        let merged = global.merged(&local);
        assert_eq!(merged.len(), 2);
        assert_eq!(call(&merged, "greet", &[]).unwrap(), json!("local"));
        assert!(merged.contains("only_global"));
    }

    #[test]
    fn test_builtin_print() {
        let table = FunctionTable::with_builtins();
        assert_eq!(
            call(&table, "print", &[json!("a"), json!(1), json!(2), json!("b")]).unwrap(),
            json!("a1 2b")
        );
    }

    #[test]
    fn test_builtin_len() {
        let table = FunctionTable::with_builtins();
        assert_eq!(call(&table, "len", &[json!([1, 2, 3])]).unwrap(), json!(3));
        assert_eq!(call(&table, "len", &[json!("héllo")]).unwrap(), json!(6));
        assert!(call(&table, "len", &[json!(3)]).is_err());
        assert_eq!(
            call(&table, "len", &[]).unwrap_err(),
            FunctionError::arity(1, 0)
        );
    }

    #[test]
    fn test_builtin_index() {
        let table = FunctionTable::with_builtins();
        let data = json!({"users": [{"name": "Ada"}]});
        assert_eq!(
            call(&table, "index", &[data.clone(), json!("users"), json!(0), json!("name")]).unwrap(),
            json!("Ada")
        );
        assert!(call(&table, "index", &[data, json!("users"), json!(5)]).is_err());
    }

    #[test]
    fn test_builtin_json() {
        let table = FunctionTable::with_builtins();
        assert_eq!(
            call(&table, "json", &[json!({"a": [1, true]})]).unwrap(),
            json!(r#"{"a":[1,true]}"#)
        );
    }

    #[test]
    fn test_builtin_logic() {
        let table = FunctionTable::with_builtins();
        assert_eq!(call(&table, "not", &[json!("")]).unwrap(), json!(true));
        assert_eq!(call(&table, "and", &[json!(1), json!(0), json!(2)]).unwrap(), json!(0));
        assert_eq!(call(&table, "and", &[json!(1), json!("x")]).unwrap(), json!("x"));
        assert_eq!(call(&table, "or", &[json!(null), json!("b")]).unwrap(), json!("b"));
        assert_eq!(call(&table, "or", &[json!(0), json!([])]).unwrap(), json!([]));
    }

    #[test]
    fn test_builtin_comparisons() {
        let table = FunctionTable::with_builtins();
        assert_eq!(call(&table, "eq", &[json!(1), json!(1.0)]).unwrap(), json!(true));
        assert_eq!(call(&table, "ne", &[json!("a"), json!("b")]).unwrap(), json!(true));
        assert_eq!(call(&table, "lt", &[json!(2), json!(10)]).unwrap(), json!(true));
        assert_eq!(call(&table, "ge", &[json!("b"), json!("a")]).unwrap(), json!(true));
        assert_eq!(call(&table, "eq", &[json!(true), json!(true)]).unwrap(), json!(true));
        assert!(call(&table, "lt", &[json!(true), json!(false)]).is_err());
        assert!(call(&table, "eq", &[json!(1), json!("1")]).is_err());
        assert_eq!(
            call(&table, "gt", &[json!(1)]).unwrap_err(),
            FunctionError::arity(2, 1)
        );
    }

    #[test]
    fn test_debug_lists_names() {
        let table = FunctionTable::new().with("b", |_| Ok(Value::Null)).with("a", |_| Ok(Value::Null));
        assert_eq!(format!("{:?}", table), r#"FunctionTable { functions: ["a", "b"] }"#);
    }
}
