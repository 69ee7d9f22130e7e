use std::{
    collections::{BTreeMap, HashMap},
    sync::LazyLock,
};

use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    diagnostic::DiagnosticKind,
    value::{Value, ValueKind},
};

/// Signature of a built-in: receives already evaluated arguments, exactly as
/// many as it was registered for. Errors are positioned by the evaluator.
pub type BuiltinFn = fn(&[Value]) -> Result<Value, DiagnosticKind>;

/// Lookup table of built-in functions keyed by name and arity.
///
/// A registry is populated once and then only read; evaluators borrow it, so
/// one registry can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, BTreeMap<usize, BuiltinFn>>,
}

/// Outcome of resolving a call site against a registry.
#[derive(Debug)]
pub enum Lookup {
    Found(BuiltinFn),
    /// The name exists but not with this number of arguments
    WrongArity { expected: Vec<usize> },
    Unknown,
}

static STANDARD: LazyLock<FunctionRegistry> = LazyLock::new(FunctionRegistry::standard);

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared standard registry, built on first use.
    pub fn global() -> &'static FunctionRegistry {
        &STANDARD
    }

    /// A fresh registry containing the standard built-ins.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register("len", 1, builtin_len)
            .register("upper", 1, builtin_upper)
            .register("lower", 1, builtin_lower)
            .register("trim", 1, builtin_trim)
            .register("abs", 1, builtin_abs)
            .register("floor", 1, builtin_floor)
            .register("ceil", 1, builtin_ceil)
            .register("round", 1, builtin_round)
            .register("round", 2, builtin_round_places)
            .register("min", 1, builtin_min_of)
            .register("max", 1, builtin_max_of)
            .register("min", 2, builtin_min)
            .register("max", 2, builtin_max)
            .register("sum", 1, builtin_sum)
            .register("contains", 2, builtin_contains)
            .register("starts_with", 2, builtin_starts_with)
            .register("ends_with", 2, builtin_ends_with)
            .register("matches", 2, builtin_matches)
            .register("keys", 1, builtin_keys)
            .register("type", 1, builtin_type)
            .register("string", 1, builtin_string);
        registry
    }

    /// Adds (or replaces) the implementation for `name` called with `arity` arguments.
    pub fn register(&mut self, name: &str, arity: usize, function: BuiltinFn) -> &mut Self {
        self.functions
            .entry(name.to_string())
            .or_default()
            .insert(arity, function);
        self
    }

    pub fn lookup(&self, name: &str, arity: usize) -> Lookup {
        match self.functions.get(name) {
            None => Lookup::Unknown,
            Some(overloads) => match overloads.get(&arity) {
                Some(function) => Lookup::Found(*function),
                None => Lookup::WrongArity {
                    expected: overloads.keys().copied().collect(),
                },
            },
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Every `(name, arity)` pair, sorted by name then arity.
    pub fn signatures(&self) -> Vec<(String, usize)> {
        let mut signatures: Vec<(String, usize)> = self
            .functions
            .iter()
            .flat_map(|(name, overloads)| overloads.keys().map(move |arity| (name.clone(), *arity)))
            .collect();
        signatures.sort();
        signatures
    }
}

// ========================================
// Argument helpers
// ========================================

fn mismatch(function: &str, args: &[Value]) -> DiagnosticKind {
    let kinds: Vec<ValueKind> = args.iter().map(Value::kind).collect();
    DiagnosticKind::type_mismatch(function, &kinds)
}

fn number_arg(function: &str, args: &[Value], index: usize) -> Result<f64, DiagnosticKind> {
    args[index].as_number().ok_or_else(|| mismatch(function, args))
}

fn string_arg<'a>(function: &str, args: &'a [Value], index: usize) -> Result<&'a str, DiagnosticKind> {
    args[index].as_str().ok_or_else(|| mismatch(function, args))
}

// ========================================
// String and collection functions
// ========================================

/// len(x) - characters of a string, elements of a list, fields of a record
fn builtin_len(args: &[Value]) -> Result<Value, DiagnosticKind> {
    let length = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Record(fields) => fields.len(),
        _ => return Err(mismatch("len", args)),
    };
    Ok(Value::Number(length as f64))
}

fn builtin_upper(args: &[Value]) -> Result<Value, DiagnosticKind> {
    Ok(Value::String(string_arg("upper", args, 0)?.to_uppercase()))
}

fn builtin_lower(args: &[Value]) -> Result<Value, DiagnosticKind> {
    Ok(Value::String(string_arg("lower", args, 0)?.to_lowercase()))
}

fn builtin_trim(args: &[Value]) -> Result<Value, DiagnosticKind> {
    Ok(Value::String(string_arg("trim", args, 0)?.trim().to_string()))
}

/// contains(haystack, needle) - substring, list membership or record key
fn builtin_contains(args: &[Value]) -> Result<Value, DiagnosticKind> {
    let found = match (&args[0], &args[1]) {
        (Value::String(s), Value::String(sub)) => s.contains(sub.as_str()),
        (Value::List(items), needle) => items.contains(needle),
        (Value::Record(fields), Value::String(key)) => fields.contains_key(key),
        _ => return Err(mismatch("contains", args)),
    };
    Ok(Value::Boolean(found))
}

fn builtin_starts_with(args: &[Value]) -> Result<Value, DiagnosticKind> {
    let s = string_arg("starts_with", args, 0)?;
    let prefix = string_arg("starts_with", args, 1)?;
    Ok(Value::Boolean(s.starts_with(prefix)))
}

fn builtin_ends_with(args: &[Value]) -> Result<Value, DiagnosticKind> {
    let s = string_arg("ends_with", args, 0)?;
    let suffix = string_arg("ends_with", args, 1)?;
    Ok(Value::Boolean(s.ends_with(suffix)))
}

/// matches(s, pattern) - true if the regular expression matches anywhere in s
fn builtin_matches(args: &[Value]) -> Result<Value, DiagnosticKind> {
    let s = string_arg("matches", args, 0)?;
    let pattern = string_arg("matches", args, 1)?;
    let re = regex::Regex::new(pattern).map_err(|e| DiagnosticKind::InvalidArgument {
        function: "matches".to_string(),
        message: format!("invalid regex: {e}"),
    })?;
    Ok(Value::Boolean(re.is_match(s)))
}

fn builtin_keys(args: &[Value]) -> Result<Value, DiagnosticKind> {
    match &args[0] {
        Value::Record(fields) => Ok(Value::List(
            fields.keys().map(|k| Value::String(k.clone())).collect(),
        )),
        _ => Err(mismatch("keys", args)),
    }
}

/// type(x) - the kind name as a string
fn builtin_type(args: &[Value]) -> Result<Value, DiagnosticKind> {
    Ok(Value::String(args[0].kind().to_string()))
}

/// string(x) - strings unchanged, anything else in its display form
fn builtin_string(args: &[Value]) -> Result<Value, DiagnosticKind> {
    match &args[0] {
        Value::String(s) => Ok(Value::String(s.clone())),
        other => Ok(Value::String(other.to_string())),
    }
}

// ========================================
// Numeric functions
// ========================================

fn builtin_abs(args: &[Value]) -> Result<Value, DiagnosticKind> {
    Ok(Value::Number(number_arg("abs", args, 0)?.abs()))
}

fn builtin_floor(args: &[Value]) -> Result<Value, DiagnosticKind> {
    Ok(Value::Number(number_arg("floor", args, 0)?.floor()))
}

fn builtin_ceil(args: &[Value]) -> Result<Value, DiagnosticKind> {
    Ok(Value::Number(number_arg("ceil", args, 0)?.ceil()))
}

fn builtin_round(args: &[Value]) -> Result<Value, DiagnosticKind> {
    Ok(round_to(number_arg("round", args, 0)?, 0))
}

/// round(n, places) - rounds half away from zero on the decimal digits as written
fn builtin_round_places(args: &[Value]) -> Result<Value, DiagnosticKind> {
    let n = number_arg("round", args, 0)?;
    let places = match &args[1] {
        Value::Number(_) => match args[1].as_integer() {
            Some(p) if (0..=28).contains(&p) => p as u32,
            _ => {
                return Err(DiagnosticKind::InvalidArgument {
                    function: "round".to_string(),
                    message: "decimal places must be a whole number between 0 and 28".to_string(),
                });
            }
        },
        _ => return Err(mismatch("round", args)),
    };
    Ok(round_to(n, places))
}

fn round_to(n: f64, places: u32) -> Value {
    // 2^52; every double at or above this magnitude is already whole
    const WHOLE_BOUND: f64 = 4_503_599_627_370_496.0;
    if !n.is_finite() || n.abs() >= WHOLE_BOUND {
        return Value::Number(n);
    }
    // Going through Decimal rounds 2.675 to 2.68 rather than the binary 2.67
    let rounded = Decimal::from_f64(n)
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| {
            let factor = 10f64.powi(places as i32);
            (n * factor).round() / factor
        });
    Value::Number(rounded)
}

fn builtin_sum(args: &[Value]) -> Result<Value, DiagnosticKind> {
    let Value::List(items) = &args[0] else {
        return Err(mismatch("sum", args));
    };
    let mut total = 0.0;
    for item in items {
        total += item.as_number().ok_or_else(|| mismatch("sum", items))?;
    }
    Ok(Value::Number(total))
}

/// Picks the smallest (or largest) of two numbers or two strings.
fn pick(function: &str, a: &Value, b: &Value, want_max: bool) -> Result<Value, DiagnosticKind> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_)) => {
            let b_wins = if want_max { b > a } else { b < a };
            Ok(if b_wins { b.clone() } else { a.clone() })
        }
        _ => Err(DiagnosticKind::type_mismatch(function, &[a.kind(), b.kind()])),
    }
}

fn builtin_min(args: &[Value]) -> Result<Value, DiagnosticKind> {
    pick("min", &args[0], &args[1], false)
}

fn builtin_max(args: &[Value]) -> Result<Value, DiagnosticKind> {
    pick("max", &args[0], &args[1], true)
}

fn extreme_of(function: &str, args: &[Value], want_max: bool) -> Result<Value, DiagnosticKind> {
    let Value::List(items) = &args[0] else {
        return Err(mismatch(function, args));
    };
    let Some((first, rest)) = items.split_first() else {
        return Err(DiagnosticKind::InvalidArgument {
            function: function.to_string(),
            message: "list is empty".to_string(),
        });
    };
    let mut best = first.clone();
    for item in rest {
        best = pick(function, &best, item, want_max)?;
    }
    // A single-element list still has to hold a comparable kind
    pick(function, &best, &best, want_max)
}

/// min(list) - smallest element of a non-empty list of numbers or strings
fn builtin_min_of(args: &[Value]) -> Result<Value, DiagnosticKind> {
    extreme_of("min", args, false)
}

/// max(list) - largest element of a non-empty list of numbers or strings
fn builtin_max_of(args: &[Value]) -> Result<Value, DiagnosticKind> {
    extreme_of("max", args, true)
}
