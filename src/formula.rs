//! Restricted arithmetic expressions over table columns.
//!
//! Computed columns are produced by evaluating a user-supplied formula
//! such as `np.sqrt(dx**2 + dy**2)` against a whitelist of already
//! loaded columns. The expression language is a small tokenizer plus a
//! recursive-descent parser: arithmetic, `**` power, comparisons and a
//! fixed set of elementwise math functions under the `np` namespace.
//! Nothing outside the whitelisted columns and that namespace is
//! reachable, and there is no ambient code execution to escape into.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ProteusError, Result};
use crate::table::LabeledTable;

/// The single function namespace expressions may use.
const FUNCTION_NAMESPACE: &str = "np";

// =============================================================================
// Tokens
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Power,
    LParen,
    RParen,
    Comma,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
}

fn tokenize(expression: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::Power);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::EqEq);
                    i += 2;
                } else {
                    return Err(ProteusError::formula("single '=' is not an operator; use '=='"));
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::NotEq);
                    i += 2;
                } else {
                    return Err(ProteusError::formula("unexpected '!' in formula"));
                }
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Scientific notation: 1.5e-3
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal.parse::<f64>().map_err(|_| {
                    ProteusError::formula(format!("invalid number literal '{}'", literal))
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = scan_ident(&chars, &mut i);
                // One dotted segment covers the function namespace: np.sqrt
                if chars.get(i) == Some(&'.')
                    && chars
                        .get(i + 1)
                        .is_some_and(|c| c.is_ascii_alphabetic() || *c == '_')
                {
                    i += 1;
                    name.push('.');
                    name.push_str(&scan_ident(&chars, &mut i));
                }
                tokens.push(Token::Ident(name));
            }
            c => {
                return Err(ProteusError::formula(format!(
                    "unexpected character '{}' in formula",
                    c
                )));
            }
        }
    }

    Ok(tokens)
}

fn scan_ident(chars: &[char], i: &mut usize) -> String {
    let start = *i;
    while *i < chars.len() && (chars[*i].is_ascii_alphanumeric() || chars[*i] == '_') {
        *i += 1;
    }
    chars[start..*i].iter().collect()
}

// =============================================================================
// Syntax Tree
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MathFunction {
    Sqrt,
    Abs,
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Log10,
    Power,
    Minimum,
    Maximum,
    Degrees,
    Radians,
}

impl MathFunction {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sqrt" => Some(Self::Sqrt),
            "abs" => Some(Self::Abs),
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "exp" => Some(Self::Exp),
            "log" => Some(Self::Log),
            "log10" => Some(Self::Log10),
            "power" => Some(Self::Power),
            "minimum" => Some(Self::Minimum),
            "maximum" => Some(Self::Maximum),
            "degrees" => Some(Self::Degrees),
            "radians" => Some(Self::Radians),
            _ => None,
        }
    }

    fn arity(&self) -> usize {
        match self {
            Self::Power | Self::Minimum | Self::Maximum => 2,
            _ => 1,
        }
    }

    fn apply1(&self, x: f64) -> f64 {
        match self {
            Self::Sqrt => x.sqrt(),
            Self::Abs => x.abs(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Exp => x.exp(),
            Self::Log => x.ln(),
            Self::Log10 => x.log10(),
            Self::Degrees => x.to_degrees(),
            Self::Radians => x.to_radians(),
            _ => unreachable!("two-argument function applied to one value"),
        }
    }

    fn apply2(&self, x: f64, y: f64) -> f64 {
        match self {
            Self::Power => x.powf(y),
            Self::Minimum => x.min(y),
            Self::Maximum => x.max(y),
            _ => unreachable!("one-argument function applied to two values"),
        }
    }
}

#[derive(Debug, Clone)]
enum Expr {
    Number(f64),
    Column(String),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        function: MathFunction,
        args: Vec<Expr>,
    },
}

// =============================================================================
// Parser
// =============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token, context: &str) -> Result<()> {
        match self.advance() {
            Some(ref token) if token == expected => Ok(()),
            other => Err(ProteusError::formula(format!(
                "expected {:?} {}, found {:?}",
                expected, context, other
            ))),
        }
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        let left = self.parse_additive()?;

        let op = match self.peek() {
            Some(Token::Lt) => Some(BinaryOp::Lt),
            Some(Token::Le) => Some(BinaryOp::Le),
            Some(Token::Gt) => Some(BinaryOp::Gt),
            Some(Token::Ge) => Some(BinaryOp::Ge),
            Some(Token::EqEq) => Some(BinaryOp::Eq),
            Some(Token::NotEq) => Some(BinaryOp::Ne),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let right = self.parse_additive()?;
            return Ok(Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // Power binds tighter than unary minus: -x**2 is -(x**2).
    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::Negate(Box::new(self.parse_unary()?)))
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;
        if self.peek() == Some(&Token::Power) {
            self.advance();
            // Right-associative; exponent re-enters unary so 2**-3 parses.
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::LParen) => {
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen, "to close parenthesis")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.advance();
                    self.parse_call(&name)
                } else if name.contains('.') {
                    Err(ProteusError::formula(format!("unknown name '{}'", name)))
                } else {
                    Ok(Expr::Column(name))
                }
            }
            other => Err(ProteusError::formula(format!(
                "unexpected token {:?} in formula",
                other
            ))),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<Expr> {
        let bare = match name.split_once('.') {
            Some((namespace, rest)) => {
                if namespace != FUNCTION_NAMESPACE {
                    return Err(ProteusError::formula(format!(
                        "unknown function namespace '{}'; only '{}' is available",
                        namespace, FUNCTION_NAMESPACE
                    )));
                }
                rest
            }
            None => name,
        };

        let function = MathFunction::from_name(bare)
            .ok_or_else(|| ProteusError::formula(format!("unknown function '{}'", name)))?;

        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.parse_expression()?);
                match self.peek() {
                    Some(Token::Comma) => {
                        self.advance();
                    }
                    _ => break,
                }
            }
        }
        self.expect(&Token::RParen, "to close function call")?;

        if args.len() != function.arity() {
            return Err(ProteusError::formula(format!(
                "function '{}' takes {} argument(s), got {}",
                name,
                function.arity(),
                args.len()
            )));
        }

        Ok(Expr::Call { function, args })
    }
}

fn parse(expression: &str) -> Result<Expr> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ProteusError::formula("empty formula"));
    }
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expression()?;
    if let Some(extra) = parser.peek() {
        return Err(ProteusError::formula(format!(
            "unexpected trailing token {:?} in formula",
            extra
        )));
    }
    Ok(expr)
}

// =============================================================================
// Evaluation
// =============================================================================

/// An intermediate result: a plain scalar or one value per table row.
#[derive(Debug, Clone)]
enum Value {
    Scalar(f64),
    Series(Vec<f64>),
}

impl Value {
    fn map(self, f: impl Fn(f64) -> f64) -> Value {
        match self {
            Value::Scalar(x) => Value::Scalar(f(x)),
            Value::Series(xs) => Value::Series(xs.into_iter().map(f).collect()),
        }
    }

    fn zip_with(self, other: Value, f: impl Fn(f64, f64) -> f64) -> Value {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(f(a, b)),
            (Value::Scalar(a), Value::Series(bs)) => {
                Value::Series(bs.into_iter().map(|b| f(a, b)).collect())
            }
            (Value::Series(xs), Value::Scalar(b)) => {
                Value::Series(xs.into_iter().map(|a| f(a, b)).collect())
            }
            (Value::Series(xs), Value::Series(ys)) => {
                Value::Series(xs.into_iter().zip(ys).map(|(a, b)| f(a, b)).collect())
            }
        }
    }
}

fn as_flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

fn evaluate(expr: &Expr, env: &HashMap<String, Vec<f64>>) -> Result<Value> {
    match expr {
        Expr::Number(value) => Ok(Value::Scalar(*value)),

        Expr::Column(name) => env.get(name).map(|v| Value::Series(v.clone())).ok_or_else(|| {
            ProteusError::formula(format!(
                "'{}' is not one of the selected columns",
                name
            ))
        }),

        Expr::Negate(inner) => Ok(evaluate(inner, env)?.map(|x| -x)),

        Expr::Binary { op, left, right } => {
            let a = evaluate(left, env)?;
            let b = evaluate(right, env)?;
            let combined = match op {
                BinaryOp::Add => a.zip_with(b, |x, y| x + y),
                BinaryOp::Sub => a.zip_with(b, |x, y| x - y),
                BinaryOp::Mul => a.zip_with(b, |x, y| x * y),
                BinaryOp::Div => a.zip_with(b, |x, y| x / y),
                BinaryOp::Pow => a.zip_with(b, f64::powf),
                BinaryOp::Lt => a.zip_with(b, |x, y| as_flag(x < y)),
                BinaryOp::Le => a.zip_with(b, |x, y| as_flag(x <= y)),
                BinaryOp::Gt => a.zip_with(b, |x, y| as_flag(x > y)),
                BinaryOp::Ge => a.zip_with(b, |x, y| as_flag(x >= y)),
                BinaryOp::Eq => a.zip_with(b, |x, y| as_flag(x == y)),
                BinaryOp::Ne => a.zip_with(b, |x, y| as_flag(x != y)),
            };
            Ok(combined)
        }

        Expr::Call { function, args } => match function.arity() {
            1 => {
                let x = evaluate(&args[0], env)?;
                Ok(x.map(|v| function.apply1(v)))
            }
            _ => {
                let x = evaluate(&args[0], env)?;
                let y = evaluate(&args[1], env)?;
                Ok(x.zip_with(y, |a, b| function.apply2(a, b)))
            }
        },
    }
}

/// Build the evaluation environment: exactly the whitelisted columns,
/// each bound under its full label. A multi-word label (`dx m`) also
/// binds its leading name token when that short name is unambiguous.
fn build_environment(table: &LabeledTable, allowed: &[String]) -> HashMap<String, Vec<f64>> {
    let mut env: HashMap<String, Vec<f64>> = HashMap::new();

    for name in allowed {
        match table.column(name) {
            Some(values) => {
                env.insert(name.clone(), values.to_vec());
            }
            None => {
                debug!("Selected column '{}' not present in table; skipping", name);
            }
        }
    }

    // Count short-name candidates before aliasing so duplicates stay out.
    let mut short_counts: HashMap<String, usize> = HashMap::new();
    for label in env.keys() {
        if let Some(short) = label.split_whitespace().next() {
            if short != label {
                *short_counts.entry(short.to_string()).or_insert(0) += 1;
            }
        }
    }

    let aliases: Vec<(String, Vec<f64>)> = env
        .iter()
        .filter_map(|(label, values)| {
            let short = label.split_whitespace().next()?;
            if short == label || env.contains_key(short) || short_counts[short] != 1 {
                return None;
            }
            Some((short.to_string(), values.clone()))
        })
        .collect();

    env.extend(aliases);
    env
}

/// Evaluate `expression` over the whitelisted columns of `table` and
/// return a copy of the table with the result appended under
/// `new_column_name` (replacing an existing column of that name).
///
/// Scalar results broadcast to every row. On any failure the original
/// table is left untouched and a `Formula` error is returned.
pub fn add_computed_column(
    table: &LabeledTable,
    allowed_columns: &[String],
    expression: &str,
    new_column_name: &str,
) -> Result<LabeledTable> {
    let expr = parse(expression)?;
    let env = build_environment(table, allowed_columns);
    let value = evaluate(&expr, &env)?;

    let values = match value {
        Value::Scalar(v) => vec![v; table.n_rows()],
        Value::Series(vs) => vs,
    };

    debug!(
        "Computed column '{}' from formula '{}'",
        new_column_name, expression
    );

    Ok(table.with_column(new_column_name, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnLabel, ColumnLayout};

    fn table_with(columns: &[(&str, Vec<f64>)]) -> LabeledTable {
        let layout: ColumnLayout = columns
            .iter()
            .map(|(label, _)| ColumnLabel::new(*label, ""))
            .collect();
        LabeledTable::new(layout, columns.iter().map(|(_, v)| v.clone()).collect())
    }

    fn owned(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_magnitude_formula() {
        let table = table_with(&[("dx", vec![3.0, 0.0]), ("dy", vec![4.0, 0.0])]);
        let result = add_computed_column(
            &table,
            &owned(&["dx", "dy"]),
            "np.sqrt(dx**2 + dy**2)",
            "mag",
        )
        .unwrap();
        assert_eq!(result.column("mag").unwrap(), &[5.0, 0.0]);
        assert_eq!(table.n_cols(), 2);
    }

    #[test]
    fn test_whitelist_is_enforced() {
        let table = table_with(&[("dx", vec![3.0]), ("dy", vec![4.0])]);
        let err = add_computed_column(&table, &owned(&["dx"]), "dx + dy", "out").unwrap_err();
        assert!(matches!(err, ProteusError::Formula { .. }));
        assert!(table.column("out").is_none());
    }

    #[test]
    fn test_scalar_broadcast() {
        let table = table_with(&[("a", vec![1.0, 2.0, 3.0])]);
        let result = add_computed_column(&table, &owned(&["a"]), "2 + 3 * 4", "c").unwrap();
        assert_eq!(result.column("c").unwrap(), &[14.0, 14.0, 14.0]);
    }

    #[test]
    fn test_power_precedence() {
        let table = table_with(&[("a", vec![2.0])]);
        let squared = add_computed_column(&table, &owned(&["a"]), "-a**2", "c").unwrap();
        assert_eq!(squared.column("c").unwrap(), &[-4.0]);

        let right_assoc = add_computed_column(&table, &owned(&["a"]), "2**3**2", "c").unwrap();
        assert_eq!(right_assoc.column("c").unwrap(), &[512.0]);

        let negative_exponent = add_computed_column(&table, &owned(&["a"]), "a**-1", "c").unwrap();
        assert_eq!(negative_exponent.column("c").unwrap(), &[0.5]);
    }

    #[test]
    fn test_comparison_yields_flags() {
        let table = table_with(&[("a", vec![1.0, 5.0, 3.0])]);
        let result = add_computed_column(&table, &owned(&["a"]), "a > 2", "flag").unwrap();
        assert_eq!(result.column("flag").unwrap(), &[0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_two_argument_functions() {
        let table = table_with(&[("a", vec![1.0, 9.0]), ("b", vec![4.0, 2.0])]);
        let result =
            add_computed_column(&table, &owned(&["a", "b"]), "np.maximum(a, b)", "m").unwrap();
        assert_eq!(result.column("m").unwrap(), &[4.0, 9.0]);

        let powered =
            add_computed_column(&table, &owned(&["a", "b"]), "np.power(b, 2)", "p").unwrap();
        assert_eq!(powered.column("p").unwrap(), &[16.0, 4.0]);
    }

    #[test]
    fn test_short_name_alias_for_labeled_columns() {
        let table = table_with(&[("dx m", vec![3.0]), ("dy m", vec![4.0])]);
        let result = add_computed_column(
            &table,
            &owned(&["dx m", "dy m"]),
            "np.sqrt(dx**2 + dy**2)",
            "mag",
        )
        .unwrap();
        assert_eq!(result.column("mag").unwrap(), &[5.0]);
    }

    #[test]
    fn test_syntax_errors() {
        let table = table_with(&[("a", vec![1.0])]);
        for bad in ["a +", "(a", "a = 1", "np.nosuch(a)", "sqrt(a, a)", "", "a $ 2"] {
            let err = add_computed_column(&table, &owned(&["a"]), bad, "c").unwrap_err();
            assert!(matches!(err, ProteusError::Formula { .. }), "formula: {bad}");
        }
    }

    #[test]
    fn test_replaces_existing_column() {
        let table = table_with(&[("a", vec![1.0, 2.0]), ("b", vec![5.0, 6.0])]);
        let result = add_computed_column(&table, &owned(&["a"]), "a * 10", "b").unwrap();
        assert_eq!(result.n_cols(), 2);
        assert_eq!(result.column("b").unwrap(), &[10.0, 20.0]);
        assert_eq!(result.labels(), vec!["a", "b"]);
    }

    #[test]
    fn test_bare_function_names_allowed() {
        let table = table_with(&[("a", vec![9.0])]);
        let result = add_computed_column(&table, &owned(&["a"]), "sqrt(a)", "c").unwrap();
        assert_eq!(result.column("c").unwrap(), &[3.0]);
    }
}
