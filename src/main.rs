//! vibegraph - inspect and evaluate encoded graph query expressions

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use log::{debug, info};
use vibegraph::datatypes::Value;
use vibegraph::expression::{
    self, Expression, ListComprehensionExpr, PredicateExpr, ReduceExpr, VariableContext,
};

/// Inspect and evaluate expressions in their wire format
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Maximum nesting depth accepted when decoding
    #[arg(long, global = true, default_value = "512")]
    max_depth: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a hex-encoded expression and print it
    Render {
        /// Hex-encoded wire bytes
        hex: String,
    },
    /// Decode a hex-encoded expression and evaluate it
    Eval {
        /// Hex-encoded wire bytes
        hex: String,

        /// Variable binding, e.g. `--bind xs=[1,[2,3],"a,b"]`
        #[arg(short, long = "bind", value_name = "NAME=VALUE")]
        bindings: Vec<String>,
    },
    /// Print the hex encoding of a few sample expressions
    Sample,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let options = expression::DecodeOptions {
        max_depth: args.max_depth,
    };

    match args.command {
        Command::Render { hex } => {
            let expr = decode_hex(&hex, &options)?;
            println!("{}", expr);
        }
        Command::Eval { hex, bindings } => {
            let expr = decode_hex(&hex, &options)?;
            let mut ctx = VariableContext::new();
            for binding in &bindings {
                let (name, value) = parse_binding(binding)?;
                debug!("binding {} = {}", name, value);
                ctx.set(name, value);
            }
            let value = expr
                .evaluate(&ctx)
                .with_context(|| format!("Failed to evaluate {}", expr))?;
            println!("{}", value);
        }
        Command::Sample => {
            for expr in samples()? {
                let bytes = expression::encode(&expr)
                    .with_context(|| format!("Failed to encode {}", expr))?;
                println!("{}\t{}", hex::encode(bytes), expr);
            }
        }
    }

    Ok(())
}

fn decode_hex(input: &str, options: &expression::DecodeOptions) -> Result<Expression> {
    let bytes = hex::decode(input.trim()).context("Expression is not valid hex")?;
    info!("decoding {} bytes", bytes.len());
    expression::decode_with(&bytes, options).context("Failed to decode expression")
}

/// Parse `name=value`, where value is `null`, a boolean, a number, a
/// double-quoted string, a `[a,b,...]` list (possibly nested), or a bare
/// string
fn parse_binding(binding: &str) -> Result<(String, Value)> {
    let Some((name, value)) = binding.split_once('=') else {
        bail!("Binding `{}' is not of the form NAME=VALUE", binding);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Binding `{}' has an empty name", binding);
    }
    let value = parse_value(value.trim())
        .with_context(|| format!("Invalid value in binding `{}'", binding))?;
    Ok((name.to_string(), value))
}

fn parse_value(text: &str) -> Result<Value> {
    if let Some(rest) = text.strip_prefix('[') {
        let Some(inner) = rest.strip_suffix(']') else {
            bail!("List `{}' is missing its closing `]'", text);
        };
        if inner.trim().is_empty() {
            return Ok(Value::List(Vec::new()));
        }
        let items = split_list_items(inner)?
            .into_iter()
            .map(|item| parse_value(item.trim()))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Value::List(items));
    }
    if let Some(rest) = text.strip_prefix('"') {
        let Some(inner) = rest.strip_suffix('"') else {
            bail!("String `{}' is missing its closing quote", text);
        };
        return Ok(Value::string(inner));
    }
    let value = match text {
        "null" | "NULL" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = text.parse::<i64>() {
                Value::Int(n)
            } else if let Ok(x) = text.parse::<f64>() {
                Value::Float(x)
            } else {
                Value::string(text)
            }
        }
    };
    Ok(value)
}

/// Split the inside of a list literal on top-level commas. Commas inside
/// nested brackets or double quotes belong to the item.
fn split_list_items(inner: &str) -> Result<Vec<&str>> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '[' if !quoted => depth += 1,
            ']' if !quoted => {
                depth = depth
                    .checked_sub(1)
                    .with_context(|| format!("Unbalanced `]' in `[{}]'", inner))?;
            }
            ',' if !quoted && depth == 0 => {
                items.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if quoted {
        bail!("Unterminated string in `[{}]'", inner);
    }
    if depth != 0 {
        bail!("Unbalanced `[' in `[{}]'", inner);
    }
    items.push(&inner[start..]);
    Ok(items)
}

fn samples() -> Result<Vec<Expression>> {
    let x = || Expression::label("x");
    Ok(vec![
        ListComprehensionExpr::new("x", Expression::label("xs"))?
            .with_filter(Expression::eq(
                Expression::modulo(x(), Expression::int(2)),
                Expression::int(0),
            ))
            .with_mapping(Expression::mul(x(), x()))
            .into(),
        PredicateExpr::new(
            "single",
            "x",
            Expression::label("xs"),
            Some(Expression::eq(x(), Expression::int(2))),
        )?
        .into(),
        ReduceExpr::new(
            "acc",
            Expression::int(0),
            "x",
            Expression::label("xs"),
            Expression::add(Expression::label("acc"), x()),
        )?
        .into(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binding() {
        assert_eq!(
            parse_binding("xs=[1, 2, \"a\"]").unwrap(),
            (
                "xs".to_string(),
                Value::list(vec![Value::Int(1), Value::Int(2), Value::string("a")])
            )
        );
        assert_eq!(parse_binding("n = 2.5").unwrap().1, Value::Float(2.5));
        assert_eq!(parse_binding("v=null").unwrap().1, Value::Null);
        assert_eq!(parse_binding("s=tim").unwrap().1, Value::string("tim"));
        assert_eq!(parse_binding("e=[]").unwrap().1, Value::List(Vec::new()));
        assert!(parse_binding("novalue").is_err());
        assert!(parse_binding("=1").is_err());
    }

    #[test]
    fn test_parse_nested_and_quoted_lists() {
        assert_eq!(
            parse_binding("xs=[\"a,b\", c]").unwrap().1,
            Value::list(vec![Value::string("a,b"), Value::string("c")])
        );
        assert_eq!(
            parse_binding("xs=[[1,2],3]").unwrap().1,
            Value::list(vec![
                Value::list(vec![Value::Int(1), Value::Int(2)]),
                Value::Int(3)
            ])
        );
        assert_eq!(
            parse_binding("xs=[[], [\"]\"]]").unwrap().1,
            Value::list(vec![
                Value::List(Vec::new()),
                Value::list(vec![Value::string("]")])
            ])
        );
        assert!(parse_binding("xs=[1,2").is_err());
        assert!(parse_binding("xs=[[1,2]").is_err());
        assert!(parse_binding("xs=[1],2]").is_err());
        assert!(parse_binding("xs=[\"a,b]").is_err());
        assert!(parse_binding("s=\"open").is_err());
    }

    #[test]
    fn test_samples_evaluate() {
        let ctx = VariableContext::new().with_var(
            "xs",
            Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]),
        );
        let results = samples()
            .unwrap()
            .iter()
            .map(|expr| {
                let bytes = hex::encode(expression::encode(expr).unwrap());
                decode_hex(&bytes, &expression::DecodeOptions::default())
                    .unwrap()
                    .evaluate(&ctx)
                    .unwrap()
            })
            .collect::<Vec<_>>();
        assert_eq!(
            results,
            vec![
                Value::list(vec![Value::Int(4), Value::Int(16)]),
                Value::Bool(true),
                Value::Int(10),
            ]
        );
    }
}
