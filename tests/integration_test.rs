use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use vibegraph::datatypes::{DataSet, Row, Value};
use vibegraph::expression::{
    decode, encode, rewrite_label_attributes, ExprVisitor, Expression, ExpressionError,
    LabelExpr, LabelRenamer, ListComprehensionExpr, PredicateExpr, ReduceExpr, VariableContext,
    Visit,
};
use vibegraph::response::{ErrorCode, ExecutionResponse};

fn person(name: &str, age: i64) -> Value {
    let mut props = BTreeMap::new();
    props.insert("name".to_string(), Value::string(name));
    props.insert("age".to_string(), Value::Int(age));
    Value::Map(props)
}

fn people() -> Value {
    Value::list(vec![
        person("Tim", 42),
        person("Tony", 28),
        person("Ann", 35),
        person("Bob", 19),
    ])
}

/// `[p IN people WHERE p.age >= 30 | p.name]`, as the parser would hand it over
fn adult_names() -> Expression {
    ListComprehensionExpr::new("p", Expression::label("people"))
        .unwrap()
        .with_filter(Expression::ge(
            Expression::label_attribute("p", "age"),
            Expression::int(30),
        ))
        .with_mapping(Expression::label_attribute("p", "name"))
        .with_origin_string("[p IN people WHERE p.age >= 30 | p.name]")
        .into()
}

#[test]
fn test_parse_rewrite_ship_evaluate() {
    let mut expr = adult_names();
    assert!(matches!(
        expr.ensure_resolved(),
        Err(ExpressionError::UnsupportedNode { .. })
    ));

    assert_eq!(rewrite_label_attributes(&mut expr), 2);
    expr.ensure_resolved().unwrap();

    let bytes = encode(&expr).unwrap();
    let received = decode(&bytes).unwrap();
    assert_eq!(received, expr);
    assert_eq!(
        received.to_string(),
        "[p IN people WHERE p.age >= 30 | p.name]"
    );

    let ctx = VariableContext::new().with_var("people", people());
    assert_eq!(
        received.evaluate(&ctx).unwrap(),
        Value::list(vec![Value::string("Tim"), Value::string("Ann")])
    );
}

#[test]
fn test_quantifiers_over_rewritten_properties() {
    let ctx = VariableContext::new().with_var("people", people());
    let age_over = |kind: &str, age: i64| -> Expression {
        let mut expr: Expression = PredicateExpr::new(
            kind,
            "p",
            Expression::label("people"),
            Some(Expression::gt(
                Expression::label_attribute("p", "age"),
                Expression::int(age),
            )),
        )
        .unwrap()
        .into();
        rewrite_label_attributes(&mut expr);
        expr
    };

    assert_eq!(age_over("all", 18).evaluate(&ctx).unwrap(), Value::Bool(true));
    assert_eq!(age_over("ANY", 40).evaluate(&ctx).unwrap(), Value::Bool(true));
    assert_eq!(age_over("single", 40).evaluate(&ctx).unwrap(), Value::Bool(true));
    assert_eq!(age_over("single", 30).evaluate(&ctx).unwrap(), Value::Bool(false));
    assert_eq!(age_over("none", 50).evaluate(&ctx).unwrap(), Value::Bool(true));

    let exists: Expression = PredicateExpr::exists(Expression::label("people")).into();
    assert_eq!(exists.evaluate(&ctx).unwrap(), Value::Bool(true));

    assert!(matches!(
        PredicateExpr::new("most", "p", Expression::label("people"), None),
        Err(ExpressionError::Construction { .. })
    ));
}

#[test]
fn test_total_age_with_reduce() {
    let mut expr: Expression = ReduceExpr::new(
        "total",
        Expression::int(0),
        "p",
        Expression::label("people"),
        Expression::add(
            Expression::label("total"),
            Expression::label_attribute("p", "age"),
        ),
    )
    .unwrap()
    .into();
    rewrite_label_attributes(&mut expr);

    let ctx = VariableContext::new().with_var("people", people());
    assert_eq!(expr.evaluate(&ctx).unwrap(), Value::Int(124));

    let empty = VariableContext::new().with_var("people", Value::List(Vec::new()));
    assert_eq!(expr.evaluate(&empty).unwrap(), Value::Int(0));
}

#[test]
fn test_shadowed_binding_survives() {
    let expr: Expression = ListComprehensionExpr::new("x", Expression::label("xs"))
        .unwrap()
        .with_mapping(Expression::add(Expression::label("x"), Expression::int(1)))
        .into();
    let wrapped = Expression::list(vec![expr, Expression::label("x")]);

    let ctx = VariableContext::new()
        .with_var("x", Value::string("outer"))
        .with_var("xs", Value::list(vec![Value::Int(1), Value::Int(2)]));
    assert_eq!(
        wrapped.evaluate(&ctx).unwrap(),
        Value::list(vec![
            Value::list(vec![Value::Int(2), Value::Int(3)]),
            Value::string("outer"),
        ])
    );
    assert_eq!(ctx.get("x"), Some(&Value::string("outer")));
}

#[test]
fn test_clone_is_independent() {
    let original = {
        let mut expr = adult_names();
        rewrite_label_attributes(&mut expr);
        expr
    };
    let mut copy = original.clone();
    assert_eq!(copy, original);

    let mut renamer = LabelRenamer::new("people", "staff");
    copy.accept(&mut renamer);
    assert_eq!(renamer.renamed(), 1);
    assert_ne!(copy, original);
    assert_eq!(
        original.children()[0],
        &Expression::label("people")
    );
}

#[test]
#[should_panic(expected = "has to be rewritten before evaluation")]
fn test_evaluating_placeholder_is_fatal() {
    let ctx = VariableContext::new().with_var("people", people());
    let _ = adult_names().evaluate(&ctx);
}

#[test]
fn test_concurrent_evaluation_of_shared_tree() {
    let expr = Arc::new({
        let mut expr: Expression = ReduceExpr::new(
            "acc",
            Expression::int(0),
            "x",
            Expression::label("xs"),
            Expression::add(Expression::label("acc"), Expression::label("x")),
        )
        .unwrap()
        .into();
        expr.ensure_resolved().unwrap();
        expr
    });

    let handles: Vec<_> = (0..8i64)
        .map(|i| {
            let expr = Arc::clone(&expr);
            thread::spawn(move || {
                let ctx = VariableContext::new()
                    .with_var("xs", Value::list((0..=i).map(Value::Int)));
                expr.evaluate(&ctx).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let i = i as i64;
        assert_eq!(handle.join().unwrap(), Value::Int(i * (i + 1) / 2));
    }
}

/// Collects every label name in field order
#[derive(Default)]
struct Labels(Vec<String>);

impl ExprVisitor for Labels {
    fn visit_label(&mut self, label: &mut LabelExpr) -> Visit {
        self.0.push(label.name().to_string());
        Visit::Continue
    }
}

#[test]
fn test_visitor_sees_decoded_tree() {
    let mut expr = adult_names();
    rewrite_label_attributes(&mut expr);
    let mut decoded = decode(&encode(&expr).unwrap()).unwrap();

    let mut labels = Labels::default();
    decoded.accept(&mut labels);
    assert_eq!(labels.0, vec!["people", "p", "p"]);
}

#[test]
fn test_result_in_response() {
    let mut expr = adult_names();
    rewrite_label_attributes(&mut expr);
    let ctx = VariableContext::new().with_var("people", people());

    let mut data = DataSet::new(vec!["names".to_string()]);
    data.push_row(Row::new(vec![expr.evaluate(&ctx).unwrap()]));
    let response = ExecutionResponse::succeeded(data);
    assert_eq!(response.error_code, ErrorCode::Succeeded);

    let bytes = response.serialize().unwrap();
    assert_eq!(ExecutionResponse::deserialize(&bytes).unwrap(), response);
}
