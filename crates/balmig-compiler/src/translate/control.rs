//! Routing and exception-strategy nodes.

use super::expr::{convert_expr, convert_identifier};
use super::{convert_blocks, CONTEXT_REF, ERROR_TYPE, ON_FAIL_ERROR_VAR};
use crate::context::Context;
use crate::diagnostic::MigrateError;
use crate::ir::{ElseIf, Expression, OnFail, Statement};
use crate::legacy::{CatchStrategy, FlowNode, WhenClause};

/// `if A {..} else if B {..} else {..}`, clauses kept in declaration order.
pub(super) fn convert_choice(
    ctx: &mut Context,
    whens: &[WhenClause],
    otherwise: &[FlowNode],
) -> Result<Vec<Statement>, MigrateError> {
    let Some((first, rest)) = whens.split_first() else {
        return Err(MigrateError::invariant("choice", "a choice router needs at least one when clause"));
    };

    let condition = Expression::from(convert_expr(&first.condition));
    let then_body = convert_blocks(ctx, &first.blocks)?;

    let mut else_ifs = Vec::with_capacity(rest.len());
    for when in rest {
        else_ifs.push(ElseIf {
            condition: Expression::from(convert_expr(&when.condition)),
            body: convert_blocks(ctx, &when.blocks)?,
        });
    }

    let else_body = convert_blocks(ctx, otherwise)?;

    Ok(vec![Statement::IfElse {
        condition,
        then_body,
        else_ifs,
        else_body,
    }])
}

/// `do { } on fail { .. }`; the preceding statements are moved into the
/// `do` body by the top-level conversion.
pub(super) fn convert_catch_exception_strategy(
    ctx: &mut Context,
    strategy: &CatchStrategy,
) -> Result<Vec<Statement>, MigrateError> {
    let handler = convert_blocks(ctx, &strategy.blocks)?;
    Ok(vec![Statement::Do {
        body: Vec::new(),
        on_fail: OnFail::untyped(handler),
    }])
}

/// Catch strategies chained into one `on fail error e` handler.
///
/// When more than one strategy is declared, the last one becomes the `else`
/// arm whatever its predicate says.
pub(super) fn convert_choice_exception_strategy(
    ctx: &mut Context,
    strategies: &[CatchStrategy],
) -> Result<Vec<Statement>, MigrateError> {
    let Some((first, rest)) = strategies.split_first() else {
        return Err(MigrateError::invariant(
            "choice-exception-strategy",
            "a choice exception strategy needs at least one catch strategy",
        ));
    };

    let condition = strategy_condition(first);
    let then_body = convert_blocks(ctx, &first.blocks)?;

    let (middle, last) = match rest.split_last() {
        Some((last, middle)) => (middle, Some(last)),
        None => (rest, None),
    };

    let mut else_ifs = Vec::with_capacity(middle.len());
    for strategy in middle {
        else_ifs.push(ElseIf {
            condition: strategy_condition(strategy),
            body: convert_blocks(ctx, &strategy.blocks)?,
        });
    }

    let else_body = match last {
        Some(strategy) => convert_blocks(ctx, &strategy.blocks)?,
        None => Vec::new(),
    };

    let chain = Statement::IfElse {
        condition,
        then_body,
        else_ifs,
        else_body,
    };
    let handler = vec![
        Statement::comment("TODO: if conditions may require some manual adjustments"),
        chain,
    ];

    Ok(vec![Statement::Do {
        body: Vec::new(),
        on_fail: OnFail::bound(handler, ERROR_TYPE, ON_FAIL_ERROR_VAR),
    }])
}

fn strategy_condition(strategy: &CatchStrategy) -> Expression {
    match &strategy.when {
        Some(when) => Expression::from(convert_expr(when)),
        None => Expression::from("true"),
    }
}

/// Delegates to a named, separately translated handler.
pub(super) fn convert_reference_exception_strategy(ctx: &mut Context, ref_name: &str) -> Vec<Statement> {
    let handler = ctx
        .analysis
        .function_name_for(ref_name)
        .map(str::to_string)
        .unwrap_or_else(|| convert_identifier(ref_name));
    let call = Statement::literal(format!("{}({}, {});", handler, CONTEXT_REF, ON_FAIL_ERROR_VAR));
    vec![Statement::Do {
        body: Vec::new(),
        on_fail: OnFail::bound(vec![call], ERROR_TYPE, ON_FAIL_ERROR_VAR),
    }]
}
