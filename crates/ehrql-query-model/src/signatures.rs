//! Operator signatures
//!
//! Each [`Function`] declares its arity and accepted operand types. Checking
//! happens when a function node is built; the engine can rely on operands
//! having the declared types.

use ehrql_types::Type;

use crate::error::ValidationReason;
use crate::model::Function;

/// Result type of applying `op` to operands of the given types
pub fn result_type(op: Function, args: &[&Type]) -> Result<Type, ValidationReason> {
    use Function::*;

    match op {
        Eq | Ne => {
            let [lhs, rhs] = exactly::<2>(args)?;
            same_type(op, lhs, rhs)?;
            if !lhs.is_scalar() {
                return Err(ValidationReason::unsupported(op.to_string(), lhs));
            }
            Ok(Type::Bool)
        }
        Lt | Le | Gt | Ge => {
            let [lhs, rhs] = exactly::<2>(args)?;
            same_type(op, lhs, rhs)?;
            orderable(op, lhs)?;
            Ok(Type::Bool)
        }
        And | Or => {
            let [lhs, rhs] = exactly::<2>(args)?;
            expect(&Type::Bool, lhs)?;
            expect(&Type::Bool, rhs)?;
            Ok(Type::Bool)
        }
        Not => {
            let [arg] = exactly::<1>(args)?;
            expect(&Type::Bool, arg)?;
            Ok(Type::Bool)
        }
        IsNull => {
            exactly::<1>(args)?;
            Ok(Type::Bool)
        }
        Negate => {
            let [arg] = exactly::<1>(args)?;
            numeric(op, arg)?;
            Ok(arg.clone())
        }
        Add | Subtract | Multiply => {
            let [lhs, rhs] = exactly::<2>(args)?;
            numeric(op, lhs)?;
            expect(lhs, rhs)?;
            Ok(lhs.clone())
        }
        TrueDivide | FloorDivide => {
            let [lhs, rhs] = exactly::<2>(args)?;
            numeric(op, lhs)?;
            expect(lhs, rhs)?;
            Ok(if op == TrueDivide { Type::Float } else { Type::Int })
        }
        CastToInt => {
            let [arg] = exactly::<1>(args)?;
            numeric(op, arg)?;
            Ok(Type::Int)
        }
        CastToFloat => {
            let [arg] = exactly::<1>(args)?;
            numeric(op, arg)?;
            Ok(Type::Float)
        }
        StringContains => {
            let [haystack, needle] = exactly::<2>(args)?;
            if !matches!(haystack, Type::Str | Type::Code(_)) {
                return Err(ValidationReason::unsupported(op.to_string(), haystack));
            }
            expect(&Type::Str, needle)?;
            Ok(Type::Bool)
        }
        In => {
            let [item, set] = exactly::<2>(args)?;
            let Some(element) = set.element_type() else {
                return Err(ValidationReason::incompatible(
                    format!("set[{item}]"),
                    set,
                ));
            };
            same_type(op, item, element)?;
            Ok(Type::Bool)
        }
        YearFromDate | MonthFromDate | DayFromDate => {
            let [arg] = exactly::<1>(args)?;
            expect(&Type::Date, arg)?;
            Ok(Type::Int)
        }
        DateDifferenceInYears | DateDifferenceInMonths | DateDifferenceInDays => {
            let [end, start] = exactly::<2>(args)?;
            expect(&Type::Date, end)?;
            expect(&Type::Date, start)?;
            Ok(Type::Int)
        }
        DateAddYears | DateAddMonths | DateAddDays => {
            let [date, amount] = exactly::<2>(args)?;
            expect(&Type::Date, date)?;
            expect(&Type::Int, amount)?;
            Ok(Type::Date)
        }
        ToFirstOfYear | ToFirstOfMonth => {
            let [arg] = exactly::<1>(args)?;
            expect(&Type::Date, arg)?;
            Ok(Type::Date)
        }
        MaximumOf | MinimumOf => {
            if args.len() < 2 {
                return Err(ValidationReason::WrongArity {
                    expected: "at least 2".to_string(),
                    found: args.len(),
                });
            }
            let first = args[0];
            orderable(op, first)?;
            for other in &args[1..] {
                same_type(op, first, other)?;
            }
            Ok(first.clone())
        }
    }
}

fn exactly<'a, const N: usize>(args: &[&'a Type]) -> Result<[&'a Type; N], ValidationReason> {
    <[&Type; N]>::try_from(args).map_err(|_| ValidationReason::WrongArity {
        expected: N.to_string(),
        found: args.len(),
    })
}

fn expect(expected: &Type, found: &Type) -> Result<(), ValidationReason> {
    if expected == found {
        Ok(())
    } else {
        Err(ValidationReason::incompatible(expected, found))
    }
}

/// Operands must share one type; codes get a dedicated reason
fn same_type(op: Function, lhs: &Type, rhs: &Type) -> Result<(), ValidationReason> {
    match (lhs, rhs) {
        (Type::Code(left), Type::Code(right)) if left != right => {
            Err(ValidationReason::CodingSystemMismatch {
                left: *left,
                right: *right,
            })
        }
        (Type::Code(system), Type::Str) | (Type::Str, Type::Code(system))
            if op != Function::StringContains =>
        {
            Err(ValidationReason::CodeComparedWithString { system: *system })
        }
        _ => expect(lhs, rhs),
    }
}

fn numeric(op: Function, ty: &Type) -> Result<(), ValidationReason> {
    if ty.is_numeric() {
        Ok(())
    } else {
        Err(ValidationReason::unsupported(op.to_string(), ty))
    }
}

fn orderable(op: Function, ty: &Type) -> Result<(), ValidationReason> {
    if ty.is_orderable() {
        Ok(())
    } else {
        Err(ValidationReason::unsupported(op.to_string(), ty))
    }
}
