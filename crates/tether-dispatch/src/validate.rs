//! The constraint validation half of the argument pipeline.
//!
//! Runs after type adaptation: every adapted value is checked against its
//! option's declared constraints in order. The first failing constraint
//! aborts the pipeline and cancels the invocation with the constraint's
//! configured message (or a generated one).

use tether_core::definition::{ArgValue, Constraint, ConstraintKind, OptionDescriptor};

/// A failed constraint, carrying the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    /// Name of the violating option.
    pub option: String,
    /// User-facing description of the failed check.
    pub message: String,
}

/// Checks all adapted arguments against their declared constraints.
///
/// `args` and `options` correspond by index; absent values pass every
/// check, since optionality is handled by the adaptation step.
pub fn check(args: &[ArgValue], options: &[OptionDescriptor]) -> Result<(), ConstraintViolation> {
    for (value, option) in args.iter().zip(options) {
        if value.is_absent() {
            continue;
        }
        for constraint in &option.constraints {
            check_one(value, constraint, &option.name)?;
        }
    }
    Ok(())
}

fn check_one(
    value: &ArgValue,
    constraint: &Constraint,
    option: &str,
) -> Result<(), ConstraintViolation> {
    let passed = match constraint.kind {
        ConstraintKind::Min(bound) => value.as_float().is_none_or(|v| v >= bound as f64),
        ConstraintKind::Max(bound) => value.as_float().is_none_or(|v| v <= bound as f64),
        ConstraintKind::MinLength(bound) => {
            value.as_str().is_none_or(|s| s.chars().count() >= bound)
        }
        ConstraintKind::MaxLength(bound) => {
            value.as_str().is_none_or(|s| s.chars().count() <= bound)
        }
    };

    if passed {
        return Ok(());
    }

    let message = constraint
        .message
        .clone()
        .unwrap_or_else(|| default_message(&constraint.kind, option));
    Err(ConstraintViolation {
        option: option.to_string(),
        message,
    })
}

fn default_message(kind: &ConstraintKind, option: &str) -> String {
    match kind {
        ConstraintKind::Min(bound) => format!("'{option}' must be at least {bound}"),
        ConstraintKind::Max(bound) => format!("'{option}' must be at most {bound}"),
        ConstraintKind::MinLength(bound) => {
            format!("'{option}' must be at least {bound} characters long")
        }
        ConstraintKind::MaxLength(bound) => {
            format!("'{option}' must be at most {bound} characters long")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::definition::OptionKind;

    #[test]
    fn first_failing_constraint_wins() {
        let options = vec![
            OptionDescriptor::required("age", OptionKind::Integer)
                .constraint(Constraint::min(0).message("no negative ages"))
                .constraint(Constraint::max(150)),
        ];
        let violation = check(&[ArgValue::Int(-3)], &options).unwrap_err();
        assert_eq!(violation.option, "age");
        assert_eq!(violation.message, "no negative ages");
    }

    #[test]
    fn string_length_constraints() {
        let options = vec![
            OptionDescriptor::required("name", OptionKind::String)
                .constraint(Constraint::min_length(2))
                .constraint(Constraint::max_length(4)),
        ];
        assert!(check(&[ArgValue::String("Ada".into())], &options).is_ok());
        assert!(check(&[ArgValue::String("A".into())], &options).is_err());
        assert!(check(&[ArgValue::String("Lovelace".into())], &options).is_err());
    }

    #[test]
    fn absent_values_pass() {
        let options = vec![
            OptionDescriptor::optional("age", OptionKind::Integer).constraint(Constraint::min(18)),
        ];
        assert!(check(&[ArgValue::Absent], &options).is_ok());
    }

    #[test]
    fn numeric_bounds_apply_to_floats() {
        let options = vec![
            OptionDescriptor::required("ratio", OptionKind::Number)
                .constraint(Constraint::max(1)),
        ];
        assert!(check(&[ArgValue::Float(0.5)], &options).is_ok());
        assert!(check(&[ArgValue::Float(1.5)], &options).is_err());
    }
}
