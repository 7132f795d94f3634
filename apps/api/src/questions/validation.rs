use std::collections::HashSet;

use regex::Regex;

use crate::errors::AppError;
use crate::questions::models::{QuestionFields, ValidationRules};

/// Checks that a question definition is internally consistent before it is stored.
pub fn validate_definition(fields: &QuestionFields) -> Result<(), AppError> {
    if fields.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }

    if fields.question_type.is_select() {
        if fields.options.is_empty() {
            return Err(AppError::Validation(format!(
                "{} questions need at least one option",
                fields.question_type.as_str()
            )));
        }
        let mut seen = HashSet::new();
        for option in &fields.options {
            if option.trim().is_empty() {
                return Err(AppError::Validation("options cannot be blank".to_string()));
            }
            if !seen.insert(option.trim()) {
                return Err(AppError::Validation(format!(
                    "option '{option}' is listed more than once"
                )));
            }
        }
    } else if !fields.options.is_empty() {
        return Err(AppError::Validation(format!(
            "{} questions do not take options",
            fields.question_type.as_str()
        )));
    }

    if let Some(rules) = &fields.validation {
        validate_rules(rules)?;
    }

    Ok(())
}

/// Stored answers must keep matching a question once it has been answered:
/// the type is fixed and existing options may be added to but not removed or renamed.
pub fn validate_answered_change(
    current: &QuestionFields,
    next: &QuestionFields,
) -> Result<(), AppError> {
    if current.question_type != next.question_type {
        return Err(AppError::Validation(format!(
            "question type cannot change from {} to {} once the question has answers",
            current.question_type.as_str(),
            next.question_type.as_str()
        )));
    }
    if let Some(missing) = current
        .options
        .iter()
        .find(|option| !next.options.contains(option))
    {
        return Err(AppError::Validation(format!(
            "option '{missing}' cannot be removed once the question has answers"
        )));
    }
    Ok(())
}

fn validate_rules(rules: &ValidationRules) -> Result<(), AppError> {
    if let (Some(min), Some(max)) = (rules.min_length, rules.max_length) {
        if min > max {
            return Err(AppError::Validation(
                "min_length cannot exceed max_length".to_string(),
            ));
        }
    }
    if let (Some(min), Some(max)) = (rules.min, rules.max) {
        if min > max {
            return Err(AppError::Validation("min cannot exceed max".to_string()));
        }
    }
    if let (Some(min), Some(max)) = (rules.min_selected, rules.max_selected) {
        if min > max {
            return Err(AppError::Validation(
                "min_selected cannot exceed max_selected".to_string(),
            ));
        }
    }
    if let Some(pattern) = &rules.pattern {
        Regex::new(pattern)
            .map_err(|e| AppError::Validation(format!("invalid pattern: {e}")))?;
    }
    Ok(())
}
