//! Answer validation against an opportunity's question snapshot.
//!
//! Checks run in three passes: answers must name known questions at most once,
//! every required question (in question order) must have a non-empty answer,
//! and each supplied answer is checked against its question's declared type,
//! options and rules.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

use crate::applications::models::{AnswerInput, AnswerValue};
use crate::models::question::QuestionRow;
use crate::questions::models::{QuestionType, ValidationRules};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnswerError {
    #[error("question {question_id} is required")]
    MissingRequired { question_id: Uuid },

    #[error("question {question_id} is not part of this opportunity")]
    UnknownQuestion { question_id: Uuid },

    #[error("question {question_id} was answered more than once")]
    DuplicateAnswer { question_id: Uuid },

    #[error("question {question_id} expects a {expected} answer")]
    TypeMismatch {
        question_id: Uuid,
        expected: &'static str,
    },

    #[error("'{option}' is not an option of question {question_id}")]
    InvalidOption { question_id: Uuid, option: String },

    #[error("'{option}' is selected more than once for question {question_id}")]
    RepeatedOption { question_id: Uuid, option: String },

    #[error("answer to question {question_id} must be at least {min} characters")]
    TooShort { question_id: Uuid, min: usize },

    #[error("answer to question {question_id} must be at most {max} characters")]
    TooLong { question_id: Uuid, max: usize },

    #[error("answer to question {question_id} does not match the expected format")]
    PatternMismatch { question_id: Uuid },

    #[error("answer to question {question_id} must be at least {min}")]
    BelowMinimum { question_id: Uuid, min: f64 },

    #[error("answer to question {question_id} must be at most {max}")]
    AboveMaximum { question_id: Uuid, max: f64 },

    #[error("question {question_id} needs at least {min} selection(s)")]
    TooFewSelected { question_id: Uuid, min: usize },

    #[error("question {question_id} allows at most {max} selection(s)")]
    TooManySelected { question_id: Uuid, max: usize },

    #[error("answer to question {question_id} must be a date (YYYY-MM-DD)")]
    InvalidDate { question_id: Uuid },

    #[error("question {question_id} has an unsupported type")]
    UnsupportedQuestionType { question_id: Uuid },
}

impl AnswerError {
    pub fn question_id(&self) -> Uuid {
        match self {
            AnswerError::MissingRequired { question_id }
            | AnswerError::UnknownQuestion { question_id }
            | AnswerError::DuplicateAnswer { question_id }
            | AnswerError::TypeMismatch { question_id, .. }
            | AnswerError::InvalidOption { question_id, .. }
            | AnswerError::RepeatedOption { question_id, .. }
            | AnswerError::TooShort { question_id, .. }
            | AnswerError::TooLong { question_id, .. }
            | AnswerError::PatternMismatch { question_id }
            | AnswerError::BelowMinimum { question_id, .. }
            | AnswerError::AboveMaximum { question_id, .. }
            | AnswerError::TooFewSelected { question_id, .. }
            | AnswerError::TooManySelected { question_id, .. }
            | AnswerError::InvalidDate { question_id }
            | AnswerError::UnsupportedQuestionType { question_id } => *question_id,
        }
    }

    /// Stable machine-readable code for clients.
    pub fn reason(&self) -> &'static str {
        match self {
            AnswerError::MissingRequired { .. } => "missing_required",
            AnswerError::UnknownQuestion { .. } => "unknown_question",
            AnswerError::DuplicateAnswer { .. } => "duplicate_answer",
            AnswerError::TypeMismatch { .. } => "type_mismatch",
            AnswerError::InvalidOption { .. } => "invalid_option",
            AnswerError::RepeatedOption { .. } => "repeated_option",
            AnswerError::TooShort { .. } => "too_short",
            AnswerError::TooLong { .. } => "too_long",
            AnswerError::PatternMismatch { .. } => "pattern_mismatch",
            AnswerError::BelowMinimum { .. } => "below_minimum",
            AnswerError::AboveMaximum { .. } => "above_maximum",
            AnswerError::TooFewSelected { .. } => "too_few_selected",
            AnswerError::TooManySelected { .. } => "too_many_selected",
            AnswerError::InvalidDate { .. } => "invalid_date",
            AnswerError::UnsupportedQuestionType { .. } => "unsupported_question_type",
        }
    }
}

/// Validates `answers` against `questions` and returns the answers to store,
/// in question order. Empty answers to optional questions are dropped.
pub fn validate_answers(
    questions: &[QuestionRow],
    answers: Vec<AnswerInput>,
) -> Result<Vec<AnswerInput>, AnswerError> {
    let known: HashSet<Uuid> = questions.iter().map(|q| q.id).collect();
    let mut by_question: HashMap<Uuid, AnswerValue> = HashMap::new();
    for answer in answers {
        if !known.contains(&answer.question_id) {
            return Err(AnswerError::UnknownQuestion {
                question_id: answer.question_id,
            });
        }
        if by_question
            .insert(answer.question_id, answer.value)
            .is_some()
        {
            return Err(AnswerError::DuplicateAnswer {
                question_id: answer.question_id,
            });
        }
    }

    let mut ordered: Vec<&QuestionRow> = questions.iter().collect();
    ordered.sort_by_key(|q| q.order_index);

    for question in ordered.iter().filter(|q| q.required) {
        let answered = by_question
            .get(&question.id)
            .map(|value| !value.is_empty())
            .unwrap_or(false);
        if !answered {
            return Err(AnswerError::MissingRequired {
                question_id: question.id,
            });
        }
    }

    let mut accepted = Vec::new();
    for question in ordered {
        let Some(value) = by_question.remove(&question.id) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let value = value.without_blank_items();
        check_value(question, &value)?;
        accepted.push(AnswerInput {
            question_id: question.id,
            value,
        });
    }

    Ok(accepted)
}

fn check_value(question: &QuestionRow, value: &AnswerValue) -> Result<(), AnswerError> {
    let question_id = question.id;
    let kind = question
        .kind()
        .ok_or(AnswerError::UnsupportedQuestionType { question_id })?;
    let rules = question.rules();

    match (kind, value) {
        (QuestionType::ShortText | QuestionType::LongText, AnswerValue::Text(text)) => {
            check_text(question_id, &rules, text)
        }
        (QuestionType::Date, AnswerValue::Text(text)) => {
            NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                .map(|_| ())
                .map_err(|_| AnswerError::InvalidDate { question_id })
        }
        (QuestionType::File, AnswerValue::Text(_)) => Ok(()),
        (QuestionType::File, AnswerValue::MultiText(items)) => {
            check_count(question_id, &rules, items.len())
        }
        (QuestionType::SingleSelect, AnswerValue::Choice(choice)) => {
            check_option(question, choice)
        }
        (QuestionType::MultiSelect, AnswerValue::MultiChoice(choices)) => {
            let mut seen = HashSet::new();
            for choice in choices {
                check_option(question, choice)?;
                if !seen.insert(choice.as_str()) {
                    return Err(AnswerError::RepeatedOption {
                        question_id,
                        option: choice.clone(),
                    });
                }
            }
            check_count(question_id, &rules, choices.len())
        }
        (QuestionType::Boolean, AnswerValue::Bool(_)) => Ok(()),
        (QuestionType::Number, AnswerValue::Number(number)) => {
            check_number(question_id, &rules, *number)
        }
        (kind, _) => Err(AnswerError::TypeMismatch {
            question_id,
            expected: expected_shape(kind),
        }),
    }
}

fn expected_shape(kind: QuestionType) -> &'static str {
    match kind {
        QuestionType::ShortText | QuestionType::LongText | QuestionType::Date => "text",
        QuestionType::File => "text or multi_text",
        QuestionType::SingleSelect => "choice",
        QuestionType::MultiSelect => "multi_choice",
        QuestionType::Boolean => "bool",
        QuestionType::Number => "number",
    }
}

fn check_text(question_id: Uuid, rules: &ValidationRules, text: &str) -> Result<(), AnswerError> {
    let length = text.trim().chars().count();
    if let Some(min) = rules.min_length {
        if length < min {
            return Err(AnswerError::TooShort { question_id, min });
        }
    }
    if let Some(max) = rules.max_length {
        if length > max {
            return Err(AnswerError::TooLong { question_id, max });
        }
    }
    if let Some(pattern) = &rules.pattern {
        // Patterns are checked on write; an unreadable stored pattern is skipped.
        if let Ok(regex) = Regex::new(pattern) {
            if !regex.is_match(text.trim()) {
                return Err(AnswerError::PatternMismatch { question_id });
            }
        }
    }
    Ok(())
}

fn check_option(question: &QuestionRow, choice: &str) -> Result<(), AnswerError> {
    if question.options.iter().any(|option| option == choice) {
        Ok(())
    } else {
        Err(AnswerError::InvalidOption {
            question_id: question.id,
            option: choice.to_string(),
        })
    }
}

fn check_count(
    question_id: Uuid,
    rules: &ValidationRules,
    count: usize,
) -> Result<(), AnswerError> {
    if let Some(min) = rules.min_selected {
        if count < min {
            return Err(AnswerError::TooFewSelected { question_id, min });
        }
    }
    if let Some(max) = rules.max_selected {
        if count > max {
            return Err(AnswerError::TooManySelected { question_id, max });
        }
    }
    Ok(())
}

fn check_number(
    question_id: Uuid,
    rules: &ValidationRules,
    number: f64,
) -> Result<(), AnswerError> {
    if !number.is_finite() {
        return Err(AnswerError::TypeMismatch {
            question_id,
            expected: "number",
        });
    }
    if let Some(min) = rules.min {
        if number < min {
            return Err(AnswerError::BelowMinimum { question_id, min });
        }
    }
    if let Some(max) = rules.max {
        if number > max {
            return Err(AnswerError::AboveMaximum { question_id, max });
        }
    }
    Ok(())
}
