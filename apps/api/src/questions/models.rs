use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    ShortText,
    LongText,
    SingleSelect,
    MultiSelect,
    Number,
    Boolean,
    Date,
    File,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::ShortText => "short_text",
            QuestionType::LongText => "long_text",
            QuestionType::SingleSelect => "single_select",
            QuestionType::MultiSelect => "multi_select",
            QuestionType::Number => "number",
            QuestionType::Boolean => "boolean",
            QuestionType::Date => "date",
            QuestionType::File => "file",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "short_text" => Some(QuestionType::ShortText),
            "long_text" => Some(QuestionType::LongText),
            "single_select" => Some(QuestionType::SingleSelect),
            "multi_select" => Some(QuestionType::MultiSelect),
            "number" => Some(QuestionType::Number),
            "boolean" => Some(QuestionType::Boolean),
            "date" => Some(QuestionType::Date),
            "file" => Some(QuestionType::File),
            _ => None,
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self, QuestionType::SingleSelect | QuestionType::MultiSelect)
    }
}

/// Per-question answer constraints. Every bound is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_selected: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selected: Option<usize>,
}

impl ValidationRules {
    pub fn is_empty(&self) -> bool {
        *self == ValidationRules::default()
    }
}

/// The editable content of a question, everything except identity and order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionFields {
    pub prompt: String,
    #[serde(default)]
    pub prompt_secondary: Option<String>,
    pub question_type: QuestionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub placeholder_secondary: Option<String>,
    #[serde(default)]
    pub validation: Option<ValidationRules>,
}

impl QuestionFields {
    /// Trims text, turns blank optional text into `None` and drops empty rule sets.
    pub fn normalized(mut self) -> Self {
        self.prompt = self.prompt.trim().to_string();
        self.prompt_secondary = blank_to_none(self.prompt_secondary);
        self.placeholder = blank_to_none(self.placeholder);
        self.placeholder_secondary = blank_to_none(self.placeholder_secondary);
        self.options = self
            .options
            .into_iter()
            .map(|o| o.trim().to_string())
            .collect();
        self.validation = self.validation.filter(|rules| !rules.is_empty());
        self
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// POST body for creating a question. `order` is optional; omitted means append.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionDraft {
    #[serde(flatten)]
    pub fields: QuestionFields,
    #[serde(default)]
    pub order: Option<i32>,
}

/// Partial update. Absent fields are untouched; an explicit `null` clears an optional field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionPatch {
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub prompt_secondary: Option<Option<String>>,
    pub question_type: Option<QuestionType>,
    pub required: Option<bool>,
    pub order: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub options: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub placeholder: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub placeholder_secondary: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub validation: Option<Option<ValidationRules>>,
}

impl QuestionPatch {
    pub fn apply(&self, fields: &mut QuestionFields) {
        if let Some(prompt) = &self.prompt {
            fields.prompt = prompt.clone();
        }
        if let Some(value) = &self.prompt_secondary {
            fields.prompt_secondary = value.clone();
        }
        if let Some(question_type) = self.question_type {
            fields.question_type = question_type;
        }
        if let Some(required) = self.required {
            fields.required = required;
        }
        if let Some(options) = &self.options {
            fields.options = options.clone().unwrap_or_default();
        }
        if let Some(value) = &self.placeholder {
            fields.placeholder = value.clone();
        }
        if let Some(value) = &self.placeholder_secondary {
            fields.placeholder_secondary = value.clone();
        }
        if let Some(value) = &self.validation {
            fields.validation = value.clone();
        }
    }

    /// True when the patch touches anything besides `order`.
    pub fn changes_fields(&self) -> bool {
        self.prompt.is_some()
            || self.prompt_secondary.is_some()
            || self.question_type.is_some()
            || self.required.is_some()
            || self.options.is_some()
            || self.placeholder.is_some()
            || self.placeholder_secondary.is_some()
            || self.validation.is_some()
    }
}

/// One `{id, order}` pair of a reorder request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderAssignment {
    pub id: Uuid,
    pub order: i32,
}

/// One entry of the desired question list in a sync request.
/// Entries with an `id` update that question; entries without one are created.
/// The position in the list is the resulting order.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncEntry {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub fields: QuestionFields,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> QuestionFields {
        QuestionFields {
            prompt: "Why do you want this role?".to_string(),
            prompt_secondary: Some("¿Por qué quieres este puesto?".to_string()),
            question_type: QuestionType::LongText,
            required: true,
            options: vec![],
            placeholder: Some("A few sentences".to_string()),
            placeholder_secondary: None,
            validation: Some(ValidationRules {
                max_length: Some(500),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_question_type_round_trips_through_str() {
        for kind in [
            QuestionType::ShortText,
            QuestionType::LongText,
            QuestionType::SingleSelect,
            QuestionType::MultiSelect,
            QuestionType::Number,
            QuestionType::Boolean,
            QuestionType::Date,
            QuestionType::File,
        ] {
            assert_eq!(QuestionType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(QuestionType::parse("essay"), None);
    }

    #[test]
    fn test_patch_changes_only_named_fields() {
        let original = fields();
        let mut patched = original.clone();
        let patch: QuestionPatch = serde_json::from_value(json!({ "required": false })).unwrap();
        patch.apply(&mut patched);

        assert!(!patched.required);
        assert_eq!(patched.prompt, original.prompt);
        assert_eq!(patched.prompt_secondary, original.prompt_secondary);
        assert_eq!(patched.placeholder, original.placeholder);
        assert_eq!(patched.validation, original.validation);
    }

    #[test]
    fn test_patch_explicit_null_clears_optional_field() {
        let mut patched = fields();
        let patch: QuestionPatch =
            serde_json::from_value(json!({ "prompt_secondary": null, "validation": null }))
                .unwrap();
        assert_eq!(patch.prompt_secondary, Some(None));
        patch.apply(&mut patched);

        assert_eq!(patched.prompt_secondary, None);
        assert_eq!(patched.validation, None);
        assert_eq!(patched.placeholder.as_deref(), Some("A few sentences"));
    }

    #[test]
    fn test_patch_with_only_order_does_not_change_fields() {
        let patch: QuestionPatch = serde_json::from_value(json!({ "order": 3 })).unwrap();
        assert!(!patch.changes_fields());
        assert_eq!(patch.order, Some(3));
    }

    #[test]
    fn test_normalized_blanks_become_none() {
        let mut f = fields();
        f.prompt = "  Name  ".to_string();
        f.placeholder = Some("   ".to_string());
        f.validation = Some(ValidationRules::default());
        let f = f.normalized();
        assert_eq!(f.prompt, "Name");
        assert_eq!(f.placeholder, None);
        assert_eq!(f.validation, None);
    }

    #[test]
    fn test_draft_accepts_flat_json_with_optional_order() {
        let draft: QuestionDraft = serde_json::from_value(json!({
            "prompt": "Preferred shift",
            "question_type": "single_select",
            "required": true,
            "options": ["Morning", "Evening"]
        }))
        .unwrap();
        assert_eq!(draft.order, None);
        assert_eq!(draft.fields.question_type, QuestionType::SingleSelect);
        assert_eq!(draft.fields.options.len(), 2);
    }
}
