//! Form documents.
//!
//! A form is described once as a static [`FormSpec`]. GET routes return it
//! unbound or bound to an entity; a rejected submission returns it bound to
//! the submitted values together with the errors.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::domain::error::DomainError;
use crate::presentation::app_error::{AppError, AppResult};

/// Error key for problems not tied to one field.
pub(crate) const NON_FIELD_ERRORS: &str = "__all__";

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

pub(crate) type FormErrors = BTreeMap<String, Vec<String>>;

/// Input hint for a client rendering the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Widget {
    TextInput,
    Textarea { rows: u8 },
    DateInput,
    EmailInput,
    Select,
    FileInput,
    PasswordInput,
}

#[derive(Debug)]
pub(crate) struct FieldSpec {
    pub(crate) name: &'static str,
    pub(crate) label: &'static str,
    pub(crate) widget: Widget,
    pub(crate) required: bool,
}

#[derive(Debug)]
pub(crate) struct FormSpec {
    pub(crate) name: &'static str,
    pub(crate) fields: &'static [FieldSpec],
}

pub(crate) static POST_FORM: FormSpec = FormSpec {
    name: "post",
    fields: &[
        FieldSpec {
            name: "title",
            label: "Title",
            widget: Widget::TextInput,
            required: true,
        },
        FieldSpec {
            name: "text",
            label: "Publication text",
            widget: Widget::Textarea { rows: 10 },
            required: true,
        },
        FieldSpec {
            name: "location",
            label: "Location",
            widget: Widget::Select,
            required: false,
        },
        FieldSpec {
            name: "pub_date",
            label: "Publication date",
            widget: Widget::DateInput,
            required: true,
        },
        FieldSpec {
            name: "category",
            label: "Category",
            widget: Widget::Select,
            required: true,
        },
        FieldSpec {
            name: "image",
            label: "Post image",
            widget: Widget::FileInput,
            required: false,
        },
    ],
};

pub(crate) static USER_FORM: FormSpec = FormSpec {
    name: "user",
    fields: &[
        FieldSpec {
            name: "email",
            label: "Email",
            widget: Widget::EmailInput,
            required: false,
        },
        FieldSpec {
            name: "first_name",
            label: "First name",
            widget: Widget::TextInput,
            required: false,
        },
        FieldSpec {
            name: "last_name",
            label: "Last name",
            widget: Widget::TextInput,
            required: false,
        },
        FieldSpec {
            name: "username",
            label: "Username",
            widget: Widget::TextInput,
            required: true,
        },
    ],
};

pub(crate) static COMMENT_FORM: FormSpec = FormSpec {
    name: "comment",
    fields: &[FieldSpec {
        name: "text",
        label: "Comment text",
        widget: Widget::Textarea { rows: 3 },
        required: true,
    }],
};

pub(crate) static REGISTRATION_FORM: FormSpec = FormSpec {
    name: "registration",
    fields: &[
        FieldSpec {
            name: "username",
            label: "Username",
            widget: Widget::TextInput,
            required: true,
        },
        FieldSpec {
            name: "password1",
            label: "Password",
            widget: Widget::PasswordInput,
            required: true,
        },
        FieldSpec {
            name: "password2",
            label: "Password confirmation",
            widget: Widget::PasswordInput,
            required: true,
        },
    ],
};

pub(crate) static LOGIN_FORM: FormSpec = FormSpec {
    name: "login",
    fields: &[
        FieldSpec {
            name: "username",
            label: "Username",
            widget: Widget::TextInput,
            required: true,
        },
        FieldSpec {
            name: "password",
            label: "Password",
            widget: Widget::PasswordInput,
            required: true,
        },
    ],
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub(crate) struct FieldView {
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) widget: Widget,
    pub(crate) required: bool,
    #[schema(value_type = Object)]
    pub(crate) value: Value,
    pub(crate) errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub(crate) struct FormView {
    pub(crate) form: String,
    pub(crate) fields: Vec<FieldView>,
    pub(crate) non_field_errors: Vec<String>,
}

impl FormView {
    #[cfg(test)]
    pub(crate) fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|field| field.name == name)
    }

    fn with_errors(mut self, mut errors: FormErrors) -> Self {
        for field in &mut self.fields {
            if let Some(messages) = errors.remove(&field.name) {
                field.errors = messages;
            }
        }
        // whatever is left has no field to sit on
        self.non_field_errors = errors.into_values().flatten().collect();
        self
    }
}

impl FormSpec {
    pub(crate) fn unbound(&self) -> FormView {
        self.build(|_| Value::Null)
    }

    /// The form filled from `data`'s serialized fields. Password inputs are
    /// never echoed back.
    pub(crate) fn bound<T: Serialize>(&self, data: &T) -> FormView {
        let values = serde_json::to_value(data).unwrap_or(Value::Null);
        self.build(|field| match field.widget {
            Widget::PasswordInput => Value::Null,
            _ => values.get(field.name).cloned().unwrap_or(Value::Null),
        })
    }

    pub(crate) fn invalid<T: Serialize>(&self, data: &T, errors: FormErrors) -> AppError {
        AppError::InvalidForm(Box::new(self.bound(data).with_errors(errors)))
    }

    /// Runs the field rules of a submitted form.
    pub(crate) fn check<T: Serialize + Validate>(&self, data: &T) -> AppResult<()> {
        data.validate()
            .map_err(|errors| self.invalid(data, errors_from_validation(&errors)))
    }

    /// Turns domain rejections of a submission into form errors; other
    /// failures pass through.
    pub(crate) fn reject<T: Serialize>(&self, data: &T, err: DomainError) -> AppError {
        match err {
            DomainError::Validation { field, message } => {
                self.invalid(data, single_error(field, message))
            }
            DomainError::InvalidCredentials => {
                self.invalid(data, single_error(NON_FIELD_ERRORS, BAD_CREDENTIALS))
            }
            other => AppError::Domain(other),
        }
    }

    fn build(&self, value: impl Fn(&FieldSpec) -> Value) -> FormView {
        FormView {
            form: self.name.to_string(),
            fields: self
                .fields
                .iter()
                .map(|field| FieldView {
                    name: field.name.to_string(),
                    label: field.label.to_string(),
                    widget: field.widget,
                    required: field.required,
                    value: value(field),
                    errors: Vec::new(),
                })
                .collect(),
            non_field_errors: Vec::new(),
        }
    }
}

fn single_error(field: &str, message: &str) -> FormErrors {
    FormErrors::from([(field.to_string(), vec![message.to_string()])])
}

pub(crate) fn errors_from_validation(errors: &ValidationErrors) -> FormErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages = errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => error.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}
