use serde::{Deserialize, Serialize};

/// How much of a context field the host should expand for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpandLevel {
    All,
    Summary,
    None,
}

/// Which context fields a submit call needs. Unset fields are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acting_user: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acting_user_access_token: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth2_app: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth2_user: Option<ExpandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<ExpandLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSubmit {
    pub path: String,
    #[serde(default)]
    pub expand: Expand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modal_label: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
}

impl FormField {
    pub fn text(name: &str, label: &str, modal_label: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: "text".to_string(),
            label: label.to_string(),
            modal_label: Some(modal_label.to_string()),
            is_required: true,
            value: None,
            subtype: None,
        }
    }

    pub fn with_value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }

    pub fn secret(mut self) -> Self {
        self.subtype = Some("password".to_string());
        self
    }
}

/// A form descriptor the host renders as a modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppForm {
    pub title: String,
    pub header: String,
    pub icon: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
    pub submit: FormSubmit,
}

/// What a call handler hands back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CallResponse {
    Ok {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
    Error {
        text: String,
    },
    Form {
        form: AppForm,
    },
}

impl CallResponse {
    pub fn ok() -> Self {
        CallResponse::Ok {
            text: None,
            data: None,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        CallResponse::Ok {
            text: Some(text.into()),
            data: None,
        }
    }

    pub fn data(data: serde_json::Value) -> Self {
        CallResponse::Ok {
            text: None,
            data: Some(data),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        CallResponse::Error { text: text.into() }
    }

    pub fn form(form: AppForm) -> Self {
        CallResponse::Form { form }
    }
}
