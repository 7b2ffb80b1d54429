use crate::model::data_structure::UserDataStructure;
use crate::model::form::FormElement;
use serde::{Deserialize, Serialize};

/// Public account request form.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequestAccountForm {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub password1: String,
    pub password2: String,
    pub email: String,
}

/// Returned once an account request has been recorded.
///
/// `url` is where the visitor continues with the registration form.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountRequestCreated {
    pub data_structure_id: String,
    pub account_request_id: String,
    pub url: String,
}

/// Everything a client needs to render the registration form.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountCreationContext {
    /// True when the scratch document is already linked to finalized data.
    pub edit: bool,
    pub form: FormElement,
    pub data_structure: UserDataStructure,
    pub account_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElementValueQuery {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElementValueUpdate {
    pub id: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElementValue {
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElementValueReplaced {
    pub replaced: Option<String>,
}

/// Submission of a filled-in form.
///
/// `id` is the scratch document, `metadata` the account request the
/// finalized data is attached to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SaveDataRequest {
    pub id: String,
    pub metadata: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SaveDataResponse {
    pub data_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DenyRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EditTitleRequest {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SetDefaultQuery {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChangeOwnerRequest {
    pub user: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobCreated {
    pub job_id: String,
}
