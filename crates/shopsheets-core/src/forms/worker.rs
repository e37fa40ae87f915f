use serde::{Deserialize, Serialize};

use super::{required, Draft, ValidationError};
use crate::models::NewWorker;

const MISSING_FIELDS: &str = "Please fill in all required fields.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerDraft {
    pub name: String,
    pub phone: String,
    pub address: String,
}

impl Draft for WorkerDraft {
    const PAGE_KEY: &'static str = "add_worker";

    type Output = NewWorker;

    fn validate(&self) -> Result<NewWorker, ValidationError> {
        Ok(NewWorker {
            name: required(&self.name, "name", MISSING_FIELDS)?,
            phone: required(&self.phone, "phone", MISSING_FIELDS)?,
            address: self.address.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_fields_trimmed() {
        let draft = WorkerDraft {
            name: " Sunil ".to_string(),
            phone: " 98450 12345".to_string(),
            address: "  Ward 4 ".to_string(),
        };
        let worker = draft.validate().unwrap();
        assert_eq!(worker.name, "Sunil");
        assert_eq!(worker.phone, "98450 12345");
        assert_eq!(worker.address, "Ward 4");
    }

    #[test]
    fn test_phone_required() {
        let draft = WorkerDraft {
            name: "Sunil".to_string(),
            ..WorkerDraft::default()
        };
        assert_eq!(draft.validate().unwrap_err().field, "phone");
    }
}
