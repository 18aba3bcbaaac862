use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: String,
    name: String,
    email: String,
}

impl Customer {
    pub fn new(id: String, name: String, email: String) -> Result<Self, DomainError> {
        if id.trim().is_empty() {
            return Err(DomainError::invalid_input("Customer id must not be empty"));
        }
        if !email.contains('@') {
            return Err(DomainError::invalid_input(format!(
                "Invalid email for customer {}: {}",
                id, email
            )));
        }

        Ok(Self { id, name, email })
    }

    /// Reconstitutes from persisted data (used by adapters).
    pub fn reconstitute(id: String, name: String, email: String) -> Self {
        Self { id, name, email }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}
