//! The device register: the till this client is bound to.

use serde::{Deserialize, Serialize};

use crate::live::Merge;
use crate::types::{Amount, BusinessId, RegisterId};

/// An open cash session on a register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSession {
    /// When the session was opened (Unix ms).
    pub opened_at: i64,
    /// Cash counted into the drawer at opening.
    pub opening_float: Amount,
    /// Net cash expected in the drawer as known by the server.
    #[serde(default)]
    pub expected_cash: Amount,
}

/// A device register.
///
/// A register with no id is uninitialized: the device is not (or no longer)
/// bound to a register on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Register {
    #[serde(default)]
    pub id: Option<RegisterId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub business_id: Option<BusinessId>,
    #[serde(default)]
    pub session: Option<RegisterSession>,
}

impl Register {
    /// A fresh, uninitialized register.
    pub fn uninitialized() -> Self {
        Self::default()
    }

    /// Whether the register is bound to a server-side register.
    pub fn is_initialized(&self) -> bool {
        self.id.is_some()
    }

    /// Whether a cash session is open.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }
}

impl Merge for Register {
    fn merge_from(&mut self, incoming: Self) {
        let Register {
            id,
            name,
            business_id,
            session,
        } = incoming;

        self.id = id;
        self.name = name;
        self.business_id = business_id;
        self.session = session;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uninitialized_register() {
        let register = Register::uninitialized();
        assert!(!register.is_initialized());
        assert!(!register.is_open());
    }

    #[test]
    fn test_register_from_wire() {
        let register: Register = serde_json::from_value(json!({
            "id": "reg-1",
            "name": "Front till",
            "businessId": "b1",
            "session": {"openedAt": 1000, "openingFloat": 5000}
        }))
        .unwrap();

        assert!(register.is_initialized());
        assert!(register.is_open());
        assert_eq!(register.session.unwrap().expected_cash, Amount::ZERO);
    }

    #[test]
    fn test_merge_into_uninitialized() {
        let mut current = Register::uninitialized();
        let incoming = Register {
            id: Some("reg-1".into()),
            name: "Front".into(),
            business_id: None,
            session: None,
        };
        current.merge_from(incoming.clone());
        assert_eq!(current, incoming);
    }
}
