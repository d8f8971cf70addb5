use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Closed set of roles a user can hold. A user may hold several roles
/// at once but always acts under exactly one active role, carried in
/// the token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Customer,
    B2bCustomer,
    Vendor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Customer, Role::B2bCustomer, Role::Vendor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::B2bCustomer => "b2b-customer",
            Role::Vendor => "vendor",
        }
    }

    /// True for both customer variants; B2B customers shop through the
    /// same catalog and order surface, only the displayed price differs.
    pub fn is_customer(&self) -> bool {
        match self {
            Role::Customer | Role::B2bCustomer => true,
            Role::Vendor => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "b2b-customer" => Ok(Role::B2bCustomer),
            "vendor" => Ok(Role::Vendor),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&Role::B2bCustomer).unwrap();
        assert_eq!(json, "\"b2b-customer\"");
        let back: Role = serde_json::from_str("\"b2b-customer\"").unwrap();
        assert_eq!(back, Role::B2bCustomer);
    }

    #[test]
    fn customer_variants() {
        assert!(Role::Customer.is_customer());
        assert!(Role::B2bCustomer.is_customer());
        assert!(!Role::Vendor.is_customer());
    }
}
