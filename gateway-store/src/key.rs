//! Tenant-scoped policy key. The private inner field means a key can only
//! be built via `new`, which requires a tenant id — cross-tenant lookups
//! by bare `Uuid` aren't representable.

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyKey {
    tenant_id: String,
    policy_id: Uuid,
}

impl PolicyKey {
    pub fn new(tenant_id: impl Into<String>, policy_id: Uuid) -> Self {
        Self { tenant_id: tenant_id.into(), policy_id }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn policy_id(&self) -> Uuid {
        self.policy_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_differ_by_tenant_even_with_same_policy_id() {
        let id = Uuid::nil();
        let a = PolicyKey::new("tenant-a", id);
        let b = PolicyKey::new("tenant-b", id);
        assert_ne!(a, b);
    }
}
