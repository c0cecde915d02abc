//! Tenant-scoped session key. Agent ids are only unique within a tenant,
//! so a bare agent id can't address a session by itself.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    tenant_id: String,
    agent_id: String,
}

impl SessionKey {
    pub fn new(tenant_id: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self { tenant_id: tenant_id.into(), agent_id: agent_id.into() }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_differ_by_tenant_even_with_same_agent_id() {
        let a = SessionKey::new("tenant-a", "agent-1");
        let b = SessionKey::new("tenant-b", "agent-1");
        assert_ne!(a, b);
    }
}
