//! Top-level encoding entry point: turns an `IntentEvent` into an
//! `IntentVector`, or a policy's per-slot anchor text lists into a
//! `RuleVector`, via anchor assembly -> embed -> project -> normalize.

use std::sync::Arc;
use std::sync::Mutex;

use gateway_core::{AnchorMatrix, IntentEvent, IntentVector, RuleVector, Slice, SlotVector, MAX_ANCHORS_PER_SLICE};
use gateway_embed::EmbeddingProvider;
use gateway_vocab::VOCABULARY;

use crate::anchor;
use crate::cache::{content_key, SlotCache};
use crate::error::EncodeError;
use crate::projection::{matrix_for, EMBEDDING_DIM};

/// Per-slot anchor texts for installing a policy's Rule Vector.
#[derive(Debug, Clone, Default)]
pub struct RuleAnchorTexts {
    pub action: Vec<String>,
    pub resource: Vec<String>,
    pub data: Vec<String>,
    pub risk: Vec<String>,
}

impl RuleAnchorTexts {
    fn for_slice(&self, slice: Slice) -> &[String] {
        match slice {
            Slice::Action => &self.action,
            Slice::Resource => &self.resource,
            Slice::Data => &self.data,
            Slice::Risk => &self.risk,
        }
    }
}

pub struct SemanticEncoder<P: EmbeddingProvider> {
    provider: Arc<P>,
    action_cache: Mutex<SlotCache>,
    resource_cache: Mutex<SlotCache>,
    data_cache: Mutex<SlotCache>,
    risk_cache: Mutex<SlotCache>,
}

impl<P: EmbeddingProvider> SemanticEncoder<P> {
    pub fn new(provider: Arc<P>, cache_capacity_per_slot: usize) -> Self {
        Self {
            provider,
            action_cache: Mutex::new(SlotCache::new(cache_capacity_per_slot)),
            resource_cache: Mutex::new(SlotCache::new(cache_capacity_per_slot)),
            data_cache: Mutex::new(SlotCache::new(cache_capacity_per_slot)),
            risk_cache: Mutex::new(SlotCache::new(cache_capacity_per_slot)),
        }
    }

    pub async fn encode_intent(&self, event: &IntentEvent) -> Result<IntentVector, EncodeError> {
        let action = self.encode_field_slot(Slice::Action, event).await?;
        let resource = self.encode_field_slot(Slice::Resource, event).await?;
        let data = self.encode_field_slot(Slice::Data, event).await?;
        let risk = self.encode_field_slot(Slice::Risk, event).await?;
        Ok(IntentVector { action, resource, data, risk })
    }

    async fn encode_field_slot(&self, slice: Slice, event: &IntentEvent) -> Result<SlotVector, EncodeError> {
        let fields = anchor::fields_for(slice, event);
        let text = VOCABULARY.assemble_anchor(slice, &fields)?;
        self.encode_slot(slice, &text).await
    }

    pub async fn encode_rule_vector(&self, anchors: &RuleAnchorTexts) -> Result<RuleVector, EncodeError> {
        Ok(RuleVector {
            action: self.encode_anchor_list(Slice::Action, anchors.for_slice(Slice::Action)).await?,
            resource: self.encode_anchor_list(Slice::Resource, anchors.for_slice(Slice::Resource)).await?,
            data: self.encode_anchor_list(Slice::Data, anchors.for_slice(Slice::Data)).await?,
            risk: self.encode_anchor_list(Slice::Risk, anchors.for_slice(Slice::Risk)).await?,
        })
    }

    async fn encode_anchor_list(&self, slice: Slice, texts: &[String]) -> Result<AnchorMatrix, EncodeError> {
        // Sorted before truncation so two policies with the same anchor set
        // in different constraint order encode to the same Rule Vector.
        let mut sorted: Vec<&String> = texts.iter().collect();
        sorted.sort();
        let bounded = if sorted.len() > MAX_ANCHORS_PER_SLICE {
            tracing::warn!(slice = ?slice, original = sorted.len(), max = MAX_ANCHORS_PER_SLICE, "truncating anchor list");
            &sorted[..MAX_ANCHORS_PER_SLICE]
        } else {
            &sorted[..]
        };

        let mut rows = Vec::with_capacity(bounded.len());
        for text in bounded {
            rows.push(self.encode_slot(slice, text).await?);
        }
        Ok(AnchorMatrix::new(rows))
    }

    async fn encode_slot(&self, slice: Slice, text: &str) -> Result<SlotVector, EncodeError> {
        let key = content_key(slice_label(slice), text);
        if let Some(cached) = self.cache_for(slice).lock().unwrap().get(&key) {
            return Ok(cached);
        }

        let embedding = self.provider.embed(text).await?;
        if embedding.dimensions as usize != EMBEDDING_DIM {
            return Err(EncodeError::UnexpectedEmbeddingDimension { expected: EMBEDDING_DIM as i32, got: embedding.dimensions });
        }

        let mut raw_384 = [0.0f32; EMBEDDING_DIM];
        raw_384.copy_from_slice(&embedding.data);
        let projected = matrix_for(slice).apply(&raw_384);
        let slot = SlotVector::from_raw(projected);

        self.cache_for(slice).lock().unwrap().insert(key, slot);
        Ok(slot)
    }

    fn cache_for(&self, slice: Slice) -> &Mutex<SlotCache> {
        match slice {
            Slice::Action => &self.action_cache,
            Slice::Resource => &self.resource_cache,
            Slice::Data => &self.data_cache,
            Slice::Risk => &self.risk_cache,
        }
    }
}

fn slice_label(slice: Slice) -> &'static str {
    match slice {
        Slice::Action => "action",
        Slice::Resource => "resource",
        Slice::Data => "data",
        Slice::Risk => "risk",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gateway_core::{Action, Actor, ActorType, Authn, Data, Resource, ResourceType, Risk, SchemaVersion, Sensitivity, Volume};
    use gateway_embed::MockEmbeddingProvider;
    use uuid::Uuid;

    fn event() -> IntentEvent {
        IntentEvent {
            id: Uuid::nil(),
            tenant_id: "tenant-a".to_string(),
            schema_version: SchemaVersion::V1_3,
            timestamp: Utc::now(),
            actor: Actor { id: "agent-1".to_string(), actor_type: ActorType::Agent },
            action: Action::Read,
            resource: Resource { resource_type: ResourceType::Database, name: None, location: None },
            data: Data { sensitivity: vec![Sensitivity::Internal], pii: false, volume: Volume::Single },
            risk: Risk { authn: Authn::Required },
            layer: None,
            tool_name: None,
            tool_method: None,
            tool_params: None,
            rate_limit: None,
        }
    }

    #[tokio::test]
    async fn encodes_intent_to_unit_norm_slots() {
        let encoder = SemanticEncoder::new(Arc::new(MockEmbeddingProvider::new("mock", EMBEDDING_DIM as i32)), 16);
        let vector = encoder.encode_intent(&event()).await.unwrap();
        for slice in gateway_core::Slice::ALL {
            assert!(vector.slot(slice).is_unit_or_zero());
        }
    }

    #[tokio::test]
    async fn repeated_encode_hits_cache() {
        let encoder = SemanticEncoder::new(Arc::new(MockEmbeddingProvider::new("mock", EMBEDDING_DIM as i32)), 16);
        let first = encoder.encode_intent(&event()).await.unwrap();
        let second = encoder.encode_intent(&event()).await.unwrap();
        assert_eq!(first.to_array(), second.to_array());
    }

    #[tokio::test]
    async fn rule_vector_truncates_past_max_anchors() {
        let encoder = SemanticEncoder::new(Arc::new(MockEmbeddingProvider::new("mock", EMBEDDING_DIM as i32)), 32);
        let texts = RuleAnchorTexts {
            action: (0..20).map(|i| format!("action anchor {i}")).collect(),
            ..Default::default()
        };
        let rule_vector = encoder.encode_rule_vector(&texts).await.unwrap();
        assert_eq!(rule_vector.action.count(), MAX_ANCHORS_PER_SLICE);
    }

    #[tokio::test]
    async fn rule_vector_truncation_is_order_independent() {
        let encoder = SemanticEncoder::new(Arc::new(MockEmbeddingProvider::new("mock", EMBEDDING_DIM as i32)), 32);
        let forward: Vec<String> = (0..20).map(|i| format!("action anchor {i:02}")).collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        let forward_vector = encoder
            .encode_rule_vector(&RuleAnchorTexts { action: forward, ..Default::default() })
            .await
            .unwrap();
        let reversed_vector = encoder
            .encode_rule_vector(&RuleAnchorTexts { action: reversed, ..Default::default() })
            .await
            .unwrap();

        assert_eq!(forward_vector.action, reversed_vector.action);
    }
}
