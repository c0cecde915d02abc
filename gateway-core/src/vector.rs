//! Fixed-dimensional vector types shared by the encoder and the enforcement
//! engine: 32-d slot vectors, the 128-d intent vector they concatenate into,
//! and the 16x32 anchor matrices a policy's Rule Vector is built from.

use serde::{Deserialize, Serialize};

/// Dimensionality of one semantic slice after sparse random projection.
pub const SLOT_DIM: usize = 32;

/// Number of semantic slices every intent and policy is encoded into.
pub const NUM_SLICES: usize = 4;

/// Dimensionality of a concatenated Intent Vector (4 x 32).
pub const INTENT_DIM: usize = NUM_SLICES * SLOT_DIM;

/// Maximum anchors retained per slice in a Rule Vector.
pub const MAX_ANCHORS_PER_SLICE: usize = 16;

/// The four orthogonal semantic axes every intent and policy constraint is
/// encoded along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Slice {
    Action,
    Resource,
    Data,
    Risk,
}

impl Slice {
    /// Fixed concatenation order for Intent Vectors and evidence arrays.
    pub const ALL: [Slice; NUM_SLICES] = [Slice::Action, Slice::Resource, Slice::Data, Slice::Risk];
}

/// A 32-dimensional L2-normalised real vector representing one semantic
/// slice. Either unit-norm or the zero vector — never anything in between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SlotVector(#[cfg_attr(feature = "openapi", schema(value_type = Vec<f32>))] pub [f32; SLOT_DIM]);

impl SlotVector {
    pub const ZERO: SlotVector = SlotVector([0.0; SLOT_DIM]);

    /// Build a slot vector from raw projection output, L2-normalising it.
    /// A zero-norm input stays the zero vector.
    pub fn from_raw(raw: [f32; SLOT_DIM]) -> Self {
        let norm = l2_norm(&raw);
        if norm == 0.0 {
            return Self::ZERO;
        }
        let mut out = raw;
        for v in out.iter_mut() {
            *v /= norm;
        }
        SlotVector(out)
    }

    pub fn norm(&self) -> f32 {
        l2_norm(&self.0)
    }

    /// True if this is the unit vector or the zero vector, per the
    /// invariant every slot vector must uphold.
    pub fn is_unit_or_zero(&self) -> bool {
        let n = self.norm();
        n == 0.0 || (n - 1.0).abs() < 1e-4
    }

    pub fn dot(&self, other: &SlotVector) -> f32 {
        dot(&self.0, &other.0)
    }

    /// Cosine similarity, clamped to [0, 1] and NaN-safe — similarity
    /// against a zero vector is defined as 0, never propagated as NaN.
    pub fn cosine(&self, other: &SlotVector) -> f32 {
        let d = self.dot(other);
        if d.is_nan() {
            0.0
        } else {
            d.clamp(0.0, 1.0)
        }
    }
}

fn l2_norm(v: &[f32; SLOT_DIM]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn dot(a: &[f32; SLOT_DIM], b: &[f32; SLOT_DIM]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Concatenation of the four slot vectors in fixed order. Global L2-norm is
/// exactly 2 when every slot is unit-normed (0 only if every slot text was
/// empty and every slot is the zero vector).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IntentVector {
    pub action: SlotVector,
    pub resource: SlotVector,
    pub data: SlotVector,
    pub risk: SlotVector,
}

impl IntentVector {
    pub fn slot(&self, slice: Slice) -> &SlotVector {
        match slice {
            Slice::Action => &self.action,
            Slice::Resource => &self.resource,
            Slice::Data => &self.data,
            Slice::Risk => &self.risk,
        }
    }

    /// Flatten to the 128-float wire/storage representation.
    pub fn to_array(&self) -> [f32; INTENT_DIM] {
        let mut out = [0.0f32; INTENT_DIM];
        out[0..SLOT_DIM].copy_from_slice(&self.action.0);
        out[SLOT_DIM..2 * SLOT_DIM].copy_from_slice(&self.resource.0);
        out[2 * SLOT_DIM..3 * SLOT_DIM].copy_from_slice(&self.data.0);
        out[3 * SLOT_DIM..4 * SLOT_DIM].copy_from_slice(&self.risk.0);
        out
    }

    pub fn from_array(arr: [f32; INTENT_DIM]) -> Self {
        let mut action = [0.0f32; SLOT_DIM];
        let mut resource = [0.0f32; SLOT_DIM];
        let mut data = [0.0f32; SLOT_DIM];
        let mut risk = [0.0f32; SLOT_DIM];
        action.copy_from_slice(&arr[0..SLOT_DIM]);
        resource.copy_from_slice(&arr[SLOT_DIM..2 * SLOT_DIM]);
        data.copy_from_slice(&arr[2 * SLOT_DIM..3 * SLOT_DIM]);
        risk.copy_from_slice(&arr[3 * SLOT_DIM..4 * SLOT_DIM]);
        Self {
            action: SlotVector(action),
            resource: SlotVector(resource),
            data: SlotVector(data),
            risk: SlotVector(risk),
        }
    }

    /// Global L2-norm across all four slots.
    pub fn norm(&self) -> f32 {
        let arr = self.to_array();
        arr.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// `1 - dot(baseline, current)`, clamped to be non-negative — the
    /// per-call semantic drift contribution. Per-slot normalisation means
    /// this dot product equals the mean of the four slice cosines.
    pub fn drift_from(&self, baseline: &IntentVector) -> f32 {
        let d: f32 = self
            .to_array()
            .iter()
            .zip(baseline.to_array().iter())
            .map(|(a, b)| a * b)
            .sum();
        (1.0 - d).max(0.0)
    }
}

/// One slice's encoded anchor set: up to [`MAX_ANCHORS_PER_SLICE`] rows,
/// zero-padded, with the true unpadded count recorded separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnchorMatrix {
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<Vec<f32>>))]
    rows: [SlotVector; MAX_ANCHORS_PER_SLICE],
    count: usize,
}

impl AnchorMatrix {
    /// Build from up to `MAX_ANCHORS_PER_SLICE` anchors. Extra anchors are
    /// dropped deterministically by truncating the already-sorted input.
    pub fn new(anchors: Vec<SlotVector>) -> Self {
        let count = anchors.len().min(MAX_ANCHORS_PER_SLICE);
        let mut rows = [SlotVector::ZERO; MAX_ANCHORS_PER_SLICE];
        for (slot, anchor) in rows.iter_mut().zip(anchors.into_iter()) {
            *slot = anchor;
        }
        Self { rows, count }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn rows(&self) -> &[SlotVector] {
        &self.rows[..self.count]
    }

    /// Max-pooled cosine similarity of `slot` against this anchor set's
    /// rows `0..count`. An empty anchor set has no opinion and similarity
    /// is 0 (not NaN, not 1).
    pub fn max_similarity(&self, slot: &SlotVector) -> f32 {
        self.rows()
            .iter()
            .map(|anchor| slot.cosine(anchor))
            .fold(0.0f32, f32::max)
    }
}

/// A policy encoded as 4 slices x up to 16 anchors x 32-d.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RuleVector {
    pub action: AnchorMatrix,
    pub resource: AnchorMatrix,
    pub data: AnchorMatrix,
    pub risk: AnchorMatrix,
}

impl RuleVector {
    pub fn slice(&self, slice: Slice) -> &AnchorMatrix {
        match slice {
            Slice::Action => &self.action,
            Slice::Resource => &self.resource,
            Slice::Data => &self.data,
            Slice::Risk => &self.risk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_raw_stays_zero() {
        let v = SlotVector::from_raw([0.0; SLOT_DIM]);
        assert_eq!(v, SlotVector::ZERO);
        assert!(v.is_unit_or_zero());
    }

    #[test]
    fn nonzero_raw_is_unit_norm() {
        let mut raw = [0.0f32; SLOT_DIM];
        raw[0] = 3.0;
        raw[1] = 4.0;
        let v = SlotVector::from_raw(raw);
        assert!((v.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn intent_vector_norm_is_two_when_all_unit() {
        let mut raw = [0.0f32; SLOT_DIM];
        raw[0] = 1.0;
        let slot = SlotVector::from_raw(raw);
        let iv = IntentVector {
            action: slot,
            resource: slot,
            data: slot,
            risk: slot,
        };
        assert!((iv.norm() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn anchor_matrix_truncates_and_pads() {
        let anchors: Vec<SlotVector> = (0..20)
            .map(|i| {
                let mut raw = [0.0f32; SLOT_DIM];
                raw[0] = i as f32 + 1.0;
                SlotVector::from_raw(raw)
            })
            .collect();
        let m = AnchorMatrix::new(anchors);
        assert_eq!(m.count(), MAX_ANCHORS_PER_SLICE);
        assert_eq!(m.rows().len(), MAX_ANCHORS_PER_SLICE);
    }

    #[test]
    fn max_similarity_is_best_anchor_hit() {
        let mut low = [0.0f32; SLOT_DIM];
        low[0] = 1.0;
        low[1] = 0.1;
        let mut high = [0.0f32; SLOT_DIM];
        high[0] = 1.0;
        let target = SlotVector::from_raw(high);
        let m = AnchorMatrix::new(vec![SlotVector::from_raw(low), SlotVector::from_raw(high)]);
        assert!((m.max_similarity(&target) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn drift_from_self_is_zero() {
        let mut raw = [0.0f32; SLOT_DIM];
        raw[0] = 1.0;
        let slot = SlotVector::from_raw(raw);
        let iv = IntentVector {
            action: slot,
            resource: slot,
            data: slot,
            risk: slot,
        };
        assert!(iv.drift_from(&iv) < 1e-5);
    }
}
