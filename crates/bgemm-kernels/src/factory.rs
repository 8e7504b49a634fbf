//! Process-wide instance registry keyed by operation signature.
//!
//! Populated once on first access and read-only afterwards. Enumeration
//! order is registration order.

use std::collections::HashMap;
use std::sync::OnceLock;

use bgemm_common::{bf16, Element, GemmLayouts, OperationSignature, F8};
use tracing::{debug, info};

use crate::device_op::DeviceBatchedGemmMultiD;
use crate::instances::{self, InstanceList};

/// Immutable table from signature to its instance list.
pub struct InstanceRegistry {
    entries: HashMap<OperationSignature, InstanceList>,
    order: Vec<OperationSignature>,
}

impl InstanceRegistry {
    fn new() -> Self {
        Self { entries: HashMap::new(), order: Vec::new() }
    }

    /// Run `add` against the list keyed by the given element types and layouts.
    pub(crate) fn register<A, B, D0, D1, E>(
        &mut self,
        layouts: GemmLayouts,
        add: fn(&mut InstanceList),
    ) where
        A: Element,
        B: Element,
        D0: Element,
        D1: Element,
        E: Element,
    {
        let signature = OperationSignature::of::<A, B, D0, D1, E>(layouts);
        let list = self.entries.entry(signature).or_insert_with(|| {
            self.order.push(signature);
            Vec::new()
        });
        let before = list.len();
        add(list);
        debug!(%signature, added = list.len() - before, "registered instances");
    }

    fn with_builtin_instances() -> Self {
        let mut registry = Self::new();

        registry.register::<F8, F8, f32, f32, bf16>(
            GemmLayouts::MK_NK_MN,
            instances::add_xdl_f8_f8_bf16_mk_nk_mn_comp_default_instances,
        );
        registry.register::<F8, F8, f32, f32, bf16>(
            GemmLayouts::MK_NK_MN,
            instances::add_xdl_f8_f8_bf16_mk_nk_mn_comp_mnkpadding_instances,
        );
        registry.register::<bf16, bf16, f32, f32, bf16>(
            GemmLayouts::MK_NK_MN,
            instances::add_xdl_bf16_bf16_bf16_mk_nk_mn_instances,
        );
        registry.register::<bf16, bf16, f32, f32, bf16>(
            GemmLayouts::MK_KN_MN,
            instances::add_xdl_bf16_bf16_bf16_mk_kn_mn_instances,
        );

        info!(
            signatures = registry.order.len(),
            instances = registry.instance_count(),
            "instance registry initialised"
        );
        registry
    }

    /// Instances for `signature`, empty when none are registered.
    pub fn get(&self, signature: &OperationSignature) -> &[Box<dyn DeviceBatchedGemmMultiD>] {
        self.entries.get(signature).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Registered signatures in registration order.
    pub fn signatures(&self) -> &[OperationSignature] {
        &self.order
    }

    pub fn instance_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

static REGISTRY: OnceLock<InstanceRegistry> = OnceLock::new();

/// The global registry.
pub fn registry() -> &'static InstanceRegistry {
    REGISTRY.get_or_init(InstanceRegistry::with_builtin_instances)
}

/// Every instance implementing `signature`, in a stable order.
pub fn get_instances(
    signature: &OperationSignature,
) -> &'static [Box<dyn DeviceBatchedGemmMultiD>] {
    registry().get(signature)
}

/// Typed convenience wrapper around [`get_instances`].
pub fn get_instances_for<A, B, D0, D1, E>(
    layouts: GemmLayouts,
) -> &'static [Box<dyn DeviceBatchedGemmMultiD>]
where
    A: Element,
    B: Element,
    D0: Element,
    D1: Element,
    E: Element,
{
    get_instances(&OperationSignature::of::<A, B, D0, D1, E>(layouts))
}

pub fn registered_signatures() -> &'static [OperationSignature] {
    registry().signatures()
}

pub fn instance_count() -> usize {
    registry().instance_count()
}
