use super::{CompiledShader, SelectorId, ShaderObject, ShaderSelectorDesc, ShaderStage, VariantKey};

/// An API-level shader and the variants compiled for it so far.
#[derive(Debug)]
pub struct ShaderSelector {
    id: SelectorId,
    desc: ShaderSelectorDesc,
    variants: Vec<ShaderObject>,
}

impl ShaderSelector {
    pub fn new(id: SelectorId, desc: ShaderSelectorDesc) -> Self {
        Self {
            id,
            desc,
            variants: Vec::new(),
        }
    }

    pub fn id(&self) -> SelectorId {
        self.id
    }

    pub fn stage(&self) -> ShaderStage {
        self.desc.stage
    }

    pub fn desc(&self) -> &ShaderSelectorDesc {
        &self.desc
    }

    pub fn variants(&self) -> &[ShaderObject] {
        &self.variants
    }

    pub fn find(&self, key: &VariantKey) -> Option<usize> {
        self.variants.iter().position(|v| v.key == *key)
    }

    pub fn variant(&self, index: usize) -> &ShaderObject {
        &self.variants[index]
    }

    pub fn variant_mut(&mut self, index: usize) -> &mut ShaderObject {
        &mut self.variants[index]
    }

    /// Cache a freshly compiled variant and return its index.
    pub fn insert(&mut self, key: VariantKey, shader: CompiledShader) -> usize {
        debug_assert!(self.find(&key).is_none(), "variant {key:?} compiled twice");
        self.variants.push(ShaderObject::new(key, shader));
        self.variants.len() - 1
    }
}
