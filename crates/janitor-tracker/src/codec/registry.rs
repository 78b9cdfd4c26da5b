//! Row decoders selected by resource kind
//!
//! Kinds that carry extra structure can register their own decoder; every
//! other kind goes through [`DefaultDecoder`].

use super::row::{row_to_field_map, ResourceRow};
use crate::error::CodecError;
use crate::resource::{fields, FieldMap, Resource};
use janitor_common::ResourceKind;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a typed resource from a decoded field map
pub trait ResourceDecoder: Send + Sync {
    fn decode(&self, fields: FieldMap) -> Result<Resource, CodecError>;
}

/// Plain [`Resource::from_field_map`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDecoder;

impl ResourceDecoder for DefaultDecoder {
    fn decode(&self, fields: FieldMap) -> Result<Resource, CodecError> {
        Resource::from_field_map(fields)
    }
}

/// Dispatch table from resource kind to decoder
#[derive(Clone)]
pub struct DecoderRegistry {
    decoders: HashMap<ResourceKind, Arc<dyn ResourceDecoder>>,
    fallback: Arc<dyn ResourceDecoder>,
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self {
            decoders: HashMap::new(),
            fallback: Arc::new(DefaultDecoder),
        }
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.decoders.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("DecoderRegistry")
            .field("registered", &kinds)
            .finish_non_exhaustive()
    }
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoder for `kind`, replacing any previous one
    pub fn register(&mut self, kind: ResourceKind, decoder: impl ResourceDecoder + 'static) {
        self.decoders.insert(kind, Arc::new(decoder));
    }

    pub fn with(mut self, kind: ResourceKind, decoder: impl ResourceDecoder + 'static) -> Self {
        self.register(kind, decoder);
        self
    }

    pub fn is_registered(&self, kind: ResourceKind) -> bool {
        self.decoders.contains_key(&kind)
    }

    /// Decoder for `kind`, falling back to the default
    pub fn decoder_for(&self, kind: ResourceKind) -> &dyn ResourceDecoder {
        &**self.decoders.get(&kind).unwrap_or(&self.fallback)
    }

    /// Decode a stored row through the decoder for its resource type
    pub fn decode_row(&self, row: &ResourceRow) -> Result<Resource, CodecError> {
        let map = row_to_field_map(row)?;
        let kind = map
            .get(fields::RESOURCE_TYPE)
            .and_then(|name| ResourceKind::parse(name));

        match kind {
            Some(kind) => self.decoder_for(kind).decode(map),
            // Unknown or missing types are reported by the default decoder
            None => self.fallback.decode(map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_row;

    /// Promotes a `name` attribute into the description
    struct NamedImageDecoder;

    impl ResourceDecoder for NamedImageDecoder {
        fn decode(&self, mut fields: FieldMap) -> Result<Resource, CodecError> {
            let name = fields.remove("name");
            let mut resource = Resource::from_field_map(fields)?;
            if resource.description.is_none() {
                resource.description = name;
            }
            Ok(resource)
        }
    }

    #[test]
    fn test_default_registry_decodes_every_kind() {
        let registry = DecoderRegistry::new();
        for kind in ResourceKind::ALL {
            assert!(!registry.is_registered(kind));
            let resource = Resource::new("id-1", "us-east-1", kind);
            let row = encode_row(&resource).unwrap();
            assert_eq!(registry.decode_row(&row).unwrap(), resource);
        }
    }

    #[test]
    fn test_registered_decoder_is_selected_by_kind() {
        let registry = DecoderRegistry::new().with(ResourceKind::Image, NamedImageDecoder);
        assert!(registry.is_registered(ResourceKind::Image));

        let image = Resource::new("ami-1", "us-east-1", ResourceKind::Image)
            .with_additional_field("name", "base-2024");
        let decoded = registry.decode_row(&encode_row(&image).unwrap()).unwrap();
        assert_eq!(decoded.description.as_deref(), Some("base-2024"));
        assert!(decoded.additional_field("name").is_none());

        // Other kinds keep the default behavior
        let snapshot = Resource::new("snap-1", "us-east-1", ResourceKind::EbsSnapshot)
            .with_additional_field("name", "nightly");
        let decoded = registry.decode_row(&encode_row(&snapshot).unwrap()).unwrap();
        assert_eq!(decoded.description, None);
        assert_eq!(decoded.additional_field("name"), Some("nightly"));
    }

    #[test]
    fn test_unknown_type_still_fails() {
        let registry = DecoderRegistry::new().with(ResourceKind::Image, NamedImageDecoder);
        let row = encode_row(&Resource::new("x", "us-east-1", ResourceKind::Image))
            .unwrap()
            .with(crate::codec::Column::ResourceType, "LAMBDA");
        assert!(matches!(
            registry.decode_row(&row),
            Err(CodecError::UnknownResourceType(name)) if name == "LAMBDA"
        ));
    }

    #[test]
    fn test_debug_lists_registered_kinds() {
        let registry = DecoderRegistry::new().with(ResourceKind::Image, NamedImageDecoder);
        assert!(format!("{registry:?}").contains("IMAGE"));
    }
}
