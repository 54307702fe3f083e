/// Tests for the sampler handler

use super::*;
use crate::backend::null::NullBackend;
use crate::backend::types::{AddressMode, FilterMode, SamplerDesc};

#[test]
fn test_create_and_resolve_sampler() {
    let mut backend = NullBackend::new();
    let mut handler = SamplerHandler::new();

    let id = handler.create(&mut backend, &SamplerDesc::default()).unwrap();
    assert!(handler.contains(id));
    assert!(handler.get(id).is_ok());
}

#[test]
fn test_destroy_recycles_sampler_id() {
    let mut backend = NullBackend::new();
    let mut handler = SamplerHandler::new();

    let id = handler
        .create(
            &mut backend,
            &SamplerDesc {
                mag_filter: FilterMode::Nearest,
                min_filter: FilterMode::Nearest,
                address_mode: AddressMode::ClampToEdge,
                ..SamplerDesc::default()
            },
        )
        .unwrap();

    assert!(handler.destroy(id));
    assert!(handler.get(id).is_err());
    assert!(!handler.destroy(id));
}
