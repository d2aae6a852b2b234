use crate::address::{AddressLayout, AddressParts, PageLayout};
use crate::cache::CacheGeometry;
use crate::config::{CacheConfig, CacheReplacementConfig, MappingConfig};
use crate::error::ConfigError;
use crate::test::random_addresses;
use crate::util::textbook_cache;

fn geometry(mapping: MappingConfig) -> CacheGeometry {
    CacheGeometry::from_config(&textbook_cache(mapping, CacheReplacementConfig::LeastRecentlyUsed)).unwrap()
}

#[test]
fn derives_bit_widths_for_every_mapping() {
    let direct = geometry(MappingConfig::Direct);
    assert_eq!((direct.lines, direct.sets, direct.associativity), (4, 4, 1));
    assert_eq!(direct.layout, AddressLayout { offset_bits: 6, index_bits: 2, tag_bits: 24 });

    let full = geometry(MappingConfig::FullyAssociative);
    assert_eq!((full.lines, full.sets, full.associativity), (4, 1, 4));
    assert_eq!(full.layout, AddressLayout { offset_bits: 6, index_bits: 0, tag_bits: 26 });

    let set = geometry(MappingConfig::SetAssociative);
    assert_eq!((set.lines, set.sets, set.associativity), (4, 2, 2));
    assert_eq!(set.layout, AddressLayout { offset_bits: 6, index_bits: 1, tag_bits: 25 });
}

#[test]
fn decomposes_block_four_onto_line_zero() {
    let layout = geometry(MappingConfig::Direct).layout;
    assert_eq!(layout.decompose(0x0100), AddressParts { tag: 1, index: 0, offset: 0 });
    assert_eq!(layout.decompose(0x00C7), AddressParts { tag: 0, index: 3, offset: 7 });
}

#[test]
fn decomposition_round_trips() {
    for mapping in [MappingConfig::Direct, MappingConfig::FullyAssociative, MappingConfig::SetAssociative] {
        let layout = geometry(mapping).layout;
        for address in random_addresses(1, 1000, 1 << 32) {
            assert_eq!(layout.compose(layout.decompose(address)), address, "{mapping} {address:#X}");
        }
    }
}

#[test]
fn rejects_a_negative_tag_width() {
    let config = CacheConfig {
        size: 1 << 33,
        block_size: 1 << 20,
        mapping: MappingConfig::Direct,
        associativity: 0,
        replacement_policy: CacheReplacementConfig::LeastRecentlyUsed,
        seed: 0,
    };
    assert_eq!(
        CacheGeometry::from_config(&config),
        Err(ConfigError::AddressTooNarrow { offset_bits: 20, index_bits: 13, address_bits: 32 })
    );
}

#[test]
fn rejects_inconsistent_sizes() {
    let mut config = textbook_cache(MappingConfig::Direct, CacheReplacementConfig::LeastRecentlyUsed);
    config.block_size = 48;
    assert_eq!(CacheGeometry::from_config(&config), Err(ConfigError::BlockSizeNotPowerOfTwo(48)));

    let mut config = textbook_cache(MappingConfig::Direct, CacheReplacementConfig::LeastRecentlyUsed);
    config.size = 300;
    assert_eq!(
        CacheGeometry::from_config(&config),
        Err(ConfigError::CacheSizeNotMultipleOfBlock { size: 300, block_size: 64 })
    );

    // Three lines can't be indexed directly, but one set of three is fine
    let mut config = textbook_cache(MappingConfig::Direct, CacheReplacementConfig::LeastRecentlyUsed);
    config.size = 192;
    assert_eq!(CacheGeometry::from_config(&config), Err(ConfigError::SetCountNotPowerOfTwo(3)));
    config.mapping = MappingConfig::FullyAssociative;
    assert_eq!(CacheGeometry::from_config(&config).unwrap().associativity, 3);
}

#[test]
fn rejects_bad_associativity() {
    let mut config = textbook_cache(MappingConfig::SetAssociative, CacheReplacementConfig::LeastRecentlyUsed);
    config.associativity = 3;
    assert_eq!(
        CacheGeometry::from_config(&config),
        Err(ConfigError::InvalidAssociativity { associativity: 3, lines: 4 })
    );
    config.associativity = 0;
    assert!(matches!(CacheGeometry::from_config(&config), Err(ConfigError::InvalidAssociativity { .. })));
}

#[test]
fn unknown_names_are_configuration_errors() {
    assert_eq!("ring".parse::<MappingConfig>(), Err(ConfigError::UnsupportedMapping("ring".to_string())));
    assert_eq!("mru".parse::<CacheReplacementConfig>(), Err(ConfigError::UnsupportedPolicy("mru".to_string())));
    assert_eq!("Set-Associative".parse::<MappingConfig>(), Ok(MappingConfig::SetAssociative));
}

#[test]
fn splits_pages() {
    let layout = PageLayout::new(4096).unwrap();
    assert_eq!(layout.split(0x1234), (1, 0x234));
    assert_eq!(layout.physical_address(2, 0x234), 0x2234);
    assert_eq!(PageLayout::new(1000), Err(ConfigError::PageSizeNotPowerOfTwo(1000)));
}
