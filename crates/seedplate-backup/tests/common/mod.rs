//! Shared descriptor fixtures for the integration suites.

use seedplate_urtypes::{
    DescriptorKey, OutputDescriptor, ScriptType, CHAIN_CODE_LEN, HARDENED, KEY_DATA_LEN,
};

const FINGERPRINTS: [u32; 7] = [
    0xDC56_7276,
    0x77C0_EDDE,
    0x0A4B_B02F,
    0x3B1A_2F9C,
    0x9D6E_0441,
    0x5600_C1D4,
    0xE1F2_A3B4,
];

#[must_use]
pub fn descriptor(threshold: usize, keys: usize) -> OutputDescriptor {
    assert!(keys <= FINGERPRINTS.len(), "fixture supports up to 7 keys");
    let keys = (0..keys)
        .map(|index| {
            let mut chain_code = [0u8; CHAIN_CODE_LEN];
            for (position, byte) in chain_code.iter_mut().enumerate() {
                *byte = ((index * 7 + position * 13) % 256) as u8;
            }
            let mut key_data = [0u8; KEY_DATA_LEN];
            key_data[0] = 0x02;
            for position in 0..32 {
                key_data[position + 1] = ((index * 11 + position * 17) % 256) as u8;
            }
            DescriptorKey {
                master_fingerprint: FINGERPRINTS[index],
                derivation_path: vec![48 | HARDENED, HARDENED, HARDENED, 2 | HARDENED],
                chain_code,
                key_data,
            }
        })
        .collect();
    OutputDescriptor {
        title: "FAMILY VAULT".into(),
        script: ScriptType::Wsh,
        threshold,
        keys,
    }
}
