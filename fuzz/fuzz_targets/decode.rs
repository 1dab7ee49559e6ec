#![no_main]
use libfuzzer_sys::fuzz_target;
use treeform::{DecodeConfig, Decoder, Directory, Strategy};

fuzz_target!(|data: &[u8]| {
    for strategy in [Strategy::Sniff, Strategy::Probe] {
        let decoder = Decoder::new(DecodeConfig::default().with_strategy(strategy));
        if let Ok(decoded) = decoder.decode_slice(data) {
            let _ = Directory::from_mapping(&decoded.tree);
        }
    }
});
