#![no_main]
use libfuzzer_sys::fuzz_target;
use treeform::xml::Reader;

fuzz_target!(|data: &[u8]| {
    let mut reader = Reader::new(data);
    while let Ok(Some(_)) = reader.next_event() {}
});
